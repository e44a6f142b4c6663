//! Capabilities that record their use

use cluster_ledger::compare::{AutoPartitionReader, Partition, PartitionReader, ReadError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Delegates to the default reader and counts partitions read.
#[derive(Default)]
pub struct CountingReader {
    reads: AtomicUsize,
}

impl CountingReader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl PartitionReader for CountingReader {
    fn read_partition(&self, paths: &[PathBuf]) -> Result<Partition, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        AutoPartitionReader.read_partition(paths)
    }
}
