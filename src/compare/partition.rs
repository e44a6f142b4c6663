//! Partition file readers
//!
//! Two layouts are understood: text files with one cluster id per line
//! (line number = element id), and binary shards of little-endian
//! `(u32 element, u32 cluster)` pairs. Shards are read in the order given.

use super::capability::{Partition, PartitionReader};
use super::error::ReadError;
use std::path::{Path, PathBuf};

const PAIR_WIDTH: usize = 8;

/// Element ids in binary shards may leave gaps, but no more than this many
/// slots per pair read.
const MAX_SPREAD: usize = 4;

/// Smallest element id ceiling, so tiny shards may still be sparse
const MIN_ELEMENT_LIMIT: usize = 1 << 16;

/// One cluster id per line
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPartitionReader;

impl TextPartitionReader {
    fn read_one(path: &Path, partition: &mut Partition, offset: usize) -> Result<usize, ReadError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut element = offset;
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
                continue;
            }
            let cluster: u64 = line.parse().map_err(|_| ReadError::Format {
                path: path.to_path_buf(),
                reason: format!("line {}: '{}' is not a cluster id", n + 1, line),
            })?;
            partition.assign(element, cluster);
            element += 1;
        }
        Ok(element)
    }
}

impl PartitionReader for TextPartitionReader {
    fn read_partition(&self, paths: &[PathBuf]) -> Result<Partition, ReadError> {
        if paths.is_empty() {
            return Err(ReadError::Empty);
        }
        let mut partition = Partition::new();
        let mut next = 0;
        for path in paths {
            next = Self::read_one(path, &mut partition, next)?;
        }
        Ok(partition)
    }
}

/// Little-endian `(u32 element, u32 cluster)` pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryPartitionReader;

impl PartitionReader for BinaryPartitionReader {
    fn read_partition(&self, paths: &[PathBuf]) -> Result<Partition, ReadError> {
        if paths.is_empty() {
            return Err(ReadError::Empty);
        }
        let mut pairs = 0usize;
        for path in paths {
            let meta = std::fs::metadata(path).map_err(|source| ReadError::Io {
                path: path.clone(),
                source,
            })?;
            pairs = pairs.saturating_add(meta.len() as usize / PAIR_WIDTH);
        }
        let limit = pairs.saturating_mul(MAX_SPREAD).max(MIN_ELEMENT_LIMIT);

        let mut partition = Partition::new();
        for path in paths {
            let bytes = std::fs::read(path).map_err(|source| ReadError::Io {
                path: path.clone(),
                source,
            })?;
            if bytes.len() % PAIR_WIDTH != 0 {
                return Err(ReadError::Format {
                    path: path.clone(),
                    reason: format!("{} bytes is not a whole number of pairs", bytes.len()),
                });
            }
            for pair in bytes.chunks_exact(PAIR_WIDTH) {
                let element = u32::from_le_bytes([pair[0], pair[1], pair[2], pair[3]]);
                let cluster = u32::from_le_bytes([pair[4], pair[5], pair[6], pair[7]]);
                if element as usize >= limit {
                    return Err(ReadError::Format {
                        path: path.clone(),
                        reason: format!(
                            "element {} is out of range for {} pairs",
                            element, pairs
                        ),
                    });
                }
                partition.assign(element as usize, u64::from(cluster));
            }
        }
        Ok(partition)
    }
}

/// Picks the reader by extension: a single `.txt` file is text, anything
/// else is binary shards.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPartitionReader;

impl PartitionReader for AutoPartitionReader {
    fn read_partition(&self, paths: &[PathBuf]) -> Result<Partition, ReadError> {
        let is_text = matches!(
            paths,
            [single] if single.extension().and_then(|e| e.to_str()) == Some("txt")
        );
        if is_text {
            TextPartitionReader.read_partition(paths)
        } else {
            BinaryPartitionReader.read_partition(paths)
        }
    }
}

/// Encode a partition as binary pairs, skipping unassigned elements
pub fn encode_binary(partition: &Partition) -> Vec<u8> {
    let mut out = Vec::with_capacity(partition.element_count() * PAIR_WIDTH);
    for element in 0..partition.element_count() {
        if let Some(cluster) = partition.cluster_of(element) {
            out.extend_from_slice(&(element as u32).to_le_bytes());
            out.extend_from_slice(&(cluster as u32).to_le_bytes());
        }
    }
    out
}
