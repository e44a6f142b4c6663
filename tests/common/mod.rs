//! Shared fixtures for pipeline integration tests
//!
//! Builds experiment directories on disk (fragments plus partition files)
//! and provides capabilities that record how they were used.

#![allow(dead_code)]

pub mod capability;
pub mod fixture;

pub use capability::CountingReader;
pub use fixture::ExperimentFixture;
