//! Core types for the Spark job submitter.
//!
//! Holds the run configuration, the Block/Code transformation model
//! that user scripts are assembled from, and the top-level error
//! classes that decide process exit codes.

pub mod config;
pub mod error;
pub mod transformation;
