//! The tools module provides helper functions for huffzip.
//!
//! The tools are:
//! - cli: Command line interface and run options.
//! - freq_count: Chunked byte frequency profiling.
//! - timer: Wall-clock time per pipeline stage.
//!
pub mod cli;
pub mod freq_count;
pub mod timer;
