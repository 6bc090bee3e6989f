//! The compression module holds the two pipelines of huffzip.
//!
//! Encoding makes two passes over the input:
//! - Profiling: count how often every byte value occurs.
//! - Tree building: merge the two lightest subtrees until one tree remains, then read a code word
//!   for every leaf off the paths from the root.
//! - Header writing: the header length, the tree in preorder and the trailing bit count.
//! - Body writing: rewind the input and emit the code word of every byte.
//!
//! Decoding reverses this in a single pass. The tree is rebuilt from the header and the body is
//! walked bit by bit, emitting a byte at every leaf. The pad bits of the final byte are skipped.
//!
//! The compressed layout is
//!
//! `u32 LE header length | tree bytes | trailing bit count | body`
//!
//! where the header length counts the tree bytes plus the trailing bit count byte.

pub mod compress;
pub mod decompress;

use std::fs;
use std::io;
use std::path::Path;

use crate::error::HuffError;

/// Fail when `output` names the same file as `input`. Creating the sink would truncate the source.
pub(crate) fn check_distinct(input: &Path, output: &Path) -> Result<(), HuffError> {
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) if a == b => Err(HuffError::SinkUnavailable {
            path: output.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "output is the input file"),
        }),
        _ => Ok(()),
    }
}
