//! A static Huffman compressor for byte streams.
//!
//! The encoder profiles the input, builds an optimal prefix code for its byte distribution and
//! writes a self-describing file: the code tree travels in the header, so decoding needs nothing
//! but the compressed file.
//!
//! Basic usage from the command line:
//!
//! `$> huffzip notes.txt`
//!
//! This writes notes.txt.huf next to the input. `huffzip notes.txt.huf` restores notes.txt.
//! Inputs are never deleted.
//!
//! From code, [`encode`] and [`decode`] work on paths, while [`encode_stream`] and
//! [`decode_stream`] accept any reader and writer.
pub mod bitstream;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::compress::{encode, encode_stream, encode_stream_append, encode_with, EncodeReport};
pub use compression::decompress::{decode, decode_stream, decode_with, DecodeReport};
pub use error::{HuffError, Stage, StageError};
pub use tools::cli::HuffOpts;
