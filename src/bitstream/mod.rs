//! The bitstream module forms the I/O subsystem for huffzip.
//!
//! Both halves work MSB-first. The writer fills a byte from bit 7 down to bit 0 and passes it on
//! once complete; the reader walks a chunk the same way and can be told to ignore the pad bits
//! at the end of the last chunk.
//!
pub mod bitreader;
pub mod bitwriter;
