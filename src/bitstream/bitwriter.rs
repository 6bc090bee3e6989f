//! BitWriter: packs bits MSB-first into bytes and hands full bytes to any `Write` sink.
//!
//! The header is staged by writing into a `Vec<u8>`; the body is written through the same type
//! straight to the output file.

use std::io::{self, Write};

use crate::huffman_coding::huffman::CodeWord;

/// Bytes collected before they are pushed to the sink.
const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Writes a bitstream for output.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    /// Handle to the output stream.
    writer: W,
    /// Output buffer of completed bytes, drained into the writer when full.
    output: Vec<u8>,
    /// Flush threshold for the output buffer.
    capacity: usize,
    /// Byte being assembled.
    queue: u8,
    /// Count of valid bits in the queue, 0..8. The next bit lands at position 7 - q_bits.
    q_bits: u8,
    /// Completed bytes so far, whether or not they have reached the writer yet.
    bytes_out: u64,
}

impl<W: Write> BitWriter<W> {
    /// Create a BitWriter with the default buffer size.
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, DEFAULT_CAPACITY)
    }

    /// Create a BitWriter that pushes its buffer to the writer every `capacity` bytes.
    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            writer,
            output: Vec::with_capacity(capacity),
            capacity,
            queue: 0,
            q_bits: 0,
            bytes_out: 0,
        }
    }

    /// Put one bit on the stream.
    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        if bit {
            self.queue |= 0x80 >> self.q_bits;
        }
        self.q_bits += 1;
        if self.q_bits == 8 {
            self.push_queue()?;
        }
        Ok(())
    }

    /// Put a full byte on the stream, MSB first. Works at any bit alignment.
    pub fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        if self.q_bits == 0 {
            self.queue = byte;
            return self.push_queue();
        }
        for i in (0..8).rev() {
            self.write_bit((byte >> i) & 1 == 1)?;
        }
        Ok(())
    }

    /// Put every bit of a code word on the stream, first bit first.
    pub fn write_code(&mut self, code: &CodeWord) -> io::Result<()> {
        for bit in code.bits() {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Pad the current byte with 0 bits until the stream is byte aligned.
    /// Returns how many pad bits were written (0..=7).
    pub fn flush_to_boundary(&mut self) -> io::Result<u8> {
        let mut padding = 0;
        while self.q_bits != 0 {
            self.write_bit(false)?;
            padding += 1;
        }
        Ok(padding)
    }

    /// True when no partial byte is pending.
    pub fn is_aligned(&self) -> bool {
        self.q_bits == 0
    }

    /// Completed bytes written so far.
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Pad to a byte boundary, push everything to the writer and hand the writer back.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush_to_boundary()?;
        self.drain()?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Move the completed byte into the output buffer.
    fn push_queue(&mut self) -> io::Result<()> {
        self.output.push(self.queue);
        self.queue = 0;
        self.q_bits = 0;
        self.bytes_out += 1;
        if self.output.len() >= self.capacity {
            self.drain()?;
        }
        Ok(())
    }

    /// Write out the data in the output buffer.
    fn drain(&mut self) -> io::Result<()> {
        self.writer.write_all(&self.output)?;
        self.output.clear();
        Ok(())
    }
}
