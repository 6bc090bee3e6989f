//! BitReader: reads a packed bitstream MSB-first out of an in-memory chunk.
//!
//! The reader is armed with one chunk at a time. The last chunk of a body may end in pad bits;
//! arming the reader with the pad count makes `bit()` stop at the last valid bit instead of at
//! the end of the buffer.

const BIT_MASK: u8 = 0x80;

/// Reads bits out of a byte buffer.
#[derive(Debug, Default)]
pub struct BitReader {
    buffer: Vec<u8>,
    /// Index of the byte holding the next bit.
    cursor: usize,
    /// Position of the next bit within the current byte, 0 = MSB.
    bit_index: u8,
    /// Number of valid bits in the final byte of the buffer, 1..=8.
    tail_bits: u8,
}

impl BitReader {
    /// Creates a BitReader over `buffer` where every bit is valid.
    pub fn new(buffer: Vec<u8>) -> Self {
        Self::with_padding(buffer, 0)
    }

    /// Creates a BitReader over `buffer` whose final `padding` bits are to be ignored.
    /// `padding` must be below 8.
    pub fn with_padding(buffer: Vec<u8>, padding: u8) -> Self {
        let mut br = BitReader::default();
        br.rearm(buffer, padding);
        br
    }

    /// Reset the cursor to the start of a freshly supplied buffer. Returns the previous buffer
    /// so the caller can reuse its allocation.
    pub fn rearm(&mut self, buffer: Vec<u8>, padding: u8) -> Vec<u8> {
        debug_assert!(padding < 8);
        self.cursor = 0;
        self.bit_index = 0;
        self.tail_bits = 8 - padding.min(7);
        std::mem::replace(&mut self.buffer, buffer)
    }

    /// Return the next bit (true for 1), or None once the last valid bit has been consumed.
    pub fn bit(&mut self) -> Option<bool> {
        let len = self.buffer.len();
        if self.cursor >= len || (self.cursor == len - 1 && self.bit_index >= self.tail_bits) {
            return None;
        }
        let bit = self.buffer[self.cursor] & (BIT_MASK >> self.bit_index) != 0;
        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
            self.cursor += 1;
        }
        Some(bit)
    }

    /// Return the next 8 bits as a byte, or None if fewer than 8 valid bits remain.
    pub fn byte(&mut self) -> Option<u8> {
        let mut byte = 0_u8;
        for _ in 0..8 {
            byte = byte << 1 | self.bit()? as u8;
        }
        Some(byte)
    }

    /// Consume what is left of the current byte without interpreting it.
    /// Returns the number of bits skipped.
    pub fn skip_to_byte_boundary(&mut self) -> u8 {
        if self.bit_index == 0 {
            return 0;
        }
        let skipped = 8 - self.bit_index;
        self.bit_index = 0;
        self.cursor += 1;
        skipped
    }

    /// Whole bytes not yet touched by the cursor.
    pub fn bytes_left(&self) -> usize {
        let started = self.cursor + usize::from(self.bit_index > 0);
        self.buffer.len().saturating_sub(started)
    }

    /// Debugging function. Report current position in the buffer.
    pub fn loc(&self) -> String {
        format!("[{}.{}]", self.cursor, self.bit_index)
    }
}
