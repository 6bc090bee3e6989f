use std::io::{self, Read};

use log::trace;

/// Default chunk size for every streaming pass over a file.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Occurrence count of each byte value in a source.
#[derive(Clone, PartialEq, Eq)]
pub struct FreqTable {
    counts: [u64; 256],
}

impl FreqTable {
    pub fn new() -> Self {
        Self { counts: [0; 256] }
    }

    /// Frequency count of an in-memory slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut freqs = Self::new();
        freqs.add(data);
        freqs
    }

    /// Tally every byte of `chunk`.
    pub fn add(&mut self, chunk: &[u8]) {
        chunk.iter().for_each(|&el| self.counts[el as usize] += 1);
    }

    pub fn get(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    /// Total number of bytes profiled.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of byte values that occur at least once.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// (byte, count) for every byte present, in ascending byte order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(b, &c)| (b as u8, c))
    }

    /// Log the table, one line per byte present.
    pub fn report(&self) {
        for (byte, count) in self.iter() {
            trace!("{:#04x} {:08b} {:>12}", byte, byte, count);
        }
    }
}

impl Default for FreqTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FreqTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Stream `source` in chunks of `chunk_size` and count every byte. At most `limit` bytes are
/// read when a ceiling is given. The source is only read, never rewound.
pub fn profile<R: Read>(source: R, chunk_size: usize, limit: Option<u64>) -> io::Result<FreqTable> {
    let mut source = source.take(limit.unwrap_or(u64::MAX));
    let mut buf = vec![0_u8; chunk_size.max(1)];
    let mut freqs = FreqTable::new();

    loop {
        let size = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(size) => size,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        freqs.add(&buf[..size]);
    }
    Ok(freqs)
}
