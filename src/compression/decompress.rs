use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, info, trace};

use super::check_distinct;
use crate::bitstream::bitreader::BitReader;
use crate::error::{AtStage, HuffError, Stage, StageError};
use crate::huffman_coding::header::{decode_header, MAX_TREE_BYTES};
use crate::huffman_coding::huffman::{HuffNode, HuffTree};
use crate::tools::cli::HuffOpts;
use crate::tools::timer::Timer;

/// Summary of a finished decode run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Compressed bytes read
    pub bytes_in: u64,
    /// Bytes restored
    pub bytes_out: u64,
    /// Value of the header length field
    pub header_len: u32,
    /// Pad bits ignored at the end of the body
    pub trailing_bits: u8,
}

/// Decompress `input` into `output` with default settings.
pub fn decode(input: &Path, output: &Path) -> Result<DecodeReport, StageError> {
    decode_with(input, output, &HuffOpts::default())
}

/// Decompress `input` into `output`. A zero-length input produces a zero-length output.
pub fn decode_with(input: &Path, output: &Path, opts: &HuffOpts) -> Result<DecodeReport, StageError> {
    let mut source = File::open(input)
        .map_err(|source| HuffError::SourceUnavailable {
            path: input.to_path_buf(),
            source,
        })
        .at(Stage::HeaderReading)?;
    check_distinct(input, output).at(Stage::HeaderReading)?;
    let sink = File::create(output)
        .map_err(|source| HuffError::SinkUnavailable {
            path: output.to_path_buf(),
            source,
        })
        .at(Stage::HeaderReading)?;
    info!("Decoding {} into {}", input.display(), output.display());
    let mut sink = BufWriter::new(sink);
    decode_stream(&mut source, &mut sink, opts)
}

/// Decompress from any reader into any writer.
pub fn decode_stream<R: Read, W: Write>(
    source: &mut R,
    sink: &mut W,
    opts: &HuffOpts,
) -> Result<DecodeReport, StageError> {
    let mut timer = Timer::new();

    let mut len_field = [0_u8; 4];
    match read_full(source, &mut len_field).at(Stage::HeaderReading)? {
        0 => {
            info!("Compressed stream is empty, nothing to decode");
            sink.flush().at(Stage::BodyDecoding)?;
            return Ok(DecodeReport::default());
        }
        4 => {}
        _ => {
            return Err(StageError::new(
                Stage::HeaderReading,
                HuffError::malformed("length field cut short"),
            ))
        }
    }
    let (tree, header_len, padding) = read_header(source, u32::from_le_bytes(len_field)).at(Stage::HeaderReading)?;
    timer.mark("read header");
    debug!(
        "Header is {} bytes, tree has {} leaves, {} pad bits",
        header_len,
        tree.leaf_count(),
        padding
    );

    let (body_in, bytes_out) = decode_body(source, sink, &tree, padding, opts.chunk_size).at(Stage::BodyDecoding)?;
    sink.flush().at(Stage::BodyDecoding)?;
    timer.mark("decode");

    let report = DecodeReport {
        bytes_in: 4 + header_len as u64 + body_in,
        bytes_out,
        header_len,
        trailing_bits: padding,
    };
    info!("Decoded {} bytes into {}", report.bytes_in, report.bytes_out);
    timer.report();
    Ok(report)
}

/// Read the tree region and the trailing bit count that follow the length field.
fn read_header<R: Read>(source: &mut R, header_len: u32) -> Result<(HuffTree, u32, u8), HuffError> {
    let tree_len = (header_len as usize)
        .checked_sub(1)
        .ok_or_else(|| HuffError::malformed("header length is zero"))?;
    if tree_len > MAX_TREE_BYTES {
        return Err(HuffError::malformed(format!(
            "header length {} is larger than any tree",
            header_len
        )));
    }

    let mut region = vec![0_u8; tree_len];
    if read_full(source, &mut region)? != tree_len {
        return Err(HuffError::malformed("tree region cut short"));
    }
    let tree = decode_header(region)?;

    let mut padding = [0_u8; 1];
    if read_full(source, &mut padding)? != 1 {
        return Err(HuffError::malformed("trailing bit count missing"));
    }
    if padding[0] > 7 {
        return Err(HuffError::corrupt(format!(
            "trailing bit count {} is out of range",
            padding[0]
        )));
    }
    Ok((tree, header_len, padding[0]))
}

/// Walks the tree one bit at a time, restarting at the root after every leaf.
struct TreeWalk<'a> {
    root: &'a HuffNode,
    at: &'a HuffNode,
}

impl<'a> TreeWalk<'a> {
    fn new(tree: &'a HuffTree) -> Self {
        Self {
            root: tree.root(),
            at: tree.root(),
        }
    }

    /// Follow one edge (0 = left, 1 = right). Returns the byte when a leaf is reached.
    fn step(&mut self, bit: bool) -> Result<Option<u8>, HuffError> {
        let at = self.at;
        match at {
            // Single-leaf tree: the lone code word is 0, a 1 bit has no edge to follow
            HuffNode::Leaf { byte, .. } if !bit => Ok(Some(*byte)),
            HuffNode::Leaf { byte, .. } => Err(HuffError::corrupt(format!(
                "1 bit in a body whose only code is 0 for {:#04x}",
                byte
            ))),
            HuffNode::Internal { left, right, .. } => {
                let next: &'a HuffNode = if bit { &**right } else { &**left };
                match next {
                    HuffNode::Leaf { byte, .. } => {
                        self.at = self.root;
                        Ok(Some(*byte))
                    }
                    HuffNode::Internal { .. } => {
                        self.at = next;
                        Ok(None)
                    }
                }
            }
        }
    }

    /// True while part of a code word has been consumed.
    fn mid_code(&self) -> bool {
        !std::ptr::eq(self.at, self.root)
    }
}

/// Stream the body in chunks and decode it. One chunk is read ahead so the last chunk is known
/// before it is decoded; only that chunk has its pad bits excluded.
/// Returns (body bytes read, bytes written).
fn decode_body<R: Read, W: Write>(
    source: &mut R,
    sink: &mut W,
    tree: &HuffTree,
    padding: u8,
    chunk_size: usize,
) -> Result<(u64, u64), HuffError> {
    let chunk_size = chunk_size.max(1);
    let mut walk = TreeWalk::new(tree);
    let mut br = BitReader::default();
    let mut out = Vec::with_capacity(chunk_size * 2);
    let mut body_in = 0_u64;
    let mut bytes_out = 0_u64;

    let mut spare = Vec::new();
    let mut current = fill_chunk(source, Vec::new(), chunk_size)?;
    while !current.is_empty() {
        let next = fill_chunk(source, spare, chunk_size)?;
        let last = next.is_empty();
        body_in += current.len() as u64;
        trace!("Decoding {} byte chunk, last: {}", current.len(), last);

        spare = br.rearm(current, if last { padding } else { 0 });
        while let Some(bit) = br.bit() {
            if let Some(byte) = walk.step(bit)? {
                out.push(byte);
            }
        }
        sink.write_all(&out)?;
        bytes_out += out.len() as u64;
        out.clear();

        current = next;
    }

    if body_in == 0 && padding != 0 {
        return Err(HuffError::corrupt(format!(
            "{} pad bits claimed for an empty body",
            padding
        )));
    }
    if walk.mid_code() {
        return Err(HuffError::corrupt("body ends inside a code word"));
    }
    Ok((body_in, bytes_out))
}

/// Fill `buf` with up to `size` bytes, reading until it is full or the source is exhausted.
fn fill_chunk<R: Read>(source: &mut R, mut buf: Vec<u8>, size: usize) -> io::Result<Vec<u8>> {
    buf.resize(size, 0);
    let filled = read_full(source, &mut buf)?;
    buf.truncate(filled);
    Ok(buf)
}

/// Like `read_exact`, but a short read at end of input is reported as a count instead of an error.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::compress::encode_stream;
    use std::io::Cursor;

    fn encode_bytes(data: &[u8]) -> Vec<u8> {
        let mut sink = Cursor::new(Vec::new());
        encode_stream(&mut Cursor::new(data), &mut sink, &HuffOpts::default()).unwrap();
        sink.into_inner()
    }

    fn decode_bytes(data: &[u8], chunk_size: usize) -> Result<Vec<u8>, StageError> {
        let opts = HuffOpts {
            chunk_size,
            ..HuffOpts::default()
        };
        let mut out = Vec::new();
        decode_stream(&mut Cursor::new(data), &mut out, &opts)?;
        Ok(out)
    }

    #[test]
    fn known_stream_test() {
        let stream = [4, 0, 0, 0, 0b0101_0000, 0b1010_1000, 0b0010_0000, 4, 0b1011_0000];
        assert_eq!(decode_bytes(&stream, 1024).unwrap(), vec![0x41, 0x42, 0x41, 0x41]);
    }

    #[test]
    fn empty_stream_test() {
        assert_eq!(decode_bytes(&[], 1024).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn single_symbol_test() {
        let data = vec![0x41; 1000];
        assert_eq!(decode_bytes(&encode_bytes(&data), 16).unwrap(), data);
    }

    #[test]
    fn single_symbol_rejects_one_bits_test() {
        // Lone leaf 0x41 has code 0, so a body of 1 bits cannot be decoded
        let stream = [3, 0, 0, 0, 0b1010_0000, 0b1000_0000, 0, 0xff];
        let err = decode_bytes(&stream, 1024).unwrap_err();
        assert_eq!(err.stage, Stage::BodyDecoding);
        assert!(matches!(err.kind, HuffError::CorruptStream(_)));

        let stream = [3, 0, 0, 0, 0b1010_0000, 0b1000_0000, 5, 0b0000_0000];
        assert_eq!(decode_bytes(&stream, 1024).unwrap(), vec![0x41; 3]);
    }

    #[test]
    fn chunk_boundaries_test() {
        let data: Vec<u8> = b"mississippi river banks ".repeat(50);
        let encoded = encode_bytes(&data);
        // 1 forces a rearm per byte; the others land the body end on and off chunk edges
        for chunk in [1, 2, 3, 7, 64, 4096] {
            assert_eq!(decode_bytes(&encoded, chunk).unwrap(), data, "chunk size {}", chunk);
        }
    }

    #[test]
    fn exact_multiple_chunk_test() {
        // Body of 3 bytes with a pad bit; chunk size 3 means the last chunk is full
        let encoded = encode_bytes(b"abracadabra");
        let body = encoded.len() - 12;
        assert_eq!(body, 3);
        assert_eq!(decode_bytes(&encoded, 3).unwrap(), b"abracadabra".to_vec());
    }

    #[test]
    fn truncated_length_test() {
        let err = decode_bytes(&[4, 0], 1024).unwrap_err();
        assert_eq!(err.stage, Stage::HeaderReading);
        assert!(matches!(err.kind, HuffError::MalformedHeader(_)));
    }

    #[test]
    fn zero_header_length_test() {
        let err = decode_bytes(&[0, 0, 0, 0, 1], 1024).unwrap_err();
        assert!(matches!(err.kind, HuffError::MalformedHeader(_)));
    }

    #[test]
    fn oversized_header_length_test() {
        let err = decode_bytes(&[0xff, 0xff, 0xff, 0xff], 1024).unwrap_err();
        assert!(matches!(err.kind, HuffError::MalformedHeader(_)));
    }

    #[test]
    fn missing_marker_test() {
        let encoded = encode_bytes(b"abracadabra");
        let err = decode_bytes(&encoded[..11], 1024).unwrap_err();
        assert!(matches!(err.kind, HuffError::MalformedHeader(_)));
    }

    #[test]
    fn bad_marker_test() {
        let mut encoded = encode_bytes(b"abracadabra");
        encoded[11] = 9;
        let err = decode_bytes(&encoded, 1024).unwrap_err();
        assert!(matches!(err.kind, HuffError::CorruptStream(_)));
    }

    #[test]
    fn padding_without_body_test() {
        let encoded = encode_bytes(b"abracadabra");
        let err = decode_bytes(&encoded[..12], 1024).unwrap_err();
        assert_eq!(err.stage, Stage::BodyDecoding);
        assert!(matches!(err.kind, HuffError::CorruptStream(_)));
    }

    #[test]
    fn body_ends_mid_code_test() {
        // a is 0 and the rest are 3 bits long, so a lone 1 bit stops inside a code word
        let mut encoded = encode_bytes(b"abracadabra");
        encoded.truncate(12);
        encoded[11] = 7;
        encoded.push(0b1000_0000);
        let err = decode_bytes(&encoded, 1024).unwrap_err();
        assert!(matches!(err.kind, HuffError::CorruptStream(_)));
    }

    #[test]
    fn pad_bits_are_not_decoded_test() {
        // Trailing bit count of 4 hides a second "B A A" pattern in the pad bits
        let stream = [4, 0, 0, 0, 0b0101_0000, 0b1010_1000, 0b0010_0000, 4, 0b1011_0100];
        let out = decode_bytes(&stream, 1024).unwrap();
        assert_eq!(out, vec![0x41, 0x42, 0x41, 0x41]);
    }
}
