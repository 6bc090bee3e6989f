//! File-level round trips through the public encode/decode API.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use huffzip::huffman_coding::huffman::HuffTree;
use huffzip::tools::freq_count::FreqTable;
use huffzip::{decode, decode_stream, encode, encode_stream_append, encode_with, HuffError, HuffOpts, Stage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Helpers ─────────────────────────────────────────────────────────────

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A scratch path that no other test in this run will use.
fn scratch(tag: &str) -> PathBuf {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("huffzip-{}-{}-{}", std::process::id(), id, tag))
}

/// Write `data` to disk, encode it, decode it again and return (compressed, restored).
fn file_round_trip(data: &[u8], opts: &HuffOpts) -> (Vec<u8>, Vec<u8>) {
    let plain = scratch("plain");
    let packed = scratch("packed.huf");
    let restored = scratch("restored");
    fs::write(&plain, data).unwrap();

    encode_with(&plain, &packed, opts).unwrap();
    decode(&packed, &restored).unwrap();

    let compressed = fs::read(&packed).unwrap();
    let output = fs::read(&restored).unwrap();
    for p in [plain, packed, restored] {
        let _ = fs::remove_file(p);
    }
    (compressed, output)
}

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

// ── Round trips ─────────────────────────────────────────────────────────

#[test]
fn text_round_trip() {
    let data = b"It was the best of times, it was the worst of times, it was the age of wisdom".repeat(40);
    let (compressed, output) = file_round_trip(&data, &HuffOpts::default());
    assert_eq!(output, data);
    assert!(compressed.len() < data.len());
}

#[test]
fn random_round_trip() {
    let data = random_bytes(100_000, 7);
    let (_, output) = file_round_trip(&data, &HuffOpts::default());
    assert_eq!(output, data);
}

#[test]
fn skewed_round_trip() {
    // Geometric-ish distribution gives a deep tree
    let mut rng = StdRng::seed_from_u64(11);
    let data: Vec<u8> = (0..50_000).map(|_| rng.gen::<u32>().trailing_zeros() as u8).collect();
    let (_, output) = file_round_trip(&data, &HuffOpts::default());
    assert_eq!(output, data);
}

#[test]
fn single_byte_round_trip() {
    let (compressed, output) = file_round_trip(&[0x7f], &HuffOpts::default());
    assert_eq!(output, vec![0x7f]);
    // length field, 2 tree bytes, pad count 7, one body byte
    assert_eq!(compressed, vec![3, 0, 0, 0, 0b1011_1111, 0b1000_0000, 7, 0]);
}

#[test]
fn repeated_symbol_round_trip() {
    let data = vec![0x41; 1000];
    let (compressed, output) = file_round_trip(&data, &HuffOpts::default());
    assert_eq!(output, data);
    assert_eq!(compressed.len(), 132);
    assert_eq!(compressed[6], 0);
}

#[test]
fn two_symbol_file() {
    let (compressed, output) = file_round_trip(&[0x41, 0x42, 0x41, 0x41], &HuffOpts::default());
    assert_eq!(output, vec![0x41, 0x42, 0x41, 0x41]);
    assert_eq!(
        compressed,
        vec![4, 0, 0, 0, 0b0101_0000, 0b1010_1000, 0b0010_0000, 4, 0b1011_0000]
    );
}

#[test]
fn chunk_multiple_round_trip() {
    // Input and body lengths both land on chunk boundaries for some of these sizes
    let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    for chunk_size in [1, 16, 256, 4096] {
        let opts = HuffOpts {
            chunk_size,
            ..HuffOpts::default()
        };
        let (compressed, output) = file_round_trip(&data, &opts);
        assert_eq!(output, data, "chunk size {}", chunk_size);
        // 256 equal weights give 8 bit codes, so the body is the input size
        assert_eq!(compressed[compressed.len() - data.len() - 1], 0);
    }
}

#[test]
fn limit_round_trip() {
    let data = b"0123456789abcdef".repeat(8);
    let opts = HuffOpts {
        limit: Some(10),
        ..HuffOpts::default()
    };
    let (_, output) = file_round_trip(&data, &opts);
    assert_eq!(output, data[..10].to_vec());
}

#[test]
fn append_matches_seekable() {
    let data = random_bytes(5000, 3);
    let plain = scratch("append-plain");
    let packed = scratch("append-packed");
    fs::write(&plain, &data).unwrap();
    encode(&plain, &packed).unwrap();

    let mut appended = Vec::new();
    encode_stream_append(&mut Cursor::new(&data), &mut appended, &HuffOpts::default()).unwrap();
    assert_eq!(fs::read(&packed).unwrap(), appended);

    let mut restored = Vec::new();
    decode_stream(&mut Cursor::new(&appended), &mut restored, &HuffOpts::default()).unwrap();
    assert_eq!(restored, data);

    let _ = fs::remove_file(plain);
    let _ = fs::remove_file(packed);
}

// ── Trailing bits and codes ─────────────────────────────────────────────

#[test]
fn trailing_bits_match_code_lengths() {
    for seed in 0..8 {
        let len = 1 + seed as usize * 37;
        let data: Vec<u8> = random_bytes(len, seed).iter().map(|b| b % 13).collect();
        let freqs = FreqTable::from_bytes(&data);
        let table = HuffTree::from_freqs(&freqs).unwrap().encoding_table();
        assert!(table.is_prefix_free());

        let bits: u64 = data.iter().map(|b| table.get(*b).unwrap().len() as u64).sum();
        let mut packed = Vec::new();
        let report = encode_stream_append(&mut Cursor::new(&data), &mut packed, &HuffOpts::default()).unwrap();
        assert_eq!(report.trailing_bits as u64, (8 - bits % 8) % 8);
        assert_eq!(packed[4 + report.header_len as usize - 1], report.trailing_bits);
    }
}

// ── Failures ────────────────────────────────────────────────────────────

#[test]
fn empty_input_file() {
    let plain = scratch("empty-plain");
    let packed = scratch("empty-packed");
    let restored = scratch("empty-restored");
    fs::write(&plain, b"").unwrap();

    let err = encode(&plain, &packed).unwrap_err();
    assert_eq!(err.stage, Stage::Profiling);
    assert!(matches!(err.kind, HuffError::EmptyInput));
    assert_eq!(fs::read(&packed).unwrap(), Vec::<u8>::new());

    decode(&packed, &restored).unwrap();
    assert_eq!(fs::read(&restored).unwrap(), Vec::<u8>::new());

    for p in [plain, packed, restored] {
        let _ = fs::remove_file(p);
    }
}

#[test]
fn missing_source() {
    let err = encode(&scratch("does-not-exist"), &scratch("never-written")).unwrap_err();
    assert!(matches!(err.kind, HuffError::SourceUnavailable { .. }));

    let err = decode(&scratch("does-not-exist"), &scratch("never-written")).unwrap_err();
    assert_eq!(err.stage, Stage::HeaderReading);
    assert!(matches!(err.kind, HuffError::SourceUnavailable { .. }));
}

#[test]
fn unwritable_sink() {
    let plain = scratch("sink-plain");
    fs::write(&plain, b"data").unwrap();
    let sink = scratch("no-such-dir").join("out.huf");
    let err = encode(&plain, &sink).unwrap_err();
    assert!(matches!(err.kind, HuffError::SinkUnavailable { .. }));
    let _ = fs::remove_file(plain);
}

#[test]
fn truncated_body_is_rejected() {
    let data = b"abracadabra".to_vec();
    let mut packed = Vec::new();
    encode_stream_append(&mut Cursor::new(&data), &mut packed, &HuffOpts::default()).unwrap();

    // Dropping the last body byte leaves pad bits that cut through a code word or decodes short
    packed.pop();
    let mut restored = Vec::new();
    match decode_stream(&mut Cursor::new(&packed), &mut restored, &HuffOpts::default()) {
        Ok(_) => assert_ne!(restored, data),
        Err(e) => assert!(matches!(e.kind, HuffError::CorruptStream(_))),
    }
}

#[test]
fn garbage_header_is_rejected() {
    // Nothing but internal node markers, so the tree runs out of bits before any leaf
    let packed = [3, 0, 0, 0, 0, 0, 0, 0];
    let mut restored = Vec::new();
    let err = decode_stream(&mut Cursor::new(&packed[..]), &mut restored, &HuffOpts::default()).unwrap_err();
    assert_eq!(err.stage, Stage::HeaderReading);
    assert!(matches!(err.kind, HuffError::MalformedHeader(_)));
}

#[test]
fn output_onto_input_is_refused() {
    let plain = scratch("self-target");
    fs::write(&plain, b"abracadabra").unwrap();

    let err = encode(&plain, &plain).unwrap_err();
    assert_eq!(err.stage, Stage::Profiling);
    assert!(matches!(err.kind, HuffError::SinkUnavailable { .. }));
    assert_eq!(fs::read(&plain).unwrap(), b"abracadabra".to_vec());

    let err = decode(&plain, &plain).unwrap_err();
    assert_eq!(err.stage, Stage::HeaderReading);
    assert!(matches!(err.kind, HuffError::SinkUnavailable { .. }));
    assert_eq!(fs::read(&plain).unwrap(), b"abracadabra".to_vec());

    let _ = fs::remove_file(plain);
}
