use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use huffzip::{decode_stream, encode_stream, HuffOpts};

fn encoded(data: &[u8]) -> Vec<u8> {
    let mut sink = Cursor::new(Vec::new());
    encode_stream(&mut Cursor::new(data), &mut sink, &HuffOpts::default()).unwrap();
    sink.into_inner()
}

fn criterion_benchmark(c: &mut Criterion) {
    let random_input = (0..65536).map(|_| rand::random::<u8>()).collect::<Vec<u8>>();
    let text_input = b"The quick brown fox jumps over the lazy dog. ".repeat(1500);

    for (name, input) in [("random", &random_input), ("text", &text_input)] {
        c.bench_function(&format!("huffman encode {}", name), |b| {
            b.iter(|| {
                let mut sink = Cursor::new(Vec::with_capacity(input.len()));
                encode_stream(&mut Cursor::new(black_box(&input[..])), &mut sink, &HuffOpts::default())
                    .unwrap()
            })
        });

        let packed = encoded(input);
        c.bench_function(&format!("huffman decode {}", name), |b| {
            b.iter(|| {
                let mut out = Vec::with_capacity(input.len());
                decode_stream(&mut Cursor::new(black_box(&packed[..])), &mut out, &HuffOpts::default())
                    .unwrap()
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
