//! Benchmarks BPE segmentation throughput over representative words.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Write;
use tempfile::NamedTempFile;
use vecxx::bpe_vocab::BPEVocab;
use vecxx::vocab::Vocab;

fn fixture() -> BPEVocab {
    let mut vocab = NamedTempFile::new().unwrap();
    vocab
        .write_all(b"washtenaw\nar@@\nbor\nten@@\naw\nwash@@\ncounty\nmichigan\n")
        .unwrap();
    let mut codes = NamedTempFile::new().unwrap();
    codes
        .write_all(
            b"a r\nt e\nte n\na w\nw a\nwa s\nwas h\nar bor</w>\nten aw</w>\nwash ten\n",
        )
        .unwrap();
    BPEVocab::new(vocab.path().to_str().unwrap(), codes.path().to_str().unwrap()).unwrap()
}

fn bench_segment(c: &mut Criterion) {
    let bpe = fixture();
    let words = ["arbor", "washtenaw", "county", "michigan", "ann"];

    c.bench_function("segment_word_mixed", |b| {
        b.iter(|| {
            for word in words {
                black_box(bpe.segment(black_box(word)));
            }
        });
    });
}

fn bench_segment_cached(c: &mut Criterion) {
    let bpe = fixture();
    // Warm the cache once; repeated calls measure the cache-hit path.
    bpe.segment("washtenaw");

    c.bench_function("segment_word_cached", |b| {
        b.iter(|| black_box(bpe.segment(black_box("washtenaw"))));
    });
}

criterion_group!(benches, bench_segment, bench_segment_cached);
criterion_main!(benches);
