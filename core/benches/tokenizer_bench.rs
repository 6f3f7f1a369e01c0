use criterion::{criterion_group, criterion_main, Criterion};
use grawler_core::tokenizer::word_frequencies;

fn bench_word_frequencies(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(500);
    c.bench_function("word_frequencies_page", |b| b.iter(|| word_frequencies(&text)));
}

criterion_group!(benches, bench_word_frequencies);
criterion_main!(benches);
