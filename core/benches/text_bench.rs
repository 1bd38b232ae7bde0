use criterion::{criterion_group, criterion_main, Criterion};
use plume_core::text::{clean_field, tokenize};

fn bench_text(c: &mut Criterion) {
    let raw = "The Pacific Ocean's \"waves\" broke over basalt; gulls wheeled, \
               rain-soaked hikers watched from the mountain trail (2024). "
        .repeat(200);
    c.bench_function("clean_field", |b| b.iter(|| clean_field(&raw)));
    let cleaned = clean_field(&raw);
    c.bench_function("tokenize_cleaned", |b| b.iter(|| tokenize(&cleaned)));
}

criterion_group!(benches, bench_text);
criterion_main!(benches);
