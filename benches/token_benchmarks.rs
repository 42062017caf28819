use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use segmentd::auth::{Role, TokenCodec};
use segmentd::inference::Prediction;

fn bench_token_codec(c: &mut Criterion) {
    let codec = TokenCodec::new("bench-secret", chrono::Duration::minutes(30)).unwrap();

    c.bench_function("token_issue", |b| {
        b.iter(|| codec.issue(black_box("doctor"), Role::User))
    });

    let token = codec.issue("doctor", Role::User).unwrap();
    c.bench_function("token_verify", |b| b.iter(|| codec.verify(black_box(&token))));

    let forged = format!("{}x", token);
    c.bench_function("token_verify_bad_signature", |b| {
        b.iter(|| codec.verify(black_box(&forged)))
    });
}

fn bench_prediction_nesting(c: &mut Criterion) {
    let shape = vec![128, 128, 4];
    let len = shape.iter().product::<usize>();
    let prediction = Prediction::new(shape, vec![0.25; len]);

    c.bench_function("prediction_to_nested_128x128x4", |b| {
        b.iter(|| black_box(&prediction).to_nested())
    });
}

criterion_group!(benches, bench_token_codec, bench_prediction_nesting);
criterion_main!(benches);
