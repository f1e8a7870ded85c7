use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fuzzgate::config::{GateOptions, MemorySource};
use fuzzgate::domain::{FlagKind, FlagValue};
use fuzzgate::rules::DecisionEngine;

fn populated_engine() -> DecisionEngine<MemorySource> {
    let source = MemorySource::new();
    source.set("FUZZER_ENABLED", "1");

    let mut engine = DecisionEngine::new(GateOptions::default(), source);
    for i in 0..50 {
        let key = format!("KEY_{i}");
        engine
            .registry_mut()
            .register(&key, FlagKind::Boolean, FlagValue::Bool(true))
            .unwrap();
        engine
            .registry_mut()
            .register(&key, FlagKind::SkipSubstring, FlagValue::Text("DOG".to_string()))
            .unwrap();
        engine
            .registry_mut()
            .register(&key, FlagKind::SkipFirstN, FlagValue::Count(1000))
            .unwrap();
    }
    engine
}

fn bench_decide_unscoped(c: &mut Criterion) {
    let engine = populated_engine();
    let payload = b"The quick brown fox jumps over the lazy dog".as_slice();

    c.bench_function("decide_unscoped", |b| {
        b.iter(|| engine.decide(None, black_box(payload)))
    });
}

fn bench_decide_scoped(c: &mut Criterion) {
    let engine = populated_engine();
    let payload = b"The quick brown fox jumps over the lazy dog".as_slice();

    c.bench_function("decide_scoped_three_flags", |b| {
        b.iter(|| engine.decide(Some("KEY_25"), black_box(payload)))
    });
}

fn bench_decide_substring_miss(c: &mut Criterion) {
    let source = MemorySource::new();
    source.set("FUZZER_ENABLED", "1");
    let mut engine = DecisionEngine::new(GateOptions::default(), source);
    engine
        .registry_mut()
        .register("BLOB", FlagKind::SkipSubstring, FlagValue::Text("NEEDLE".to_string()))
        .unwrap();

    let payload = vec![0x41u8; 4096];

    c.bench_function("decide_substring_miss_4k", |b| {
        b.iter(|| engine.decide(Some("BLOB"), black_box(&payload)))
    });
}

criterion_group!(
    benches,
    bench_decide_unscoped,
    bench_decide_scoped,
    bench_decide_substring_miss
);
criterion_main!(benches);
