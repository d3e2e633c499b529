use criterion::{black_box, criterion_group, criterion_main, Criterion};

use metrickit::{MetricDef, Registry};

pub fn benchmark_register(c: &mut Criterion) {
    c.bench_function("register-counter", |b| {
        let registry = Registry::new();
        let mut names = (0u64..).map(|i| format!("bench_counter_{i}"));
        b.iter(|| {
            registry.register(MetricDef::counter(&names.next().unwrap(), "bench").labels(&["tag"]))
        })
    });
    c.bench_function("lookup-existing", |b| {
        let registry = Registry::new();
        registry
            .register(MetricDef::counter("bench_lookup", "bench"))
            .unwrap();
        b.iter(|| black_box(registry.lookup("bench_lookup")));
    });
}

pub fn benchmark_counter(c: &mut Criterion) {
    let registry = Registry::new();
    let one_tag = registry
        .register(MetricDef::counter("bench_inc_one_tag", "bench").labels(&["tag"]))
        .unwrap();
    let eight_tags = registry
        .register(MetricDef::counter("bench_inc_eight_tags", "bench").labels(&[
            "one", "two", "three", "four", "five", "six", "seven", "eight",
        ]))
        .unwrap();
    c.bench_function("counter-inc-1-tag", |b| {
        b.iter(|| one_tag.inc(&["one"]));
    });
    c.bench_function("counter-inc-1-tag-new", |b| {
        let mut values = (0i64..).map(|i| i.to_string());
        b.iter(|| {
            let value = values.next().unwrap();
            one_tag.inc(&[value.as_str()])
        });
    });
    c.bench_function("counter-inc-8-tags", |b| {
        b.iter(|| eight_tags.inc(&["1", "2", "3", "4", "5", "6", "7", "8"]));
    });
    c.bench_function("counter-wrong-kind", |b| {
        b.iter(|| black_box(one_tag.dec(&["one"])).is_err());
    });
}

pub fn benchmark_histogram(c: &mut Criterion) {
    let registry = Registry::new();
    let histogram = registry
        .register(MetricDef::histogram("bench_histogram", "bench").labels(&["tag"]))
        .unwrap();
    c.bench_function("histogram-observe-1-tag", |b| {
        b.iter(|| histogram.observe(&["one"], 0.2));
    });
}

pub fn benchmark_summary(c: &mut Criterion) {
    let registry = Registry::new();
    let summary = registry
        .register(
            MetricDef::summary("bench_summary", "bench")
                .labels(&["tag"])
                .objectives(&[(0.5, 0.05), (0.9, 0.01), (0.99, 0.001)]),
        )
        .unwrap();
    c.bench_function("summary-observe-1-tag", |b| {
        let mut values = (0u64..).map(|i| (i % 1000) as f64);
        b.iter(|| summary.observe(&["one"], values.next().unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_register,
    benchmark_counter,
    benchmark_histogram,
    benchmark_summary
);
criterion_main!(benches);
