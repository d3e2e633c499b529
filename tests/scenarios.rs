#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use metrickit::{Error, Metric, MetricDef, MetricKind, MetricValue, Registry};

const ALL_KINDS: [MetricKind; 4] = [
    MetricKind::Counter,
    MetricKind::Gauge,
    MetricKind::Histogram,
    MetricKind::Summary,
];

fn register(registry: &Registry, kind: MetricKind) -> Arc<Metric> {
    registry
        .register(MetricDef::new(kind, &format!("{kind}_metric"), "test"))
        .expect("register")
}

fn assert_wrong_kind(result: metrickit::Result<()>, kind: MetricKind) {
    match result {
        Err(Error::WrongKind { kind: got, .. }) => assert_eq!(got, kind),
        other => panic!("{kind}: expected WrongKind, got {other:?}"),
    }
}

#[test]
fn set_gauge_value_only_on_gauges() {
    let registry = Registry::new();
    for kind in ALL_KINDS.into_iter().filter(|k| *k != MetricKind::Gauge) {
        assert_wrong_kind(register(&registry, kind).set_gauge_value(&[], 1.0), kind);
    }
}

#[test]
fn inc_and_add_only_on_counters_and_gauges() {
    let registry = Registry::new();
    for kind in [MetricKind::Histogram, MetricKind::Summary] {
        let metric = register(&registry, kind);
        assert_wrong_kind(metric.inc(&[]), kind);
        assert_wrong_kind(metric.add(&[], 1.0), kind);
    }
}

#[test]
fn dec_only_on_gauges() {
    let registry = Registry::new();
    for kind in ALL_KINDS.into_iter().filter(|k| *k != MetricKind::Gauge) {
        assert_wrong_kind(register(&registry, kind).dec(&[]), kind);
    }
}

#[test]
fn observe_only_on_histograms_and_summaries() {
    let registry = Registry::new();
    for kind in [MetricKind::Counter, MetricKind::Gauge] {
        assert_wrong_kind(register(&registry, kind).observe(&[], 1.0), kind);
    }
}

#[test]
fn queue_depth_gauge_round_trip() {
    let registry = Registry::new();
    let gauge = registry
        .register(MetricDef::gauge("queue_depth", "Items waiting"))
        .unwrap();
    gauge.set_gauge_value(&[], 5.0).unwrap();
    gauge.inc(&[]).unwrap();
    assert_eq!(gauge.value(&[]).unwrap(), Some(MetricValue::Gauge(6.0)));
    gauge.dec(&[]).unwrap();
    assert_eq!(gauge.value(&[]).unwrap(), Some(MetricValue::Gauge(5.0)));
}

#[test]
fn counter_accumulates_and_refuses_dec() {
    let registry = Registry::new();
    let counter = registry
        .register(MetricDef::counter("requests_total", "Requests").labels(&["method"]))
        .unwrap();
    counter.add(&["GET"], 3.0).unwrap();
    counter.add(&["GET"], 2.0).unwrap();
    assert_eq!(
        counter.value(&["GET"]).unwrap(),
        Some(MetricValue::Counter(5.0))
    );

    let err = counter.dec(&["GET"]).unwrap_err();
    assert!(err.is_wrong_kind());
    assert!(err.to_string().contains("requests_total"));
    assert_eq!(
        counter.value(&["GET"]).unwrap(),
        Some(MetricValue::Counter(5.0))
    );

    let err = counter.add(&["GET"], -1.0).unwrap_err();
    assert!(matches!(err, Error::NegativeCounterIncrement { .. }));
    assert_eq!(
        counter.value(&["GET"]).unwrap(),
        Some(MetricValue::Counter(5.0))
    );
}

#[test]
fn histogram_bucket_placement() {
    let registry = Registry::new();
    let histogram = registry
        .register(MetricDef::histogram("latency_seconds", "Latency").buckets(&[0.1, 0.5, 1.0]))
        .unwrap();
    histogram.observe(&[], 0.3).unwrap();
    assert_eq!(
        histogram.value(&[]).unwrap(),
        Some(MetricValue::Histogram {
            buckets: vec![(0.1, 0), (0.5, 1), (1.0, 1)],
            count: 1,
            sum: 0.3,
        })
    );
    assert!(histogram
        .set_gauge_value(&[], 1.0)
        .unwrap_err()
        .is_wrong_kind());
}

#[test]
fn unregistered_metric_reports_not_registered() {
    for kind in ALL_KINDS {
        let metric = Metric::from(MetricDef::new(kind, "orphan", ""));
        assert_eq!(metric.kind(), MetricKind::None);
        for err in [
            metric.set_gauge_value(&[], 1.0).unwrap_err(),
            metric.inc(&[]).unwrap_err(),
            metric.dec(&[]).unwrap_err(),
            metric.add(&[], 1.0).unwrap_err(),
            metric.observe(&[], 1.0).unwrap_err(),
        ] {
            assert_eq!(
                err,
                Error::NotRegistered {
                    name: "orphan".into()
                },
                "{kind}"
            );
        }
    }
}

#[test]
fn label_arity_is_enforced() {
    let registry = Registry::new();
    let counter = registry
        .register(MetricDef::counter("requests_total", "").labels(&["method", "code"]))
        .unwrap();
    let err = counter.inc(&["GET"]).unwrap_err();
    assert_eq!(
        err,
        Error::InconsistentCardinality {
            name: "requests_total".into(),
            expected: 2,
            actual: 1,
        }
    );
    assert!(counter.collect().unwrap().samples.is_empty());
}

#[test]
fn registries_are_isolated() {
    let a = Registry::new();
    let b = Registry::new();
    a.register(MetricDef::counter("shared_name", "")).unwrap();
    b.register(MetricDef::gauge("shared_name", "")).unwrap();
    assert_eq!(a.lookup("shared_name").unwrap().kind(), MetricKind::Counter);
    assert_eq!(b.lookup("shared_name").unwrap().kind(), MetricKind::Gauge);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_recording() -> anyhow::Result<()> {
    let registry = Arc::new(Registry::new());
    registry.register(MetricDef::counter("hits_total", "").labels(&["shard"]))?;
    registry.register(
        MetricDef::histogram("sizes", "")
            .labels(&["shard"])
            .buckets(&[10.0, 100.0]),
    )?;

    let mut tasks = Vec::new();
    for task in 0..8 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let hits = registry.lookup("hits_total").expect("registered");
            let sizes = registry.lookup("sizes").expect("registered");
            let shard = if task % 2 == 0 { "even" } else { "odd" };
            for i in 0..1000 {
                hits.inc(&[shard])?;
                sizes.observe(&[shard], (i % 200) as f64)?;
            }
            Ok::<_, Error>(())
        }));
    }
    for task in tasks {
        task.await??;
    }

    let hits = registry.lookup("hits_total").expect("registered");
    for shard in ["even", "odd"] {
        assert_eq!(hits.value(&[shard])?, Some(MetricValue::Counter(4000.0)));
    }
    let sizes = registry.lookup("sizes").expect("registered");
    let Some(MetricValue::Histogram { buckets, count, .. }) = sizes.value(&["even"])? else {
        panic!("histogram value expected");
    };
    assert_eq!(count, 4000);
    // Per task: 0..=10 is 11 of every 200, 0..=100 is 101 of every 200.
    assert_eq!(buckets, vec![(10.0, 4 * 5 * 11), (100.0, 4 * 5 * 101)]);
    Ok(())
}
