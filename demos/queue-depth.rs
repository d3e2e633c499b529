use std::{sync::Arc, time::Duration};

use metrickit::{MetricDef, Registry};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let registry = Arc::new(Registry::new());
    let depth = registry.register(MetricDef::gauge("queue_depth", "Items waiting"))?;
    let processed = registry.register(
        MetricDef::counter("processed_total", "Items processed").labels(&["outcome"]),
    )?;
    let latency = registry.register(
        MetricDef::histogram("process_seconds", "Time spent per item")
            .buckets(&[0.001, 0.01, 0.1]),
    )?;

    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    for round in 0..10u32 {
        ticker.tick().await;
        depth.set_gauge_value(&[], f64::from(round % 4))?;
        processed.inc(&[if round % 3 == 0 { "error" } else { "ok" }])?;
        latency.observe(&[], f64::from(round) / 100.0)?;
    }

    for family in registry.gather() {
        tracing::info!(name = %family.name, kind = %family.kind, samples = ?family.samples);
    }
    Ok(())
}
