//! Metric definitions loaded from YAML (strict parsing).
//!
//! ```yaml
//! namespace: app
//! default_buckets: [0.1, 0.3, 1.2, 5, 10]
//! metrics:
//!   - kind: counter
//!     name: requests_total
//!     help: Total requests
//!     labels: [method]
//! ```

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    metric::MetricDef,
    metrics::{histogram::validate_buckets, MetricKind},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Prefixed onto every metric name as `<namespace>_<name>`.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Buckets for histograms that don't list their own.
    #[serde(default)]
    pub default_buckets: Option<Vec<f64>>,

    #[serde(default)]
    pub metrics: Vec<MetricDef>,
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(buckets) = &self.default_buckets {
            if buckets.is_empty() {
                return Err(Error::Config("default_buckets must not be empty".into()));
            }
            validate_buckets(buckets, &[])?;
        }
        if let Some(def) = self.metrics.iter().find(|def| def.kind == MetricKind::None) {
            return Err(Error::Config(format!(
                "metric '{}' must declare a kind other than none",
                def.name
            )));
        }
        Ok(())
    }

    pub(crate) fn qualified_name(&self, name: &str) -> String {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => format!("{ns}_{name}"),
            _ => name.to_string(),
        }
    }
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<MetricsConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<MetricsConfig> {
    let cfg: MetricsConfig =
        serde_yaml::from_str(s).map_err(|e| Error::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    tracing::info!(
        message = "loaded metrics config",
        namespace = cfg.namespace.as_deref().unwrap_or(""),
        metrics = cfg.metrics.len(),
    );
    Ok(cfg)
}
