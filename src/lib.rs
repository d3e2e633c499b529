//! Typed metric handles over label-keyed counter, gauge, histogram and summary
//! storage.
//!
//! ```
//! use metrickit::{MetricDef, Registry};
//!
//! let registry = Registry::new();
//! let requests = registry
//!     .register(MetricDef::counter("requests_total", "Total requests").labels(&["method"]))
//!     .unwrap();
//! requests.inc(&["GET"]).unwrap();
//!
//! // Counters can't go down; the mistake is reported rather than ignored.
//! assert!(requests.dec(&["GET"]).unwrap_err().is_wrong_kind());
//! ```
//!
//! A [`Metric`] that never went through a [`Registry`] refuses everything
//! with [`Error::NotRegistered`], so a forgotten registration shows up as an
//! error at the call site instead of as a silently missing series.

pub mod config;
pub mod error;
pub mod metric;
pub mod metrics;
pub mod registry;
pub(crate) mod utils;

pub use config::MetricsConfig;
pub use error::{Error, Result};
pub use metric::{Metric, MetricDef};
pub use metrics::{
    exponential_buckets, linear_buckets, MetricFamily, MetricKind, MetricValue, Objective, Sample,
    DEFAULT_BUCKETS,
};
pub use registry::Registry;
