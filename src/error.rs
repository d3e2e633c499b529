//! Error type shared by the registry, the metric handles and the storage
//! vectors underneath them.

use std::fmt;

use thiserror::Error;

use crate::metrics::MetricKind;

/// Shared result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The set of kinds an operation accepts, rendered as "gauge or counter".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedKinds(pub &'static [MetricKind]);

impl fmt::Display for ExpectedKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The metric value was never materialized by a registry.
    #[error("metric '{name}' is not registered")]
    NotRegistered { name: String },
    /// The metric is registered, but its kind does not support the operation.
    #[error("metric '{name}' is a {kind}, expected {expected}")]
    WrongKind {
        name: String,
        kind: MetricKind,
        expected: ExpectedKinds,
    },
    #[error("metric '{name}' expects {expected} label values, got {actual}")]
    InconsistentCardinality {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("counter '{name}' cannot be decreased (tried to add {value})")]
    NegativeCounterIncrement { name: String, value: f64 },
    #[error("metric '{name}' is already registered")]
    DuplicateMetric { name: String },
    #[error("metric '{name}' has no kind and cannot be registered")]
    UnsupportedKind { name: String },
    #[error("invalid metric name '{0}'")]
    InvalidName(String),
    #[error("invalid label name '{label}' on metric '{name}'")]
    InvalidLabelName { name: String, label: String },
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
    #[error("invalid objective: {0}")]
    InvalidObjective(String),
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Error::NotRegistered { .. })
    }

    pub fn is_wrong_kind(&self) -> bool {
        matches!(self, Error::WrongKind { .. })
    }
}
