use std::{fmt, sync::Arc};

use dashmap::DashMap;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    error::{Error, Result},
    utils::{hash_label_values, BuildNoopHasher},
};

pub(crate) mod counter;
pub(crate) mod gauge;
pub(crate) mod histogram;
pub(crate) mod summary;

pub use counter::Counter;
pub use gauge::Gauge;
pub use histogram::{exponential_buckets, linear_buckets, Histogram, DEFAULT_BUCKETS};
pub use summary::{Objective, Summary};

/// The kinds of metric a [`crate::Metric`] can hold. `None` is the sentinel
/// for a metric that was never registered and is never an operational kind.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    #[default]
    None,
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::None => "none",
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in time reading of one label combination.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Counter(f64),
    Gauge(f64),
    /// `buckets` holds cumulative counts keyed by upper bound, the implicit
    /// `+Inf` bucket is `count`.
    Histogram {
        buckets: Vec<(f64, u64)>,
        count: u64,
        sum: f64,
    },
    Summary {
        quantiles: Vec<(f64, f64)>,
        count: u64,
        sum: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Vec<(String, String)>,
    pub value: MetricValue,
}

/// Everything an exposition endpoint needs to render one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub description: String,
    pub kind: MetricKind,
    pub samples: Vec<Sample>,
}

/// A trait representing a single label combination's storage. Implementations
/// are internally synchronized so a child can be shared freely across threads.
pub trait Recordable: Send + Sync + 'static {
    /// Per-vector configuration handed to every child on creation.
    type Opts: Send + Sync + 'static;

    fn with_opts(opts: &Self::Opts) -> Self;

    fn value(&self) -> MetricValue;
}

struct Child<T> {
    label_values: Box<[String]>,
    metric: Arc<T>,
}

impl<T> Child<T> {
    fn matches(&self, values: &[&str]) -> bool {
        self.label_values.len() == values.len()
            && self
                .label_values
                .iter()
                .zip(values)
                .all(|(have, want)| have == want)
    }
}

/// A family of children of the same kind keyed by label values. Children are
/// created lazily on first use and live until removed.
pub struct MetricVec<T: Recordable> {
    name: String,
    label_names: Vec<String>,
    opts: T::Opts,
    // NOTE: keyed by a pre-computed hash of the label values, collisions are
    // chained in the SmallVec and resolved by comparing the values themselves.
    children: DashMap<u64, SmallVec<[Child<T>; 1]>, BuildNoopHasher>,
}

impl<T: Recordable> MetricVec<T> {
    pub(crate) fn new(name: &str, label_names: &[String], opts: T::Opts) -> Self {
        Self {
            name: name.to_string(),
            label_names: label_names.to_vec(),
            opts,
            children: DashMap::with_hasher(BuildNoopHasher),
        }
    }

    fn check_cardinality(&self, values: &[&str]) -> Result<()> {
        if values.len() != self.label_names.len() {
            return Err(Error::InconsistentCardinality {
                name: self.name.clone(),
                expected: self.label_names.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }

    /// Return the child for these label values, creating it if this is the
    /// first time they've been seen.
    pub fn with_label_values(&self, values: &[&str]) -> Result<Arc<T>> {
        self.check_cardinality(values)?;
        let hash = hash_label_values(values);
        if let Some(chain) = self.children.get(&hash) {
            if let Some(child) = chain.iter().find(|c| c.matches(values)) {
                return Ok(child.metric.clone());
            }
        }
        // Slow path: another writer may have raced us between the read above
        // and taking the shard write lock here, so check again.
        let mut chain = self.children.entry(hash).or_default();
        if let Some(child) = chain.iter().find(|c| c.matches(values)) {
            return Ok(child.metric.clone());
        }
        let metric = Arc::new(T::with_opts(&self.opts));
        chain.push(Child {
            label_values: values.iter().map(|v| v.to_string()).collect(),
            metric: metric.clone(),
        });
        Ok(metric)
    }

    /// Like [`MetricVec::with_label_values`] but never creates a child.
    pub fn get_label_values(&self, values: &[&str]) -> Result<Option<Arc<T>>> {
        self.check_cardinality(values)?;
        let hash = hash_label_values(values);
        Ok(self.children.get(&hash).and_then(|chain| {
            chain
                .iter()
                .find(|c| c.matches(values))
                .map(|c| c.metric.clone())
        }))
    }

    /// Remove the child for these label values. Returns whether one existed.
    pub fn remove_label_values(&self, values: &[&str]) -> Result<bool> {
        self.check_cardinality(values)?;
        let hash = hash_label_values(values);
        let (removed, now_empty) = match self.children.get_mut(&hash) {
            Some(mut chain) => {
                let before = chain.len();
                chain.retain(|c| !c.matches(values));
                (chain.len() != before, chain.is_empty())
            }
            None => (false, false),
        };
        if now_empty {
            self.children.remove_if(&hash, |_, chain| chain.is_empty());
        }
        Ok(removed)
    }

    pub fn reset(&self) {
        self.children.clear();
    }

    /// Number of live label combinations.
    pub fn len(&self) -> usize {
        self.children.iter().map(|chain| chain.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot every child, sorted by label values so output is stable.
    pub fn samples(&self) -> Vec<Sample> {
        let mut samples: Vec<Sample> = self
            .children
            .iter()
            .flat_map(|chain| {
                chain
                    .iter()
                    .map(|child| Sample {
                        labels: self
                            .label_names
                            .iter()
                            .cloned()
                            .zip(child.label_values.iter().cloned())
                            .collect(),
                        value: child.metric.value(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        samples.sort_by(|a, b| a.labels.cmp(&b.labels));
        samples
    }
}

/// The storage behind a registered metric. Exactly one variant is live for
/// the lifetime of the metric, and it is what determines the metric's kind.
pub(crate) enum Storage {
    Counter(MetricVec<Counter>),
    Gauge(MetricVec<Gauge>),
    Histogram(MetricVec<Histogram>),
    Summary(MetricVec<Summary>),
}

impl Storage {
    pub(crate) fn kind(&self) -> MetricKind {
        match self {
            Storage::Counter(_) => MetricKind::Counter,
            Storage::Gauge(_) => MetricKind::Gauge,
            Storage::Histogram(_) => MetricKind::Histogram,
            Storage::Summary(_) => MetricKind::Summary,
        }
    }

    pub(crate) fn value(&self, values: &[&str]) -> Result<Option<MetricValue>> {
        Ok(match self {
            Storage::Counter(vec) => vec.get_label_values(values)?.map(|c| c.value()),
            Storage::Gauge(vec) => vec.get_label_values(values)?.map(|g| g.value()),
            Storage::Histogram(vec) => vec.get_label_values(values)?.map(|h| h.value()),
            Storage::Summary(vec) => vec.get_label_values(values)?.map(|s| s.value()),
        })
    }

    pub(crate) fn samples(&self) -> Vec<Sample> {
        match self {
            Storage::Counter(vec) => vec.samples(),
            Storage::Gauge(vec) => vec.samples(),
            Storage::Histogram(vec) => vec.samples(),
            Storage::Summary(vec) => vec.samples(),
        }
    }

    pub(crate) fn remove_label_values(&self, values: &[&str]) -> Result<bool> {
        match self {
            Storage::Counter(vec) => vec.remove_label_values(values),
            Storage::Gauge(vec) => vec.remove_label_values(values),
            Storage::Histogram(vec) => vec.remove_label_values(values),
            Storage::Summary(vec) => vec.remove_label_values(values),
        }
    }

    pub(crate) fn reset(&self) {
        match self {
            Storage::Counter(vec) => vec.reset(),
            Storage::Gauge(vec) => vec.reset(),
            Storage::Histogram(vec) => vec.reset(),
            Storage::Summary(vec) => vec.reset(),
        }
    }
}
