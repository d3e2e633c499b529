//! The typed metric handle.
//!
//! A [`Metric`] is built from a [`MetricDef`] and starts out unregistered:
//! its kind reads as [`MetricKind::None`] and every recording operation fails
//! with [`Error::NotRegistered`]. A [`crate::Registry`] materializes the
//! definition into storage of the declared kind, and from then on the kind
//! decides which operations are legal:
//!
//! | operation | counter | gauge | histogram | summary |
//! |---|---|---|---|---|
//! | [`Metric::set_gauge_value`] | | x | | |
//! | [`Metric::inc`] | x | x | | |
//! | [`Metric::dec`] | | x | | |
//! | [`Metric::add`] | x | x | | |
//! | [`Metric::observe`] | | | x | x |
//!
//! Anything else fails with [`Error::WrongKind`].

use std::sync::Arc;

use serde::Deserialize;

use crate::{
    error::{Error, ExpectedKinds, Result},
    metrics::{
        counter::check_increment, histogram::validate_buckets, summary::validate_objectives,
        Counter, Gauge, Histogram, MetricFamily, MetricKind, MetricValue, MetricVec, Objective,
        Storage, Summary, DEFAULT_BUCKETS,
    },
};

const GAUGE: ExpectedKinds = ExpectedKinds(&[MetricKind::Gauge]);
const COUNTER_OR_GAUGE: ExpectedKinds = ExpectedKinds(&[MetricKind::Counter, MetricKind::Gauge]);
const HISTOGRAM_OR_SUMMARY: ExpectedKinds =
    ExpectedKinds(&[MetricKind::Histogram, MetricKind::Summary]);

/// The schema of a metric: what it is called, what it measures and how its
/// storage is shaped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricDef {
    pub kind: MetricKind,
    pub name: String,
    #[serde(default, alias = "help")]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Histogram upper bounds. Empty means [`DEFAULT_BUCKETS`].
    #[serde(default)]
    pub buckets: Vec<f64>,
    /// Summary quantile objectives.
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

impl MetricDef {
    pub fn new(kind: MetricKind, name: &str, description: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            labels: Vec::new(),
            buckets: Vec::new(),
            objectives: Vec::new(),
        }
    }

    pub fn counter(name: &str, description: &str) -> Self {
        Self::new(MetricKind::Counter, name, description)
    }

    pub fn gauge(name: &str, description: &str) -> Self {
        Self::new(MetricKind::Gauge, name, description)
    }

    pub fn histogram(name: &str, description: &str) -> Self {
        Self::new(MetricKind::Histogram, name, description)
    }

    pub fn summary(name: &str, description: &str) -> Self {
        Self::new(MetricKind::Summary, name, description)
    }

    pub fn labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn buckets(mut self, buckets: &[f64]) -> Self {
        self.buckets = buckets.to_vec();
        self
    }

    pub fn objectives(mut self, objectives: &[(f64, f64)]) -> Self {
        self.objectives = objectives
            .iter()
            .map(|(quantile, error)| Objective::new(*quantile, *error))
            .collect();
        self
    }

    fn validate_name(&self) -> Result<()> {
        let mut chars = self.name.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
            }
            _ => false,
        };
        if !valid {
            return Err(Error::InvalidName(self.name.clone()));
        }
        Ok(())
    }

    fn validate_labels(&self) -> Result<()> {
        let reserved = match self.kind {
            MetricKind::Histogram => Some("le"),
            MetricKind::Summary => Some("quantile"),
            _ => None,
        };
        for (i, label) in self.labels.iter().enumerate() {
            let mut chars = label.chars();
            let well_formed = match chars.next() {
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                }
                _ => false,
            };
            if !well_formed
                || label.starts_with("__")
                || Some(label.as_str()) == reserved
                || self.labels[..i].contains(label)
            {
                return Err(Error::InvalidLabelName {
                    name: self.name.clone(),
                    label: label.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A handle to one metric. Cheap to share behind an `Arc`; every recording
/// operation is safe to call from many threads at once.
pub struct Metric {
    name: String,
    description: String,
    label_names: Vec<String>,
    buckets: Vec<f64>,
    objectives: Vec<Objective>,
    declared: MetricKind,
    /// `None` until a registry materializes the metric. The live variant is
    /// the metric's kind.
    storage: Option<Storage>,
}

impl From<MetricDef> for Metric {
    fn from(def: MetricDef) -> Self {
        Self::new(def)
    }
}

impl std::fmt::Debug for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("label_names", &self.label_names)
            .finish()
    }
}

impl Metric {
    /// An unregistered metric. Nothing can be recorded until it has been
    /// materialized through a [`crate::Registry`].
    pub fn new(def: MetricDef) -> Self {
        Self {
            name: def.name,
            description: def.description,
            label_names: def.labels,
            buckets: def.buckets,
            objectives: def.objectives,
            declared: def.kind,
            storage: None,
        }
    }

    /// Validate the definition and build storage of the declared kind.
    /// `default_buckets` stands in for a histogram defined without buckets.
    pub(crate) fn materialize(def: MetricDef, default_buckets: Option<&[f64]>) -> Result<Self> {
        def.validate_name()?;
        def.validate_labels()?;
        let mut metric = Self::new(def);
        let storage = match metric.declared {
            MetricKind::None => {
                return Err(Error::UnsupportedKind {
                    name: metric.name.clone(),
                })
            }
            MetricKind::Counter => Storage::Counter(MetricVec::new(
                &metric.name,
                &metric.label_names,
                Arc::from(metric.name.as_str()),
            )),
            MetricKind::Gauge => {
                Storage::Gauge(MetricVec::new(&metric.name, &metric.label_names, ()))
            }
            MetricKind::Histogram => {
                let buckets = validate_buckets(
                    &metric.buckets,
                    default_buckets.unwrap_or(&DEFAULT_BUCKETS),
                )?;
                let storage = Storage::Histogram(MetricVec::new(
                    &metric.name,
                    &metric.label_names,
                    Arc::from(buckets.as_slice()),
                ));
                metric.buckets = buckets;
                storage
            }
            MetricKind::Summary => {
                let objectives = validate_objectives(&metric.objectives)?;
                let storage = Storage::Summary(MetricVec::new(
                    &metric.name,
                    &metric.label_names,
                    Arc::from(objectives.as_slice()),
                ));
                metric.objectives = objectives;
                storage
            }
        };
        metric.storage = Some(storage);
        Ok(metric)
    }

    /// The operational kind, or [`MetricKind::None`] while unregistered.
    pub fn kind(&self) -> MetricKind {
        self.storage
            .as_ref()
            .map(Storage::kind)
            .unwrap_or(MetricKind::None)
    }

    pub fn is_registered(&self) -> bool {
        self.storage.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Histogram upper bounds. Once registered these are the bounds actually
    /// in use, defaults included.
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    fn storage(&self) -> Result<&Storage> {
        self.storage.as_ref().ok_or_else(|| Error::NotRegistered {
            name: self.name.clone(),
        })
    }

    fn wrong_kind(&self, storage: &Storage, expected: ExpectedKinds) -> Error {
        Error::WrongKind {
            name: self.name.clone(),
            kind: storage.kind(),
            expected,
        }
    }

    /// Set a gauge to `value`.
    pub fn set_gauge_value(&self, label_values: &[&str], value: f64) -> Result<()> {
        match self.storage()? {
            Storage::Gauge(vec) => vec.with_label_values(label_values)?.set(value),
            other => return Err(self.wrong_kind(other, GAUGE)),
        }
        Ok(())
    }

    /// Increment a counter or gauge by 1.
    pub fn inc(&self, label_values: &[&str]) -> Result<()> {
        match self.storage()? {
            Storage::Counter(vec) => vec.with_label_values(label_values)?.inc(),
            Storage::Gauge(vec) => vec.with_label_values(label_values)?.inc(),
            other => return Err(self.wrong_kind(other, COUNTER_OR_GAUGE)),
        }
        Ok(())
    }

    /// Decrement a gauge by 1.
    pub fn dec(&self, label_values: &[&str]) -> Result<()> {
        match self.storage()? {
            Storage::Gauge(vec) => vec.with_label_values(label_values)?.dec(),
            other => return Err(self.wrong_kind(other, GAUGE)),
        }
        Ok(())
    }

    /// Add `value` to a counter or gauge. Counters refuse negative values.
    pub fn add(&self, label_values: &[&str], value: f64) -> Result<()> {
        match self.storage()? {
            Storage::Counter(vec) => {
                check_increment(&self.name, value)?;
                vec.with_label_values(label_values)?.add(value)?
            }
            Storage::Gauge(vec) => vec.with_label_values(label_values)?.add(value),
            other => return Err(self.wrong_kind(other, COUNTER_OR_GAUGE)),
        }
        Ok(())
    }

    /// Record one observation into a histogram or summary.
    pub fn observe(&self, label_values: &[&str], value: f64) -> Result<()> {
        match self.storage()? {
            Storage::Histogram(vec) => vec.with_label_values(label_values)?.observe(value),
            Storage::Summary(vec) => vec.with_label_values(label_values)?.observe(value),
            other => return Err(self.wrong_kind(other, HISTOGRAM_OR_SUMMARY)),
        }
        Ok(())
    }

    /// Current value for one label combination, `None` if nothing has been
    /// recorded under it yet.
    pub fn value(&self, label_values: &[&str]) -> Result<Option<MetricValue>> {
        self.storage()?.value(label_values)
    }

    /// Drop one label combination. Returns whether it existed.
    pub fn remove_label_values(&self, label_values: &[&str]) -> Result<bool> {
        self.storage()?.remove_label_values(label_values)
    }

    /// Drop every label combination.
    pub fn reset(&self) -> Result<()> {
        self.storage()?.reset();
        Ok(())
    }

    /// Snapshot all label combinations, or `None` while unregistered.
    pub fn collect(&self) -> Option<MetricFamily> {
        let storage = self.storage.as_ref()?;
        Some(MetricFamily {
            name: self.name.clone(),
            description: self.description.clone(),
            kind: storage.kind(),
            samples: storage.samples(),
        })
    }
}
