use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use parking_lot::RwLock;

use crate::{
    config::MetricsConfig,
    error::{Error, Result},
    metric::{Metric, MetricDef},
    metrics::MetricFamily,
};

/// Owns every registered [`Metric`] and guarantees at most one per name.
///
/// There is no process-wide instance. Build one at startup and hand it (or an
/// `Arc` of it) to whatever needs to register, look up or gather metrics.
#[derive(Default)]
pub struct Registry {
    metrics: RwLock<HashMap<String, Arc<Metric>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            metrics: Default::default(),
        }
    }

    /// Register is a fairly heavy weight operation: the definition is
    /// validated and its storage built while holding the write lock. We
    /// expect callers to keep the returned handle around rather than looking
    /// metrics up on every recording, which keeps the hot path coordination
    /// free.
    pub fn register(&self, def: MetricDef) -> Result<Arc<Metric>> {
        self.register_with_defaults(def, None)
    }

    fn register_with_defaults(
        &self,
        def: MetricDef,
        default_buckets: Option<&[f64]>,
    ) -> Result<Arc<Metric>> {
        let mut metrics = self.metrics.write();
        match metrics.entry(def.name.clone()) {
            Entry::Occupied(existing) => {
                tracing::warn!(
                    message = "duplicate metric registration",
                    name = %existing.key(),
                    existing = %existing.get().kind(),
                    attempted = %def.kind,
                );
                Err(Error::DuplicateMetric {
                    name: existing.key().clone(),
                })
            }
            Entry::Vacant(vacant) => {
                let metric = Arc::new(Metric::materialize(def, default_buckets)?);
                tracing::debug!(
                    message = "registered metric",
                    name = metric.name(),
                    kind = %metric.kind(),
                    labels = ?metric.label_names(),
                );
                vacant.insert(metric.clone());
                Ok(metric)
            }
        }
    }

    /// Register every metric a config defines, prefixing names with the
    /// config's namespace. The config is validated first, so a config
    /// built in code gets the same checks as one loaded from YAML. Stops at
    /// the first failure; metrics registered before it stay registered.
    pub fn register_config(&self, config: &MetricsConfig) -> Result<Vec<Arc<Metric>>> {
        config.validate()?;
        config
            .metrics
            .iter()
            .map(|def| {
                let mut def = def.clone();
                def.name = config.qualified_name(&def.name);
                self.register_with_defaults(def, config.default_buckets.as_deref())
            })
            .collect()
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Metric>> {
        self.metrics.read().get(name).cloned()
    }

    /// Forget a metric. Handles already given out keep working but no longer
    /// show up in [`Registry::gather`], and the name becomes free again.
    pub fn unregister(&self, name: &str) -> Option<Arc<Metric>> {
        let removed = self.metrics.write().remove(name);
        if removed.is_some() {
            tracing::debug!(message = "unregistered metric", name = name);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }

    /// Snapshot every registered metric, sorted by name.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let metrics: Vec<Arc<Metric>> = self.metrics.read().values().cloned().collect();
        let mut families: Vec<MetricFamily> =
            metrics.iter().filter_map(|metric| metric.collect()).collect();
        families.sort_by(|a, b| a.name.cmp(&b.name));
        families
    }
}
