use std::sync::Arc;

use super::{MetricValue, Recordable};
use crate::{
    error::{Error, Result},
    utils::AtomicF64,
};

/// Reject increments that would move a counter backwards.
pub(crate) fn check_increment(name: &str, value: f64) -> Result<()> {
    if value < 0.0 {
        return Err(Error::NegativeCounterIncrement {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}

/// A monotonically increasing cumulative counter. It only ever goes up, so
/// negative increments are rejected.
#[derive(Debug)]
pub struct Counter {
    name: Arc<str>,
    inner: AtomicF64,
}

impl Counter {
    pub fn add(&self, value: f64) -> Result<()> {
        check_increment(&self.name, value)?;
        self.inner.add(value);
        Ok(())
    }

    pub fn inc(&self) {
        self.inner.add(1.0);
    }

    pub fn get(&self) -> f64 {
        self.inner.get()
    }
}

impl Recordable for Counter {
    /// The owning metric's name, carried so errors can name it.
    type Opts = Arc<str>;

    fn with_opts(name: &Arc<str>) -> Self {
        Self {
            name: name.clone(),
            inner: AtomicF64::default(),
        }
    }

    fn value(&self) -> MetricValue {
        MetricValue::Counter(self.get())
    }
}
