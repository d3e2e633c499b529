use super::{MetricValue, Recordable};
use crate::utils::AtomicF64;

#[derive(Debug, Default)]
pub struct Gauge {
    inner: AtomicF64,
}

impl Gauge {
    pub fn add(&self, value: f64) {
        self.inner.add(value);
    }

    pub fn sub(&self, value: f64) {
        self.add(-value);
    }

    pub fn inc(&self) {
        self.add(1.0);
    }

    pub fn dec(&self) {
        self.add(-1.0)
    }

    pub fn set(&self, value: f64) {
        self.inner.set(value)
    }

    pub fn get(&self) -> f64 {
        self.inner.get()
    }
}

impl Recordable for Gauge {
    type Opts = ();

    fn with_opts(_opts: &()) -> Self {
        Self::default()
    }

    fn value(&self) -> MetricValue {
        MetricValue::Gauge(self.get())
    }
}
