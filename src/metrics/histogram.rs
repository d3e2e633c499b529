use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use super::{MetricValue, Recordable};
use crate::{
    error::{Error, Result},
    utils::AtomicF64,
};

/// Default upper bounds, tailored to request latencies measured in seconds.
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// `count` buckets of `width`, the lowest with an upper bound of `start`.
pub fn linear_buckets(start: f64, width: f64, count: usize) -> Result<Vec<f64>> {
    if count < 1 {
        return Err(Error::InvalidBuckets(
            "linear_buckets needs a positive count".into(),
        ));
    }
    if width <= 0.0 {
        return Err(Error::InvalidBuckets(format!(
            "linear_buckets needs a positive width, got {width}"
        )));
    }
    Ok((0..count).map(|i| start + width * i as f64).collect())
}

/// `count` buckets where each upper bound is `factor` times the previous one,
/// the lowest being `start`.
pub fn exponential_buckets(start: f64, factor: f64, count: usize) -> Result<Vec<f64>> {
    if count < 1 {
        return Err(Error::InvalidBuckets(
            "exponential_buckets needs a positive count".into(),
        ));
    }
    if start <= 0.0 {
        return Err(Error::InvalidBuckets(format!(
            "exponential_buckets needs a positive start, got {start}"
        )));
    }
    if factor <= 1.0 {
        return Err(Error::InvalidBuckets(format!(
            "exponential_buckets needs a factor greater than 1, got {factor}"
        )));
    }
    let mut bound = start;
    Ok((0..count)
        .map(|_| {
            let current = bound;
            bound *= factor;
            current
        })
        .collect())
}

/// Normalize a set of upper bounds for use by a histogram. An empty set falls
/// back to `defaults`, a trailing `+Inf` is dropped since that bucket always
/// exists, and what remains must be strictly increasing.
pub(crate) fn validate_buckets(buckets: &[f64], defaults: &[f64]) -> Result<Vec<f64>> {
    let mut buckets = if buckets.is_empty() {
        defaults.to_vec()
    } else {
        buckets.to_vec()
    };
    if buckets.last() == Some(&f64::INFINITY) {
        buckets.pop();
    }
    if let Some(nan) = buckets.iter().find(|b| b.is_nan()) {
        return Err(Error::InvalidBuckets(format!("bucket bound {nan} is not a number")));
    }
    for pair in buckets.windows(2) {
        if pair[0] >= pair[1] {
            return Err(Error::InvalidBuckets(format!(
                "bounds must be strictly increasing, {} is followed by {}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(buckets)
}

/// A threadsafe histogram counting observations into fixed buckets.
#[derive(Debug)]
pub struct Histogram {
    upper_bounds: Arc<[f64]>,
    /// One count per upper bound plus a final slot for `+Inf`. Counts are
    /// not cumulative here, [`Histogram::value`] accumulates them.
    counts: Box<[AtomicU64]>,
    sum: AtomicF64,
}

impl Histogram {
    pub fn observe(&self, value: f64) {
        // NaN compares false against every bound and lands in +Inf.
        let index = self
            .upper_bounds
            .iter()
            .position(|bound| value <= *bound)
            .unwrap_or(self.upper_bounds.len());
        self.counts[index].fetch_add(1, Ordering::Relaxed);
        self.sum.add(value);
    }
}

impl Recordable for Histogram {
    type Opts = Arc<[f64]>;

    fn with_opts(upper_bounds: &Arc<[f64]>) -> Self {
        Self {
            upper_bounds: upper_bounds.clone(),
            counts: (0..=upper_bounds.len()).map(|_| AtomicU64::new(0)).collect(),
            sum: AtomicF64::default(),
        }
    }

    fn value(&self) -> MetricValue {
        let mut cumulative = 0u64;
        let buckets = self
            .upper_bounds
            .iter()
            .zip(self.counts.iter())
            .map(|(bound, count)| {
                cumulative += count.load(Ordering::Relaxed);
                (*bound, cumulative)
            })
            .collect();
        let count = cumulative + self.counts[self.upper_bounds.len()].load(Ordering::Relaxed);
        MetricValue::Histogram {
            buckets,
            count,
            sum: self.sum.get(),
        }
    }
}
