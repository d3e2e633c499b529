use std::sync::Arc;

use parking_lot::Mutex;
use quantiles::ckms::CKMS;
use serde::Deserialize;

use super::{MetricValue, Recordable};
use crate::error::{Error, Result};

/// A quantile to track and the maximum rank error tolerated when estimating
/// it, e.g. `{ quantile: 0.99, error: 0.001 }`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Objective {
    pub quantile: f64,
    pub error: f64,
}

impl Objective {
    pub fn new(quantile: f64, error: f64) -> Self {
        Self { quantile, error }
    }
}

/// Check objectives and return them sorted by quantile.
pub(crate) fn validate_objectives(objectives: &[Objective]) -> Result<Vec<Objective>> {
    let mut objectives = objectives.to_vec();
    for o in &objectives {
        if !(0.0..=1.0).contains(&o.quantile) {
            return Err(Error::InvalidObjective(format!(
                "quantile {} is outside [0, 1]",
                o.quantile
            )));
        }
        if !(o.error > 0.0 && o.error < 1.0) {
            return Err(Error::InvalidObjective(format!(
                "error {} for quantile {} is outside (0, 1)",
                o.error, o.quantile
            )));
        }
    }
    objectives.sort_by(|a, b| a.quantile.total_cmp(&b.quantile));
    if let Some(pair) = objectives
        .windows(2)
        .find(|pair| pair[0].quantile == pair[1].quantile)
    {
        return Err(Error::InvalidObjective(format!(
            "quantile {} is listed twice",
            pair[0].quantile
        )));
    }
    Ok(objectives)
}

#[derive(Debug)]
struct SummaryInner {
    /// `None` when no objectives were asked for.
    stream: Option<CKMS<f64>>,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

/// Tracks count, sum and streaming quantile estimates of observations.
///
/// Quantiles cover every observation since the summary was created; there is
/// no max-age window and old observations never decay out of the estimate.
/// The 0 and 1 quantiles are answered exactly from the observed min and max.
#[derive(Debug)]
pub struct Summary {
    objectives: Arc<[Objective]>,
    inner: Mutex<SummaryInner>,
}

impl Summary {
    pub fn observe(&self, value: f64) {
        let mut inner = self.inner.lock();
        inner.count += 1;
        inner.sum += value;
        inner.min = inner.min.min(value);
        inner.max = inner.max.max(value);
        if let Some(stream) = inner.stream.as_mut() {
            stream.insert(value);
        }
    }
}

impl SummaryInner {
    fn quantile(&self, q: f64) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        if q == 0.0 {
            return self.min;
        }
        if q == 1.0 {
            return self.max;
        }
        self.stream
            .as_ref()
            .and_then(|stream| stream.query(q))
            .map_or(f64::NAN, |(_, value)| value)
    }
}

impl Recordable for Summary {
    /// Validated objectives, sorted by quantile.
    type Opts = Arc<[Objective]>;

    fn with_opts(objectives: &Arc<[Objective]>) -> Self {
        // One stream answers every objective, so it runs at the tightest error.
        let stream = objectives
            .iter()
            .map(|o| o.error)
            .min_by(f64::total_cmp)
            .map(CKMS::new);
        Self {
            objectives: objectives.clone(),
            inner: Mutex::new(SummaryInner {
                stream,
                count: 0,
                sum: 0.0,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            }),
        }
    }

    fn value(&self) -> MetricValue {
        let inner = self.inner.lock();
        let quantiles = self
            .objectives
            .iter()
            .map(|o| (o.quantile, inner.quantile(o.quantile)))
            .collect();
        MetricValue::Summary {
            quantiles,
            count: inner.count,
            sum: inner.sum,
        }
    }
}
