//! Conditional exponential moving average.
//!
//! The EMA only advances when the caller says so; otherwise it holds its
//! previous value. An unseeded EMA takes the first accepted sample verbatim.

use crate::Period;

/// EMA weight for a period: `2 / (period + 1)`
#[inline]
pub fn ema_alpha(period: Period) -> f64 {
    2.0 / (period.get() as f64 + 1.0)
}

/// One step of the conditional EMA.
///
/// - `should_update == false` returns `previous` unchanged (possibly `None`)
/// - an unseeded `previous` is seeded with `value`
/// - otherwise `previous + (value - previous) * alpha`
#[inline]
pub fn cond_ema(value: f64, should_update: bool, period: Period, previous: Option<f64>) -> Option<f64> {
    if !should_update {
        return previous;
    }
    match previous {
        None => Some(value),
        Some(prev) => Some(prev + (value - prev) * ema_alpha(period)),
    }
}

/// Stateful wrapper around [`cond_ema`] that remembers its last value.
#[derive(Debug, Clone, Copy)]
pub struct CondEma {
    period: Period,
    value: Option<f64>,
}

impl CondEma {
    pub fn new(period: Period) -> Self {
        Self { period, value: None }
    }

    /// Feed a sample; returns the (possibly unchanged) estimate.
    #[inline]
    pub fn update(&mut self, value: f64, should_update: bool) -> Option<f64> {
        self.value = cond_ema(value, should_update, self.period, self.value);
        self.value
    }
}
