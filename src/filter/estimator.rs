//! Range size estimation
//!
//! Every bar updates all running statistics (ATR, average change, rolling
//! standard deviation) regardless of the selected scale, so switching scale
//! never changes warm-up behaviour. The selected [`RangeScale`] then picks
//! which value becomes the range size.

use super::smoother::CondEma;
use super::window::RingWindow;
use crate::config::{FilterConfig, RangeScale, PIP_SIZE};
use crate::{OHLCExt, OHLC};

/// Everything the estimator computed for one bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeEstimate {
    /// Range size under the configured scale
    pub range_size: f64,
    pub true_range: f64,
    pub atr: f64,
    /// Absolute change of the movement midpoint vs. the previous bar's high/low midpoint
    pub abs_change: f64,
    pub avg_change: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Copy)]
struct PrevBar {
    close: f64,
    midpoint: f64,
}

/// Per-run estimator state
#[derive(Debug, Clone)]
pub struct RangeEstimator {
    scale: RangeScale,
    qty: f64,
    point_value: f64,
    tick_size: f64,
    atr: CondEma,
    avg_change: CondEma,
    window: RingWindow,
    prev: Option<PrevBar>,
}

impl RangeEstimator {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            scale: config.range_scale,
            qty: config.range_qty,
            point_value: config.point_value,
            tick_size: config.tick_size,
            atr: CondEma::new(config.range_period),
            avg_change: CondEma::new(config.range_period),
            window: RingWindow::new(config.range_period),
            prev: None,
        }
    }

    /// Advance by one bar. `x` is the movement midpoint of `bar`.
    pub fn update<T: OHLC>(&mut self, bar: &T, x: f64) -> RangeEstimate {
        let true_range = bar.true_range(self.prev.map(|p| p.close));
        let atr = self.atr.update(true_range, true).unwrap_or(0.0);

        let abs_change = match self.prev {
            None => 0.0,
            Some(prev) => (x - prev.midpoint).abs(),
        };
        let avg_change = self.avg_change.update(abs_change, true).unwrap_or(0.0);

        self.window.push(x);
        let std_dev = self.window.std_dev();

        let qty = self.qty;
        let range_size = match self.scale {
            RangeScale::Points => qty * self.point_value,
            RangeScale::Pips => qty * PIP_SIZE,
            RangeScale::Ticks => qty * self.tick_size,
            RangeScale::PercentOfPrice => bar.close() * qty / 100.0,
            RangeScale::Atr => qty * atr,
            RangeScale::AverageChange => qty * avg_change,
            RangeScale::StdDev => qty * std_dev,
            RangeScale::Absolute => qty,
        };

        self.prev = Some(PrevBar {
            close: bar.close(),
            midpoint: bar.midpoint(),
        });

        RangeEstimate {
            range_size,
            true_range,
            atr,
            abs_change,
            avg_change,
            std_dev,
        }
    }
}
