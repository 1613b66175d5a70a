//! Range filter ratchet
//!
//! Holds a single anchor price. The anchor only moves when price clears the
//! band around it by a full range, which is what strips out minor noise.

use tracing::trace;

use super::smoother::CondEma;
use super::window::RingWindow;
use crate::config::{FilterConfig, FilterType};

/// Ratchet result for one bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatchetOutput {
    /// Effective range used this bar (smoothed or raw)
    pub range: f64,
    /// Anchor after this bar's breakout check
    pub anchor: f64,
    /// Emitted filter value (anchor, or mean of recent anchor changes)
    pub filter_value: f64,
    pub high_band: f64,
    pub low_band: f64,
    /// Whether the anchor differs from the previous bar's anchor
    pub changed: bool,
}

/// Apply a breakout policy to the previous anchor.
///
/// A quantized ratchet with a non-positive range cannot step and keeps the
/// previous anchor.
#[inline]
pub fn breakout(filter_type: FilterType, high: f64, low: f64, r: f64, prev: f64) -> f64 {
    match filter_type {
        FilterType::Ratchet => {
            if high - r > prev {
                high - r
            } else if low + r < prev {
                low + r
            } else {
                prev
            }
        }
        FilterType::QuantizedRatchet => {
            if r <= 0.0 {
                return prev;
            }
            if high >= prev + r {
                prev + ((high - prev).abs() / r).floor() * r
            } else if low <= prev - r {
                prev - ((low - prev).abs() / r).floor() * r
            } else {
                prev
            }
        }
    }
}

/// Per-run ratchet state
#[derive(Debug, Clone)]
pub struct RangeRatchet {
    filter_type: FilterType,
    smooth_range: bool,
    smoother: CondEma,
    changes: Option<RingWindow>,
    anchor: Option<f64>,
    change_count: u64,
}

impl RangeRatchet {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            filter_type: config.filter_type,
            smooth_range: config.smooth_range,
            smoother: CondEma::new(config.smooth_period),
            changes: config
                .average_filter_changes
                .then(|| RingWindow::new(config.average_samples)),
            anchor: None,
            change_count: 0,
        }
    }

    /// Advance by one bar given movement extremes and the raw range size.
    pub fn update(&mut self, high: f64, low: f64, range_size: f64) -> RatchetOutput {
        let r = if self.smooth_range {
            self.smoother.update(range_size, true).unwrap_or(range_size)
        } else {
            range_size
        };

        let prev = self.anchor;
        let anchor = match prev {
            None => (high + low) / 2.0,
            Some(prev) => breakout(self.filter_type, high, low, r, prev),
        };
        let changed = prev != Some(anchor);
        if changed {
            self.change_count += 1;
            if let Some(prev) = prev {
                trace!(prev, anchor, range = r, "anchor moved");
            }
        }

        let filter_value = match self.changes.as_mut() {
            Some(window) => {
                if changed {
                    window.push(anchor);
                }
                window.mean().unwrap_or(anchor)
            }
            None => anchor,
        };

        self.anchor = Some(anchor);

        RatchetOutput {
            range: r,
            anchor,
            filter_value,
            high_band: filter_value + r,
            low_band: filter_value - r,
            changed,
        }
    }

    /// Current anchor, `None` before the first bar
    #[inline]
    pub fn anchor(&self) -> Option<f64> {
        self.anchor
    }

    /// Number of anchor changes so far; the initial seed counts as one
    #[inline]
    pub fn change_count(&self) -> u64 {
        self.change_count
    }
}
