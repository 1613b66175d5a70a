//! # range-filter
//!
//! Adaptive range filter for price bars: a noise-suppressing trend line with
//! dynamic high/low bands and a per-bar trend direction.
//!
//! ## Quick Start
//!
//! ```rust
//! use range_filter::prelude::*;
//!
//! let bars = vec![
//!     PriceBar::new(100.0, 101.0, 99.0, 100.0),
//!     PriceBar::new(108.5, 110.0, 108.0, 109.0),
//! ];
//!
//! let filter = RangeFilterBuilder::new()
//!     .movement_source(MovementSource::Wicks)
//!     .range_scale(RangeScale::Absolute)
//!     .range_qty(1.0)
//!     .smooth_range(false)
//!     .build()
//!     .unwrap();
//!
//! let results = filter.run(&bars).unwrap();
//! assert_eq!(results[0].filter_value, 100.0);
//! assert_eq!(results[1].filter_value, 109.0);
//! assert!(results[1].is_upward);
//! ```

pub mod config;
pub mod filter;
pub mod params;

pub mod prelude {
    pub use crate::{
        // Configuration
        config::{FilterConfig, FilterType, MovementSource, RangeScale},
        // Parameters
        params::{expand_grid, with_params, ParamMeta, ParamType},
        // Parallel
        run_parallel,
        sweep_parallel,
        // Output
        BarResult,
        Direction,
        // Errors
        ErrorKind,
        FilterError,
        // Engine
        FilterIterator,
        FilterState,
        // Core traits
        OHLCExt,
        Period,
        PriceBar,
        RangeFilter,
        RangeFilterBuilder,
        Result,
        RunError,
        RunResult,
        OHLC,
    };
}

use tracing::debug;

use crate::config::{FilterConfig, FilterType, MovementSource, RangeScale};
use crate::filter::{RangeEstimator, RangeRatchet, TrendClassifier};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors that can occur while configuring or running the filter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown {field}: {value:?}")]
    UnknownVariant { field: &'static str, value: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Empty input: no bars to filter")]
    EmptyInput,

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },
}

/// Broad class of a [`FilterError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Detected before any bar is processed
    Configuration,
    /// Detected while processing bars
    Input,
}

impl FilterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FilterError::InvalidValue(_)
            | FilterError::OutOfRange { .. }
            | FilterError::UnknownVariant { .. }
            | FilterError::InvalidConfig(_) => ErrorKind::Configuration,
            FilterError::EmptyInput | FilterError::InvalidBar { .. } => ErrorKind::Input,
        }
    }

    fn at_index(self, index: usize) -> Self {
        match self {
            FilterError::InvalidBar { reason, .. } => FilterError::InvalidBar { index, reason },
            other => other,
        }
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(FilterError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// Core price bar trait
pub trait OHLC {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
}

impl<T: OHLC + ?Sized> OHLC for &T {
    fn open(&self) -> f64 {
        (**self).open()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }

    fn low(&self) -> f64 {
        (**self).low()
    }

    fn close(&self) -> f64 {
        (**self).close()
    }
}

/// Extension trait with computed properties for price bars
pub trait OHLCExt: OHLC {
    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    /// (high + low) / 2
    #[inline]
    fn midpoint(&self) -> f64 {
        (self.high() + self.low()) / 2.0
    }

    /// Wilder true range. Without a previous close this is the bar's own range.
    #[inline]
    fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            None => self.range(),
            Some(pc) => self
                .range()
                .max((self.high() - pc).abs())
                .max((self.low() - pc).abs()),
        }
    }

    /// Reject bars carrying NaN or infinite prices
    fn validate(&self) -> Result<()> {
        let fields = [self.open(), self.high(), self.low(), self.close()];
        if fields.iter().any(|v| v.is_nan()) {
            return Err(FilterError::InvalidBar {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if fields.iter().any(|v| v.is_infinite()) {
            return Err(FilterError::InvalidBar {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        Ok(())
    }
}

impl<T: OHLC + ?Sized> OHLCExt for T {}

/// Plain price bar
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PriceBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }
}

impl OHLC for PriceBar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

// ============================================================
// OUTPUT
// ============================================================

/// Trend direction of the filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    #[default]
    Neutral,
    Bearish,
}

impl Direction {
    /// 1, 0 or -1
    #[inline]
    pub fn signum(self) -> i8 {
        match self {
            Direction::Bullish => 1,
            Direction::Neutral => 0,
            Direction::Bearish => -1,
        }
    }

    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Filter output for one bar, index-aligned with the input
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BarResult {
    /// Raw range size from the scale model
    pub range_size: f64,
    /// Range actually applied this bar (smoothed when `smooth_range` is on)
    pub effective_range: f64,
    pub filter_value: f64,
    pub high_band: f64,
    pub low_band: f64,
    pub direction: Direction,
    pub is_upward: bool,
    pub is_downward: bool,
}

// ============================================================
// FILTER STATE - one bar at a time
// ============================================================

/// Mutable state of a single run.
///
/// A bar that fails validation is rejected before any state is touched, so
/// the state stays usable after an error.
#[derive(Debug, Clone)]
pub struct FilterState {
    movement_source: MovementSource,
    estimator: RangeEstimator,
    ratchet: RangeRatchet,
    trend: TrendClassifier,
    processed: usize,
}

impl FilterState {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: &FilterConfig) -> Self {
        Self {
            movement_source: config.movement_source,
            estimator: RangeEstimator::new(config),
            ratchet: RangeRatchet::new(config),
            trend: TrendClassifier::new(),
            processed: 0,
        }
    }

    /// Feed the next bar
    pub fn update<T: OHLC>(&mut self, bar: &T) -> Result<BarResult> {
        bar.validate().map_err(|e| e.at_index(self.processed))?;

        let (high, low) = self.movement_source.extremes(bar);
        let x = (high + low) / 2.0;

        let estimate = self.estimator.update(bar, x);
        let out = self.ratchet.update(high, low, estimate.range_size);
        let direction = self.trend.classify(out.filter_value);

        self.processed += 1;

        Ok(BarResult {
            range_size: estimate.range_size,
            effective_range: out.range,
            filter_value: out.filter_value,
            high_band: out.high_band,
            low_band: out.low_band,
            direction,
            is_upward: direction.is_bullish(),
            is_downward: direction.is_bearish(),
        })
    }

    /// Bars accepted so far
    #[inline]
    pub fn processed(&self) -> usize {
        self.processed
    }

    #[inline]
    pub fn anchor(&self) -> Option<f64> {
        self.ratchet.anchor()
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.trend.direction()
    }

    /// Anchor changes so far, the first-bar seed included
    #[inline]
    pub fn change_count(&self) -> u64 {
        self.ratchet.change_count()
    }
}

// ============================================================
// RANGE FILTER
// ============================================================

/// Validated filter, reusable across any number of independent runs
#[derive(Debug, Clone)]
pub struct RangeFilter {
    config: FilterConfig,
}

impl RangeFilter {
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Fresh state for an incremental run
    pub fn state(&self) -> FilterState {
        FilterState::from_validated(&self.config)
    }

    /// Run over all bars. Aborts on the first invalid bar.
    pub fn run<T: OHLC>(&self, bars: &[T]) -> Result<Vec<BarResult>> {
        if bars.is_empty() {
            return Err(FilterError::EmptyInput);
        }

        debug!(
            bars = bars.len(),
            filter_type = %self.config.filter_type,
            range_scale = %self.config.range_scale,
            "range filter run started"
        );

        let mut state = self.state();
        let mut results = Vec::with_capacity(bars.len());
        for bar in bars {
            match state.update(bar) {
                Ok(r) => results.push(r),
                Err(error) => {
                    debug!(%error, processed = state.processed(), "range filter run aborted");
                    return Err(error);
                }
            }
        }

        debug!(
            bars = results.len(),
            anchor_changes = state.change_count(),
            "range filter run finished"
        );
        Ok(results)
    }

    /// Lazily filter bars. An empty slice yields nothing.
    pub fn iter<'a, T: OHLC>(&self, bars: &'a [T]) -> FilterIterator<'a, T> {
        FilterIterator::new(self.state(), bars)
    }
}

// ============================================================
// FILTER ITERATOR
// ============================================================

/// Iterator over per-bar results; stops after the first error
pub struct FilterIterator<'a, T: OHLC> {
    state: FilterState,
    bars: &'a [T],
    current: usize,
    failed: bool,
}

impl<'a, T: OHLC> FilterIterator<'a, T> {
    fn new(state: FilterState, bars: &'a [T]) -> Self {
        Self {
            state,
            bars,
            current: 0,
            failed: false,
        }
    }

    /// State after the bars yielded so far
    pub fn state(&self) -> &FilterState {
        &self.state
    }
}

impl<'a, T: OHLC> Iterator for FilterIterator<'a, T> {
    type Item = Result<BarResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let bar = self.bars.get(self.current)?;
        self.current += 1;

        let result = self.state.update(bar);
        self.failed = result.is_err();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.bars.len().saturating_sub(self.current);
        (remaining.min(1), Some(remaining))
    }
}

impl<'a, T: OHLC> std::iter::FusedIterator for FilterIterator<'a, T> {}

// ============================================================
// BUILDER
// ============================================================

/// Builder for [`RangeFilter`]; starts from [`FilterConfig::default`]
#[derive(Debug, Clone, Default)]
pub struct RangeFilterBuilder {
    config: FilterConfig,
    range_period: Option<usize>,
    smooth_period: Option<usize>,
    average_samples: Option<usize>,
}

impl RangeFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: FilterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn filter_type(mut self, filter_type: FilterType) -> Self {
        self.config.filter_type = filter_type;
        self
    }

    pub fn movement_source(mut self, source: MovementSource) -> Self {
        self.config.movement_source = source;
        self
    }

    pub fn range_qty(mut self, qty: f64) -> Self {
        self.config.range_qty = qty;
        self
    }

    pub fn range_scale(mut self, scale: RangeScale) -> Self {
        self.config.range_scale = scale;
        self
    }

    pub fn range_period(mut self, period: usize) -> Self {
        self.range_period = Some(period);
        self
    }

    /// Enable/disable range smoothing
    pub fn smooth_range(mut self, enable: bool) -> Self {
        self.config.smooth_range = enable;
        self
    }

    pub fn smooth_period(mut self, period: usize) -> Self {
        self.smooth_period = Some(period);
        self
    }

    /// Enable/disable averaging over anchor changes
    pub fn average_filter_changes(mut self, enable: bool) -> Self {
        self.config.average_filter_changes = enable;
        self
    }

    pub fn average_samples(mut self, samples: usize) -> Self {
        self.average_samples = Some(samples);
        self
    }

    pub fn point_value(mut self, value: f64) -> Self {
        self.config.point_value = value;
        self
    }

    pub fn tick_size(mut self, size: f64) -> Self {
        self.config.tick_size = size;
        self
    }

    /// Build the filter
    pub fn build(self) -> Result<RangeFilter> {
        let mut config = self.config;
        if let Some(n) = self.range_period {
            config.range_period = period_field("range_period", n)?;
        }
        if let Some(n) = self.smooth_period {
            config.smooth_period = period_field("smooth_period", n)?;
        }
        if let Some(n) = self.average_samples {
            config.average_samples = period_field("average_samples", n)?;
        }
        RangeFilter::new(config)
    }
}

fn period_field(name: &str, value: usize) -> Result<Period> {
    Period::new(value).map_err(|_| FilterError::InvalidConfig(format!("{name} must be > 0, got {value}")))
}

// ============================================================
// PARALLEL RUNS
// ============================================================

use rayon::prelude::*;

/// Result of filtering a single instrument
#[derive(Debug)]
pub struct RunResult {
    pub symbol: String,
    pub results: Vec<BarResult>,
}

/// Error from filtering a single instrument
#[derive(Debug)]
pub struct RunError {
    pub symbol: String,
    pub error: FilterError,
}

/// Filter many instruments with one configuration in parallel
pub fn run_parallel<'a, T, I>(filter: &RangeFilter, instruments: I) -> (Vec<RunResult>, Vec<RunError>)
where
    T: OHLC + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            filter
                .run(bars)
                .map(|results| RunResult {
                    symbol: symbol.to_string(),
                    results,
                })
                .map_err(|error| RunError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

/// Filter one series under many configurations in parallel.
///
/// Output order matches `configs`.
pub fn sweep_parallel<T>(bars: &[T], configs: &[FilterConfig]) -> Vec<Result<Vec<BarResult>>>
where
    T: OHLC + Sync,
{
    configs
        .par_iter()
        .map(|config| RangeFilter::new(config.clone())?.run(bars))
        .collect()
}

// ============================================================
// TESTS
// ============================================================
