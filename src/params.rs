//! Parameter metadata for the range filter
//!
//! This module describes the numeric configuration fields, enabling:
//! - Grid search over filter settings
//! - Parameter documentation
//! - Applying `name -> value` overrides on top of a base configuration
//!
//! # Example
//!
//! ```rust
//! use range_filter::params::{expand_grid, param_meta};
//! use range_filter::prelude::*;
//!
//! for param in param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let configs = expand_grid(&FilterConfig::default(), &["range_qty"]).unwrap();
//! assert!(!configs.is_empty());
//! ```

use std::collections::HashMap;

use crate::config::FilterConfig;
use crate::{FilterError, Period, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Positive real value
  Real,
  /// Period value (positive integer)
  Period,
}

/// Metadata for a single filter parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name, identical to the `FilterConfig` field
  pub name: &'static str,
  /// Parameter type (Real or Period)
  pub param_type: ParamType,
  /// Default value
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  /// Create a new ParamMeta for a real-valued parameter
  pub const fn real(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Real, default, range, description }
  }

  /// Create a new ParamMeta for a Period parameter
  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    if step <= 0.0 {
      values.push(min);
      return values;
    }
    let mut i = 0usize;
    loop {
      // index-based to avoid accumulating float error
      let v = min + step * i as f64;
      if v > max + f64::EPSILON {
        break;
      }
      values.push(v);
      i += 1;
    }
    values
  }

  /// Validate a value against this parameter's optimization range
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value < min || value > max {
      return Err(FilterError::OutOfRange { field: self.name, value, min, max });
    }
    self.check_type(value)
  }

  /// Validate only the value's type (positivity, integrality)
  pub fn check_type(&self, value: f64) -> Result<()> {
    match self.param_type {
      ParamType::Real => {
        if !value.is_finite() || value <= 0.0 {
          return Err(FilterError::InvalidValue("Real parameter must be positive and finite"));
        }
        Ok(())
      },
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(FilterError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// FILTER PARAMETERS
// ============================================================

static FILTER_PARAMS: [ParamMeta; 4] = [
  ParamMeta::real(
    "range_qty",
    2.618,
    (0.5, 5.0, 0.5),
    "Multiplier (or absolute size) fed into the range scale model",
  ),
  ParamMeta::period(
    "range_period",
    14.0,
    (5.0, 50.0, 1.0),
    "Lookback for ATR, average change and standard deviation",
  ),
  ParamMeta::period("smooth_period", 27.0, (5.0, 60.0, 1.0), "EMA period used to smooth the range"),
  ParamMeta::period(
    "average_samples",
    2.0,
    (1.0, 10.0, 1.0),
    "Number of anchor changes averaged when change averaging is on",
  ),
];

/// Metadata for all tunable numeric parameters
pub fn param_meta() -> &'static [ParamMeta] {
  &FILTER_PARAMS
}

/// Look up a parameter by name
pub fn find_param(name: &str) -> Option<&'static ParamMeta> {
  FILTER_PARAMS.iter().find(|p| p.name == name)
}

/// Apply `name -> value` overrides to a base configuration.
///
/// Unknown names are rejected. Values are type-checked but not restricted
/// to the optimization range.
pub fn with_params(base: &FilterConfig, params: &HashMap<&str, f64>) -> Result<FilterConfig> {
  let mut config = base.clone();
  for (&name, &value) in params {
    apply(&mut config, name, value)?;
  }
  config.validate()?;
  Ok(config)
}

fn apply(config: &mut FilterConfig, name: &str, value: f64) -> Result<()> {
  let meta = find_param(name).ok_or_else(|| FilterError::UnknownVariant {
    field: "parameter",
    value: name.to_string(),
  })?;
  meta.check_type(value)?;
  match meta.name {
    "range_qty" => config.range_qty = value,
    "range_period" => config.range_period = Period::new(value as usize)?,
    "smooth_period" => config.smooth_period = Period::new(value as usize)?,
    "average_samples" => config.average_samples = Period::new(value as usize)?,
    _ => return Err(FilterError::InvalidConfig(format!("parameter {name} is not settable"))),
  }
  Ok(())
}

/// Cartesian product of the grids of the named parameters, applied to `base`.
///
/// Parameters not named keep their value from `base`. Order is row-major in
/// the order of `names` (last name varies fastest).
pub fn expand_grid(base: &FilterConfig, names: &[&str]) -> Result<Vec<FilterConfig>> {
  let mut configs = vec![base.clone()];
  for &name in names {
    let meta = find_param(name).ok_or_else(|| FilterError::UnknownVariant {
      field: "parameter",
      value: name.to_string(),
    })?;
    let grid = meta.generate_grid();
    let mut next = Vec::with_capacity(configs.len() * grid.len());
    for config in &configs {
      for &value in &grid {
        let mut c = config.clone();
        apply(&mut c, name, value)?;
        next.push(c);
      }
    }
    configs = next;
  }
  Ok(configs)
}

// ============================================================
// TESTS
// ============================================================
