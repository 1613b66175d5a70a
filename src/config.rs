//! Filter configuration
//!
//! All enum choices parse from (and serialize to) human-readable labels. The
//! labels used by the classic "Range Filter" study (`"Type 1"`, `"% of Price"`,
//! `"Average Change"`, ...) are accepted as aliases, so configurations written
//! for that tool load unchanged. Unrecognized labels are a configuration error;
//! there is no silent fallback.

use std::fmt;
use std::str::FromStr;

use crate::{FilterError, Period, Result, OHLC};

/// Generate a label-backed enum with `as_str`, `Display`, `FromStr` and serde.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $field:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $label:literal $(| $alias:literal)*
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),*
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// Canonical label
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FilterError;

            fn from_str(s: &str) -> Result<Self> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($label) $(|| s.eq_ignore_ascii_case($alias))* {
                        return Ok($name::$variant);
                    }
                )*
                Err(FilterError::UnknownVariant {
                    field: $field,
                    value: s.to_string(),
                })
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                s.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
                let label = String::deserialize(d)?;
                label.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

// ============================================================
// CHOICES
// ============================================================

labeled_enum! {
    /// Breakout policy of the ratchet
    pub enum FilterType: "filter_type" {
        /// Continuous breakout: anchor trails the extreme by exactly one range
        #[default]
        Ratchet => "Ratchet" | "Type 1" | "type1",
        /// Step breakout: anchor moves in whole multiples of the range
        QuantizedRatchet => "Quantized Ratchet" | "QuantizedRatchet" | "Type 2" | "type2",
    }
}

labeled_enum! {
    /// Which prices drive the filter
    pub enum MovementSource: "movement_source" {
        /// Close price used as both extremes
        #[default]
        Close => "Close",
        /// Bar high and low
        Wicks => "Wicks",
    }
}

labeled_enum! {
    /// Model used to size the band around the anchor
    pub enum RangeScale: "range_scale" {
        Points => "Points",
        Pips => "Pips",
        Ticks => "Ticks",
        PercentOfPrice => "% of Price" | "PercentOfPrice" | "Percent",
        Atr => "ATR" | "Average True Range",
        #[default]
        AverageChange => "Average Change" | "AverageChange",
        StdDev => "Standard Deviation" | "StdDev",
        Absolute => "Absolute",
    }
}

impl MovementSource {
    /// Movement extremes `(high, low)` of a bar under this source
    #[inline]
    pub fn extremes<T: OHLC>(self, bar: &T) -> (f64, f64) {
        match self {
            MovementSource::Close => (bar.close(), bar.close()),
            MovementSource::Wicks => (bar.high(), bar.low()),
        }
    }
}

// ============================================================
// FILTER CONFIG
// ============================================================

/// Pip size used by [`RangeScale::Pips`]
pub const PIP_SIZE: f64 = 0.0001;

/// Immutable configuration for one filter run
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub filter_type: FilterType,
    pub movement_source: MovementSource,
    /// Multiplier (or absolute size) fed into the range scale model
    pub range_qty: f64,
    pub range_scale: RangeScale,
    /// Lookback for ATR, average change and standard deviation
    pub range_period: Period,
    pub smooth_range: bool,
    pub smooth_period: Period,
    /// Emit the mean of the last `average_samples` anchor changes instead of the anchor
    pub average_filter_changes: bool,
    pub average_samples: Period,
    /// Value of one point, used by [`RangeScale::Points`]
    pub point_value: f64,
    /// Minimum tick, used by [`RangeScale::Ticks`]
    pub tick_size: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filter_type: FilterType::Ratchet,
            movement_source: MovementSource::Close,
            range_qty: 2.618,
            range_scale: RangeScale::AverageChange,
            range_period: Period::new_const(14),
            smooth_range: true,
            smooth_period: Period::new_const(27),
            average_filter_changes: false,
            average_samples: Period::new_const(2),
            point_value: 1.0,
            tick_size: 0.01,
        }
    }
}

impl FilterConfig {
    /// Check the fields the type system does not already guarantee
    pub fn validate(&self) -> Result<()> {
        check_positive(self.range_qty, "range_qty must be positive and finite")?;
        check_positive(self.point_value, "point_value must be positive and finite")?;
        check_positive(self.tick_size, "tick_size must be positive and finite")?;
        Ok(())
    }
}

fn check_positive(value: f64, msg: &'static str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(FilterError::InvalidValue(msg));
    }
    Ok(())
}
