//! Range filter building blocks
//!
//! Leaves first:
//!
//! - **smoother**: conditional EMA shared by every running statistic
//! - **window**: fixed-capacity ring buffer (std-dev and change averaging)
//! - **estimator**: per-bar range size under the configured scale model
//! - **ratchet**: anchor update, bands and optional change averaging
//! - **trend**: direction from consecutive filter values
//!
//! [`crate::FilterState`] threads these together one bar at a time.

pub mod estimator;
pub mod ratchet;
pub mod smoother;
pub mod trend;
pub mod window;

pub use estimator::{RangeEstimate, RangeEstimator};
pub use ratchet::{breakout, RangeRatchet, RatchetOutput};
pub use smoother::{cond_ema, ema_alpha, CondEma};
pub use trend::TrendClassifier;
pub use window::RingWindow;
