//! Integration tests for the range filter.
//!
//! Hand-computed scenarios for each scale model and ratchet policy, run
//! through the public API with a caller-defined bar type.

use range_filter::prelude::*;

// ============================================================
// TEST HELPERS
// ============================================================

#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
}

impl TestBar {
    fn new(o: f64, h: f64, l: f64, c: f64) -> Self {
        Self { o, h, l, c }
    }

    /// Degenerate bar where every price is the same
    fn flat(price: f64) -> Self {
        Self::new(price, price, price, price)
    }
}

impl OHLC for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }
}

fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "actual={actual}, expected={expected}"
    );
}

fn absolute(qty: f64) -> RangeFilterBuilder {
    RangeFilterBuilder::new()
        .range_scale(RangeScale::Absolute)
        .range_qty(qty)
        .smooth_range(false)
}

fn filter_values(results: &[BarResult]) -> Vec<f64> {
    results.iter().map(|r| r.filter_value).collect()
}

// ============================================================
// CORE SCENARIOS
// ============================================================

#[test]
fn test_constant_bars_never_move_anchor() {
    let filter = absolute(1.0)
        .movement_source(MovementSource::Wicks)
        .build()
        .unwrap();
    let bars = vec![TestBar::new(100.0, 101.0, 99.0, 100.0); 5];

    let results = filter.run(&bars).unwrap();
    assert_eq!(results.len(), 5);
    for r in &results {
        assert_eq!(r.range_size, 1.0);
        assert_eq!(r.filter_value, 100.0);
        assert_eq!(r.direction.signum(), 0);
    }
}

#[test]
fn test_upward_gap_after_stable_anchor() {
    let filter = absolute(1.0)
        .movement_source(MovementSource::Wicks)
        .build()
        .unwrap();
    let bars = vec![
        TestBar::new(100.0, 101.0, 99.0, 100.0),
        TestBar::new(100.0, 101.0, 99.0, 100.0),
        TestBar::new(108.0, 110.0, 108.0, 109.0),
    ];

    let results = filter.run(&bars).unwrap();
    assert_eq!(results[1].filter_value, 100.0);
    assert_eq!(results[2].filter_value, 109.0);
    assert_eq!(results[2].direction, Direction::Bullish);
    assert_eq!(results[2].direction.signum(), 1);
}

#[test]
fn test_downward_break_then_carry() {
    let filter = absolute(2.0).build().unwrap();
    let closes = [100.0, 101.0, 95.0, 96.0, 96.5, 99.0];
    let bars: Vec<TestBar> = closes.iter().map(|&c| TestBar::flat(c)).collect();

    let results = filter.run(&bars).unwrap();
    // 100 seed; 101-2 < 100 hold; 95+2 = 97 down; 96+2 = 98 > 97 and 96-2 < 97 hold;
    // 96.5 hold; 99-2 = 97 not > 97 hold
    assert_eq!(filter_values(&results), vec![100.0, 100.0, 97.0, 97.0, 97.0, 97.0]);
    let dirs: Vec<i8> = results.iter().map(|r| r.direction.signum()).collect();
    assert_eq!(dirs, vec![0, 0, -1, -1, -1, -1]);
    assert!(results[5].is_downward && !results[5].is_upward);
}

#[test]
fn test_quantized_ratchet_steps() {
    let filter = absolute(1.0)
        .filter_type(FilterType::QuantizedRatchet)
        .movement_source(MovementSource::Wicks)
        .build()
        .unwrap();
    let bars = vec![
        TestBar::new(100.0, 101.0, 99.0, 100.0),
        TestBar::new(102.0, 103.5, 102.0, 103.0),
        TestBar::new(103.0, 103.8, 102.5, 103.0),
        TestBar::new(101.0, 101.0, 98.5, 99.0),
    ];

    let results = filter.run(&bars).unwrap();
    // 100 seed; floor(3.5) = 3 steps up; inside band; floor(4.5) = 4 steps down
    assert_eq!(filter_values(&results), vec![100.0, 103.0, 103.0, 99.0]);
    let dirs: Vec<i8> = results.iter().map(|r| r.direction.signum()).collect();
    assert_eq!(dirs, vec![0, 1, 1, -1]);
}

#[test]
fn test_averaged_filter_changes() {
    let filter = absolute(1.0)
        .movement_source(MovementSource::Wicks)
        .average_filter_changes(true)
        .average_samples(2)
        .build()
        .unwrap();
    let bars = vec![
        TestBar::new(100.0, 101.0, 99.0, 100.0),
        TestBar::new(109.0, 110.0, 108.0, 109.0),
        TestBar::new(109.0, 110.0, 108.0, 109.0),
        TestBar::new(119.0, 120.0, 118.0, 119.0),
    ];

    let results = filter.run(&bars).unwrap();
    assert_eq!(filter_values(&results), vec![100.0, 104.5, 104.5, 114.0]);
    assert_eq!(results[1].high_band, 105.5);
    assert_eq!(results[1].low_band, 103.5);
    assert_eq!(results[2].direction, Direction::Bullish);
}

// ============================================================
// SCALE MODELS
// ============================================================

#[test]
fn test_percent_of_price() {
    let filter = RangeFilterBuilder::new()
        .range_scale(RangeScale::PercentOfPrice)
        .range_qty(2.0)
        .smooth_range(false)
        .build()
        .unwrap();
    let bars = vec![TestBar::flat(50.0), TestBar::flat(200.0)];

    let results = filter.run(&bars).unwrap();
    assert_approx(results[0].range_size, 1.0);
    assert_approx(results[1].range_size, 4.0);
    assert_approx(results[1].filter_value, 196.0);
}

#[test]
fn test_pips_points_ticks() {
    let bars = vec![TestBar::new(1.1, 1.1010, 1.0990, 1.1)];

    let pips = RangeFilterBuilder::new()
        .range_scale(RangeScale::Pips)
        .range_qty(10.0)
        .build()
        .unwrap();
    assert_approx(pips.run(&bars).unwrap()[0].range_size, 0.001);

    let points = RangeFilterBuilder::new()
        .range_scale(RangeScale::Points)
        .range_qty(3.0)
        .point_value(0.5)
        .build()
        .unwrap();
    assert_approx(points.run(&bars).unwrap()[0].range_size, 1.5);

    let ticks = RangeFilterBuilder::new()
        .range_scale(RangeScale::Ticks)
        .range_qty(3.0)
        .build()
        .unwrap();
    assert_approx(ticks.run(&bars).unwrap()[0].range_size, 0.03);
}

#[test]
fn test_atr_scale_with_smoothing() {
    let filter = RangeFilterBuilder::new()
        .range_scale(RangeScale::Atr)
        .range_qty(1.0)
        .range_period(3)
        .smooth_range(true)
        .smooth_period(3)
        .build()
        .unwrap();
    let bars = vec![
        TestBar::new(100.0, 102.0, 98.0, 100.0),
        TestBar::new(100.0, 110.0, 108.0, 109.0),
    ];

    let results = filter.run(&bars).unwrap();
    // TR 4 then max(2, 10, 8) = 10; ATR 4 then 7; smoothed 4 then 5.5
    assert_approx(results[0].range_size, 4.0);
    assert_approx(results[1].range_size, 7.0);
    assert_approx(results[0].effective_range, 4.0);
    assert_approx(results[1].effective_range, 5.5);
    // close source: 109 - 5.5 = 103.5 > 100
    assert_approx(results[1].filter_value, 103.5);
    assert_approx(results[1].high_band, 109.0);
    assert_approx(results[1].low_band, 98.0);
}

#[test]
fn test_std_dev_scale_warms_up_from_zero() {
    let filter = RangeFilterBuilder::new()
        .range_scale(RangeScale::StdDev)
        .range_qty(1.0)
        .range_period(2)
        .smooth_range(false)
        .build()
        .unwrap();
    let bars = vec![TestBar::flat(10.0), TestBar::flat(14.0), TestBar::flat(14.0)];

    let results = filter.run(&bars).unwrap();
    assert_approx(results[0].range_size, 0.0);
    // window [10, 14] -> 2; window [14, 14] -> 0
    assert_approx(results[1].range_size, 2.0);
    assert_approx(results[2].range_size, 0.0);
    // zero range: anchor snaps straight to price
    assert_approx(results[1].filter_value, 12.0);
    assert_approx(results[2].filter_value, 14.0);
}

#[test]
fn test_average_change_defaults() {
    let filter = RangeFilterBuilder::new().build().unwrap();
    let bars: Vec<TestBar> = (0..60)
        .map(|i| {
            // wobbling but strictly rising closes
            let c = 100.0 + (i as f64 * 0.3).sin() + i as f64 * 0.5;
            TestBar::new(c, c + 1.0, c - 1.0, c)
        })
        .collect();

    let results = filter.run(&bars).unwrap();
    assert_eq!(results.len(), bars.len());
    assert_eq!(results[0].range_size, 0.0);
    assert!(results[1..].iter().all(|r| r.range_size > 0.0));
    assert!(results.last().unwrap().is_upward);
}

// ============================================================
// STREAMING / ERRORS
// ============================================================

#[test]
fn test_streaming_matches_batch() {
    let filter = RangeFilterBuilder::new()
        .movement_source(MovementSource::Wicks)
        .range_scale(RangeScale::Atr)
        .build()
        .unwrap();
    let bars: Vec<TestBar> = (0..40)
        .map(|i| {
            let c = 50.0 + ((i * 7 + 3) % 11) as f64 - 5.0 + i as f64 * 0.2;
            TestBar::new(c - 0.2, c + 0.8, c - 0.9, c)
        })
        .collect();

    let batch = filter.run(&bars).unwrap();
    let mut state = filter.state();
    for (i, bar) in bars.iter().enumerate() {
        assert_eq!(state.update(bar).unwrap(), batch[i]);
    }
    assert_eq!(state.processed(), bars.len());
}

#[test]
fn test_bars_by_reference() {
    let filter = absolute(1.0).build().unwrap();
    let owned = vec![TestBar::flat(10.0), TestBar::flat(12.0)];
    let refs: Vec<&TestBar> = owned.iter().collect();
    assert_eq!(filter.run(&refs).unwrap(), filter.run(&owned).unwrap());
}

#[test]
fn test_infinite_bar_aborts_run() {
    let filter = absolute(1.0).build().unwrap();
    let bars = vec![
        TestBar::flat(10.0),
        TestBar::flat(11.0),
        TestBar::new(11.0, f64::INFINITY, 10.0, 11.0),
        TestBar::flat(12.0),
    ];
    let err = filter.run(&bars).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert_eq!(
        err,
        FilterError::InvalidBar {
            index: 2,
            reason: "Infinite value in OHLC"
        }
    );
}

#[test]
fn test_empty_input_is_input_error() {
    let filter = absolute(1.0).build().unwrap();
    let bars: Vec<TestBar> = vec![];
    let err = filter.run(&bars).unwrap_err();
    assert_eq!(err, FilterError::EmptyInput);
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_huge_periods_run_without_preallocating() {
    let filter = RangeFilterBuilder::new()
        .range_scale(RangeScale::StdDev)
        .range_qty(1.0)
        .range_period(usize::MAX / 4)
        .smooth_range(false)
        .average_filter_changes(true)
        .average_samples(usize::MAX / 4)
        .build()
        .unwrap();
    let bars = vec![TestBar::flat(10.0), TestBar::flat(14.0), TestBar::flat(14.0)];

    let results = filter.run(&bars).unwrap();
    assert_eq!(results.len(), 3);
    // nothing evicted: window [10, 14, 14]
    let mean = 38.0 / 3.0;
    let var = ((10.0 - mean) * (10.0 - mean) + 2.0 * (14.0 - mean) * (14.0 - mean)) / 3.0;
    assert_approx(results[2].range_size, f64::sqrt(var));
}

#[test]
fn test_independent_runs_share_nothing() {
    let filter = absolute(1.0).build().unwrap();
    let a = vec![TestBar::flat(10.0), TestBar::flat(20.0)];
    let b = vec![TestBar::flat(500.0)];

    let first = filter.run(&a).unwrap();
    let _ = filter.run(&b).unwrap();
    assert_eq!(filter.run(&a).unwrap(), first);
}
