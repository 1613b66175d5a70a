//! Trend direction from consecutive filter values

use crate::Direction;

/// Tracks the previous filter value and direction; ties carry direction forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendClassifier {
    prev_filter: Option<f64>,
    direction: Direction,
}

impl TrendClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, filter_value: f64) -> Direction {
        if let Some(prev) = self.prev_filter {
            if filter_value > prev {
                self.direction = Direction::Bullish;
            } else if filter_value < prev {
                self.direction = Direction::Bearish;
            }
        }
        self.prev_filter = Some(filter_value);
        self.direction
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_all(values: &[f64]) -> Vec<Direction> {
        let mut trend = TrendClassifier::new();
        values.iter().map(|&v| trend.classify(v)).collect()
    }

    #[test]
    fn test_first_bar_neutral() {
        let mut trend = TrendClassifier::new();
        assert_eq!(trend.classify(100.0), Direction::Neutral);
    }

    #[test]
    fn test_carry_forward_on_ties() {
        let dirs = classify_all(&[100.0, 101.0, 101.0, 101.0, 99.0, 99.0, 100.0]);
        assert_eq!(
            dirs,
            vec![
                Direction::Neutral,
                Direction::Bullish,
                Direction::Bullish,
                Direction::Bullish,
                Direction::Bearish,
                Direction::Bearish,
                Direction::Bullish,
            ]
        );
    }

    #[test]
    fn test_flat_series_stays_neutral() {
        let dirs = classify_all(&[5.0; 4]);
        assert!(dirs.iter().all(|d| *d == Direction::Neutral));
    }
}
