//! History presentation helpers.
//!
//! Turns a user's stored measurements into display lines and, when there are
//! at least two of them, a chronological trend series.

use crate::metric::round2;
use crate::store::DATE_FORMAT;
use crate::Measurement;
use chrono::NaiveDateTime;

/// Minimum number of measurements needed for a trend
pub const MIN_TREND_POINTS: usize = 2;

/// One point on a trend chart
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrendPoint {
    pub at: NaiveDateTime,
    pub bmi: f64,
}

/// Index values over time, oldest first
#[derive(Clone, Debug)]
pub struct TrendSeries {
    points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Build a series from history as returned by the store (newest first).
    ///
    /// Returns `None` when there are fewer than [`MIN_TREND_POINTS`] measurements.
    pub fn from_history(history: &[Measurement]) -> Option<Self> {
        if history.len() < MIN_TREND_POINTS {
            return None;
        }

        let mut points: Vec<TrendPoint> = history
            .iter()
            .rev()
            .map(|m| TrendPoint {
                at: m.recorded_at,
                bmi: m.bmi,
            })
            .collect();
        // Stable, so same-second points keep insertion order
        points.sort_by(|a, b| a.at.cmp(&b.at));

        Some(Self { points })
    }

    pub fn points(&self) -> &[TrendPoint] {
        &self.points
    }

    pub fn first(&self) -> TrendPoint {
        self.points[0]
    }

    pub fn latest(&self) -> TrendPoint {
        self.points[self.points.len() - 1]
    }

    pub fn min_bmi(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.bmi)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn max_bmi(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.bmi)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Latest index minus the first, rounded to two decimals
    pub fn change(&self) -> f64 {
        round2(self.latest().bmi - self.first().bmi)
    }
}

/// Format one history entry for display
pub fn describe(measurement: &Measurement) -> String {
    format!(
        "{}: BMI {} ({}) - W:{}kg H:{}cm",
        measurement.recorded_at.format(DATE_FORMAT),
        measurement.bmi,
        measurement.category,
        measurement.weight_kg,
        measurement.height_cm
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;
    use chrono::{Duration, NaiveDate};

    fn measurement(id: i64, days_ago: i64, bmi: f64) -> Measurement {
        let base = NaiveDate::from_ymd_opt(2024, 6, 30)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Measurement {
            id,
            user_id: 1,
            weight_kg: 70.0,
            height_cm: 175.0,
            bmi,
            category: Category::classify(bmi),
            recorded_at: base - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_needs_two_points() {
        assert!(TrendSeries::from_history(&[]).is_none());
        assert!(TrendSeries::from_history(&[measurement(1, 0, 22.0)]).is_none());
    }

    #[test]
    fn test_series_is_chronological() {
        // Store order: newest first
        let history = vec![
            measurement(3, 0, 23.1),
            measurement(2, 5, 24.4),
            measurement(1, 10, 25.2),
        ];

        let series = TrendSeries::from_history(&history).unwrap();
        let values: Vec<f64> = series.points().iter().map(|p| p.bmi).collect();
        assert_eq!(values, vec![25.2, 24.4, 23.1]);
        assert_eq!(series.first().bmi, 25.2);
        assert_eq!(series.latest().bmi, 23.1);
    }

    #[test]
    fn test_same_second_points_follow_insertion_order() {
        let mut older = measurement(1, 0, 22.0);
        let mut newer = measurement(2, 0, 23.0);
        older.recorded_at = newer.recorded_at;
        newer.bmi = 23.0;

        // Store order: newest first, then an older entry
        let history = vec![newer, older, measurement(0, 3, 21.0)];
        let series = TrendSeries::from_history(&history).unwrap();
        let values: Vec<f64> = series.points().iter().map(|p| p.bmi).collect();
        assert_eq!(values, vec![21.0, 22.0, 23.0]);
    }

    #[test]
    fn test_summary_figures() {
        let history = vec![
            measurement(3, 0, 23.1),
            measurement(2, 5, 26.4),
            measurement(1, 10, 24.8),
        ];

        let series = TrendSeries::from_history(&history).unwrap();
        assert_eq!(series.min_bmi(), 23.1);
        assert_eq!(series.max_bmi(), 26.4);
        assert_eq!(series.change(), -1.7);
    }

    #[test]
    fn test_describe_line() {
        let line = describe(&measurement(1, 0, 22.86));
        assert_eq!(
            line,
            "2024-06-30 09:00:00: BMI 22.86 (Normal) - W:70kg H:175cm"
        );
    }
}
