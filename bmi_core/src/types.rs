//! Core domain types for the BMI tracker.
//!
//! - Users and their measurements as persisted by the record store
//! - The weight category enumeration
//! - Readings produced by the metric engine

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Category
// ============================================================================

/// Weight category derived from a BMI index
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl Category {
    /// Lower bound of `Normal`, inclusive
    pub const NORMAL_FROM: f64 = 18.5;
    /// Lower bound of `Overweight`, inclusive
    pub const OVERWEIGHT_FROM: f64 = 25.0;
    /// Lower bound of `Obese`, inclusive
    pub const OBESE_FROM: f64 = 30.0;

    /// Classify an index using half-open thresholds.
    pub fn classify(index: f64) -> Self {
        if index < Self::NORMAL_FROM {
            Category::Underweight
        } else if index < Self::OVERWEIGHT_FROM {
            Category::Normal
        } else if index < Self::OBESE_FROM {
            Category::Overweight
        } else {
            Category::Obese
        }
    }

    /// Name as stored in the `category` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Underweight => "Underweight",
            Category::Normal => "Normal",
            Category::Overweight => "Overweight",
            Category::Obese => "Obese",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "Underweight" => Ok(Category::Underweight),
            "Normal" => Ok(Category::Normal),
            "Overweight" => Ok(Category::Overweight),
            "Obese" => Ok(Category::Obese),
            other => Err(crate::Error::CorruptRecord(format!(
                "unknown category '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// Metric engine output
// ============================================================================

/// A computed index together with the inputs it was derived from.
///
/// Only [`crate::metric::compute`] builds these, so a reading handed to the
/// store always has an index and category consistent with its weight and
/// height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BmiReading {
    pub(crate) weight_kg: f64,
    pub(crate) height_cm: f64,
    pub(crate) bmi: f64,
    pub(crate) category: Category,
}

impl BmiReading {
    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    /// Index rounded to two decimals
    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

// ============================================================================
// Persisted records
// ============================================================================

/// A named person whose measurements are tracked
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
}

/// One saved measurement, owned by a user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub id: i64,
    pub user_id: i64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: f64,
    pub category: Category,
    pub recorded_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_half_open() {
        assert_eq!(Category::classify(18.49), Category::Underweight);
        assert_eq!(Category::classify(18.5), Category::Normal);
        assert_eq!(Category::classify(24.95), Category::Normal);
        assert_eq!(Category::classify(24.99), Category::Normal);
        assert_eq!(Category::classify(25.0), Category::Overweight);
        assert_eq!(Category::classify(29.95), Category::Overweight);
        assert_eq!(Category::classify(30.0), Category::Obese);
        assert_eq!(Category::classify(55.0), Category::Obese);
    }

    #[test]
    fn test_category_text_roundtrip() {
        for category in [
            Category::Underweight,
            Category::Normal,
            Category::Overweight,
            Category::Obese,
        ] {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
            assert_eq!(category.to_string(), category.as_str());
        }
    }

    #[test]
    fn test_unknown_category_text() {
        let err = "normal".parse::<Category>().unwrap_err();
        assert!(matches!(err, crate::Error::CorruptRecord(_)));
    }
}
