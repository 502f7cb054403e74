//! BMI computation.
//!
//! The index is `weight_kg / height_m²`, rounded to two decimals. The
//! category is derived from the rounded index so the two always agree when
//! displayed side by side.

use crate::{BmiReading, Category, Error, Result};

/// Compute the index and category for a weight (kg) and height (cm).
///
/// Both inputs must be finite and strictly positive.
pub fn compute(weight_kg: f64, height_cm: f64) -> Result<BmiReading> {
    ensure_positive("weight", weight_kg)?;
    ensure_positive("height", height_cm)?;

    let height_m = height_cm / 100.0;
    let bmi = round2(weight_kg / (height_m * height_m));

    Ok(BmiReading {
        weight_kg,
        height_cm,
        bmi,
        category: Category::classify(bmi),
    })
}

/// Parse user-entered text as a strictly positive real number.
///
/// Usable directly as a clap `value_parser`.
pub fn parse_positive(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("'{}' is not a number", raw.trim())))?;
    ensure_positive("value", value)?;
    Ok(value)
}

/// Round half away from zero to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn ensure_positive(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "{} must be a positive number, got {}",
            what, value
        )));
    }
    Ok(())
}
