//! Location quotient
//!
//! LQ compares a feature's share of variable x (relative to its y) with the
//! same ratio over the whole study area: LQi = (xi/yi) / (ΣX/ΣY). Values
//! above 1 mean the feature is over-represented relative to the region.

use terrastat_core::{Error, Result};

/// Compute the location quotient for every feature.
///
/// Features with `yi == 0` have no defined local ratio and yield NaN:
/// flagged output, not a failure.
///
/// # Errors
///
/// - [`Error::DimensionMismatch`] if the columns differ in length
/// - [`Error::InsufficientData`] for empty input
/// - [`Error::DegenerateInput`] when either column sums to zero, making the
///   regional ratio undefined
pub fn location_quotient(x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }
    if x.is_empty() {
        return Err(Error::InsufficientData {
            needed: 1,
            actual: 0,
            what: "features",
        });
    }

    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    if sum_y == 0.0 {
        return Err(Error::DegenerateInput(
            "variable y sums to zero, the regional ratio is undefined".into(),
        ));
    }
    if sum_x == 0.0 {
        return Err(Error::DegenerateInput(
            "variable x sums to zero, the regional ratio is undefined".into(),
        ));
    }
    let regional = sum_x / sum_y;

    Ok(x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            if yi == 0.0 {
                f64::NAN
            } else {
                (xi / yi) / regional
            }
        })
        .collect())
}
