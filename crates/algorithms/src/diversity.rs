//! Entropy diversity index over attribute series
//!
//! Measures how evenly each feature's total is spread across a series of
//! numeric fields (e.g. population counts per group). The index is Shannon
//! entropy of the row shares normalized by ln(k), so it ranges from 0 (all
//! weight in one field) to 1 (an even split across all k fields).

use terrastat_core::{Error, Result};

/// Compute the normalized entropy index for every feature.
///
/// `columns` holds the field series column-by-column; all columns must have
/// the same length (one value per feature). Zero shares contribute nothing
/// (0·ln 0 = 0). A feature whose row sums to zero has no share distribution
/// and yields NaN; callers should treat those rows as missing.
///
/// # Errors
///
/// - [`Error::InsufficientData`] for fewer than 2 fields
/// - [`Error::DimensionMismatch`] for ragged columns
/// - [`Error::DegenerateInput`] if any value is negative (shares are
///   proportions of a nonnegative total)
pub fn entropy_index(columns: &[Vec<f64>]) -> Result<Vec<f64>> {
    let k = columns.len();
    if k < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            actual: k,
            what: "fields",
        });
    }
    let n = columns[0].len();
    for column in columns {
        if column.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: column.len(),
            });
        }
    }
    for (f, column) in columns.iter().enumerate() {
        if let Some(i) = column.iter().position(|&v| v < 0.0) {
            return Err(Error::DegenerateInput(format!(
                "negative value in entropy series (field {f}, feature {i})"
            )));
        }
    }

    let ln_k = (k as f64).ln();
    let index = (0..n)
        .map(|i| {
            let total: f64 = columns.iter().map(|c| c[i]).sum();
            if total == 0.0 {
                return f64::NAN;
            }
            let mut h = 0.0;
            for column in columns {
                let share = column[i] / total;
                if share > 0.0 {
                    h -= share * share.ln();
                }
            }
            h / ln_k
        })
        .collect();

    Ok(index)
}
