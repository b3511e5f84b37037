//! Spatial autocorrelation statistics
//!
//! - **global**: Moran's I over the whole collection with analytic inference
//! - **local**: per-feature Moran's I (LISA) with conditional-permutation
//!   significance
//!
//! Both consume a numeric attribute column and a [`WeightsGraph`] that is
//! index-aligned with it.

mod global;
mod local;

pub use global::{global_morans_i, GlobalMoranResult};
pub use local::{local_morans_i, LocalMoranParams, LocalMoranResult, Quadrant};

use terrastat_core::{Error, Result};

use crate::weights::WeightsGraph;

/// Shared preconditions: the value column must line up with the graph and
/// carry at least 3 finite observations.
fn check_inputs(values: &[f64], weights: &WeightsGraph) -> Result<()> {
    if values.len() != weights.n() {
        return Err(Error::DimensionMismatch {
            expected: weights.n(),
            actual: values.len(),
        });
    }
    if values.len() < 3 {
        return Err(Error::InsufficientData {
            needed: 3,
            actual: values.len(),
            what: "features",
        });
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(Error::DegenerateInput(format!(
            "non-finite attribute value at feature {i}"
        )));
    }
    Ok(())
}

/// Deviations from the mean and their sum of squares.
///
/// A zero-variance attribute makes Moran's I undefined.
fn deviations(values: &[f64]) -> Result<(Vec<f64>, f64)> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let devs: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let sum_sq: f64 = devs.iter().map(|d| d * d).sum();
    if sum_sq.abs() < f64::EPSILON {
        return Err(Error::DegenerateInput(
            "attribute has zero variance, Moran's I is undefined".into(),
        ));
    }
    Ok((devs, sum_sq))
}

/// Approximate CDF of the standard normal distribution
/// Uses Abramowitz & Stegun approximation (error < 7.5e-8)
fn normal_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let t = 1.0 / (1.0 + 0.2316419 * x.abs());
    let d = 0.3989422804014327; // 1/sqrt(2*pi)
    let p = d * (-x * x / 2.0).exp()
        * (t * (0.3193815
            + t * (-0.3565638
                + t * (1.781478
                    + t * (-1.821256
                        + t * 1.330274)))));

    if x > 0.0 {
        1.0 - p
    } else {
        p
    }
}
