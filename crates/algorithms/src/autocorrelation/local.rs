//! Local Moran's I (LISA) with conditional permutation inference

use serde::Serialize;
use terrastat_core::{Error, Result};

use super::{check_inputs, deviations};
use crate::maybe_rayon::*;
use crate::rng::Xorshift64;
use crate::weights::WeightsGraph;

/// Cluster/outlier quadrant of a local Moran's I value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Quadrant {
    /// High value surrounded by high values (cluster)
    HighHigh,
    /// Low value surrounded by high values (spatial outlier)
    LowHigh,
    /// Low value surrounded by low values (cluster)
    LowLow,
    /// High value surrounded by low values (spatial outlier)
    HighLow,
}

impl Quadrant {
    /// Conventional LISA quadrant code: 1 HH, 2 LH, 3 LL, 4 HL.
    pub fn code(&self) -> i64 {
        match self {
            Quadrant::HighHigh => 1,
            Quadrant::LowHigh => 2,
            Quadrant::LowLow => 3,
            Quadrant::HighLow => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::HighHigh => "High-High",
            Quadrant::LowHigh => "Low-High",
            Quadrant::LowLow => "Low-Low",
            Quadrant::HighLow => "High-Low",
        }
    }
}

/// Parameters for the conditional permutation test
#[derive(Debug, Clone, Copy)]
pub struct LocalMoranParams {
    /// Number of conditional permutations per feature
    pub permutations: usize,
    /// RNG seed; a fixed seed reproduces identical p-values, with or
    /// without the `parallel` feature
    pub seed: u64,
}

impl Default for LocalMoranParams {
    fn default() -> Self {
        Self {
            permutations: 999,
            seed: 42,
        }
    }
}

/// Per-feature local Moran's I result
#[derive(Debug, Clone, Serialize)]
pub struct LocalMoranResult {
    /// Local Moran's I. NaN for isolated features.
    pub i: f64,
    /// Cluster quadrant; `None` for isolated features.
    pub quadrant: Option<Quadrant>,
    /// Two-sided conditional-permutation p-value. NaN for isolates.
    pub p_value: f64,
}

impl LocalMoranResult {
    /// Whether the feature had no neighbors, so its statistic is undefined
    /// and should be treated as low-confidence output.
    pub fn is_flagged(&self) -> bool {
        self.quadrant.is_none()
    }
}

/// Compute local Moran's I for every feature.
///
/// Ii = zi · Σj wij zj / m2 with m2 = Σ zi²/n. The quadrant compares the
/// signs of zi and the weighted neighbor average (nonnegative counts as
/// "high").
///
/// Significance is assessed by conditional permutation: for each feature the
/// neighbor values are redrawn from the remaining n−1 observations
/// `permutations` times, and the two-sided empirical p-value is
/// 2·(min(#sim ≥ obs, #sim ≤ obs)+1)/(permutations+1), capped at 1. This is
/// the dominant cost, O(n · permutations); the loop runs feature-parallel
/// under the `parallel` feature with one RNG stream per feature.
///
/// Isolated features yield a NaN statistic, `None` quadrant and NaN p-value
/// rather than failing the whole analysis.
///
/// # Errors
///
/// Same conditions as [`super::global_morans_i`], plus
/// [`Error::InvalidParameter`] when `permutations` is zero.
pub fn local_morans_i(
    values: &[f64],
    weights: &WeightsGraph,
    params: LocalMoranParams,
) -> Result<Vec<LocalMoranResult>> {
    if params.permutations == 0 {
        return Err(Error::InvalidParameter {
            name: "permutations",
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    check_inputs(values, weights)?;
    let (z, sum_sq) = deviations(values)?;
    let m2 = sum_sq / values.len() as f64;

    let results = (0..values.len())
        .into_par_iter()
        .map(|i| feature_statistic(i, &z, m2, weights, params))
        .collect();

    Ok(results)
}

fn feature_statistic(
    i: usize,
    z: &[f64],
    m2: f64,
    weights: &WeightsGraph,
    params: LocalMoranParams,
) -> LocalMoranResult {
    let row = weights.neighbors(i);
    if row.is_empty() {
        return LocalMoranResult {
            i: f64::NAN,
            quadrant: None,
            p_value: f64::NAN,
        };
    }

    let lag: f64 = row.iter().map(|&(j, w)| w * z[j]).sum();
    let i_obs = z[i] * lag / m2;
    let quadrant = classify(z[i], lag);

    // Conditional permutation: feature i keeps its value, its neighbors draw
    // theirs from the other n−1 observations.
    let row_weights: Vec<f64> = row.iter().map(|&(_, w)| w).collect();
    let k = row_weights.len();
    let others: Vec<f64> = z
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(_, &v)| v)
        .collect();

    let mut rng = Xorshift64::stream(params.seed, i as u64);
    let mut pool = others.clone();
    let mut at_or_above = 0usize;
    let mut at_or_below = 0usize;

    for _ in 0..params.permutations {
        pool.copy_from_slice(&others);
        rng.partial_shuffle(&mut pool, k);
        let lag_sim: f64 = row_weights.iter().zip(&pool).map(|(w, v)| w * v).sum();
        let i_sim = z[i] * lag_sim / m2;
        if i_sim >= i_obs {
            at_or_above += 1;
        }
        if i_sim <= i_obs {
            at_or_below += 1;
        }
    }

    let tail = at_or_above.min(at_or_below) as f64;
    let p_value = (2.0 * (tail + 1.0) / (params.permutations as f64 + 1.0)).min(1.0);

    LocalMoranResult {
        i: i_obs,
        quadrant: Some(quadrant),
        p_value,
    }
}

fn classify(deviation: f64, lag: f64) -> Quadrant {
    match (deviation >= 0.0, lag >= 0.0) {
        (true, true) => Quadrant::HighHigh,
        (false, true) => Quadrant::LowHigh,
        (false, false) => Quadrant::LowLow,
        (true, false) => Quadrant::HighLow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocorrelation::global_morans_i;
    use crate::weights::WeightsGraph;

    fn rook_grid(rows: usize, cols: usize) -> WeightsGraph {
        let n = rows * cols;
        let mut neighbors = vec![Vec::new(); n];
        for r in 0..rows {
            for c in 0..cols {
                let i = r * cols + c;
                if c + 1 < cols {
                    neighbors[i].push((i + 1, 1.0));
                    neighbors[i + 1].push((i, 1.0));
                }
                if r + 1 < rows {
                    let j = (r + 1) * cols + c;
                    neighbors[i].push((j, 1.0));
                    neighbors[j].push((i, 1.0));
                }
            }
        }
        WeightsGraph::from_neighbors(neighbors)
    }

    /// 4x4 grid, top half high, bottom half low.
    fn split_values() -> Vec<f64> {
        (0..16).map(|i| if i < 8 { 10.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_quadrants_on_split_grid() {
        let w = rook_grid(4, 4);
        let results = local_morans_i(&split_values(), &w, LocalMoranParams::default()).unwrap();

        // Corner of the high block, all neighbors high.
        assert_eq!(results[0].quadrant, Some(Quadrant::HighHigh));
        assert!(results[0].i > 0.0);
        // Corner of the low block, all neighbors low.
        assert_eq!(results[15].quadrant, Some(Quadrant::LowLow));
        assert!(results[15].i > 0.0, "low-low is still positive association");
    }

    #[test]
    fn test_outlier_quadrant() {
        // One low cell inside a high plain.
        let w = rook_grid(3, 3);
        let mut values = vec![10.0; 9];
        values[4] = 0.0;
        let results = local_morans_i(&values, &w, LocalMoranParams::default()).unwrap();
        assert_eq!(results[4].quadrant, Some(Quadrant::LowHigh));
        assert!(results[4].i < 0.0, "outliers carry negative local I");
    }

    #[test]
    fn test_local_sums_match_global() {
        let w = rook_grid(4, 4);
        let values: Vec<f64> = (0..16).map(|i| ((i * 5 + 2) % 9) as f64).collect();
        let local = local_morans_i(&values, &w, LocalMoranParams::default()).unwrap();
        let global = global_morans_i(&values, &w).unwrap();

        let local_sum: f64 = local.iter().map(|r| r.i).sum();
        assert!(
            (local_sum / w.s0() - global.i).abs() < 1e-9,
            "Σ Ii / S0 = {} but global I = {}",
            local_sum / w.s0(),
            global.i
        );
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let w = rook_grid(4, 4);
        let values = split_values();
        let params = LocalMoranParams {
            permutations: 199,
            seed: 7,
        };
        let a = local_morans_i(&values, &w, params).unwrap();
        let b = local_morans_i(&values, &w, params).unwrap();
        for (ra, rb) in a.iter().zip(&b) {
            assert_eq!(ra.p_value, rb.p_value);
            assert_eq!(ra.i, rb.i);
        }
    }

    #[test]
    fn test_cluster_member_more_significant_than_boundary() {
        let w = rook_grid(4, 4);
        let results = local_morans_i(&split_values(), &w, LocalMoranParams::default()).unwrap();
        // Feature 1 sits in the high block with an all-high neighborhood;
        // drawing 3 high values from the mixed pool is rare (≈ 0.077), so the
        // two-sided p lands near 0.15. Feature 9 straddles the boundary and
        // its neighborhood is unremarkable under reshuffling.
        assert!(
            results[1].p_value < 0.25,
            "clustered cell p = {}",
            results[1].p_value
        );
        assert!(
            results[1].p_value < results[9].p_value,
            "clustered cell (p = {}) should beat boundary cell (p = {})",
            results[1].p_value,
            results[9].p_value
        );
    }

    #[test]
    fn test_isolate_flagged_not_fatal() {
        let neighbors = vec![
            vec![(1, 1.0)],
            vec![(0, 1.0), (2, 1.0)],
            vec![(1, 1.0)],
            Vec::new(), // isolate
        ];
        let w = WeightsGraph::from_neighbors(neighbors);
        let values = [1.0, 2.0, 3.0, 4.0];
        let results = local_morans_i(&values, &w, LocalMoranParams::default()).unwrap();

        assert!(results[3].is_flagged());
        assert!(results[3].i.is_nan());
        assert!(results[3].p_value.is_nan());
        assert!(!results[0].is_flagged());
    }

    #[test]
    fn test_zero_permutations_rejected() {
        let w = rook_grid(2, 2);
        let params = LocalMoranParams {
            permutations: 0,
            seed: 1,
        };
        assert!(matches!(
            local_morans_i(&[1.0, 2.0, 3.0, 4.0], &w, params),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_p_values_in_range() {
        let w = rook_grid(3, 3);
        let values: Vec<f64> = (0..9).map(|i| ((i * 3 + 1) % 7) as f64).collect();
        let params = LocalMoranParams {
            permutations: 99,
            seed: 11,
        };
        for r in local_morans_i(&values, &w, params).unwrap() {
            assert!(r.p_value > 0.0 && r.p_value <= 1.0, "p = {}", r.p_value);
        }
    }
}
