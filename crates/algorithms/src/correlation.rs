//! Correlation coefficients and matrices
//!
//! Pearson, Spearman (average ranks) and Kendall (tau-b, tie-corrected)
//! coefficients for paired columns, and a labeled [`CorrelationMatrix`] for
//! pairwise analysis of several attribute columns at once.

use std::fmt;

use ndarray::Array2;
use terrastat_core::{Error, Result};

/// Correlation coefficient family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
    Kendall,
}

impl CorrelationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
            CorrelationMethod::Kendall => "kendall",
        }
    }

    fn compute(&self, x: &[f64], y: &[f64]) -> Result<f64> {
        match self {
            CorrelationMethod::Pearson => pearson(x, y),
            CorrelationMethod::Spearman => spearman(x, y),
            CorrelationMethod::Kendall => kendall(x, y),
        }
    }
}

/// Pearson product-moment correlation between `x` and `y`.
///
/// Returns 0.0 if either series is constant (zero variance).
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    validate_paired(x, y)?;

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok(cov / denom)
}

/// Spearman rank correlation: Pearson correlation of average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    validate_paired(x, y)?;
    pearson(&rank_average(x), &rank_average(y))
}

/// Kendall rank correlation, tau-b (corrected for ties in either series).
///
/// Returns 0.0 when every pair is tied in one of the series.
pub fn kendall(x: &[f64], y: &[f64]) -> Result<f64> {
    validate_paired(x, y)?;

    let n = x.len();
    let mut concordant = 0i64;
    let mut discordant = 0i64;
    let mut tied_x = 0i64;
    let mut tied_y = 0i64;

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 {
                tied_x += 1;
            }
            if dy == 0.0 {
                tied_y += 1;
            }
            if dx == 0.0 || dy == 0.0 {
                continue;
            }
            if dx * dy > 0.0 {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    let n0 = (n * (n - 1) / 2) as f64;
    let denom = ((n0 - tied_x as f64) * (n0 - tied_y as f64)).sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok((concordant - discordant) as f64 / denom)
}

fn validate_paired(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            actual: x.len(),
            what: "observations",
        });
    }
    Ok(())
}

/// Ranks with ties averaged (the form Spearman correlation needs).
fn rank_average(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && data[order[j]].total_cmp(&data[order[i]]).is_eq() {
            j += 1;
        }
        // 1-based ranks i+1..=j averaged over the tie group.
        let rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        i = j;
    }
    ranks
}

/// Pairwise correlation matrix over labeled attribute columns.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    values: Array2<f64>,
    labels: Vec<String>,
    method: CorrelationMethod,
}

impl CorrelationMatrix {
    /// Correlation between variables `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    /// Number of variables.
    pub fn n(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn method(&self) -> CorrelationMethod {
        self.method
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(6);
        write!(f, "{:width$}", "")?;
        for label in &self.labels {
            write!(f, " {label:>width$}")?;
        }
        writeln!(f)?;
        for (i, label) in self.labels.iter().enumerate() {
            write!(f, "{label:width$}")?;
            for j in 0..self.n() {
                write!(f, " {:>width$.3}", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Build the pairwise correlation matrix of the given columns.
///
/// The matrix is symmetric with a unit diagonal. At least two columns of
/// equal length (≥ 2 observations) are required.
pub fn correlation_matrix(
    columns: &[(String, Vec<f64>)],
    method: CorrelationMethod,
) -> Result<CorrelationMatrix> {
    if columns.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            actual: columns.len(),
            what: "fields",
        });
    }
    let obs = columns[0].1.len();
    for (_, column) in columns {
        if column.len() != obs {
            return Err(Error::DimensionMismatch {
                expected: obs,
                actual: column.len(),
            });
        }
    }

    let k = columns.len();
    let mut values = Array2::<f64>::eye(k);
    for i in 0..k {
        for j in (i + 1)..k {
            let r = method.compute(&columns[i].1, &columns[j].1)?;
            values[(i, j)] = r;
            values[(j, i)] = r;
        }
    }

    Ok(CorrelationMatrix {
        values,
        labels: columns.iter().map(|(name, _)| name.clone()).collect(),
        method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn test_pearson_perfect_positive() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < TOL);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [10.0, 8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &y).unwrap() + 1.0).abs() < TOL);
    }

    #[test]
    fn test_pearson_constant_series() {
        let x = [3.0, 3.0, 3.0];
        let y = [1.0, 2.0, 3.0];
        assert!(pearson(&x, &y).unwrap().abs() < TOL);
    }

    #[test]
    fn test_paired_validation() {
        assert!(matches!(
            pearson(&[1.0, 2.0], &[1.0]),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            pearson(&[1.0], &[2.0]),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_spearman_monotonic_transform() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 8.0, 27.0, 64.0, 125.0]; // x³, monotone
        assert!((spearman(&x, &y).unwrap() - 1.0).abs() < TOL);
    }

    #[test]
    fn test_spearman_with_ties() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [1.0, 2.0, 2.0, 3.0];
        assert!((spearman(&x, &y).unwrap() - 1.0).abs() < TOL);
    }

    #[test]
    fn test_kendall_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [10.0, 20.0, 30.0, 40.0];
        assert!((kendall(&x, &y).unwrap() - 1.0).abs() < TOL);
        let rev = [40.0, 30.0, 20.0, 10.0];
        assert!((kendall(&x, &rev).unwrap() + 1.0).abs() < TOL);
    }

    #[test]
    fn test_kendall_tau_b_ties() {
        // 5 concordant pairs, 1 pair tied in x: tau-b = 5 / sqrt(5 * 6).
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        let expected = 5.0 / (30.0_f64).sqrt();
        assert!((kendall(&x, &y).unwrap() - expected).abs() < TOL);
    }

    #[test]
    fn test_kendall_all_tied() {
        let x = [1.0, 1.0, 1.0];
        let y = [1.0, 2.0, 3.0];
        assert!(kendall(&x, &y).unwrap().abs() < TOL);
    }

    #[test]
    fn test_rank_average_ties() {
        assert_eq!(
            rank_average(&[10.0, 20.0, 20.0, 30.0]),
            vec![1.0, 2.5, 2.5, 4.0]
        );
    }

    #[test]
    fn test_matrix_symmetric_unit_diagonal() {
        let columns = vec![
            ("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]),
            ("b".to_string(), vec![4.0, 3.0, 2.0, 1.0]),
            ("c".to_string(), vec![1.0, 3.0, 2.0, 4.0]),
        ];
        let m = correlation_matrix(&columns, CorrelationMethod::Pearson).unwrap();
        assert_eq!(m.n(), 3);
        for i in 0..3 {
            assert!((m.get(i, i) - 1.0).abs() < TOL);
            for j in 0..3 {
                assert!((m.get(i, j) - m.get(j, i)).abs() < TOL);
            }
        }
        assert!((m.get(0, 1) + 1.0).abs() < TOL);
        assert_eq!(m.labels(), &["a", "b", "c"]);
    }

    #[test]
    fn test_matrix_needs_two_fields() {
        let columns = vec![("a".to_string(), vec![1.0, 2.0])];
        assert!(matches!(
            correlation_matrix(&columns, CorrelationMethod::Pearson),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_matrix_ragged_columns() {
        let columns = vec![
            ("a".to_string(), vec![1.0, 2.0, 3.0]),
            ("b".to_string(), vec![1.0, 2.0]),
        ];
        assert!(matches!(
            correlation_matrix(&columns, CorrelationMethod::Pearson),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_matrix_display_contains_labels() {
        let columns = vec![
            ("pop".to_string(), vec![1.0, 2.0, 3.0]),
            ("income".to_string(), vec![2.0, 4.0, 6.0]),
        ];
        let m = correlation_matrix(&columns, CorrelationMethod::Spearman).unwrap();
        let text = m.to_string();
        assert!(text.contains("pop"));
        assert!(text.contains("income"));
        assert!(text.contains("1.000"));
    }
}
