use anyhow::{Result, anyhow};

const MIN_STD: f64 = 1e-9;

/// Per-column z-scoring. Columns that are constant over the fit set map to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl Standardizer {
    pub fn fit(rows: &[&[f64]]) -> Self {
        let dim = rows.first().map(|r| r.len()).unwrap_or(0);
        let n = rows.len().max(1) as f64;
        let mut means = vec![0.0_f64; dim];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }
        let mut stds = vec![0.0_f64; dim];
        for row in rows {
            for ((s, v), m) in stds.iter_mut().zip(row.iter()).zip(&means) {
                *s += (v - m).powi(2);
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
        }
        Self { means, stds }
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(v, (m, s))| standardized(*v, *m, *s))
            .collect()
    }
}

pub fn standardized(raw: f64, mean: f64, std: f64) -> f64 {
    if std < MIN_STD {
        0.0
    } else {
        (raw - mean) / std
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    pub intercept: f64,
    pub coeffs: Vec<f64>,
}

impl RidgeFit {
    pub fn predict(&self, z: &[f64]) -> f64 {
        self.intercept + dot(&self.coeffs, z)
    }
}

/// Closed-form ridge on already standardized rows:
/// `(XᵀX/n + l2·I) β = Xᵀ(y − ȳ)/n`, intercept `ȳ`.
pub fn ridge_fit(z: &[Vec<f64>], y: &[f64], l2: f64) -> Result<RidgeFit> {
    if z.is_empty() || z.len() != y.len() {
        return Err(anyhow!(
            "ridge fit needs matching non-empty inputs ({} rows, {} targets)",
            z.len(),
            y.len()
        ));
    }
    let dim = z[0].len();
    let n = z.len() as f64;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut a = vec![vec![0.0_f64; dim]; dim];
    let mut b = vec![0.0_f64; dim];
    for (row, target) in z.iter().zip(y) {
        let r = target - y_mean;
        for i in 0..dim {
            let xi = row[i];
            if xi == 0.0 {
                continue;
            }
            b[i] += xi * r;
            for j in 0..=i {
                a[i][j] += xi * row[j];
            }
        }
    }
    for i in 0..dim {
        b[i] /= n;
        for j in 0..=i {
            a[i][j] /= n;
            a[j][i] = a[i][j];
        }
        a[i][i] += l2.max(MIN_STD);
    }

    let coeffs = cholesky_solve(a, &b)
        .ok_or_else(|| anyhow!("normal equations not positive definite (l2={l2})"))?;
    Ok(RidgeFit {
        intercept: y_mean,
        coeffs,
    })
}

/// Solves `A x = b` for symmetric positive-definite `A`.
pub fn cholesky_solve(mut a: Vec<Vec<f64>>, b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if a.len() != n {
        return None;
    }
    // In-place lower factor.
    for j in 0..n {
        let mut d = a[j][j];
        for k in 0..j {
            d -= a[j][k] * a[j][k];
        }
        if !d.is_finite() || d <= 0.0 {
            return None;
        }
        let d = d.sqrt();
        a[j][j] = d;
        for i in (j + 1)..n {
            let mut s = a[i][j];
            for k in 0..j {
                s -= a[i][k] * a[j][k];
            }
            a[i][j] = s / d;
        }
    }
    let mut y = vec![0.0_f64; n];
    for i in 0..n {
        let mut s = b[i];
        for k in 0..i {
            s -= a[i][k] * y[k];
        }
        y[i] = s / a[i][i];
    }
    let mut x = vec![0.0_f64; n];
    for i in (0..n).rev() {
        let mut s = y[i];
        for k in (i + 1)..n {
            s -= a[k][i] * x[k];
        }
        x[i] = s / a[i][i];
    }
    Some(x)
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn mean_abs_error(pred: &[f64], actual: &[f64]) -> f64 {
    if pred.is_empty() {
        return 0.0;
    }
    pred.iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / pred.len() as f64
}

pub fn rmse(pred: &[f64], actual: &[f64]) -> f64 {
    if pred.is_empty() {
        return 0.0;
    }
    (pred
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / pred.len() as f64)
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn cholesky_solves_small_system() {
        let a = vec![vec![4.0, 2.0], vec![2.0, 3.0]];
        let x = cholesky_solve(a, &[2.0, 1.0]).unwrap();
        assert_float_absolute_eq!(x[0], 0.5, 1e-12);
        assert_float_absolute_eq!(x[1], 0.0, 1e-12);
    }

    #[test]
    fn ridge_recovers_linear_signal() {
        let xs: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64, 7.0]).collect();
        let y: Vec<f64> = xs.iter().map(|r| 3.0 + 2.0 * r[0]).collect();
        let refs: Vec<&[f64]> = xs.iter().map(|r| r.as_slice()).collect();
        let std = Standardizer::fit(&refs);
        let z: Vec<Vec<f64>> = xs.iter().map(|r| std.transform(r)).collect();
        let fit = ridge_fit(&z, &y, 1e-6).unwrap();
        // constant column is degenerate and carries no weight
        assert_float_absolute_eq!(fit.coeffs[1], 0.0, 1e-9);
        let pred = fit.predict(&std.transform(&[10.0, 7.0]));
        assert_float_absolute_eq!(pred, 23.0, 1e-3);
    }
}
