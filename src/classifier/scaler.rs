//! Per-feature standardization

use serde::{Deserialize, Serialize};

/// Zero-mean, unit-variance scaling fitted on training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on row-major samples. Constant features get a unit scale.
    pub fn fit(x: &[Vec<f64>]) -> Self {
        let n_features = x.first().map(|row| row.len()).unwrap_or(0);
        let n = x.len().max(1) as f64;

        let mut mean = vec![0.0; n_features];
        for row in x {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = vec![0.0; n_features];
        for row in x {
            for ((s, v), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        for s in &mut scale {
            let std = (*s / n).sqrt();
            *s = if std > f64::EPSILON { std } else { 1.0 };
        }

        Self { mean, scale }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn transform_all(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        x.iter().map(|row| self.transform(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform() {
        let x = vec![vec![1.0, 10.0], vec![3.0, 10.0], vec![5.0, 10.0]];
        let scaler = StandardScaler::fit(&x);
        let scaled = scaler.transform_all(&x);

        let mean0: f64 = scaled.iter().map(|r| r[0]).sum::<f64>() / 3.0;
        let var0: f64 = scaled.iter().map(|r| r[0] * r[0]).sum::<f64>() / 3.0;
        assert!(mean0.abs() < 1e-12);
        assert!((var0 - 1.0).abs() < 1e-12);

        // constant column is centred but not rescaled
        assert_eq!(scaled[0][1], 0.0);
        assert_eq!(scaler.n_features(), 2);
    }
}
