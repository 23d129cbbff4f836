//! RBF-kernel support vector machine, one-vs-rest
//!
//! Each binary machine is trained with kernelized Pegasos (stochastic
//! sub-gradient descent on the hinge loss). The machine exposes decision
//! values only, so it carries no probability output.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{argmax, check_training_set, Classifier};
use crate::error::RehabError;

/// Regularization, kernel width and epoch count
#[derive(Debug, Clone, PartialEq)]
pub struct SvmParams {
    /// Inverse regularization strength
    pub c: f64,
    /// RBF width; `None` uses `1 / (n_features * var(X))`
    pub gamma: Option<f64>,
    /// Passes over the data, in sampled steps
    pub epochs: usize,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: None,
            epochs: 20,
        }
    }
}

/// Fitted one-vs-rest kernel machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSvm {
    n_classes: usize,
    gamma: f64,
    support_vectors: Vec<Vec<f64>>,
    /// `dual_coef[k][s]` weights support vector `s` in class `k`'s decision
    dual_coef: Vec<Vec<f64>>,
}

impl KernelSvm {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &SvmParams,
        rng: &mut StdRng,
    ) -> Result<Self, RehabError> {
        let n_features = check_training_set(x, y, n_classes)?;
        if params.c <= 0.0 {
            return Err(RehabError::TrainingError("C must be positive".to_string()));
        }

        let n = x.len();
        let gamma = params.gamma.unwrap_or_else(|| scale_gamma(x, n_features));
        let lambda = 1.0 / (params.c * n as f64);
        let steps = params.epochs.max(1) * n;

        let gram: Vec<Vec<f64>> = x
            .iter()
            .map(|a| x.iter().map(|b| rbf(a, b, gamma)).collect())
            .collect();

        let mut alphas: Vec<Vec<u32>> = Vec::with_capacity(n_classes);
        for class in 0..n_classes {
            let sign: Vec<f64> = y
                .iter()
                .map(|&label| if label == class { 1.0 } else { -1.0 })
                .collect();
            let mut alpha = vec![0u32; n];
            let mut active: Vec<usize> = Vec::new();

            for t in 1..=steps {
                let i = rng.gen_range(0..n);
                let margin: f64 = active
                    .iter()
                    .map(|&j| alpha[j] as f64 * sign[j] * gram[j][i])
                    .sum::<f64>()
                    / (lambda * t as f64);
                if sign[i] * margin < 1.0 {
                    if alpha[i] == 0 {
                        active.push(i);
                    }
                    alpha[i] += 1;
                }
            }
            alphas.push(alpha);
        }

        let support: Vec<usize> = (0..n)
            .filter(|&j| alphas.iter().any(|alpha| alpha[j] > 0))
            .collect();
        let scale = 1.0 / (lambda * steps as f64);
        let dual_coef = alphas
            .iter()
            .enumerate()
            .map(|(class, alpha)| {
                support
                    .iter()
                    .map(|&j| {
                        let sign = if y[j] == class { 1.0 } else { -1.0 };
                        alpha[j] as f64 * sign * scale
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            n_classes,
            gamma,
            support_vectors: support.iter().map(|&j| x[j].clone()).collect(),
            dual_coef,
        })
    }

    pub fn n_support(&self) -> usize {
        self.support_vectors.len()
    }

    /// One-vs-rest decision value per class
    pub fn decision_function(&self, x: &[f64]) -> Vec<f64> {
        let kernel: Vec<f64> = self
            .support_vectors
            .iter()
            .map(|sv| rbf(sv, x, self.gamma))
            .collect();
        self.dual_coef
            .iter()
            .map(|coef| coef.iter().zip(&kernel).map(|(c, k)| c * k).sum())
            .collect()
    }
}

impl Classifier for KernelSvm {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, x: &[f64]) -> usize {
        argmax(&self.decision_function(x))
    }
}

fn rbf(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    let dist: f64 = a.iter().zip(b).map(|(p, q)| (p - q).powi(2)).sum();
    (-gamma * dist).exp()
}

fn scale_gamma(x: &[Vec<f64>], n_features: usize) -> f64 {
    let count = (x.len() * n_features) as f64;
    let mean: f64 = x.iter().flatten().sum::<f64>() / count;
    let var: f64 = x.iter().flatten().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    if var > f64::EPSILON {
        1.0 / (n_features as f64 * var)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    fn corner_clusters() -> (Vec<Vec<f64>>, Vec<usize>) {
        let centres = [(-2.0, -2.0), (2.0, -2.0), (0.0, 2.0)];
        let mut x = Vec::new();
        let mut y = Vec::new();
        for (class, (cx, cy)) in centres.iter().enumerate() {
            for i in 0..12 {
                let dx = ((i % 4) as f64 - 1.5) * 0.2;
                let dy = ((i / 4) as f64 - 1.0) * 0.2;
                x.push(vec![cx + dx, cy + dy]);
                y.push(class);
            }
        }
        (x, y)
    }

    #[test]
    fn test_svm_separates_clusters() {
        let (x, y) = corner_clusters();
        let mut rng = StdRng::seed_from_u64(42);
        let svm = KernelSvm::fit(&x, &y, 3, &SvmParams::default(), &mut rng).unwrap();

        assert_eq!(svm.predict(&[-2.0, -2.0]), 0);
        assert_eq!(svm.predict(&[2.0, -2.0]), 1);
        assert_eq!(svm.predict(&[0.0, 2.0]), 2);
        assert!(svm.n_support() > 0);
    }

    #[test]
    fn test_svm_has_no_probabilities() {
        let (x, y) = corner_clusters();
        let mut rng = StdRng::seed_from_u64(1);
        let svm = KernelSvm::fit(&x, &y, 3, &SvmParams::default(), &mut rng).unwrap();
        assert!(svm.predict_proba(&[0.0, 0.0]).is_none());
    }

    #[test]
    fn test_scale_gamma() {
        let x = vec![vec![1.0, -1.0], vec![1.0, -1.0]];
        // variance over all entries is 1
        assert!((scale_gamma(&x, 2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_c_rejected() {
        let (x, y) = corner_clusters();
        let params = SvmParams {
            c: 0.0,
            ..Default::default()
        };
        let result = KernelSvm::fit(&x, &y, 3, &params, &mut StdRng::seed_from_u64(1));
        assert!(matches!(result, Err(RehabError::TrainingError(_))));
    }
}
