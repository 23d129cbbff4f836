//! Multinomial logistic regression

use serde::{Deserialize, Serialize};

use super::{argmax, check_training_set, softmax, Classifier};
use crate::error::RehabError;

/// L2 strength, iteration cap and step size
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticParams {
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
    /// Stop once the gradient's max-norm falls below this
    pub tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            learning_rate: 0.1,
            tolerance: 1e-6,
        }
    }
}

/// Fitted softmax regression; the intercept is not penalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// `weights[k]` is class `k`'s coefficient vector
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    n_iter: usize,
}

impl LogisticRegression {
    /// Full-batch gradient descent on the mean cross-entropy plus
    /// `||W||^2 / (2 * C * n)`
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &LogisticParams,
    ) -> Result<Self, RehabError> {
        let n_features = check_training_set(x, y, n_classes)?;
        if params.c <= 0.0 {
            return Err(RehabError::TrainingError("C must be positive".to_string()));
        }

        let n = x.len() as f64;
        let penalty = 1.0 / (params.c * n);
        let mut weights = vec![vec![0.0; n_features]; n_classes];
        let mut intercepts = vec![0.0; n_classes];
        let mut n_iter = 0;

        for _ in 0..params.max_iter {
            n_iter += 1;
            let mut grad_w = vec![vec![0.0; n_features]; n_classes];
            let mut grad_b = vec![0.0; n_classes];

            for (row, &label) in x.iter().zip(y) {
                let proba = softmax(&logits(&weights, &intercepts, row));
                for class in 0..n_classes {
                    let err = proba[class] - if label == class { 1.0 } else { 0.0 };
                    grad_b[class] += err / n;
                    for (g, v) in grad_w[class].iter_mut().zip(row) {
                        *g += err * v / n;
                    }
                }
            }

            let mut max_grad: f64 = 0.0;
            for class in 0..n_classes {
                for (w, g) in weights[class].iter_mut().zip(&grad_w[class]) {
                    let g = g + penalty * *w;
                    max_grad = max_grad.max(g.abs());
                    *w -= params.learning_rate * g;
                }
                max_grad = max_grad.max(grad_b[class].abs());
                intercepts[class] -= params.learning_rate * grad_b[class];
            }

            if max_grad < params.tolerance {
                break;
            }
        }

        Ok(Self {
            weights,
            intercepts,
            n_iter,
        })
    }

    /// Iterations run before convergence or the cap
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }
}

impl Classifier for LogisticRegression {
    fn n_classes(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, x: &[f64]) -> usize {
        argmax(&logits(&self.weights, &self.intercepts, x))
    }

    fn predict_proba(&self, x: &[f64]) -> Option<Vec<f64>> {
        Some(softmax(&logits(&self.weights, &self.intercepts, x)))
    }
}

fn logits(weights: &[Vec<f64>], intercepts: &[f64], x: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .zip(intercepts)
        .map(|(w, b)| b + w.iter().zip(x).map(|(wi, xi)| wi * xi).sum::<f64>())
        .collect()
}
