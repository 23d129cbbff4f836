//! Multiclass gradient boosting with softmax deviance
//!
//! One regression tree per class per stage is fitted to the negative gradient
//! (`one_hot - p`). Leaf values take a single Newton step,
//! `(K-1)/K * sum(r) / sum(|r| * (1-|r|))`, before shrinkage.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{argmax, check_training_set, class_counts, softmax, Classifier};
use crate::error::RehabError;

/// Stage count, tree depth and shrinkage
#[derive(Debug, Clone, PartialEq)]
pub struct BoostingParams {
    pub n_stages: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum RegressionNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<RegressionNode>,
        right: Box<RegressionNode>,
    },
}

impl RegressionNode {
    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                RegressionNode::Leaf { value } => return *value,
                RegressionNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

/// Fitted boosting ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    n_classes: usize,
    learning_rate: f64,
    /// Initial raw score per class (log prior)
    init: Vec<f64>,
    /// `stages[m][k]` is the tree for class `k` at stage `m`
    stages: Vec<Vec<RegressionNode>>,
}

impl GradientBoosting {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &BoostingParams,
    ) -> Result<Self, RehabError> {
        check_training_set(x, y, n_classes)?;
        let n = x.len();

        let init: Vec<f64> = class_counts(y, n_classes)
            .into_iter()
            .map(|count| (count.max(1) as f64 / n as f64).ln())
            .collect();

        let mut raw: Vec<Vec<f64>> = vec![init.clone(); n];
        let mut stages = Vec::with_capacity(params.n_stages);
        let indices: Vec<usize> = (0..n).collect();
        let k = n_classes as f64;

        for _ in 0..params.n_stages {
            let probs: Vec<Vec<f64>> = raw.iter().map(|r| softmax(r)).collect();
            let mut stage = Vec::with_capacity(n_classes);

            for class in 0..n_classes {
                let residuals: Vec<f64> = (0..n)
                    .map(|i| (if y[i] == class { 1.0 } else { 0.0 }) - probs[i][class])
                    .collect();

                let newton_step = |leaf: &[usize]| {
                    let numerator: f64 = leaf.iter().map(|&i| residuals[i]).sum();
                    let denominator: f64 = leaf
                        .iter()
                        .map(|&i| residuals[i].abs() * (1.0 - residuals[i].abs()))
                        .sum();
                    if denominator.abs() < 1e-150 {
                        0.0
                    } else {
                        (k - 1.0) / k * numerator / denominator
                    }
                };

                let grower = RegressionGrower {
                    x,
                    targets: &residuals,
                    max_depth: params.max_depth,
                    min_samples_split: params.min_samples_split.max(2),
                    min_samples_leaf: params.min_samples_leaf.max(1),
                    leaf_value: &newton_step,
                };
                let tree = grower.grow(indices.clone(), 0);

                for (i, row) in x.iter().enumerate() {
                    raw[i][class] += params.learning_rate * tree.evaluate(row);
                }
                stage.push(tree);
            }
            stages.push(stage);
        }

        Ok(Self {
            n_classes,
            learning_rate: params.learning_rate,
            init,
            stages,
        })
    }

    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    fn raw_scores(&self, x: &[f64]) -> Vec<f64> {
        let mut raw = self.init.clone();
        for stage in &self.stages {
            for (score, tree) in raw.iter_mut().zip(stage) {
                *score += self.learning_rate * tree.evaluate(x);
            }
        }
        raw
    }
}

impl Classifier for GradientBoosting {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, x: &[f64]) -> usize {
        argmax(&self.raw_scores(x))
    }

    fn predict_proba(&self, x: &[f64]) -> Option<Vec<f64>> {
        Some(softmax(&self.raw_scores(x)))
    }
}

/// Least-squares regression tree grower with a pluggable leaf value
struct RegressionGrower<'a> {
    x: &'a [Vec<f64>],
    targets: &'a [f64],
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
    leaf_value: &'a dyn Fn(&[usize]) -> f64,
}

impl RegressionGrower<'_> {
    fn grow(&self, indices: Vec<usize>, depth: usize) -> RegressionNode {
        if depth >= self.max_depth
            || indices.len() < self.min_samples_split
            || indices.len() < 2 * self.min_samples_leaf
        {
            return self.leaf(&indices);
        }

        let Some((feature, threshold)) = self.best_split(&indices) else {
            return self.leaf(&indices);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.x[i][feature] <= threshold);
        if left.is_empty() || right.is_empty() {
            return self.leaf(&indices);
        }

        RegressionNode::Split {
            feature,
            threshold,
            left: Box::new(self.grow(left, depth + 1)),
            right: Box::new(self.grow(right, depth + 1)),
        }
    }

    fn leaf(&self, indices: &[usize]) -> RegressionNode {
        RegressionNode::Leaf {
            value: (self.leaf_value)(indices),
        }
    }

    fn best_split(&self, indices: &[usize]) -> Option<(usize, f64)> {
        let n_features = self.x[0].len();
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| self.targets[i].powi(2)).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;

        let mut best: Option<(usize, f64, f64)> = None;
        for feature in 0..n_features {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| {
                self.x[a][feature]
                    .partial_cmp(&self.x[b][feature])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..n - 1 {
                let t = self.targets[sorted[pos]];
                left_sum += t;
                left_sq += t * t;

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let here = self.x[sorted[pos]][feature];
                let next = self.x[sorted[pos + 1]][feature];
                if next <= here {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);

                if best.map_or(true, |(_, _, s)| sse < s) {
                    best = Some((feature, (here + next) / 2.0, sse));
                }
            }
        }

        best.filter(|(_, _, sse)| *sse < parent_sse - 1e-12)
            .map(|(feature, threshold, _)| (feature, threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn three_band_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..60 {
            let v = i as f64 / 10.0;
            x.push(vec![v, 1.0]);
            y.push((i / 20) as usize);
        }
        (x, y)
    }

    #[test]
    fn test_boosting_learns_bands() {
        let (x, y) = three_band_data();
        let params = BoostingParams {
            n_stages: 20,
            max_depth: 2,
            ..Default::default()
        };
        let model = GradientBoosting::fit(&x, &y, 3, &params).unwrap();

        assert_eq!(model.n_stages(), 20);
        assert_eq!(model.predict(&[0.5, 1.0]), 0);
        assert_eq!(model.predict(&[3.0, 1.0]), 1);
        assert_eq!(model.predict(&[5.5, 1.0]), 2);

        let proba = model.predict_proba(&[5.5, 1.0]).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba[2] > 0.5);
    }

    #[test]
    fn test_zero_stages_predicts_prior() {
        let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![1, 1, 1, 0];
        let params = BoostingParams {
            n_stages: 0,
            ..Default::default()
        };
        let model = GradientBoosting::fit(&x, &y, 2, &params).unwrap();

        assert_eq!(model.predict(&[0.0]), 1);
        let proba = model.predict_proba(&[0.0]).unwrap();
        assert!((proba[1] - 0.75).abs() < 1e-12);
    }
}
