//! CART classification tree
//!
//! Axis-aligned binary splits chosen by weighted Gini impurity. Leaves store
//! the normalized weighted class distribution of their training samples.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{argmax, check_training_set, class_counts, Classifier};
use crate::error::RehabError;

/// Class weighting applied to training samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    #[default]
    Uniform,
    /// `n_samples / (n_classes * class_count)`
    Balanced,
}

impl ClassWeight {
    /// Weight per class index
    pub fn weights(&self, y: &[usize], n_classes: usize) -> Vec<f64> {
        match self {
            ClassWeight::Uniform => vec![1.0; n_classes],
            ClassWeight::Balanced => {
                let n = y.len() as f64;
                class_counts(y, n_classes)
                    .into_iter()
                    .map(|count| {
                        if count == 0 {
                            0.0
                        } else {
                            n / (n_classes as f64 * count as f64)
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Tree growth limits
#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; all when `None`
    pub max_features: Option<usize>,
    pub class_weight: ClassWeight,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            class_weight: ClassWeight::Uniform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    n_classes: usize,
    root: Node,
}

impl DecisionTree {
    /// Fit on the full training set
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, RehabError> {
        check_training_set(x, y, n_classes)?;
        let class_weights = params.class_weight.weights(y, n_classes);
        let indices = (0..x.len()).collect();
        Ok(Self::fit_indices(
            x,
            y,
            n_classes,
            &class_weights,
            indices,
            params,
            rng,
        ))
    }

    /// Fit on a (possibly repeating) subset of sample indices
    pub(crate) fn fit_indices(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        class_weights: &[f64],
        indices: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let builder = Builder {
            x,
            y,
            n_classes,
            class_weights,
            params,
        };
        let root = builder.build(indices, 0, rng);
        Self { n_classes, root }
    }

    /// A single-leaf tree that always predicts `class` with certainty
    pub fn constant(n_classes: usize, class: usize) -> Self {
        let mut distribution = vec![0.0; n_classes];
        if let Some(slot) = distribution.get_mut(class) {
            *slot = 1.0;
        }
        Self {
            n_classes,
            root: Node::Leaf { distribution },
        }
    }

    /// Depth of the deepest leaf; a single leaf has depth 0
    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }

    fn leaf_distribution(&self, x: &[f64]) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
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

impl Classifier for DecisionTree {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, x: &[f64]) -> usize {
        argmax(self.leaf_distribution(x))
    }

    fn predict_proba(&self, x: &[f64]) -> Option<Vec<f64>> {
        Some(self.leaf_distribution(x).to_vec())
    }
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    class_weights: &'a [f64],
    params: &'a TreeParams,
}

impl Builder<'_> {
    fn build(&self, indices: Vec<usize>, depth: usize, rng: &mut StdRng) -> Node {
        let counts = self.weighted_counts(&indices);
        let total: f64 = counts.iter().sum();

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        let too_small = indices.len() < self.params.min_samples_split
            || indices.len() < 2 * self.params.min_samples_leaf;
        let pure = counts.iter().filter(|c| **c > 0.0).count() <= 1;

        if depth_reached || too_small || pure {
            return leaf(counts, total);
        }

        let Some((feature, threshold)) = self.best_split(&indices, &counts, total, rng) else {
            return leaf(counts, total);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[i][feature] <= threshold);
        if left.is_empty() || right.is_empty() {
            return leaf(counts, total);
        }

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(left, depth + 1, rng)),
            right: Box::new(self.build(right, depth + 1, rng)),
        }
    }

    fn weighted_counts(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += self.class_weights[self.y[i]];
        }
        counts
    }

    fn best_split(
        &self,
        indices: &[usize],
        counts: &[f64],
        total: f64,
        rng: &mut StdRng,
    ) -> Option<(usize, f64)> {
        let n_features = self.x[0].len();
        // with max_features, visit features in random order and keep drawing
        // past the quota until some valid split turns up
        let quota = self
            .params
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features);
        let order: Vec<usize> = if quota < n_features {
            sample(rng, n_features, n_features).into_vec()
        } else {
            (0..n_features).collect()
        };

        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_score = total * gini(counts, total);
        let mut best: Option<(usize, f64, f64)> = None;

        for (visited, feature) in order.into_iter().enumerate() {
            if visited >= quota && best.is_some() {
                break;
            }

            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| {
                self.x[a][feature]
                    .partial_cmp(&self.x[b][feature])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left = vec![0.0; self.n_classes];
            let mut left_total = 0.0;
            let mut right = vec![0.0; self.n_classes];

            for pos in 0..sorted.len() - 1 {
                let i = sorted[pos];
                let w = self.class_weights[self.y[i]];
                left[self.y[i]] += w;
                left_total += w;

                let n_left = pos + 1;
                if n_left < min_leaf || sorted.len() - n_left < min_leaf {
                    continue;
                }

                let here = self.x[i][feature];
                let next = self.x[sorted[pos + 1]][feature];
                if next <= here {
                    continue;
                }

                for ((r, c), l) in right.iter_mut().zip(counts).zip(&left) {
                    *r = c - l;
                }
                let right_total = total - left_total;
                let score =
                    left_total * gini(&left, left_total) + right_total * gini(&right, right_total);

                if best.map_or(true, |(_, _, s)| score < s) {
                    best = Some((feature, (here + next) / 2.0, score));
                }
            }
        }

        best.filter(|(_, _, score)| *score < parent_score - 1e-12)
            .map(|(feature, threshold, _)| (feature, threshold))
    }
}

fn leaf(counts: Vec<f64>, total: f64) -> Node {
    let n = counts.len().max(1) as f64;
    let distribution = if total > 0.0 {
        counts.into_iter().map(|c| c / total).collect()
    } else {
        vec![1.0 / n; counts.len()]
    };
    Node::Leaf { distribution }
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}
