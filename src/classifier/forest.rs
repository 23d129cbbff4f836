//! Random forest of bootstrapped CART trees

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tree::{ClassWeight, DecisionTree, TreeParams};
use super::{argmax, check_training_set, Classifier};
use crate::error::RehabError;

/// Forest size and per-tree limits
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub class_weight: ClassWeight,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            class_weight: ClassWeight::Uniform,
        }
    }
}

/// Bagged ensemble; probabilities are the mean of the trees' leaf distributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Result<Self, RehabError> {
        let n_features = check_training_set(x, y, n_classes)?;
        if params.n_trees == 0 {
            return Err(RehabError::TrainingError(
                "forest needs at least one tree".to_string(),
            ));
        }

        // class weights come from the full set, not each bootstrap draw
        let class_weights = params.class_weight.weights(y, n_classes);
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: Some(((n_features as f64).sqrt() as usize).max(1)),
            class_weight: params.class_weight,
        };

        let n = x.len();
        let trees = (0..params.n_trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit_indices(
                    x,
                    y,
                    n_classes,
                    &class_weights,
                    bootstrap,
                    &tree_params,
                    rng,
                )
            })
            .collect();

        Ok(Self { n_classes, trees })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn mean_distribution(&self, x: &[f64]) -> Vec<f64> {
        let mut mean = vec![0.0; self.n_classes];
        for tree in &self.trees {
            if let Some(proba) = tree.predict_proba(x) {
                for (m, p) in mean.iter_mut().zip(proba) {
                    *m += p;
                }
            }
        }
        let n = self.trees.len().max(1) as f64;
        mean.iter_mut().for_each(|m| *m /= n);
        mean
    }
}

impl Classifier for RandomForest {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, x: &[f64]) -> usize {
        argmax(&self.mean_distribution(x))
    }

    fn predict_proba(&self, x: &[f64]) -> Option<Vec<f64>> {
        Some(self.mean_distribution(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    fn two_cluster_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let jitter = (i % 5) as f64 * 0.1;
            x.push(vec![1.0 + jitter, 0.05 + jitter / 100.0]);
            y.push(0);
            x.push(vec![5.0 + jitter, 0.12 + jitter / 100.0]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn test_forest_separates_clusters() {
        let (x, y) = two_cluster_data();
        let params = ForestParams {
            n_trees: 15,
            max_depth: Some(4),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let forest = RandomForest::fit(&x, &y, 2, &params, &mut rng).unwrap();

        assert_eq!(forest.n_trees(), 15);
        assert_eq!(forest.predict(&[1.2, 0.05]), 0);
        assert_eq!(forest.predict(&[5.2, 0.12]), 1);

        let proba = forest.predict_proba(&[5.2, 0.12]).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba[1] > 0.9);
    }

    #[test]
    fn test_forest_is_deterministic_for_seed() {
        let (x, y) = two_cluster_data();
        let params = ForestParams {
            n_trees: 5,
            ..Default::default()
        };
        let a = RandomForest::fit(&x, &y, 2, &params, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = RandomForest::fit(&x, &y, 2, &params, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_trees_is_an_error() {
        let (x, y) = two_cluster_data();
        let params = ForestParams {
            n_trees: 0,
            ..Default::default()
        };
        let result = RandomForest::fit(&x, &y, 2, &params, &mut StdRng::seed_from_u64(1));
        assert!(matches!(result, Err(RehabError::TrainingError(_))));
    }
}
