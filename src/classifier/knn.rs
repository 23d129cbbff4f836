//! Distance-weighted k-nearest-neighbors

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{argmax, check_training_set, Classifier};
use crate::error::RehabError;

#[derive(Debug, Clone, PartialEq)]
pub struct KnnParams {
    pub k: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self { k: 5 }
    }
}

/// Stored training set voting by inverse euclidean distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNearestNeighbors {
    k: usize,
    n_classes: usize,
    samples: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl KNearestNeighbors {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &KnnParams,
    ) -> Result<Self, RehabError> {
        check_training_set(x, y, n_classes)?;
        if params.k == 0 {
            return Err(RehabError::TrainingError("k must be at least 1".to_string()));
        }
        Ok(Self {
            k: params.k,
            n_classes,
            samples: x.to_vec(),
            labels: y.to_vec(),
        })
    }

    /// Normalized class votes from the k nearest samples. Exact matches
    /// (zero distance) outvote everything else.
    fn votes(&self, x: &[f64]) -> Vec<f64> {
        let mut neighbors: Vec<(f64, usize)> = self
            .samples
            .iter()
            .zip(&self.labels)
            .map(|(s, &label)| (euclidean(s, x), label))
            .collect();
        neighbors.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        neighbors.truncate(self.k);

        let exact = neighbors.iter().any(|(d, _)| *d == 0.0);
        let mut votes = vec![0.0; self.n_classes];
        for (dist, label) in neighbors {
            let weight = if exact {
                if dist == 0.0 {
                    1.0
                } else {
                    0.0
                }
            } else {
                1.0 / dist
            };
            votes[label] += weight;
        }

        let total: f64 = votes.iter().sum();
        if total > 0.0 {
            votes.iter_mut().for_each(|v| *v /= total);
        }
        votes
    }
}

impl Classifier for KNearestNeighbors {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, x: &[f64]) -> usize {
        argmax(&self.votes(x))
    }

    fn predict_proba(&self, x: &[f64]) -> Option<Vec<f64>> {
        Some(self.votes(x))
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(p, q)| (p - q).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let x = vec![
            vec![0.0],
            vec![1.0],
            vec![2.0],
            vec![10.0],
            vec![11.0],
            vec![12.0],
        ];
        let y = vec![0, 0, 0, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_nearest_cluster_wins() {
        let (x, y) = line_data();
        let knn = KNearestNeighbors::fit(&x, &y, 2, &KnnParams { k: 3 }).unwrap();

        assert_eq!(knn.predict(&[1.5]), 0);
        assert_eq!(knn.predict(&[10.5]), 1);
    }

    #[test]
    fn test_distance_weighting_beats_majority() {
        let (x, y) = line_data();
        // k covers all six points; 5.5 sits nearer the first cluster
        let knn = KNearestNeighbors::fit(&x, &y, 2, &KnnParams { k: 6 }).unwrap();
        let proba = knn.predict_proba(&[5.5]).unwrap();

        assert!(proba[0] > proba[1]);
        assert_eq!(knn.predict(&[5.5]), 0);
    }

    #[test]
    fn test_exact_match_takes_all_weight() {
        let (x, y) = line_data();
        let knn = KNearestNeighbors::fit(&x, &y, 2, &KnnParams { k: 4 }).unwrap();

        assert_eq!(knn.predict_proba(&[2.0]), Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_zero_k_rejected() {
        let (x, y) = line_data();
        assert!(KNearestNeighbors::fit(&x, &y, 2, &KnnParams { k: 0 }).is_err());
    }
}
