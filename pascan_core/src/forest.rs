//! Bootstrap random forest over band readings.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::tree::{DecisionTree, TreeConfig};
use crate::BandReadings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub tree: TreeConfig,
    /// Seed for bootstrap resampling and per-split feature draws.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeConfig::default(),
            seed: crate::synth::DEFAULT_SEED,
        }
    }
}

/// An ensemble of CART trees; the forest probability is the mean of
/// the per-tree leaf probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit `n_trees` trees, each on a bootstrap resample of the rows.
    /// Class weights are balanced on the labels passed here (not per
    /// bootstrap sample).
    ///
    /// Returns `None` for empty input or a single-class label vector.
    pub fn fit(readings: &[BandReadings], labels: &[bool], config: &ForestConfig) -> Option<Self> {
        if readings.is_empty() || readings.len() != labels.len() || config.n_trees == 0 {
            return None;
        }
        let n_pos = labels.iter().filter(|&&l| l).count();
        let n_neg = labels.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return None;
        }

        let n = labels.len();
        let class_weights = [
            n as f64 / (2.0 * n_neg as f64),
            n as f64 / (2.0 * n_pos as f64),
        ];

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);
        for _ in 0..config.n_trees {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(DecisionTree::fit(
                readings,
                labels,
                &sample,
                class_weights,
                &config.tree,
                &mut rng,
            ));
        }

        Some(Self { trees })
    }

    /// Mean positive-class probability across all trees.
    pub fn predict_proba(&self, reading: &BandReadings) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(reading)).sum();
        sum / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
