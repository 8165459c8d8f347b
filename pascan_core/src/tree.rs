//! CART classification trees with weighted Gini splits.
//!
//! Trees grow until leaves are pure (or no candidate split improves
//! impurity), choosing each split from a random feature subset. Leaves
//! store the weighted positive-class fraction, so a tree yields a
//! probability rather than a bare vote.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{BandReadings, BAND_COUNT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probability: f64,
    },
}

/// Growth limits. `max_features` is the number of candidate features
/// drawn (without replacement) at every split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeConfig {
    pub max_features: usize,
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            // floor(sqrt(BAND_COUNT)), the usual forest heuristic
            max_features: 2,
            min_samples_split: 2,
            max_depth: None,
        }
    }
}

/// An arena-allocated decision tree over band readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    root: usize,
}

impl DecisionTree {
    /// Grow a tree on the rows named by `indices` (which may repeat,
    /// as in a bootstrap sample). `class_weights` is `[w_normal, w_cancer]`.
    pub fn fit(
        readings: &[BandReadings],
        labels: &[bool],
        indices: &[usize],
        class_weights: [f64; 2],
        config: &TreeConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let mut builder = TreeBuilder {
            readings,
            labels,
            class_weights,
            config,
            nodes: Vec::new(),
        };
        let root = builder.grow(indices, 0, rng);
        Self {
            nodes: builder.nodes,
            root,
        }
    }

    /// Weighted positive fraction of the leaf this reading falls into.
    pub fn predict_proba(&self, reading: &BandReadings) -> f64 {
        let mut index = self.root;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { probability } => return *probability,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if reading[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }
}

struct TreeBuilder<'a> {
    readings: &'a [BandReadings],
    labels: &'a [bool],
    class_weights: [f64; 2],
    config: &'a TreeConfig,
    nodes: Vec<TreeNode>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, indices: &[usize], depth: usize, rng: &mut impl Rng) -> usize {
        let (w_pos, w_total) = self.weigh(indices);
        let probability = if w_total > 0.0 { w_pos / w_total } else { 0.0 };

        let depth_capped = self.config.max_depth.is_some_and(|d| depth >= d);
        let pure = w_pos == 0.0 || w_pos == w_total;
        if depth_capped || pure || indices.len() < self.config.min_samples_split {
            return self.push(TreeNode::Leaf { probability });
        }

        let Some((feature, threshold)) = self.best_split(indices, rng) else {
            return self.push(TreeNode::Leaf { probability });
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.readings[i][feature] <= threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return self.push(TreeNode::Leaf { probability });
        }

        let left = self.grow(&left_rows, depth + 1, rng);
        let right = self.grow(&right_rows, depth + 1, rng);
        self.push(TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        })
    }

    /// Best (feature, threshold) over a random feature subset, by
    /// weighted Gini decrease. Thresholds are midpoints between
    /// consecutive distinct values.
    fn best_split(&self, indices: &[usize], rng: &mut impl Rng) -> Option<(usize, f64)> {
        let mut features: Vec<usize> = (0..BAND_COUNT).collect();
        features.shuffle(rng);
        features.truncate(self.config.max_features.clamp(1, BAND_COUNT));

        let (w_pos, w_total) = self.weigh(indices);
        let parent_gini = gini(w_pos, w_total);

        let mut best: Option<(usize, f64)> = None;
        let mut best_decrease = 1e-12;

        for feature in features {
            let mut column: Vec<(f64, f64, f64)> = indices
                .iter()
                .map(|&i| {
                    let w = self.weight_of(i);
                    let pos = if self.labels[i] { w } else { 0.0 };
                    (self.readings[i][feature], w, pos)
                })
                .collect();
            column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_w = 0.0;
            let mut left_pos = 0.0;
            for window in 0..column.len() - 1 {
                let (value, w, pos) = column[window];
                left_w += w;
                left_pos += pos;

                let next_value = column[window + 1].0;
                if next_value <= value {
                    continue;
                }

                let right_w = w_total - left_w;
                let right_pos = w_pos - left_pos;
                let weighted = (left_w / w_total) * gini(left_pos, left_w)
                    + (right_w / w_total) * gini(right_pos, right_w);
                let decrease = parent_gini - weighted;
                if decrease > best_decrease {
                    best_decrease = decrease;
                    best = Some((feature, 0.5 * (value + next_value)));
                }
            }
        }

        best
    }

    fn weigh(&self, indices: &[usize]) -> (f64, f64) {
        let mut w_pos = 0.0;
        let mut w_total = 0.0;
        for &i in indices {
            let w = self.weight_of(i);
            w_total += w;
            if self.labels[i] {
                w_pos += w;
            }
        }
        (w_pos, w_total)
    }

    fn weight_of(&self, index: usize) -> f64 {
        self.class_weights[usize::from(self.labels[index])]
    }

    fn push(&mut self, node: TreeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// Two-class Gini impurity from the positive weight and total weight.
fn gini(w_pos: f64, w_total: f64) -> f64 {
    if w_total <= 0.0 {
        return 0.0;
    }
    let p = w_pos / w_total;
    2.0 * p * (1.0 - p)
}
