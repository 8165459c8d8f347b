//! Probability calibration.
//!
//! Isotonic regression (pool-adjacent-violators) maps raw ensemble
//! scores onto well-calibrated probabilities. [`CalibratedEnsemble`]
//! reproduces the cross-validated calibration scheme: each member
//! pairs an ensemble fit on the out-of-fold rows with an isotonic map
//! fit on the held-out fold, and the calibrated probability is the
//! mean over members.

use serde::{Deserialize, Serialize};

use crate::error::TrainError;
use crate::split::stratified_kfold;
use crate::stacking::{StackedEnsemble, StackingConfig};
use crate::BandReadings;

/// A non-decreasing piecewise-linear map from scores to probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotonicRegression {
    /// Score knots, strictly increasing.
    pub thresholds: Vec<f64>,
    /// Calibrated value at each knot.
    pub values: Vec<f64>,
}

impl Default for IsotonicRegression {
    fn default() -> Self {
        // Identity map on [0, 1].
        Self {
            thresholds: vec![0.0, 1.0],
            values: vec![0.0, 1.0],
        }
    }
}

/// A block of pooled samples during PAV fitting.
#[derive(Debug, Clone, Copy)]
struct Block {
    x_min: f64,
    x_max: f64,
    sum: f64,
    weight: f64,
}

impl Block {
    fn mean(&self) -> f64 {
        self.sum / self.weight
    }
}

impl IsotonicRegression {
    /// Fit by pool-adjacent-violators on (score, label) pairs.
    /// Identical scores are pooled before PAV runs.
    pub fn fit(predictions: &[f64], labels: &[bool]) -> Self {
        if predictions.is_empty() || predictions.len() != labels.len() {
            return Self::default();
        }

        let mut pairs: Vec<(f64, f64)> = predictions
            .iter()
            .zip(labels.iter())
            .map(|(&p, &l)| (p, if l { 1.0 } else { 0.0 }))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut blocks: Vec<Block> = Vec::with_capacity(pairs.len());
        for (x, y) in pairs {
            match blocks.last_mut() {
                Some(last) if last.x_max == x => {
                    last.sum += y;
                    last.weight += 1.0;
                }
                _ => blocks.push(Block {
                    x_min: x,
                    x_max: x,
                    sum: y,
                    weight: 1.0,
                }),
            }
            // Merge backwards while monotonicity is violated.
            while blocks.len() >= 2 {
                let n = blocks.len();
                if blocks[n - 2].mean() <= blocks[n - 1].mean() {
                    break;
                }
                let last = blocks[n - 1];
                blocks.truncate(n - 1);
                let merged = &mut blocks[n - 2];
                merged.x_max = last.x_max;
                merged.sum += last.sum;
                merged.weight += last.weight;
            }
        }

        let mut thresholds = Vec::with_capacity(blocks.len() * 2);
        let mut values = Vec::with_capacity(blocks.len() * 2);
        for block in &blocks {
            thresholds.push(block.x_min);
            values.push(block.mean());
            if block.x_max > block.x_min {
                thresholds.push(block.x_max);
                values.push(block.mean());
            }
        }

        if thresholds.len() < 2 {
            return Self::default();
        }
        Self { thresholds, values }
    }

    /// Calibrated value for a score: clamped at the ends, linearly
    /// interpolated between knots.
    pub fn transform(&self, prediction: f64) -> f64 {
        let first = self.thresholds[0];
        let last = self.thresholds[self.thresholds.len() - 1];
        if prediction <= first {
            return self.values[0];
        }
        if prediction >= last {
            return self.values[self.values.len() - 1];
        }

        let upper = self.thresholds.partition_point(|&t| t < prediction);
        let t0 = self.thresholds[upper - 1];
        let t1 = self.thresholds[upper];
        let v0 = self.values[upper - 1];
        let v1 = self.values[upper];
        if t1 - t0 < 1e-12 {
            return v0;
        }
        let alpha = (prediction - t0) / (t1 - t0);
        v0 + alpha * (v1 - v0)
    }

    pub fn transform_batch(&self, predictions: &[f64]) -> Vec<f64> {
        predictions.iter().map(|&p| self.transform(p)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConfig {
    pub cv_folds: usize,
    pub stacking: StackingConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            cv_folds: 3,
            stacking: StackingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CalibratedMember {
    ensemble: StackedEnsemble,
    isotonic: IsotonicRegression,
}

/// Cross-validated isotonic calibration over stacked ensembles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedEnsemble {
    members: Vec<CalibratedMember>,
}

impl CalibratedEnsemble {
    pub fn fit(
        readings: &[BandReadings],
        labels: &[bool],
        config: &CalibrationConfig,
    ) -> Result<Self, TrainError> {
        if readings.is_empty() {
            return Err(TrainError::EmptyDataset);
        }

        let folds = stratified_kfold(labels, config.cv_folds);
        let mut members = Vec::with_capacity(folds.len());

        for (fold_index, fold) in folds.iter().enumerate() {
            let mut in_fold = vec![false; readings.len()];
            for &i in fold {
                in_fold[i] = true;
            }
            let train_rows: Vec<usize> = (0..readings.len()).filter(|&i| !in_fold[i]).collect();
            let fold_readings: Vec<BandReadings> =
                train_rows.iter().map(|&i| readings[i]).collect();
            let fold_labels: Vec<bool> = train_rows.iter().map(|&i| labels[i]).collect();

            let mut stacking = config.stacking;
            stacking.forest.seed = stacking
                .forest
                .seed
                .wrapping_add(101 * (1 + fold_index as u64));
            let ensemble = StackedEnsemble::fit(&fold_readings, &fold_labels, &stacking)?;

            let held_out_scores: Vec<f64> = fold
                .iter()
                .map(|&i| ensemble.predict_proba(&readings[i]))
                .collect();
            let held_out_labels: Vec<bool> = fold.iter().map(|&i| labels[i]).collect();
            let isotonic = IsotonicRegression::fit(&held_out_scores, &held_out_labels);

            members.push(CalibratedMember { ensemble, isotonic });
        }

        Ok(Self { members })
    }

    /// Mean calibrated probability over all members, clamped to [0, 1].
    pub fn predict_proba(&self, reading: &BandReadings) -> f64 {
        let sum: f64 = self
            .members
            .iter()
            .map(|m| m.isotonic.transform(m.ensemble.predict_proba(reading)))
            .sum();
        (sum / self.members.len() as f64).clamp(0.0, 1.0)
    }
}
