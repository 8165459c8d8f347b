//! Two-level stacked ensemble.
//!
//! Base learners (class-balanced logistic regression and a random
//! forest) feed a logistic meta-learner. The meta-learner is fit on
//! out-of-fold base probabilities from a stratified k-fold pass, so it
//! never sees a probability produced by a model that trained on the
//! same row. Base learners are then refit on the full partition.

use serde::{Deserialize, Serialize};

use crate::error::{TrainError, CANCER_CLASS, NORMAL_CLASS};
use crate::forest::{ForestConfig, RandomForest};
use crate::logistic::{LogisticConfig, LogisticRegression};
use crate::split::stratified_kfold;
use crate::BandReadings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackingConfig {
    pub cv_folds: usize,
    pub base_logistic: LogisticConfig,
    pub forest: ForestConfig,
    pub meta_logistic: LogisticConfig,
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            cv_folds: 5,
            base_logistic: LogisticConfig {
                balanced: true,
                ..LogisticConfig::default()
            },
            forest: ForestConfig::default(),
            meta_logistic: LogisticConfig {
                max_iter: 500,
                ..LogisticConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedEnsemble {
    logistic: LogisticRegression,
    forest: RandomForest,
    meta: LogisticRegression,
}

impl StackedEnsemble {
    pub fn fit(
        readings: &[BandReadings],
        labels: &[bool],
        config: &StackingConfig,
    ) -> Result<Self, TrainError> {
        if readings.is_empty() {
            return Err(TrainError::EmptyDataset);
        }

        let folds = stratified_kfold(labels, config.cv_folds);
        let mut meta_features = vec![[0.0f64; 2]; readings.len()];

        for (fold_index, fold) in folds.iter().enumerate() {
            let mut in_fold = vec![false; readings.len()];
            for &i in fold {
                in_fold[i] = true;
            }
            let train_rows: Vec<usize> = (0..readings.len()).filter(|&i| !in_fold[i]).collect();

            let fold_readings: Vec<BandReadings> =
                train_rows.iter().map(|&i| readings[i]).collect();
            let fold_labels: Vec<bool> = train_rows.iter().map(|&i| labels[i]).collect();

            let forest_config = ForestConfig {
                seed: config.forest.seed.wrapping_add(1 + fold_index as u64),
                ..config.forest
            };
            let (logistic, forest) =
                fit_base(&fold_readings, &fold_labels, config, &forest_config)?;

            for &i in fold {
                meta_features[i] = [
                    logistic.predict_proba(&readings[i]),
                    forest.predict_proba(&readings[i]),
                ];
            }
        }

        let meta = LogisticRegression::fit(&meta_features, labels, &config.meta_logistic)
            .ok_or(TrainError::ClassAbsent(CANCER_CLASS))?;

        let (logistic, forest) = fit_base(readings, labels, config, &config.forest)?;

        Ok(Self {
            logistic,
            forest,
            meta,
        })
    }

    pub fn predict_proba(&self, reading: &BandReadings) -> f64 {
        let base = [
            self.logistic.predict_proba(reading),
            self.forest.predict_proba(reading),
        ];
        self.meta.predict_proba(&base)
    }
}

fn fit_base(
    readings: &[BandReadings],
    labels: &[bool],
    config: &StackingConfig,
    forest_config: &ForestConfig,
) -> Result<(LogisticRegression, RandomForest), TrainError> {
    let missing = || {
        if labels.iter().all(|&l| l) {
            TrainError::ClassTooSmall(NORMAL_CLASS)
        } else {
            TrainError::ClassTooSmall(CANCER_CLASS)
        }
    };
    let logistic = LogisticRegression::fit(readings, labels, &config.base_logistic)
        .ok_or_else(missing)?;
    let forest = RandomForest::fit(readings, labels, forest_config).ok_or_else(missing)?;
    Ok((logistic, forest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifted_classes(n_per_class: usize) -> (Vec<BandReadings>, Vec<bool>) {
        let mut readings = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_per_class {
            let t = (i as f64) / (n_per_class as f64);
            readings.push([0.5 + 0.2 * t, 0.4 - 0.1 * t, 0.6, 0.5 + 0.05 * t]);
            labels.push(false);
            readings.push([1.5 - 0.2 * t, 1.6 + 0.1 * t, 1.4, 1.5 - 0.05 * t]);
            labels.push(true);
        }
        (readings, labels)
    }

    fn quick_config() -> StackingConfig {
        StackingConfig {
            forest: ForestConfig {
                n_trees: 10,
                ..ForestConfig::default()
            },
            ..StackingConfig::default()
        }
    }

    #[test]
    fn stacked_probabilities_order_the_classes() {
        let (readings, labels) = shifted_classes(30);
        let stack = StackedEnsemble::fit(&readings, &labels, &quick_config()).unwrap();

        let p_normal = stack.predict_proba(&[0.5, 0.4, 0.6, 0.5]);
        let p_cancer = stack.predict_proba(&[1.5, 1.6, 1.4, 1.5]);
        assert!(p_normal < 0.5, "normal-side probability was {p_normal}");
        assert!(p_cancer > 0.5, "cancer-side probability was {p_cancer}");
    }

    #[test]
    fn fit_is_deterministic() {
        let (readings, labels) = shifted_classes(20);
        let a = StackedEnsemble::fit(&readings, &labels, &quick_config()).unwrap();
        let b = StackedEnsemble::fit(&readings, &labels, &quick_config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_class_partition_is_fatal() {
        let readings = vec![[1.0, 1.0, 1.0, 1.0]; 10];
        let labels = vec![false; 10];
        let err = StackedEnsemble::fit(&readings, &labels, &quick_config()).unwrap_err();
        assert_eq!(err, TrainError::ClassTooSmall(CANCER_CLASS));
    }

    #[test]
    fn empty_partition_is_fatal() {
        let err = StackedEnsemble::fit(&[], &[], &quick_config()).unwrap_err();
        assert_eq!(err, TrainError::EmptyDataset);
    }
}
