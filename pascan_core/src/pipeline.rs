//! Training orchestration and the scoring artifact.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::calibration::{CalibratedEnsemble, CalibrationConfig};
use crate::error::{InputError, TrainError};
use crate::metrics::{roc_auc, roc_curve, youden_threshold};
use crate::scaler::StandardScaler;
use crate::synth::{Dataset, DEFAULT_SEED};
use crate::{BandReadings, BAND_COUNT};

/// Training options. The single `seed` drives the hold-out shuffle and
/// every seeded stage below it, so one value reproduces a whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub validation_fraction: f64,
    pub seed: u64,
    pub calibration: CalibrationConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.2,
            seed: DEFAULT_SEED,
            calibration: CalibrationConfig::default(),
        }
    }
}

/// Validation-set figures recorded when the artifact was fitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub roc_auc: f64,
    pub n_train: usize,
    pub n_validation: usize,
}

/// Risk classification of a scored reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Low,
    High,
}

impl RiskLabel {
    /// High iff `probability >= threshold`; the boundary itself is high.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Result of scoring one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub probability: f64,
    pub threshold: f64,
    pub risk: RiskLabel,
}

/// The immutable fitted artifact: scaler, calibrated classifier and the
/// decision threshold derived from the same training run's validation
/// partition. Never refit any part of it after training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticModel {
    pub scaler: StandardScaler,
    pub ensemble: CalibratedEnsemble,
    pub threshold: f64,
    pub summary: ValidationSummary,
}

impl DiagnosticModel {
    /// Score one reading against the fitted artifact.
    ///
    /// The input must hold exactly [`BAND_COUNT`] finite values in the
    /// fixed band order; anything else is rejected before it reaches
    /// the model.
    pub fn score(&self, readings: &[f64]) -> Result<Diagnosis, InputError> {
        if readings.len() != BAND_COUNT {
            return Err(InputError::WrongArity {
                expected: BAND_COUNT,
                got: readings.len(),
            });
        }
        if let Some(index) = readings.iter().position(|v| !v.is_finite()) {
            return Err(InputError::NonFinite { index });
        }

        let mut reading = [0.0; BAND_COUNT];
        reading.copy_from_slice(readings);

        let scaled = self.scaler.transform(&reading);
        let probability = self.ensemble.predict_proba(&scaled);
        Ok(Diagnosis {
            probability,
            threshold: self.threshold,
            risk: RiskLabel::from_probability(probability, self.threshold),
        })
    }
}

/// Fit the full pipeline on a labelled dataset.
///
/// Stratified 80/20 hold-out, scaler fit on the training partition
/// only, calibrated stacked ensemble on the scaled training rows, then
/// a Youden-J threshold from the validation ROC curve. Any degenerate
/// class distribution is a fatal [`TrainError`].
pub fn train(dataset: &Dataset, config: &TrainConfig) -> Result<DiagnosticModel, TrainError> {
    if dataset.is_empty() {
        return Err(TrainError::EmptyDataset);
    }

    let split = crate::split::stratified_holdout(
        &dataset.labels,
        config.validation_fraction,
        config.seed,
    )?;

    let train_readings: Vec<BandReadings> =
        split.train.iter().map(|&i| dataset.readings[i]).collect();
    let train_labels: Vec<bool> = split.train.iter().map(|&i| dataset.labels[i]).collect();
    let val_readings: Vec<BandReadings> = split
        .validation
        .iter()
        .map(|&i| dataset.readings[i])
        .collect();
    let val_labels: Vec<bool> = split.validation.iter().map(|&i| dataset.labels[i]).collect();

    let scaler = StandardScaler::fit(&train_readings);
    let train_scaled = scaler.transform_batch(&train_readings);

    let mut calibration = config.calibration;
    calibration.stacking.forest.seed = config.seed;
    let ensemble = CalibratedEnsemble::fit(&train_scaled, &train_labels, &calibration)?;

    let val_scaled = scaler.transform_batch(&val_readings);
    let val_probs: Vec<f64> = val_scaled.iter().map(|r| ensemble.predict_proba(r)).collect();

    let curve = roc_curve(&val_probs, &val_labels);
    let threshold = youden_threshold(&curve)
        .ok_or(TrainError::ClassAbsent(crate::error::CANCER_CLASS))?;

    let summary = ValidationSummary {
        roc_auc: roc_auc(&val_probs, &val_labels),
        n_train: train_labels.len(),
        n_validation: val_labels.len(),
    };
    debug!(
        "trained on {} rows, validated on {} (roc_auc {:.4}, threshold {:.4})",
        summary.n_train, summary.n_validation, summary.roc_auc, threshold
    );

    Ok(DiagnosticModel {
        scaler,
        ensemble,
        threshold,
        summary,
    })
}
