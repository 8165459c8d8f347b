//! End-to-end pipeline behavior on seeded synthetic data.

use pretty_assertions::assert_eq;

use pascan_core::calibration::CalibrationConfig;
use pascan_core::forest::ForestConfig;
use pascan_core::metrics::roc_curve;
use pascan_core::scaler::StandardScaler;
use pascan_core::split::stratified_holdout;
use pascan_core::stacking::StackingConfig;
use pascan_core::synth::{generate, generate_default, ABSORBANCE_FLOOR};
use pascan_core::{train, InputError, RiskLabel, TrainConfig, BAND_COUNT, NORMAL_MEANS};

/// A reduced forest keeps the non-default-path tests quick.
fn quick_config(seed: u64) -> TrainConfig {
    TrainConfig {
        seed,
        calibration: CalibrationConfig {
            stacking: StackingConfig {
                forest: ForestConfig {
                    n_trees: 15,
                    ..ForestConfig::default()
                },
                ..StackingConfig::default()
            },
            ..CalibrationConfig::default()
        },
        ..TrainConfig::default()
    }
}

#[test]
fn generation_is_reproducible_and_counted() {
    let a = generate(2000, 0.35, 0.15, 42);
    let b = generate(2000, 0.35, 0.15, 42);
    assert_eq!(a, b);

    assert_eq!(a.len(), 2000);
    assert_eq!(a.positives(), 700); // floor(2000 * 0.35)

    for reading in &a.readings {
        for &value in reading {
            assert!(value >= ABSORBANCE_FLOOR);
        }
    }
}

#[test]
fn scaler_standardizes_the_training_partition() {
    let dataset = generate(600, 0.35, 0.15, 42);
    let split = stratified_holdout(&dataset.labels, 0.2, 42).unwrap();

    let train_rows: Vec<_> = split.train.iter().map(|&i| dataset.readings[i]).collect();
    let scaler = StandardScaler::fit(&train_rows);
    let scaled = scaler.transform_batch(&train_rows);

    for band in 0..BAND_COUNT {
        let n = scaled.len() as f64;
        let mean: f64 = scaled.iter().map(|r| r[band]).sum::<f64>() / n;
        let var: f64 = scaled.iter().map(|r| (r[band] - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9, "band {band} mean {mean}");
        assert!((var - 1.0).abs() < 1e-9, "band {band} variance {var}");
    }
}

#[test]
fn training_is_deterministic() {
    let dataset = generate(400, 0.35, 0.15, 7);
    let a = train(&dataset, &quick_config(7)).unwrap();
    let b = train(&dataset, &quick_config(7)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn threshold_lies_on_the_validation_roc_curve() {
    let dataset = generate(400, 0.35, 0.15, 9);
    let config = quick_config(9);
    let model = train(&dataset, &config).unwrap();

    assert!((0.0..=1.0).contains(&model.threshold));

    // Rebuild the validation partition the trainer used and recompute
    // its ROC curve from the served probabilities.
    let split = stratified_holdout(&dataset.labels, config.validation_fraction, config.seed).unwrap();
    let probs: Vec<f64> = split
        .validation
        .iter()
        .map(|&i| model.score(&dataset.readings[i]).unwrap().probability)
        .collect();
    let labels: Vec<bool> = split.validation.iter().map(|&i| dataset.labels[i]).collect();
    let curve = roc_curve(&probs, &labels);

    assert!(
        curve.iter().any(|p| p.threshold == model.threshold),
        "threshold {} not on the validation ROC curve",
        model.threshold
    );
}

#[test]
fn scoring_is_deterministic() {
    let dataset = generate(400, 0.35, 0.15, 3);
    let model = train(&dataset, &quick_config(3)).unwrap();

    let reading = [1.4, 2.1, 2.9, 2.6];
    let first = model.score(&reading).unwrap();
    let second = model.score(&reading).unwrap();
    assert_eq!(first, second);
}

#[test]
fn default_pipeline_separates_the_populations() {
    let dataset = generate_default();
    let model = train(&dataset, &TrainConfig::default()).unwrap();

    assert!(model.summary.roc_auc > 0.9, "auc {}", model.summary.roc_auc);

    // The normal population's own means must sit below the threshold.
    let normal = model.score(&NORMAL_MEANS).unwrap();
    assert!(normal.probability < model.threshold);
    assert_eq!(normal.risk, RiskLabel::Low);

    // A reading near the cancer-shifted means must sit at or above it.
    let shifted = model.score(&[2.0, 2.7, 3.3, 4.1]).unwrap();
    assert!(shifted.probability >= model.threshold);
    assert_eq!(shifted.risk, RiskLabel::High);
}

#[test]
fn malformed_readings_are_rejected_not_fatal() {
    let dataset = generate(400, 0.35, 0.15, 11);
    let model = train(&dataset, &quick_config(11)).unwrap();

    assert!(matches!(
        model.score(&[1.0, 2.0, 3.0]),
        Err(InputError::WrongArity {
            expected: 4,
            got: 3
        })
    ));
    assert!(matches!(
        model.score(&[1.0, 2.0, 3.0, f64::NAN]),
        Err(InputError::NonFinite { index: 3 })
    ));

    // The artifact still serves valid requests afterwards.
    assert!(model.score(&[1.2, 1.8, 2.8, 2.2]).is_ok());
}

#[test]
fn fitted_artifact_survives_a_json_round_trip() {
    let dataset = generate(240, 0.4, 0.15, 13);
    let model = train(&dataset, &quick_config(13)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagnostic_model.json");
    std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();

    let reloaded: pascan_core::DiagnosticModel =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(reloaded, model);

    let reading = [1.5, 2.0, 3.0, 2.8];
    assert_eq!(
        reloaded.score(&reading).unwrap(),
        model.score(&reading).unwrap()
    );
}
