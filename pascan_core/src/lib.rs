//! pascan_core — photoacoustic spectral cancer-risk screening pipeline.
//!
//! Generates synthetic two-population spectral datasets, trains a
//! calibrated stacked classifier with a ROC-derived decision threshold,
//! and scores new four-band readings against the fitted artifact.
//!
//! The fitted [`DiagnosticModel`] is immutable: it is built once by
//! [`train`] and only ever read afterwards, so it can be shared freely
//! across concurrent scoring calls.

pub mod calibration;
pub mod error;
pub mod forest;
pub mod logistic;
pub mod metrics;
pub mod pipeline;
pub mod scaler;
pub mod split;
pub mod stacking;
pub mod synth;
pub mod tree;

pub use error::{InputError, TrainError};
pub use pipeline::{train, Diagnosis, DiagnosticModel, RiskLabel, TrainConfig, ValidationSummary};
pub use synth::{generate, Dataset};

/// Number of spectral bands per reading.
pub const BAND_COUNT: usize = 4;

/// One spectral reading: absorbance-like values in fixed band order.
pub type BandReadings = [f64; BAND_COUNT];

/// Band names in their fixed semantic order.
pub const BAND_NAMES: [&str; BAND_COUNT] = [
    "C=O (~1720 cm^-1)",
    "CH3 (~1300 cm^-1)",
    "C-OH (~1100 cm^-1)",
    "O-H (~3500 cm^-1)",
];

/// Per-band means of the normal population.
pub const NORMAL_MEANS: BandReadings = [1.2, 1.8, 2.8, 2.2];

/// Per-band standard deviations shared by both populations.
pub const NORMAL_STDS: BandReadings = [0.4, 0.6, 0.7, 0.9];

/// Additive per-band mean shift of the cancer population.
pub const CANCER_SHIFT: BandReadings = [0.8, 0.9, 0.5, 1.9];
