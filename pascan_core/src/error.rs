//! Error types for training and scoring.

use thiserror::Error;

/// Fatal training preconditions. Front ends must refuse to serve when
/// `train` fails; none of these are recoverable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainError {
    #[error("dataset is empty")]
    EmptyDataset,

    /// A class is entirely absent, so stratified splitting and
    /// class-balanced fitting cannot proceed.
    #[error("no {0} samples in the dataset")]
    ClassAbsent(&'static str),

    /// A class is present but too small to survive the requested
    /// partitioning (hold-out split or an internal cross-validation fold).
    #[error("too few {0} samples to partition for training")]
    ClassTooSmall(&'static str),
}

/// Rejected scoring input. These never reach the model and never
/// terminate the serving process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("expected {expected} band readings, got {got}")]
    WrongArity { expected: usize, got: usize },

    #[error("band reading {index} is not a finite number")]
    NonFinite { index: usize },
}

pub(crate) const NORMAL_CLASS: &str = "normal";
pub(crate) const CANCER_CLASS: &str = "cancer";
