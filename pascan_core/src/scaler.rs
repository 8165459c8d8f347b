//! Per-band standardization.

use serde::{Deserialize, Serialize};

use crate::{BandReadings, BAND_COUNT};

/// Zero-mean / unit-variance transform fitted per band.
///
/// Fit once on the training partition and applied unchanged to
/// validation and inference inputs. A zero-variance band transforms
/// to zero rather than dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: BandReadings,
    pub std: BandReadings,
}

impl StandardScaler {
    pub fn fit(readings: &[BandReadings]) -> Self {
        let mut mean = [0.0; BAND_COUNT];
        let mut std = [0.0; BAND_COUNT];
        if readings.is_empty() {
            return Self { mean, std };
        }

        let n = readings.len() as f64;
        for reading in readings {
            for (acc, &value) in mean.iter_mut().zip(reading.iter()) {
                *acc += value;
            }
        }
        for acc in mean.iter_mut() {
            *acc /= n;
        }

        for reading in readings {
            for ((acc, &value), &mean) in std.iter_mut().zip(reading.iter()).zip(mean.iter()) {
                let d = value - mean;
                *acc += d * d;
            }
        }
        for acc in std.iter_mut() {
            *acc = (*acc / n).sqrt();
        }

        Self { mean, std }
    }

    pub fn transform(&self, reading: &BandReadings) -> BandReadings {
        let mut out = [0.0; BAND_COUNT];
        for i in 0..BAND_COUNT {
            out[i] = if self.std[i] == 0.0 {
                0.0
            } else {
                (reading[i] - self.mean[i]) / self.std[i]
            };
        }
        out
    }

    pub fn transform_batch(&self, readings: &[BandReadings]) -> Vec<BandReadings> {
        readings.iter().map(|r| self.transform(r)).collect()
    }
}
