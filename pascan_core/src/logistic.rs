//! Logistic regression fitted by batch gradient descent.

use serde::{Deserialize, Serialize};

/// Fitting options. `balanced` reweights samples inversely to class
/// frequency so the minority class contributes equally to the gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticConfig {
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub balanced: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-8,
            balanced: false,
        }
    }
}

/// A binary logistic model over an arbitrary feature count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogisticRegression {
    /// Fit by batch gradient descent, stopping early once every
    /// parameter update falls below `tol`.
    ///
    /// Returns `None` for empty input, ragged feature rows, or a
    /// single-class label vector (the gradient cannot separate what is
    /// not there).
    pub fn fit<R: AsRef<[f64]>>(
        features: &[R],
        labels: &[bool],
        config: &LogisticConfig,
    ) -> Option<Self> {
        if features.is_empty() || features.len() != labels.len() {
            return None;
        }
        let n_features = features[0].as_ref().len();
        if n_features == 0 || features.iter().any(|r| r.as_ref().len() != n_features) {
            return None;
        }

        let n_pos = labels.iter().filter(|&&l| l).count();
        let n_neg = labels.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return None;
        }

        let n = labels.len() as f64;
        let (w_pos, w_neg) = if config.balanced {
            (n / (2.0 * n_pos as f64), n / (2.0 * n_neg as f64))
        } else {
            (1.0, 1.0)
        };
        let sample_weights: Vec<f64> = labels
            .iter()
            .map(|&l| if l { w_pos } else { w_neg })
            .collect();
        let total_weight: f64 = sample_weights.iter().sum();

        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;

        for _ in 0..config.max_iter {
            let mut grad_w = vec![0.0; n_features];
            let mut grad_b = 0.0;

            for ((row, &label), &sw) in features.iter().zip(labels.iter()).zip(&sample_weights) {
                let row = row.as_ref();
                let y = if label { 1.0 } else { 0.0 };
                let p = sigmoid(dot(&weights, row) + bias);
                let diff = sw * (p - y);
                for (g, &x) in grad_w.iter_mut().zip(row.iter()) {
                    *g += diff * x;
                }
                grad_b += diff;
            }

            let mut max_step = 0.0f64;
            for (w, g) in weights.iter_mut().zip(grad_w.iter()) {
                let step = config.learning_rate * g / total_weight;
                *w -= step;
                max_step = max_step.max(step.abs());
            }
            let step = config.learning_rate * grad_b / total_weight;
            bias -= step;
            max_step = max_step.max(step.abs());

            if max_step < config.tol {
                break;
            }
        }

        Some(Self { weights, bias })
    }

    /// Positive-class probability for one feature row.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(dot(&self.weights, features) + self.bias)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
