//! ROC statistics and threshold selection.

use serde::{Deserialize, Serialize};

/// One operating point of a ROC curve: predict positive when the score
/// is at or above `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
    pub threshold: f64,
}

/// ROC curve over observed scores, one point per distinct score,
/// ordered by descending threshold (so fpr/tpr are non-decreasing).
///
/// Empty when either class is absent.
pub fn roc_curve(predictions: &[f64], labels: &[bool]) -> Vec<RocPoint> {
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Vec::new();
    }

    let mut pairs: Vec<(f64, bool)> = predictions
        .iter()
        .zip(labels.iter())
        .map(|(&p, &l)| (p, l))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut points = Vec::new();
    let mut tp = 0usize;
    let mut fp = 0usize;
    for (i, &(score, label)) in pairs.iter().enumerate() {
        if label {
            tp += 1;
        } else {
            fp += 1;
        }
        // Emit once per distinct score, after consuming its ties.
        let boundary = i + 1 == pairs.len() || pairs[i + 1].0 != score;
        if boundary {
            points.push(RocPoint {
                fpr: fp as f64 / n_neg as f64,
                tpr: tp as f64 / n_pos as f64,
                threshold: score,
            });
        }
    }
    points
}

/// Threshold maximizing Youden's J (`tpr - fpr`). Ties resolve to the
/// first point in curve order, i.e. the lowest false-positive rate.
pub fn youden_threshold(curve: &[RocPoint]) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for point in curve {
        let j = point.tpr - point.fpr;
        match best {
            Some((best_j, _)) if j <= best_j => {}
            _ => best = Some((j, point.threshold)),
        }
    }
    best.map(|(_, threshold)| threshold)
}

/// ROC-AUC via rank accumulation (Wilcoxon–Mann–Whitney). Tied scores
/// earn half credit. Returns 0.5 for degenerate label sets.
pub fn roc_auc(predictions: &[f64], labels: &[bool]) -> f64 {
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut pairs: Vec<(f64, bool)> = predictions
        .iter()
        .zip(labels.iter())
        .map(|(&p, &l)| (p, l))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut auc = 0.0;
    let mut tp_seen = 0.0;
    let mut i = 0;
    while i < pairs.len() {
        let score = pairs[i].0;
        let mut group_pos = 0.0;
        let mut group_neg = 0.0;
        while i < pairs.len() && pairs[i].0 == score {
            if pairs[i].1 {
                group_pos += 1.0;
            } else {
                group_neg += 1.0;
            }
            i += 1;
        }
        auc += group_neg * (tp_seen + group_pos / 2.0);
        tp_seen += group_pos;
    }

    auc / (n_pos as f64 * n_neg as f64)
}
