//! Deterministic stratified partitioning.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{TrainError, CANCER_CLASS, NORMAL_CLASS};

/// Row indices of a stratified hold-out split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratifiedSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Split rows into train/validation partitions, preserving the label
/// ratio in both. Shuffling is seeded, so the split is reproducible.
///
/// Fails when either class is absent or too small to appear on both
/// sides of the split.
pub fn stratified_holdout(
    labels: &[bool],
    validation_fraction: f64,
    seed: u64,
) -> Result<StratifiedSplit, TrainError> {
    if labels.is_empty() {
        return Err(TrainError::EmptyDataset);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut validation = Vec::new();

    for (class, name) in [(false, NORMAL_CLASS), (true, CANCER_CLASS)] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            return Err(TrainError::ClassAbsent(name));
        }

        indices.shuffle(&mut rng);
        let n_val = ((indices.len() as f64 * validation_fraction).round() as usize).max(1);
        if n_val >= indices.len() {
            return Err(TrainError::ClassTooSmall(name));
        }
        validation.extend_from_slice(&indices[..n_val]);
        train.extend_from_slice(&indices[n_val..]);
    }

    train.sort_unstable();
    validation.sort_unstable();
    Ok(StratifiedSplit { train, validation })
}

/// Assign every row to one of `k` folds, round-robin within each class,
/// so each fold keeps roughly the overall label ratio. Deterministic:
/// no shuffling is involved.
pub fn stratified_kfold(labels: &[bool], k: usize) -> Vec<Vec<usize>> {
    let mut folds = vec![Vec::new(); k];
    for class in [false, true] {
        for (position, index) in labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .enumerate()
        {
            folds[position % k].push(index);
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n_normal: usize, n_cancer: usize) -> Vec<bool> {
        let mut l = vec![false; n_normal];
        l.extend(std::iter::repeat(true).take(n_cancer));
        l
    }

    #[test]
    fn holdout_preserves_class_ratio() {
        let labels = labels(80, 20);
        let split = stratified_holdout(&labels, 0.2, 42).unwrap();
        assert_eq!(split.validation.len(), 20);
        assert_eq!(split.train.len(), 80);

        let val_pos = split.validation.iter().filter(|&&i| labels[i]).count();
        assert_eq!(val_pos, 4);
        let train_pos = split.train.iter().filter(|&&i| labels[i]).count();
        assert_eq!(train_pos, 16);
    }

    #[test]
    fn holdout_is_seed_deterministic() {
        let labels = labels(50, 30);
        let a = stratified_holdout(&labels, 0.2, 9).unwrap();
        let b = stratified_holdout(&labels, 0.2, 9).unwrap();
        assert_eq!(a, b);
        let c = stratified_holdout(&labels, 0.2, 10).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn holdout_partitions_are_disjoint_and_complete() {
        let labels = labels(33, 17);
        let split = stratified_holdout(&labels, 0.25, 5).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.validation).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn holdout_rejects_missing_class() {
        let err = stratified_holdout(&labels(10, 0), 0.2, 1).unwrap_err();
        assert_eq!(err, TrainError::ClassAbsent("cancer"));
        let err = stratified_holdout(&[], 0.2, 1).unwrap_err();
        assert_eq!(err, TrainError::EmptyDataset);
    }

    #[test]
    fn holdout_rejects_single_sample_class() {
        let err = stratified_holdout(&labels(10, 1), 0.2, 1).unwrap_err();
        assert_eq!(err, TrainError::ClassTooSmall("cancer"));
    }

    #[test]
    fn kfold_covers_all_rows_once() {
        let labels = labels(13, 7);
        let folds = stratified_kfold(&labels, 5);
        assert_eq!(folds.len(), 5);
        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn kfold_keeps_both_classes_in_each_fold() {
        let labels = labels(50, 25);
        for fold in stratified_kfold(&labels, 5) {
            assert!(fold.iter().any(|&i| labels[i]));
            assert!(fold.iter().any(|&i| !labels[i]));
        }
    }
}
