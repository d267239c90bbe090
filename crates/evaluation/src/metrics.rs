//! Mean Average Precision at K.
//!
//! AP@K walks the first K predictions and, at every hit, adds the precision
//! so far (`hits / rank`). The sum is divided by `min(|actual|, K)`, not by K,
//! so a user with fewer than K held-out items can still reach 1.0.

use data_loader::{GroundTruth, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::predictions::PredictionSet;

/// Rank cutoff used by the offline evaluation
pub const DEFAULT_K: usize = 10;

/// Average precision of one ranked list against held-out items.
///
/// `actual` may repeat items; repeats count towards its length (the
/// normaliser) but membership is what decides a hit. An empty `actual`
/// scores 0.0.
pub fn average_precision_at_k(predicted: &[ItemId], actual: &[ItemId], k: usize) -> f64 {
    if actual.is_empty() || k == 0 {
        return 0.0;
    }

    let relevant: HashSet<ItemId> = actual.iter().copied().collect();
    let mut score = 0.0;
    let mut num_hits = 0usize;

    for (i, item) in predicted.iter().take(k).enumerate() {
        if relevant.contains(item) {
            num_hits += 1;
            score += num_hits as f64 / (i + 1) as f64;
        }
    }

    score / actual.len().min(k) as f64
}

/// MAP@K with coverage counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub k: usize,
    /// Mean AP over scored users (0.0 if nobody could be scored)
    pub map: f64,
    /// Ground-truth users that had predictions
    pub users_scored: usize,
    /// Ground-truth users without predictions, left out of the mean
    pub users_skipped: usize,
}

/// Score every ground-truth user that has predictions.
///
/// Users missing from `predictions` are skipped rather than counted as 0.
/// Users are visited in ascending order, so the float sum is reproducible.
pub fn evaluate(ground_truth: &GroundTruth, predictions: &PredictionSet, k: usize) -> EvaluationReport {
    let mut total = 0.0;
    let mut users_scored = 0;
    let mut users_skipped = 0;

    for (user_id, actual) in ground_truth {
        match predictions.get(user_id) {
            Some(predicted) => {
                total += average_precision_at_k(predicted, actual, k);
                users_scored += 1;
            }
            None => users_skipped += 1,
        }
    }

    let map = if users_scored > 0 {
        total / users_scored as f64
    } else {
        warn!("No ground-truth user has predictions; MAP@{} defaults to 0", k);
        0.0
    };

    debug!(
        "MAP@{} = {:.6} over {} users ({} skipped)",
        k, map, users_scored, users_skipped
    );

    EvaluationReport {
        k,
        map,
        users_scored,
        users_skipped,
    }
}

/// Mean of per-user AP@K over users present in both inputs
pub fn mean_average_precision_at_k(
    ground_truth: &GroundTruth,
    predictions: &PredictionSet,
    k: usize,
) -> f64 {
    evaluate(ground_truth, predictions, k).map
}
