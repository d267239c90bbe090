//! Turning model output into per-user ranked lists.
//!
//! Two sources feed the evaluation and must agree on the resulting lists:
//! a dense score matrix (top K of each row) and a submission file (first K
//! space-separated ids per user).

use data_loader::{GroundTruth, ItemId, ScoreMatrix, SubmissionRow, UserId};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::info;

use crate::error::{EvaluationError, Result};
use crate::metrics::{EvaluationReport, evaluate};

/// Ranked predicted items per user
pub type PredictionSet = HashMap<UserId, Vec<ItemId>>;

/// Top `k` items of every matrix row, highest score first.
///
/// Ties keep ascending item order, matching the ranking used for serving.
/// Rows are ranked in parallel.
pub fn predictions_from_matrix(matrix: &ScoreMatrix, k: usize) -> PredictionSet {
    (0..matrix.n_users())
        .into_par_iter()
        .filter_map(|row| {
            let user_id = row as UserId;
            matrix.top_items(user_id, k).map(|items| (user_id, items))
        })
        .collect()
}

/// First `k` whitespace-separated ids of each submission row.
///
/// A user listed twice keeps the later row.
pub fn predictions_from_submission(rows: &[SubmissionRow], k: usize) -> Result<PredictionSet> {
    let mut predictions = PredictionSet::with_capacity(rows.len());

    for row in rows {
        let items = row
            .recommendation
            .split_whitespace()
            .take(k)
            .map(|token| {
                token.parse::<ItemId>().map_err(|_| EvaluationError::InvalidToken {
                    user_id: row.user_id,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<ItemId>>>()?;
        predictions.insert(row.user_id, items);
    }

    Ok(predictions)
}

/// MAP@K of a score matrix against held-out interactions
pub fn evaluate_matrix(ground_truth: &GroundTruth, matrix: &ScoreMatrix, k: usize) -> EvaluationReport {
    info!(
        "Ranking top {} of {} items for {} users",
        k,
        matrix.n_items(),
        matrix.n_users()
    );
    let predictions = predictions_from_matrix(matrix, k);
    evaluate(ground_truth, &predictions, k)
}

/// MAP@K of a submission file against held-out interactions
pub fn evaluate_submission(
    ground_truth: &GroundTruth,
    rows: &[SubmissionRow],
    k: usize,
) -> Result<EvaluationReport> {
    info!("Parsing {} submission rows", rows.len());
    let predictions = predictions_from_submission(rows, k)?;
    Ok(evaluate(ground_truth, &predictions, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: UserId, recommendation: &str) -> SubmissionRow {
        SubmissionRow {
            user_id,
            recommendation: recommendation.to_string(),
        }
    }

    #[test]
    fn test_matrix_top_k_per_user() {
        let matrix = ScoreMatrix::from_rows(vec![
            vec![0.3, 0.1, 0.3, 0.9],
            vec![0.0, 0.5, 0.4, 0.2],
        ])
        .unwrap();

        let predictions = predictions_from_matrix(&matrix, 3);

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[&0], vec![3, 0, 2]);
        assert_eq!(predictions[&1], vec![1, 2, 3]);
    }

    #[test]
    fn test_submission_takes_first_k_tokens() {
        let rows = vec![row(0, "  4 8\t15 16 23 42 "), row(1, "7")];

        let predictions = predictions_from_submission(&rows, 3).unwrap();

        assert_eq!(predictions[&0], vec![4, 8, 15]);
        assert_eq!(predictions[&1], vec![7]);
    }

    #[test]
    fn test_submission_tokens_past_k_are_not_parsed() {
        let rows = vec![row(0, "1 2 three")];

        assert_eq!(predictions_from_submission(&rows, 2).unwrap()[&0], vec![1, 2]);

        let err = predictions_from_submission(&rows, 3).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::InvalidToken { user_id: 0, ref token } if token == "three"
        ));
    }

    #[test]
    fn test_later_submission_row_wins() {
        let rows = vec![row(5, "1 2"), row(5, "3 4")];
        assert_eq!(predictions_from_submission(&rows, 10).unwrap()[&5], vec![3, 4]);
    }
}
