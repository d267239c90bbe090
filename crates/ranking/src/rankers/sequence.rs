//! Sequence-aware ranking for the "Hybrid with Sequence" model.
//!
//! The sequence model only has lists for a bounded cohort of users and only
//! for the first page. Everyone else, and every later page, gets the plain
//! score ranking.

use data_loader::{ScoreMatrix, UserId};
use std::sync::Arc;
use tracing::debug;

use crate::engine::{self, RecommendationPage};
use crate::error::Result;
use crate::store::ModelStore;
use crate::traits::Ranker;

/// Prefixes cohort users' first page with their sequence list.
///
/// Predictions are fetched from the store only when a request actually
/// needs them, so users outside the cohort never touch the sequence file.
pub struct SequenceRanker {
    store: Arc<ModelStore>,
    user_threshold: UserId,
}

impl SequenceRanker {
    /// Create a new SequenceRanker.
    ///
    /// # Arguments
    /// * `store` - Shared store holding (or able to load) the sequence predictions
    /// * `user_threshold` - Users below this ordinal are in the sequence cohort
    pub fn new(store: Arc<ModelStore>, user_threshold: UserId) -> Self {
        Self {
            store,
            user_threshold,
        }
    }
}

impl Ranker for SequenceRanker {
    fn name(&self) -> &str {
        "SequenceRanker"
    }

    fn rank_page(
        &self,
        matrix: &ScoreMatrix,
        user_id: UserId,
        start_pos: usize,
        page_size: usize,
    ) -> Result<RecommendationPage> {
        if !engine::uses_sequence_prefix(user_id, start_pos, self.user_threshold) {
            debug!("User {} at {} uses plain score ranking", user_id, start_pos);
            return engine::recommend(matrix, user_id, start_pos, page_size);
        }

        let predictions = self.store.sequence_predictions()?;
        engine::recommend_with_sequence(
            matrix,
            &predictions,
            user_id,
            start_pos,
            page_size,
            self.user_threshold,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankingConfig;
    use crate::error::RankingError;

    fn matrix() -> ScoreMatrix {
        ScoreMatrix::from_rows(vec![
            vec![0.1, 0.9, 0.4, 0.6, 0.3],
            vec![0.5, 0.2, 0.8, 0.1, 0.7],
        ])
        .unwrap()
    }

    fn store_without_files() -> Arc<ModelStore> {
        Arc::new(ModelStore::new(RankingConfig::with_data_dir(
            "/nonexistent/ranking-data",
        )))
    }

    #[test]
    fn test_cohort_first_page_uses_sequence_list() {
        let store = store_without_files();
        store.insert_sequence_predictions(vec![(0, vec![4, 2])].into_iter().collect());
        let ranker = SequenceRanker::new(store, 1);

        let page = ranker.rank_page(&matrix(), 0, 0, 5).unwrap();
        assert_eq!(page.items, vec![4, 2, 1, 3, 2]);
    }

    #[test]
    fn test_outside_cohort_never_reads_predictions() {
        // No predictions inserted and no file on disk: only the fallback can succeed
        let ranker = SequenceRanker::new(store_without_files(), 1);

        assert_eq!(ranker.rank_page(&matrix(), 1, 0, 3).unwrap().items, vec![2, 4, 0]);
        assert_eq!(ranker.rank_page(&matrix(), 0, 3, 3).unwrap().items, vec![4, 0]);
    }

    #[test]
    fn test_cohort_without_prediction_file_fails() {
        let ranker = SequenceRanker::new(store_without_files(), 1);

        let err = ranker.rank_page(&matrix(), 0, 0, 5).unwrap_err();
        assert!(matches!(err, RankingError::Data(_)));
    }
}
