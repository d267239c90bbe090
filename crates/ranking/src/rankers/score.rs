//! Plain score ranking.

use data_loader::{ScoreMatrix, UserId};

use crate::engine::{self, RecommendationPage};
use crate::error::Result;
use crate::traits::Ranker;

/// Pages through a user's items by descending score
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreRanker;

impl Ranker for ScoreRanker {
    fn name(&self) -> &str {
        "ScoreRanker"
    }

    fn rank_page(
        &self,
        matrix: &ScoreMatrix,
        user_id: UserId,
        start_pos: usize,
        page_size: usize,
    ) -> Result<RecommendationPage> {
        engine::recommend(matrix, user_id, start_pos, page_size)
    }
}
