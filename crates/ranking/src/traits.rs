//! Core trait for ranking strategies.
//!
//! A `Ranker` turns one user's row of a score matrix into a page of items.
//! The service picks a ranker per request from the selected model.

use data_loader::{ScoreMatrix, UserId};

use crate::engine::RecommendationPage;
use crate::error::Result;

/// Produces one page of recommendations from a score matrix.
///
/// ## Design Note
/// - `Send + Sync` lets one ranker serve concurrent requests
/// - Rankers only borrow the matrix; it stays shared and immutable
pub trait Ranker: Send + Sync {
    /// Returns the name of this ranker (for logging/debugging)
    fn name(&self) -> &str;

    /// Rank `user_id`'s items and cut the page starting at `start_pos`.
    ///
    /// # Returns
    /// * `Ok(RecommendationPage)` - up to `page_size` items, possibly fewer
    /// * `Err` - if the user has no row or a required input is missing
    fn rank_page(
        &self,
        matrix: &ScoreMatrix,
        user_id: UserId,
        start_pos: usize,
        page_size: usize,
    ) -> Result<RecommendationPage>;
}
