//! Top-K ranking and pagination over a score matrix.
//!
//! A user's row is ranked once per call, highest score first with ties in
//! ascending item order, and a page is the window
//! `[start_pos, start_pos + page_size)` of that ranking. Windows past the end
//! are cut short (or empty) rather than wrapping around.
//!
//! The sequence-aware variant replaces the first page of users in the
//! sequence cohort with the sequence model's list followed by the top of the
//! score ranking.

use data_loader::{ItemId, ScoreMatrix, SequencePredictions, UserId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RankingError, Result};

/// Items shown per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Users below this ordinal have precomputed sequence predictions
pub const DEFAULT_SEQUENCE_USER_THRESHOLD: UserId = 1200;

/// Page slots reserved for the sequence list; the rest is score padding
pub const SEQUENCE_PREFIX_SLOTS: usize = 2;

/// One page of recommended items for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationPage {
    pub user_id: UserId,
    /// Cursor this page was cut at
    pub start_pos: usize,
    pub items: Vec<ItemId>,
}

impl RecommendationPage {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ranked items of a user, or `UserOutOfRange`
fn ranked_items(matrix: &ScoreMatrix, user_id: UserId) -> Result<Vec<ItemId>> {
    matrix
        .ranked_items(user_id)
        .ok_or(RankingError::UserOutOfRange {
            user_id,
            n_users: matrix.n_users(),
        })
}

/// `ranked[start_pos..start_pos + page_size]`, clamped to the ranking
fn page_window(ranked: &[ItemId], start_pos: usize, page_size: usize) -> &[ItemId] {
    if start_pos >= ranked.len() {
        return &[];
    }
    let end = start_pos.saturating_add(page_size).min(ranked.len());
    &ranked[start_pos..end]
}

/// Whether a request is served from the sequence model's list
pub fn uses_sequence_prefix(user_id: UserId, start_pos: usize, user_threshold: UserId) -> bool {
    start_pos == 0 && user_id < user_threshold
}

/// The page of `user_id`'s ranking starting at `start_pos`.
///
/// Returns fewer than `page_size` items (possibly none) once the cursor
/// nears or passes the number of items.
pub fn recommend(
    matrix: &ScoreMatrix,
    user_id: UserId,
    start_pos: usize,
    page_size: usize,
) -> Result<RecommendationPage> {
    let ranked = ranked_items(matrix, user_id)?;
    let items = page_window(&ranked, start_pos, page_size).to_vec();

    debug!(
        "Ranked {} items for user {}, page at {} has {} items",
        ranked.len(),
        user_id,
        start_pos,
        items.len()
    );

    Ok(RecommendationPage {
        user_id,
        start_pos,
        items,
    })
}

/// Like [`recommend`], but the first page of a sequence-cohort user is the
/// sequence list followed by the top `page_size - 2` ranked items.
///
/// The two parts are not deduplicated: an item in the sequence list may
/// appear again in the padding.
pub fn recommend_with_sequence(
    matrix: &ScoreMatrix,
    predictions: &SequencePredictions,
    user_id: UserId,
    start_pos: usize,
    page_size: usize,
    user_threshold: UserId,
) -> Result<RecommendationPage> {
    if !uses_sequence_prefix(user_id, start_pos, user_threshold) {
        return recommend(matrix, user_id, start_pos, page_size);
    }

    let prefix = predictions
        .get(user_id)
        .ok_or(RankingError::MissingSequencePrediction { user_id })?;
    let ranked = ranked_items(matrix, user_id)?;
    let padding = page_window(&ranked, 0, page_size.saturating_sub(SEQUENCE_PREFIX_SLOTS));

    let mut items = Vec::with_capacity(prefix.len() + padding.len());
    items.extend_from_slice(prefix);
    items.extend_from_slice(padding);

    let repeated = padding.iter().filter(|item| prefix.contains(item)).count();
    debug!(
        "Sequence page for user {}: {} predicted + {} ranked items ({} repeated)",
        user_id,
        prefix.len(),
        padding.len(),
        repeated
    );

    Ok(RecommendationPage {
        user_id,
        start_pos,
        items,
    })
}
