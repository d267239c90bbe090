//! Core domain types for the book recommendation data.
//!
//! Users and items are addressed by dense zero-based ordinals that double as
//! row and column indices of every [`ScoreMatrix`]. Nothing here checks that
//! a matrix and an interaction log agree on those ordinals; callers load
//! matching files.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{DataLoadError, Result};

// =============================================================================
// Type Aliases
// =============================================================================

/// Zero-based user ordinal (row index of a score matrix)
pub type UserId = u32;

/// Zero-based item ordinal (column index of a score matrix)
pub type ItemId = u32;

/// Held-out interactions per user, in ascending user order.
///
/// Items keep file order and duplicates, so `len()` counts every held-out
/// interaction.
pub type GroundTruth = BTreeMap<UserId, Vec<ItemId>>;

// =============================================================================
// Score Matrix
// =============================================================================

/// Dense `(n_users, n_items)` relevance scores produced by an offline model.
///
/// Immutable once built. Ranking code shares it behind an `Arc` and only ever
/// reads rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    scores: Array2<f64>,
}

impl ScoreMatrix {
    /// Wrap an already-shaped array
    pub fn from_array(scores: Array2<f64>) -> Self {
        Self { scores }
    }

    /// Build a matrix from row vectors; every row must have the same length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_users = rows.len();
        let n_items = rows.first().map(|r| r.len()).unwrap_or(0);

        let mut flat = Vec::with_capacity(n_users * n_items);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != n_items {
                return Err(DataLoadError::FieldCountMismatch {
                    expected: n_items,
                    found: row.len(),
                    line: idx + 1,
                });
            }
            flat.extend(row);
        }

        let scores = Array2::from_shape_vec((n_users, n_items), flat).map_err(|e| {
            DataLoadError::InvalidValue {
                field: "shape".to_string(),
                value: e.to_string(),
            }
        })?;
        Ok(Self { scores })
    }

    pub fn n_users(&self) -> usize {
        self.scores.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.scores.ncols()
    }

    /// Scores of one user, or `None` if the ordinal is past the last row
    pub fn user_scores(&self, user_id: UserId) -> Option<ArrayView1<'_, f64>> {
        let row = user_id as usize;
        if row < self.n_users() {
            Some(self.scores.row(row))
        } else {
            None
        }
    }

    /// All item ordinals of a user's row, highest score first.
    ///
    /// The sort is stable, so equal scores keep ascending item order.
    /// NaN compares above every number (`f64::total_cmp`) and ranks first.
    pub fn ranked_items(&self, user_id: UserId) -> Option<Vec<ItemId>> {
        let scores = self.user_scores(user_id)?;
        let mut items: Vec<usize> = (0..scores.len()).collect();
        items.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        Some(items.into_iter().map(|i| i as ItemId).collect())
    }

    /// The `limit` best items of a user's row, in ranked order
    pub fn top_items(&self, user_id: UserId, limit: usize) -> Option<Vec<ItemId>> {
        let mut ranked = self.ranked_items(user_id)?;
        ranked.truncate(limit);
        Some(ranked)
    }
}

// =============================================================================
// Sequence Model Output
// =============================================================================

/// Precomputed recommendation lists from the sequence model.
///
/// Only a cohort of low user ordinals is covered; lookups for anyone else
/// return `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequencePredictions {
    lists: HashMap<UserId, Vec<ItemId>>,
}

impl SequencePredictions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the list for a user, replacing any earlier one
    pub fn insert(&mut self, user_id: UserId, items: Vec<ItemId>) {
        self.lists.insert(user_id, items);
    }

    pub fn get(&self, user_id: UserId) -> Option<&[ItemId]> {
        self.lists.get(&user_id).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl FromIterator<(UserId, Vec<ItemId>)> for SequencePredictions {
    fn from_iter<I: IntoIterator<Item = (UserId, Vec<ItemId>)>>(iter: I) -> Self {
        Self {
            lists: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Interactions and Submissions
// =============================================================================

/// One user-item interaction from the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// Unix timestamp (seconds) of the interaction
    pub timestamp: i64,
}

/// One row of a submission file: a user and their space-separated item list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub user_id: UserId,
    pub recommendation: String,
}

// =============================================================================
// InteractionLog - in-memory interaction index
// =============================================================================

/// All interactions of a log file, indexed by user.
///
/// Per-user lists keep file order; the log is read-only after loading.
#[derive(Debug, Default)]
pub struct InteractionLog {
    pub(crate) user_interactions: BTreeMap<UserId, Vec<Interaction>>,
    pub(crate) total: usize,
}

impl InteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an interaction at the end of its user's list
    pub fn insert(&mut self, interaction: Interaction) {
        self.user_interactions
            .entry(interaction.user_id)
            .or_default()
            .push(interaction);
        self.total += 1;
    }

    /// Interactions of one user in file order; empty if the user is unknown
    pub fn get_user_interactions(&self, user_id: UserId) -> &[Interaction] {
        self.user_interactions
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct users and of interactions
    pub fn counts(&self) -> (usize, usize) {
        (self.user_interactions.len(), self.total)
    }
}

impl FromIterator<Interaction> for InteractionLog {
    fn from_iter<I: IntoIterator<Item = Interaction>>(iter: I) -> Self {
        let mut log = Self::new();
        for interaction in iter {
            log.insert(interaction);
        }
        log
    }
}
