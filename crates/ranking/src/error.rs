//! Error types for the ranking crate.

use data_loader::{DataLoadError, UserId};
use thiserror::Error;

use crate::model::ModelKind;

/// Errors that can occur while producing a recommendation page.
///
/// None of these are retried; they go straight back to the caller.
#[derive(Error, Debug)]
pub enum RankingError {
    /// Ranking was requested before a user or model was configured,
    /// or the configuration itself is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Model identifier is not one of the four known variants
    #[error(
        "Unknown model '{0}' (expected Collaborative Filtering, Semantic Embedding, Hybrid or Hybrid with Sequence)"
    )]
    UnknownModel(String),

    /// Ranking was attempted before the backing matrix was loaded
    #[error("Score matrix for model '{model}' is not loaded")]
    MatrixNotLoaded { model: ModelKind },

    /// User ordinal has no row in the score matrix
    #[error("User {user_id} is outside the score matrix ({n_users} users)")]
    UserOutOfRange { user_id: UserId, n_users: usize },

    /// A user of the sequence cohort has no precomputed list
    #[error("No sequence prediction for user {user_id}")]
    MissingSequencePrediction { user_id: UserId },

    /// Loading a matrix or prediction file failed
    #[error(transparent)]
    Data(#[from] DataLoadError),
}

impl RankingError {
    /// True for errors caused by missing or invalid configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RankingError::Configuration(_) | RankingError::UnknownModel(_)
        )
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RankingError>;
