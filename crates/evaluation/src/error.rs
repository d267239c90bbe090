//! Error types for the evaluation crate.

use data_loader::UserId;
use thiserror::Error;

/// Errors raised while turning raw predictions into ranked item lists
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// A submission token is not an item id
    #[error("Invalid item id '{token}' in recommendation of user {user_id}")]
    InvalidToken { user_id: UserId, token: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EvaluationError>;
