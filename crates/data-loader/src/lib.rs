//! # Data Loader Crate
//!
//! Loads the inputs of the book recommender: precomputed score matrices,
//! sequence model predictions, interaction logs and submission files.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (ScoreMatrix, SequencePredictions, InteractionLog)
//! - **parser**: Parse `.npy` and CSV files into Rust structs
//! - **index**: Interaction log loading, ground truth and history queries
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{parser, InteractionLog};
//! use std::path::Path;
//!
//! let scores = parser::parse_score_matrix(Path::new("data/score_hybrid_full.npy"))?;
//! let top = scores.top_items(42, 10).unwrap_or_default();
//!
//! let log = InteractionLog::load_from_file(Path::new("data/interactions_test.csv"))?;
//! let truth = log.ground_truth();
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{DEFAULT_HISTORY_LENGTH, HISTORY_TIME_FORMAT, format_local_timestamp};
pub use types::{
    // Type aliases
    GroundTruth,
    ItemId,
    UserId,
    // Core types
    Interaction,
    InteractionLog,
    ScoreMatrix,
    SequencePredictions,
    SubmissionRow,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_log_creation() {
        let log = InteractionLog::new();
        assert_eq!(log.counts(), (0, 0));
        assert!(log.ground_truth().is_empty());
    }

    #[test]
    fn test_insert_interaction() {
        let mut log = InteractionLog::new();
        log.insert(Interaction {
            user_id: 1,
            item_id: 4821,
            timestamp: 1_700_000_000,
        });

        let interactions = log.get_user_interactions(1);
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0].item_id, 4821);
        assert!(log.get_user_interactions(2).is_empty());
    }
}
