//! Offline evaluation of recommendation quality with MAP@K.
//!
//! This crate provides:
//! - `average_precision_at_k` / `mean_average_precision_at_k`
//! - `evaluate`: MAP plus how many users were scored or skipped
//! - Prediction ingestion from a score matrix or a submission file
//!
//! ## Example Usage
//! ```ignore
//! use data_loader::{parser, InteractionLog};
//! use evaluation::{evaluate_matrix, DEFAULT_K};
//!
//! let truth = InteractionLog::load_from_file(Path::new("data/interactions_test.csv"))?
//!     .ground_truth();
//! let scores = parser::parse_score_matrix(Path::new("data/score_hybrid_full.npy"))?;
//!
//! let report = evaluate_matrix(&truth, &scores, DEFAULT_K);
//! println!("MAP@{}: {:.4}", report.k, report.map);
//! ```

pub mod error;
pub mod metrics;
pub mod predictions;

// Re-export main types
pub use error::{EvaluationError, Result};
pub use metrics::{
    DEFAULT_K, EvaluationReport, average_precision_at_k, evaluate, mean_average_precision_at_k,
};
pub use predictions::{
    PredictionSet, evaluate_matrix, evaluate_submission, predictions_from_matrix,
    predictions_from_submission,
};
