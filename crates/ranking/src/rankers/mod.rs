//! Ranker implementations.
//!
//! - [`ScoreRanker`]: plain score ranking, used by all models
//! - [`SequenceRanker`]: sequence-model first page for the covered cohort

pub mod score;
pub mod sequence;

// Re-export for convenience
pub use score::ScoreRanker;
pub use sequence::SequenceRanker;
