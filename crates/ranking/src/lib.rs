//! Ranking and pagination over precomputed score matrices.
//!
//! This crate provides:
//! - `recommend` / `recommend_with_sequence`: pure page functions
//! - `Ranker` trait with score and sequence implementations
//! - `ModelStore`: matrices loaded once and shared read-only
//! - `RecommendationService`: answers `RecommendationContext` requests
//! - `Session`: login / model / "show more" state for front ends
//!
//! ## Example Usage
//! ```ignore
//! use ranking::{ModelKind, RankingConfig, RecommendationService, Session};
//!
//! let service = RecommendationService::new(RankingConfig::with_data_dir("UI/data"))?;
//!
//! let mut session = Session::new();
//! session.login(42);
//! session.select_model(ModelKind::HybridWithSequence);
//! let first = service.recommend(&session.context()?)?;
//!
//! session.show_more(service.page_size())?;
//! let second = service.recommend(&session.context()?)?;
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod model;
pub mod rankers;
pub mod service;
pub mod store;
pub mod traits;

// Re-export main types
pub use config::RankingConfig;
pub use context::{RecommendationContext, Session, SessionState};
pub use engine::{
    DEFAULT_PAGE_SIZE, DEFAULT_SEQUENCE_USER_THRESHOLD, RecommendationPage, recommend,
    recommend_with_sequence,
};
pub use error::{RankingError, Result};
pub use model::ModelKind;
pub use rankers::{ScoreRanker, SequenceRanker};
pub use service::RecommendationService;
pub use store::ModelStore;
pub use traits::Ranker;
