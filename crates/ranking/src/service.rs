//! # Recommendation Service
//!
//! Serves recommendation pages for request contexts:
//! 1. Validate the context (user and model present)
//! 2. Fetch the model's score matrix from the shared store (loading once)
//! 3. Pick the ranker for the model
//! 4. Cut the requested page
//!
//! The service is cheap to clone and safe to share across threads; every
//! clone reads the same immutable matrices.

use data_loader::UserId;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::config::RankingConfig;
use crate::context::RecommendationContext;
use crate::engine::RecommendationPage;
use crate::error::Result;
use crate::model::ModelKind;
use crate::rankers::{ScoreRanker, SequenceRanker};
use crate::store::ModelStore;
use crate::traits::Ranker;

/// Long-lived entry point for ranking requests
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<ModelStore>,
    score_ranker: ScoreRanker,
    sequence_ranker: Arc<SequenceRanker>,
}

impl RecommendationService {
    /// Create a service over a fresh store; files load on first request
    pub fn new(config: RankingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_store(Arc::new(ModelStore::new(config))))
    }

    /// Create a service over an existing (possibly pre-filled) store
    pub fn with_store(store: Arc<ModelStore>) -> Self {
        let sequence_ranker = Arc::new(SequenceRanker::new(
            store.clone(),
            store.config().sequence_user_threshold,
        ));
        Self {
            store,
            score_ranker: ScoreRanker,
            sequence_ranker,
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn page_size(&self) -> usize {
        self.store.config().page_size
    }

    /// Main entry point: the page described by `context`.
    ///
    /// # Errors
    /// * `Configuration` - no user or no model in the context
    /// * `Data` - the model's matrix (or sequence file) could not be read
    /// * `UserOutOfRange` - the user has no row in the matrix
    #[instrument(skip(self, context), fields(user_id = ?context.user_id, model = ?context.model))]
    pub fn recommend(&self, context: &RecommendationContext) -> Result<RecommendationPage> {
        let start_time = Instant::now();

        let user_id = context.require_user()?;
        let model = context.require_model()?;

        let matrix = self.store.load(model)?;
        let ranker = self.ranker_for(model);

        let page = ranker.rank_page(&matrix, user_id, context.start_pos, self.page_size())?;

        info!(
            "{} served {} items for user {} at {} with {} in {:.2?}",
            ranker.name(),
            page.len(),
            user_id,
            context.start_pos,
            model,
            start_time.elapsed()
        );
        Ok(page)
    }

    /// First page for a user and model
    pub fn first_page(&self, user_id: UserId, model: ModelKind) -> Result<RecommendationPage> {
        self.recommend(&RecommendationContext::new(user_id, model))
    }

    fn ranker_for(&self, model: ModelKind) -> &dyn Ranker {
        if model.uses_sequence() {
            self.sequence_ranker.as_ref()
        } else {
            &self.score_ranker
        }
    }
}
