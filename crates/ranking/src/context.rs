//! Request context and the browsing session that produces it.
//!
//! [`RecommendationContext`] carries everything one ranking request needs
//! (user, model, cursor). [`Session`] is the login / model / "show more"
//! state machine a front end keeps between requests; it hands out contexts
//! rather than the engine reading any ambient state.

use data_loader::UserId;
use serde::{Deserialize, Serialize};

use crate::error::{RankingError, Result};
use crate::model::ModelKind;

/// Request-scoped input of one ranking call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationContext {
    pub user_id: Option<UserId>,
    pub model: Option<ModelKind>,
    /// Number of top items already shown
    pub start_pos: usize,
}

impl RecommendationContext {
    /// Context for the first page of a user and model
    pub fn new(user_id: UserId, model: ModelKind) -> Self {
        Self {
            user_id: Some(user_id),
            model: Some(model),
            start_pos: 0,
        }
    }

    pub fn with_start_pos(mut self, start_pos: usize) -> Self {
        self.start_pos = start_pos;
        self
    }

    pub fn require_user(&self) -> Result<UserId> {
        self.user_id
            .ok_or_else(|| RankingError::Configuration("no user is logged in".to_string()))
    }

    pub fn require_model(&self) -> Result<ModelKind> {
        self.model
            .ok_or_else(|| RankingError::Configuration("no model is selected".to_string()))
    }
}

/// Where a session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { user_id: UserId, start_pos: usize },
}

/// One user's browsing session.
///
/// - `login` moves to `LoggedIn` with the cursor at 0 (also on re-login)
/// - `select_model` resets the cursor when the model actually changes
/// - `show_more` advances the cursor by one page
/// - `logout` returns to `LoggedOut`; the model selection is remembered
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    model: ModelKind,
}

impl Session {
    /// A logged-out session with the default model selected
    pub fn new() -> Self {
        Self {
            state: SessionState::LoggedOut,
            model: ModelKind::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn { .. })
    }

    pub fn login(&mut self, user_id: UserId) {
        self.state = SessionState::LoggedIn {
            user_id,
            start_pos: 0,
        };
    }

    pub fn logout(&mut self) {
        self.state = SessionState::LoggedOut;
    }

    /// Switch models; the cursor restarts only if the model changed
    pub fn select_model(&mut self, model: ModelKind) {
        if model == self.model {
            return;
        }
        self.model = model;
        if let SessionState::LoggedIn { start_pos, .. } = &mut self.state {
            *start_pos = 0;
        }
    }

    /// Advance the cursor by one page and return the new position
    pub fn show_more(&mut self, page_size: usize) -> Result<usize> {
        match &mut self.state {
            SessionState::LoggedIn { start_pos, .. } => {
                *start_pos = start_pos.saturating_add(page_size);
                Ok(*start_pos)
            }
            SessionState::LoggedOut => Err(RankingError::Configuration(
                "log in before requesting more recommendations".to_string(),
            )),
        }
    }

    /// Context for the page the session is currently on
    pub fn context(&self) -> Result<RecommendationContext> {
        match self.state {
            SessionState::LoggedIn { user_id, start_pos } => {
                Ok(RecommendationContext::new(user_id, self.model).with_start_pos(start_pos))
            }
            SessionState::LoggedOut => Err(RankingError::Configuration(
                "log in before requesting recommendations".to_string(),
            )),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_requires_user_and_model() {
        let empty = RecommendationContext::default();
        assert!(empty.require_user().unwrap_err().is_configuration());
        assert!(empty.require_model().unwrap_err().is_configuration());

        let ctx = RecommendationContext::new(7, ModelKind::Hybrid).with_start_pos(20);
        assert_eq!(ctx.require_user().unwrap(), 7);
        assert_eq!(ctx.require_model().unwrap(), ModelKind::Hybrid);
        assert_eq!(ctx.start_pos, 20);
    }

    #[test]
    fn test_logged_out_session_has_no_context() {
        let mut session = Session::new();

        assert_eq!(session.state(), SessionState::LoggedOut);
        assert!(session.context().unwrap_err().is_configuration());
        assert!(session.show_more(10).is_err());
    }

    #[test]
    fn test_show_more_advances_by_page() {
        let mut session = Session::new();
        session.login(3);

        assert_eq!(session.show_more(10).unwrap(), 10);
        assert_eq!(session.show_more(10).unwrap(), 20);

        let ctx = session.context().unwrap();
        assert_eq!(ctx.user_id, Some(3));
        assert_eq!(ctx.model, Some(ModelKind::CollaborativeFiltering));
        assert_eq!(ctx.start_pos, 20);
    }

    #[test]
    fn test_show_more_saturates_cursor() {
        let mut session = Session::new();
        session.login(3);

        assert_eq!(session.show_more(usize::MAX - 5).unwrap(), usize::MAX - 5);
        assert_eq!(session.show_more(10).unwrap(), usize::MAX);
        assert_eq!(session.show_more(10).unwrap(), usize::MAX);
    }

    #[test]
    fn test_model_change_resets_cursor() {
        let mut session = Session::new();
        session.login(3);
        session.show_more(10).unwrap();

        // Re-selecting the same model keeps the cursor
        session.select_model(ModelKind::CollaborativeFiltering);
        assert_eq!(session.context().unwrap().start_pos, 10);

        session.select_model(ModelKind::Hybrid);
        let ctx = session.context().unwrap();
        assert_eq!(ctx.start_pos, 0);
        assert_eq!(ctx.model, Some(ModelKind::Hybrid));
    }

    #[test]
    fn test_relogin_resets_cursor_and_keeps_model() {
        let mut session = Session::new();
        session.login(3);
        session.select_model(ModelKind::SemanticEmbedding);
        session.show_more(10).unwrap();

        session.login(8);
        assert_eq!(
            session.state(),
            SessionState::LoggedIn { user_id: 8, start_pos: 0 }
        );

        session.logout();
        assert!(!session.is_logged_in());
        session.login(9);
        assert_eq!(session.model(), ModelKind::SemanticEmbedding);
    }
}
