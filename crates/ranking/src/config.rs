//! Where the score matrices live and how pages are cut.

use data_loader::UserId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{DEFAULT_PAGE_SIZE, DEFAULT_SEQUENCE_USER_THRESHOLD};
use crate::error::{RankingError, Result};
use crate::model::ModelKind;

/// Ranking configuration.
///
/// File entries are resolved against `data_dir` unless they are absolute.
/// Every field has a default, so a JSON config only needs the keys it
/// overrides:
///
/// ```json
/// { "data_dir": "UI/data", "sequence_user_threshold": 1500 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub data_dir: PathBuf,
    pub collaborative_filtering_scores: PathBuf,
    pub semantic_embedding_scores: PathBuf,
    /// Shared by the Hybrid and Hybrid with Sequence models
    pub hybrid_scores: PathBuf,
    pub sequence_predictions: PathBuf,
    pub page_size: usize,
    /// Users below this ordinal are covered by the sequence model
    pub sequence_user_threshold: UserId,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            collaborative_filtering_scores: PathBuf::from("score_cf_normalized.npy"),
            semantic_embedding_scores: PathBuf::from("score_semantic_normalized.npy"),
            hybrid_scores: PathBuf::from("score_hybrid_full.npy"),
            sequence_predictions: PathBuf::from("seq_pred.csv"),
            page_size: DEFAULT_PAGE_SIZE,
            sequence_user_threshold: DEFAULT_SEQUENCE_USER_THRESHOLD,
        }
    }
}

impl RankingConfig {
    /// Default file names inside `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Read a JSON config file; missing keys take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RankingError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: RankingConfig = serde_json::from_str(&content).map_err(|e| {
            RankingError::Configuration(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(RankingError::Configuration(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Backing matrix file of a model
    pub fn matrix_path(&self, model: ModelKind) -> PathBuf {
        let file = match model {
            ModelKind::CollaborativeFiltering => &self.collaborative_filtering_scores,
            ModelKind::SemanticEmbedding => &self.semantic_embedding_scores,
            ModelKind::Hybrid | ModelKind::HybridWithSequence => &self.hybrid_scores,
        };
        self.data_dir.join(file)
    }

    pub fn sequence_path(&self) -> PathBuf {
        self.data_dir.join(&self.sequence_predictions)
    }
}
