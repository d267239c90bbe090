//! Long-lived cache of score matrices and sequence predictions.
//!
//! Files are read at most once and then shared read-only through `Arc`.
//! Matrices are keyed by backing file, so models that point at the same file
//! share one matrix in memory.

use data_loader::{ScoreMatrix, SequencePredictions, parser};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, instrument};

use crate::config::RankingConfig;
use crate::error::{RankingError, Result};
use crate::model::ModelKind;

/// Shared store of loaded model inputs
#[derive(Debug)]
pub struct ModelStore {
    config: RankingConfig,
    matrices: RwLock<HashMap<PathBuf, Arc<ScoreMatrix>>>,
    sequence_predictions: RwLock<Option<Arc<SequencePredictions>>>,
}

impl ModelStore {
    /// Create an empty store; nothing is read until first use
    pub fn new(config: RankingConfig) -> Self {
        Self {
            config,
            matrices: RwLock::new(HashMap::new()),
            sequence_predictions: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// The already-loaded matrix of a model, without touching the disk
    pub fn get(&self, model: ModelKind) -> Result<Arc<ScoreMatrix>> {
        let path = self.config.matrix_path(model);
        self.matrices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path)
            .cloned()
            .ok_or(RankingError::MatrixNotLoaded { model })
    }

    /// The matrix of a model, reading its file on first use
    pub fn load(&self, model: ModelKind) -> Result<Arc<ScoreMatrix>> {
        if let Ok(matrix) = self.get(model) {
            return Ok(matrix);
        }

        let path = self.config.matrix_path(model);
        info!("Loading {} scores from {:?}", model, path);
        let matrix = parser::parse_score_matrix(&path)?;
        info!(
            "Loaded {} x {} score matrix for {}",
            matrix.n_users(),
            matrix.n_items(),
            model
        );
        Ok(self.store_matrix(path, matrix))
    }

    /// Put an in-memory matrix in place of a model's backing file
    pub fn insert(&self, model: ModelKind, matrix: ScoreMatrix) -> Arc<ScoreMatrix> {
        let path = self.config.matrix_path(model);
        let matrix = Arc::new(matrix);
        self.matrices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, matrix.clone());
        matrix
    }

    /// Keeps the first matrix stored for a path if two loads race
    fn store_matrix(&self, path: PathBuf, matrix: ScoreMatrix) -> Arc<ScoreMatrix> {
        self.matrices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path)
            .or_insert_with(|| Arc::new(matrix))
            .clone()
    }

    /// Load every distinct matrix file in parallel
    #[instrument(skip(self))]
    pub fn preload(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let pending: Vec<ModelKind> = ModelKind::ALL
            .into_iter()
            .filter(|&model| seen.insert(self.config.matrix_path(model)))
            .filter(|&model| self.get(model).is_err())
            .collect();

        pending
            .par_iter()
            .map(|&model| self.load(model).map(|_| ()))
            .collect::<Result<Vec<()>>>()?;

        info!("Preloaded {} score matrices", self.loaded_count());
        Ok(())
    }

    /// Number of distinct matrices held in memory
    pub fn loaded_count(&self) -> usize {
        self.matrices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The sequence model's predictions, reading the file on first use
    pub fn sequence_predictions(&self) -> Result<Arc<SequencePredictions>> {
        if let Some(predictions) = self
            .sequence_predictions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(predictions.clone());
        }

        let path = self.config.sequence_path();
        info!("Loading sequence predictions from {:?}", path);
        let predictions = parser::parse_sequence_predictions(&path)?;
        info!("Loaded sequence predictions for {} users", predictions.len());

        let mut slot = self
            .sequence_predictions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(slot.get_or_insert_with(|| Arc::new(predictions)).clone())
    }

    /// Put in-memory sequence predictions in place of the file
    pub fn insert_sequence_predictions(&self, predictions: SequencePredictions) {
        *self
            .sequence_predictions
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(predictions));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_data_store() -> ModelStore {
        ModelStore::new(RankingConfig::with_data_dir("/nonexistent/ranking-data"))
    }

    fn tiny_matrix() -> ScoreMatrix {
        ScoreMatrix::from_rows(vec![vec![0.1, 0.2]]).unwrap()
    }

    #[test]
    fn test_get_before_load_is_not_loaded() {
        let store = missing_data_store();
        let err = store.get(ModelKind::SemanticEmbedding).unwrap_err();
        assert!(matches!(
            err,
            RankingError::MatrixNotLoaded { model: ModelKind::SemanticEmbedding }
        ));
    }

    #[test]
    fn test_hybrid_models_share_one_matrix() {
        let store = missing_data_store();
        let inserted = store.insert(ModelKind::Hybrid, tiny_matrix());

        let shared = store.load(ModelKind::HybridWithSequence).unwrap();
        assert!(Arc::ptr_eq(&inserted, &shared));
        assert_eq!(store.loaded_count(), 1);
        assert!(store.get(ModelKind::CollaborativeFiltering).is_err());
    }

    #[test]
    fn test_load_missing_file_reports_data_error() {
        let store = missing_data_store();
        let err = store.load(ModelKind::CollaborativeFiltering).unwrap_err();
        assert!(matches!(err, RankingError::Data(_)));
    }

    #[test]
    fn test_preload_skips_already_loaded() {
        let store = missing_data_store();
        for model in ModelKind::ALL {
            store.insert(model, tiny_matrix());
        }

        store.preload().unwrap();
        assert_eq!(store.loaded_count(), 3);
    }

    #[test]
    fn test_inserted_sequence_predictions_are_cached() {
        let store = missing_data_store();
        store.insert_sequence_predictions(vec![(0, vec![1])].into_iter().collect());

        let first = store.sequence_predictions().unwrap();
        let second = store.sequence_predictions().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.get(0), Some(&[1][..]));
    }
}
