//! The recommender models a user can pick from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RankingError;

/// One of the four selectable recommender models.
///
/// Each maps to a precomputed score matrix; `Hybrid` and
/// `HybridWithSequence` share the same matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelKind {
    #[default]
    #[serde(rename = "Collaborative Filtering")]
    CollaborativeFiltering,
    #[serde(rename = "Semantic Embedding")]
    SemanticEmbedding,
    #[serde(rename = "Hybrid")]
    Hybrid,
    #[serde(rename = "Hybrid with Sequence")]
    HybridWithSequence,
}

impl ModelKind {
    /// All models, in the order they are offered to users
    pub const ALL: [ModelKind; 4] = [
        ModelKind::CollaborativeFiltering,
        ModelKind::SemanticEmbedding,
        ModelKind::Hybrid,
        ModelKind::HybridWithSequence,
    ];

    /// Display name, also the accepted identifier when parsing
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::CollaborativeFiltering => "Collaborative Filtering",
            ModelKind::SemanticEmbedding => "Semantic Embedding",
            ModelKind::Hybrid => "Hybrid",
            ModelKind::HybridWithSequence => "Hybrid with Sequence",
        }
    }

    /// Whether first pages mix in the sequence model's precomputed lists
    pub fn uses_sequence(self) -> bool {
        matches!(self, ModelKind::HybridWithSequence)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ModelKind::ALL
            .into_iter()
            .find(|model| model.name() == trimmed)
            .ok_or_else(|| RankingError::UnknownModel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_models() {
        for model in ModelKind::ALL {
            assert_eq!(model.name().parse::<ModelKind>().unwrap(), model);
        }
        assert_eq!(
            " Hybrid ".parse::<ModelKind>().unwrap(),
            ModelKind::Hybrid
        );
    }

    #[test]
    fn test_unknown_model_fails_fast() {
        let err = "Matrix Factorization".parse::<ModelKind>().unwrap_err();
        assert!(matches!(err, RankingError::UnknownModel(ref s) if s == "Matrix Factorization"));
        assert!(err.is_configuration());

        // Identifiers are matched exactly
        assert!("hybrid".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&ModelKind::HybridWithSequence).unwrap();
        assert_eq!(json, "\"Hybrid with Sequence\"");

        let model: ModelKind = serde_json::from_str("\"Semantic Embedding\"").unwrap();
        assert_eq!(model, ModelKind::SemanticEmbedding);
    }

    #[test]
    fn test_only_sequence_model_uses_sequence() {
        let sequence: Vec<_> = ModelKind::ALL.into_iter().filter(|m| m.uses_sequence()).collect();
        assert_eq!(sequence, vec![ModelKind::HybridWithSequence]);
        assert_eq!(ModelKind::default(), ModelKind::CollaborativeFiltering);
    }
}
