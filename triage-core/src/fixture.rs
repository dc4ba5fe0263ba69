//! Document fixtures.
//!
//! The document set and category vocabulary are supplied by the caller, either
//! the built-in demo fixture or a JSON file of the form:
//! ```json
//! {
//!   "documents": [
//!     { "id": 1, "text": "...", "predicted_category": "Technology", "confidence_score": 0.95 }
//!   ],
//!   "categories": ["Technology", "Finance"]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{CategoryVocabulary, Document, DocumentId};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate document id {0}")]
    DuplicateDocument(DocumentId),
    #[error("document {id} has confidence {score} outside [0, 1]")]
    ConfidenceOutOfRange { id: DocumentId, score: f64 },
    #[error("fixture has no categories")]
    EmptyVocabulary,
}

/// A static document set with the categories reviewers may choose from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub documents: Vec<Document>,
    pub categories: CategoryVocabulary,
}

impl Fixture {
    /// The three-document demo set.
    pub fn builtin() -> Self {
        Self {
            documents: vec![
                Document::new(
                    1,
                    "Artificial intelligence is transforming the technology industry with major advances...",
                    "Technology",
                    0.95,
                ),
                Document::new(
                    2,
                    "Financial markets rallied sharply after the central bank's announcements...",
                    "Finance",
                    0.78,
                ),
                Document::new(
                    3,
                    "The football match ended 3-2 after extra time...",
                    "Sport",
                    0.62,
                ),
            ],
            categories: CategoryVocabulary::new([
                "Technology",
                "Finance",
                "Sport",
                "Politics",
                "Health",
            ]),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, FixtureError> {
        let raw: Fixture = serde_json::from_str(json)?;
        let fixture = Self {
            categories: CategoryVocabulary::new(raw.categories.iter()),
            documents: raw.documents,
        };
        fixture.check()?;
        Ok(fixture)
    }

    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn check(&self) -> Result<(), FixtureError> {
        if self.categories.is_empty() {
            return Err(FixtureError::EmptyVocabulary);
        }

        let mut seen = HashSet::new();
        for doc in &self.documents {
            if !seen.insert(doc.id) {
                return Err(FixtureError::DuplicateDocument(doc.id));
            }
            if !(0.0..=1.0).contains(&doc.confidence_score) {
                return Err(FixtureError::ConfidenceOutOfRange {
                    id: doc.id,
                    score: doc.confidence_score,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::ConfidenceTier;

    #[test]
    fn test_builtin_fixture() {
        let fixture = Fixture::builtin();

        let tiers: Vec<_> = fixture.documents.iter().map(|d| d.tier()).collect();
        assert_eq!(
            tiers,
            vec![
                ConfidenceTier::High,
                ConfidenceTier::Medium,
                ConfidenceTier::Medium
            ]
        );
        assert_eq!(fixture.categories.len(), 5);
        assert!(fixture.check().is_ok());
    }

    #[test]
    fn test_parse_fixture() {
        let json = r#"{
            "documents": [
                {"id": 10, "text": "a", "predicted_category": "Health", "confidence_score": 0.4}
            ],
            "categories": ["Health", "Sport", "Health"]
        }"#;

        let fixture = Fixture::from_json_str(json).unwrap();

        assert_eq!(fixture.documents[0].id, DocumentId(10));
        assert_eq!(fixture.categories.len(), 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{
            "documents": [
                {"id": 1, "text": "a", "predicted_category": "Health", "confidence_score": 0.4},
                {"id": 1, "text": "b", "predicted_category": "Sport", "confidence_score": 0.9}
            ],
            "categories": ["Health"]
        }"#;

        assert!(matches!(
            Fixture::from_json_str(json),
            Err(FixtureError::DuplicateDocument(DocumentId(1)))
        ));
    }

    #[test]
    fn test_out_of_range_confidence_rejected() {
        let json = r#"{
            "documents": [
                {"id": 1, "text": "a", "predicted_category": "Health", "confidence_score": 1.5}
            ],
            "categories": ["Health"]
        }"#;

        assert!(matches!(
            Fixture::from_json_str(json),
            Err(FixtureError::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let json = r#"{"documents": [], "categories": ["", " "]}"#;

        assert!(matches!(
            Fixture::from_json_str(json),
            Err(FixtureError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            Fixture::from_json_str("{not json"),
            Err(FixtureError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Fixture::from_path(Path::new("/nonexistent/fixture.json")).unwrap_err();

        assert!(err.to_string().contains("/nonexistent/fixture.json"));
    }
}
