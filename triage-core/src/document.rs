//! Documents under review and the category vocabulary they are labeled with.
//!
//! Documents are immutable: they are loaded once from a fixture and never
//! modified by review actions. Review decisions live in
//! [`AnnotationStore`](crate::annotation::AnnotationStore), keyed by [`DocumentId`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::confidence::{classify, ConfidenceTier};

/// Newtype for document identifiers to prevent mixing with other integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A unit of content with a model-predicted category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
    pub predicted_category: String,
    /// Model confidence in `[0, 1]`.
    pub confidence_score: f64,
}

impl Document {
    pub fn new(
        id: impl Into<DocumentId>,
        text: impl Into<String>,
        predicted_category: impl Into<String>,
        confidence_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            predicted_category: predicted_category.into(),
            confidence_score,
        }
    }

    pub fn tier(&self) -> ConfidenceTier {
        classify(self.confidence_score)
    }

    /// Prediction with its confidence as a whole percentage, e.g. `Technology (95%)`.
    pub fn prediction_label(&self) -> String {
        format!(
            "{} ({:.0}%)",
            self.predicted_category,
            self.confidence_score * 100.0
        )
    }

    /// Categories offered as corrections: the vocabulary minus the prediction.
    ///
    /// This only shapes the menu. Correcting to the predicted category is still
    /// accepted by the store.
    pub fn correction_choices<'a>(&self, vocabulary: &'a CategoryVocabulary) -> Vec<&'a str> {
        vocabulary
            .iter()
            .filter(|category| *category != self.predicted_category)
            .collect()
    }
}

/// Ordered set of categories a reviewer may assign.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryVocabulary(Vec<String>);

impl CategoryVocabulary {
    /// Build a vocabulary, dropping blank entries and later duplicates.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: Vec<String> = Vec::new();
        for category in categories {
            let category = category.into();
            if category.trim().is_empty() || seen.contains(&category) {
                continue;
            }
            seen.push(category);
        }
        Self(seen)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|c| c == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
