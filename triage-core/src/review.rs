//! Review controller: documents paired with their current decision.
//!
//! The controller owns the document set and the [`AnnotationStore`]. It checks
//! that actions refer to known documents and categories before handing them to
//! the store, and submits pending decisions through an [`AnnotationSubmitter`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::annotation::{Annotation, AnnotationStore};
use crate::confidence::ConfidenceTier;
use crate::document::{CategoryVocabulary, Document, DocumentId};
use crate::error::ReviewError;
use crate::fixture::Fixture;
use crate::submission::AnnotationSubmitter;

/// Result of the most recent save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SaveStatus {
    /// Nothing saved since the last action.
    Idle,
    /// The last save submitted this many decisions.
    Saved { count: usize },
    /// The last save failed; decisions are still pending.
    Failed { reason: String },
}

/// A document as presented to the reviewer.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView<'a> {
    pub document: &'a Document,
    pub tier: ConfidenceTier,
    pub annotation: Option<&'a Annotation>,
    /// Menu of corrections; empty once the document is annotated.
    pub correction_choices: Vec<&'a str>,
}

/// Receipt for an accepted commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    pub submitted: usize,
}

pub struct ReviewController {
    documents: Vec<Document>,
    categories: CategoryVocabulary,
    store: AnnotationStore,
    submitter: Arc<dyn AnnotationSubmitter>,
    save_status: SaveStatus,
}

impl ReviewController {
    pub fn new(fixture: Fixture, submitter: Arc<dyn AnnotationSubmitter>) -> Self {
        Self {
            documents: fixture.documents,
            categories: fixture.categories,
            store: AnnotationStore::new(),
            submitter,
            save_status: SaveStatus::Idle,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn categories(&self) -> &CategoryVocabulary {
        &self.categories
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn annotation(&self, id: DocumentId) -> Option<&Annotation> {
        self.store.get(id)
    }

    /// Every document in fixture order, with its current decision.
    pub fn views(&self) -> Vec<DocumentView<'_>> {
        self.documents
            .iter()
            .map(|document| {
                let annotation = self.store.get(document.id);
                DocumentView {
                    document,
                    tier: document.tier(),
                    annotation,
                    correction_choices: if annotation.is_some() {
                        Vec::new()
                    } else {
                        document.correction_choices(&self.categories)
                    },
                }
            })
            .collect()
    }

    fn require_document(&self, id: DocumentId) -> Result<(), ReviewError> {
        if self.document(id).is_some() {
            Ok(())
        } else {
            warn!("Action on unknown document {}", id);
            Err(ReviewError::UnknownDocument(id))
        }
    }

    pub fn validate(&mut self, id: DocumentId) -> Result<(), ReviewError> {
        self.require_document(id)?;
        self.store.validate(id);
        self.save_status = SaveStatus::Idle;
        info!("Document {} validated", id);
        Ok(())
    }

    /// Correct a document's category.
    ///
    /// The category must be in the vocabulary. Choosing the predicted category
    /// is allowed and recorded as a correction.
    pub fn correct(&mut self, id: DocumentId, category: &str) -> Result<(), ReviewError> {
        self.require_document(id)?;
        if !category.trim().is_empty() && !self.categories.contains(category) {
            warn!("Rejected unknown category {:?} for document {}", category, id);
            return Err(ReviewError::UnknownCategory(category.to_string()));
        }
        self.store.correct(id, category)?;
        self.save_status = SaveStatus::Idle;
        info!("Document {} corrected to {}", id, category);
        Ok(())
    }

    pub fn pending_count(&self) -> usize {
        self.store.pending_count()
    }

    /// Whether the save trigger is enabled.
    pub fn can_save(&self) -> bool {
        self.pending_count() > 0
    }

    pub fn save_label(&self) -> String {
        match self.pending_count() {
            0 => "No changes".to_string(),
            n => format!("Save ({})", n),
        }
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }

    /// Submit all pending decisions as one batch.
    ///
    /// Decisions stay recorded afterwards, whatever the outcome.
    pub async fn commit(&mut self) -> Result<CommitReceipt, ReviewError> {
        if !self.can_save() {
            return Err(ReviewError::NothingToCommit);
        }

        match self.store.commit(self.submitter.as_ref()).await {
            Ok(submitted) => {
                self.save_status = SaveStatus::Saved { count: submitted };
                Ok(CommitReceipt { submitted })
            }
            Err(e) => {
                self.save_status = SaveStatus::Failed {
                    reason: e.to_string(),
                };
                Err(e.into())
            }
        }
    }

    /// Average model confidence over the document set, in whole percent.
    pub fn average_confidence_percent(&self) -> Option<u64> {
        if self.documents.is_empty() {
            return None;
        }
        let sum: f64 = self.documents.iter().map(|d| d.confidence_score).sum();
        Some((sum / self.documents.len() as f64 * 100.0).round() as u64)
    }
}
