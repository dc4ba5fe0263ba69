//! Per-document review decisions.
//!
//! The store is an explicit map from [`DocumentId`] to [`Annotation`]. Absence
//! of an entry means the document is unannotated. Setting an entry replaces
//! whatever was there before (last write wins) and no history is retained, so
//! the pending count is simply the number of keys in the map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::document::DocumentId;
use crate::error::{AnnotationError, SubmissionError};
use crate::submission::AnnotationSubmitter;

/// A reviewer's recorded decision about one document.
///
/// Serialized with the action as a tag:
/// ```json
/// { "action": "corrected", "category": "Sport" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Annotation {
    /// The predicted category was confirmed as-is.
    Validated,
    /// The reviewer assigned a category of their own.
    Corrected { category: String },
}

impl Annotation {
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Validated => None,
            Self::Corrected { category } => Some(category),
        }
    }

    /// Short status line shown next to an annotated document.
    pub fn status_label(&self) -> String {
        match self {
            Self::Validated => "validated".to_string(),
            Self::Corrected { category } => format!("corrected -> {}", category),
        }
    }
}

/// One line of a submission batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub document_id: DocumentId,
    #[serde(flatten)]
    pub annotation: Annotation,
}

/// All pending decisions, submitted as a single all-or-nothing unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnotationBatch {
    pub entries: Vec<BatchEntry>,
}

impl AnnotationBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Current review decision for each annotated document.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    entries: BTreeMap<DocumentId, Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a document as validated, replacing any previous decision.
    ///
    /// Returns the decision that was replaced, if any.
    pub fn validate(&mut self, document_id: DocumentId) -> Option<Annotation> {
        self.set(document_id, Annotation::Validated)
    }

    /// Record a corrected category, replacing any previous decision.
    ///
    /// The category is opaque to the store; it may even equal the predicted
    /// category. An empty category is rejected without touching the store.
    pub fn correct(
        &mut self,
        document_id: DocumentId,
        category: impl Into<String>,
    ) -> Result<Option<Annotation>, AnnotationError> {
        let category = category.into();
        if category.trim().is_empty() {
            warn!("Rejected correction of document {} with empty category", document_id);
            return Err(AnnotationError::EmptyCategory);
        }
        Ok(self.set(document_id, Annotation::Corrected { category }))
    }

    fn set(&mut self, document_id: DocumentId, annotation: Annotation) -> Option<Annotation> {
        let previous = self.entries.insert(document_id, annotation.clone());
        match &previous {
            Some(old) => debug!(
                "Document {}: {} replaced by {}",
                document_id,
                old.status_label(),
                annotation.status_label()
            ),
            None => debug!("Document {}: {}", document_id, annotation.status_label()),
        }
        previous
    }

    pub fn get(&self, document_id: DocumentId) -> Option<&Annotation> {
        self.entries.get(&document_id)
    }

    /// Number of documents with a recorded decision.
    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of every pending decision, ordered by document id.
    pub fn batch(&self) -> AnnotationBatch {
        AnnotationBatch {
            entries: self
                .entries
                .iter()
                .map(|(document_id, annotation)| BatchEntry {
                    document_id: *document_id,
                    annotation: annotation.clone(),
                })
                .collect(),
        }
    }

    /// Submit every pending decision as one batch.
    ///
    /// Entries are kept whether or not the submission succeeds: on success they
    /// stay visible as the reviewer's recorded decisions, on failure they are
    /// still there to retry. Returns the size of the submitted batch.
    pub async fn commit(
        &self,
        submitter: &dyn AnnotationSubmitter,
    ) -> Result<usize, SubmissionError> {
        let batch = self.batch();
        let size = batch.len();

        info!("Submitting batch of {} annotation(s)", size);
        match submitter.submit(&batch).await {
            Ok(()) => {
                info!("Batch of {} annotation(s) accepted", size);
                Ok(size)
            }
            Err(e) => {
                warn!("Batch of {} annotation(s) failed: {}", size, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::InMemorySubmitter;
    use proptest::prelude::*;

    #[test]
    fn test_validate_then_correct_is_last_write_wins() {
        let mut store = AnnotationStore::new();
        let doc = DocumentId(1);

        assert_eq!(store.validate(doc), None);
        let replaced = store.correct(doc, "Sport").unwrap();

        assert_eq!(replaced, Some(Annotation::Validated));
        assert_eq!(
            store.get(doc),
            Some(&Annotation::Corrected {
                category: "Sport".to_string()
            })
        );
        assert_eq!(store.pending_count(), 1);
    }

    #[test]
    fn test_correct_then_validate_returns_to_validated() {
        let mut store = AnnotationStore::new();
        let doc = DocumentId(2);

        store.correct(doc, "Health").unwrap();
        store.validate(doc);

        assert_eq!(store.get(doc), Some(&Annotation::Validated));
    }

    #[test]
    fn test_empty_category_is_rejected_without_state_change() {
        let mut store = AnnotationStore::new();
        store.validate(DocumentId(1));

        assert_eq!(
            store.correct(DocumentId(1), ""),
            Err(AnnotationError::EmptyCategory)
        );
        assert_eq!(
            store.correct(DocumentId(2), "   "),
            Err(AnnotationError::EmptyCategory)
        );

        assert_eq!(store.get(DocumentId(1)), Some(&Annotation::Validated));
        assert_eq!(store.get(DocumentId(2)), None);
        assert_eq!(store.pending_count(), 1);
    }

    #[test]
    fn test_store_does_not_check_document_identity_or_vocabulary() {
        let mut store = AnnotationStore::new();

        store.validate(DocumentId(9_999));
        store.correct(DocumentId(10_000), "Not A Category").unwrap();

        assert_eq!(store.pending_count(), 2);
    }

    #[test]
    fn test_batch_is_ordered_by_document_id() {
        let mut store = AnnotationStore::new();
        store.correct(DocumentId(3), "Finance").unwrap();
        store.validate(DocumentId(1));

        let ids: Vec<u64> = store
            .batch()
            .entries
            .iter()
            .map(|e| e.document_id.0)
            .collect();

        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_batch_entry_json_structure() {
        let entry = BatchEntry {
            document_id: DocumentId(2),
            annotation: Annotation::Corrected {
                category: "Sport".to_string(),
            },
        };

        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["document_id"], 2);
        assert_eq!(value["action"], "corrected");
        assert_eq!(value["category"], "Sport");
    }

    #[tokio::test]
    async fn test_commit_keeps_entries_on_success() {
        let mut store = AnnotationStore::new();
        store.validate(DocumentId(1));
        let submitter = InMemorySubmitter::new();

        let size = store.commit(&submitter).await.unwrap();

        assert_eq!(size, 1);
        assert_eq!(store.pending_count(), 1);
        assert_eq!(submitter.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_preserves_entries() {
        let mut store = AnnotationStore::new();
        store.validate(DocumentId(1));
        store.correct(DocumentId(2), "Sport").unwrap();
        let submitter = InMemorySubmitter::rejecting("maintenance");

        let result = store.commit(&submitter).await;

        assert!(matches!(result, Err(SubmissionError::Rejected { .. })));
        assert_eq!(store.pending_count(), 2);
        assert!(submitter.submitted().await.is_empty());
    }

    // =========================================================================
    // Property-based tests
    // =========================================================================

    #[derive(Debug, Clone)]
    enum Action {
        Validate(u64),
        Correct(u64, String),
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (0u64..20).prop_map(Action::Validate),
            (0u64..20, "[A-Z][a-z]{2,8}").prop_map(|(id, cat)| Action::Correct(id, cat)),
        ]
    }

    proptest! {
        /// Pending count tracks distinct ids, never the number of calls.
        #[test]
        fn prop_pending_count_is_distinct_ids(actions in prop::collection::vec(arb_action(), 0..64)) {
            let mut store = AnnotationStore::new();
            let mut ids = std::collections::HashSet::new();

            for action in &actions {
                match action {
                    Action::Validate(id) => {
                        store.validate(DocumentId(*id));
                        ids.insert(*id);
                    }
                    Action::Correct(id, category) => {
                        store.correct(DocumentId(*id), category.clone()).unwrap();
                        ids.insert(*id);
                    }
                }
            }

            prop_assert_eq!(store.pending_count(), ids.len());
            prop_assert_eq!(store.batch().len(), ids.len());
        }

        /// The last action for an id decides its state.
        #[test]
        fn prop_last_write_wins(actions in prop::collection::vec(arb_action(), 1..64)) {
            let mut store = AnnotationStore::new();
            for action in &actions {
                match action {
                    Action::Validate(id) => { store.validate(DocumentId(*id)); }
                    Action::Correct(id, category) => {
                        store.correct(DocumentId(*id), category.clone()).unwrap();
                    }
                }
            }

            let expected = match actions.last().unwrap() {
                Action::Validate(id) => (*id, Annotation::Validated),
                Action::Correct(id, category) => (*id, Annotation::Corrected { category: category.clone() }),
            };
            prop_assert_eq!(store.get(DocumentId(expected.0)), Some(&expected.1));
        }
    }
}
