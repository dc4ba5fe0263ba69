//! Annotation-submission endpoint abstraction.
//!
//! A production deployment wires [`AnnotationSubmitter`] to a real service.
//! The in-memory implementation records accepted batches and can be told to
//! reject everything, which is enough for local runs and tests.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::annotation::AnnotationBatch;
use crate::error::SubmissionError;

/// Receives batches of review decisions.
///
/// A batch is all-or-nothing: an `Err` means none of its entries were
/// accepted. Implementations must not retry on their own.
#[async_trait]
pub trait AnnotationSubmitter: Send + Sync {
    async fn submit(&self, batch: &AnnotationBatch) -> Result<(), SubmissionError>;
}

/// Submitter that keeps accepted batches in memory.
pub struct InMemorySubmitter {
    submitted: RwLock<Vec<AnnotationBatch>>,
    /// When set, every batch is rejected with this reason.
    reject_reason: Option<String>,
}

impl InMemorySubmitter {
    pub fn new() -> Self {
        Self {
            submitted: RwLock::new(Vec::new()),
            reject_reason: None,
        }
    }

    /// A submitter that rejects every batch.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            submitted: RwLock::new(Vec::new()),
            reject_reason: Some(reason.into()),
        }
    }

    /// Batches accepted so far, oldest first.
    pub async fn submitted(&self) -> Vec<AnnotationBatch> {
        self.submitted.read().await.clone()
    }
}

impl Default for InMemorySubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnnotationSubmitter for InMemorySubmitter {
    async fn submit(&self, batch: &AnnotationBatch) -> Result<(), SubmissionError> {
        if let Some(reason) = &self.reject_reason {
            return Err(SubmissionError::Rejected {
                reason: reason.clone(),
            });
        }

        let mut submitted = self.submitted.write().await;
        submitted.push(batch.clone());
        info!(
            "Recorded batch {} with {} entries",
            submitted.len(),
            batch.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, BatchEntry};
    use crate::document::DocumentId;

    fn single_entry_batch() -> AnnotationBatch {
        AnnotationBatch {
            entries: vec![BatchEntry {
                document_id: DocumentId(1),
                annotation: Annotation::Validated,
            }],
        }
    }

    #[tokio::test]
    async fn test_records_batches_in_order() {
        let submitter = InMemorySubmitter::new();

        submitter.submit(&AnnotationBatch::default()).await.unwrap();
        submitter.submit(&single_entry_batch()).await.unwrap();

        let submitted = submitter.submitted().await;
        assert_eq!(submitted.len(), 2);
        assert!(submitted[0].is_empty());
        assert_eq!(submitted[1].len(), 1);
    }

    #[tokio::test]
    async fn test_rejecting_submitter_records_nothing() {
        let submitter = InMemorySubmitter::rejecting("read-only");

        let result = submitter.submit(&single_entry_batch()).await;

        assert_eq!(
            result,
            Err(SubmissionError::Rejected {
                reason: "read-only".to_string()
            })
        );
        assert!(submitter.submitted().await.is_empty());
    }
}
