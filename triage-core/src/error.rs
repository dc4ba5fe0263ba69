//! Error types for review and refresh operations.
//!
//! None of these are fatal: every failure leaves local state intact and the
//! operation can simply be invoked again.

use thiserror::Error;

use crate::document::DocumentId;

/// Invalid input to the annotation store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("correction category must not be empty")]
    EmptyCategory,
}

/// The annotation-submission endpoint did not accept a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("submission rejected: {reason}")]
    Rejected { reason: String },
    #[error("submission endpoint unavailable: {reason}")]
    Unavailable { reason: String },
}

/// The aggregates source could not produce a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("aggregates source unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("aggregates source returned a malformed snapshot: {reason}")]
    Malformed { reason: String },
}

/// Errors surfaced by the review controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("unknown document {0}")]
    UnknownDocument(DocumentId),
    #[error("unknown category {0:?}")]
    UnknownCategory(String),
    #[error("no pending annotations to save")]
    NothingToCommit,
    #[error(transparent)]
    InvalidInput(#[from] AnnotationError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// A refresh ran to completion but produced no new snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("refresh task aborted: {reason}")]
    Aborted { reason: String },
}
