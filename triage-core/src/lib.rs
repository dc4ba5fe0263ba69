pub mod aggregates;
pub mod annotation;
pub mod confidence;
pub mod document;
pub mod error;
pub mod fixture;
pub mod refresh;
pub mod review;
pub mod submission;

pub use aggregates::{AggregateSnapshot, AggregatesSource, AggregationEngine, PerturbationSource};
pub use annotation::{Annotation, AnnotationBatch, AnnotationStore, BatchEntry};
pub use confidence::{classify, ConfidenceTier};
pub use document::{CategoryVocabulary, Document, DocumentId};
pub use error::{AnnotationError, FetchError, RefreshError, ReviewError, SubmissionError};
pub use fixture::Fixture;
pub use refresh::{
    auto_refresh_loop, RefreshCoordinator, RefreshOutcome, RefreshRequest, RefreshState,
};
pub use review::{ReviewController, SaveStatus};
pub use submission::{AnnotationSubmitter, InMemorySubmitter};
