use std::sync::Arc;
use std::time::Duration;

use triage_core::aggregates::{CategoryCount, ScriptedDeltas};
use triage_core::{
    AggregateSnapshot, AggregationEngine, Annotation, BatchEntry, DocumentId, Fixture,
    InMemorySubmitter, PerturbationSource, RefreshCoordinator, RefreshOutcome, RefreshRequest,
    ReviewController,
};

#[tokio::test]
async fn test_validate_and_correct_then_commit_submits_two_entries() {
    let submitter = Arc::new(InMemorySubmitter::new());
    let mut controller = ReviewController::new(Fixture::builtin(), submitter.clone());

    controller.validate(DocumentId(1)).unwrap();
    controller.correct(DocumentId(2), "Sport").unwrap();
    assert_eq!(controller.pending_count(), 2);

    let receipt = controller.commit().await.unwrap();

    assert_eq!(receipt.submitted, 2);
    let batches = submitter.submitted().await;
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].entries,
        vec![
            BatchEntry {
                document_id: DocumentId(1),
                annotation: Annotation::Validated,
            },
            BatchEntry {
                document_id: DocumentId(2),
                annotation: Annotation::Corrected {
                    category: "Sport".to_string()
                },
            },
        ]
    );
    // Decisions remain visible after a successful save
    assert_eq!(controller.pending_count(), 2);
}

#[tokio::test]
async fn test_refresh_with_fixed_deltas() {
    let baseline = AggregateSnapshot {
        by_category: vec![
            CategoryCount {
                category: "Technology".to_string(),
                count: 450,
            },
            CategoryCount {
                category: "Finance".to_string(),
                count: 320,
            },
        ],
        timeline: vec![],
        confidence_histogram: vec![],
    };
    let source = PerturbationSource::new(baseline.clone(), ScriptedDeltas::new([3, -7]));
    let engine = Arc::new(AggregationEngine::new(baseline, Arc::new(source)));
    let coordinator = RefreshCoordinator::new(engine.clone());

    let RefreshRequest::Started(handle) = coordinator.request_refresh() else {
        panic!("expected a refresh to start");
    };
    let outcome = handle.wait().await;

    assert!(matches!(outcome, RefreshOutcome::Applied { .. }));
    let snapshot = engine.snapshot().await;
    assert_eq!(
        snapshot.by_category,
        vec![
            CategoryCount {
                category: "Technology".to_string(),
                count: 453,
            },
            CategoryCount {
                category: "Finance".to_string(),
                count: 313,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_annotations_during_refresh_are_unaffected() {
    let source = PerturbationSource::new(AggregateSnapshot::baseline(), ScriptedDeltas::new([5]))
        .with_latency(Duration::from_millis(500));
    let engine = Arc::new(AggregationEngine::new(
        AggregateSnapshot::baseline(),
        Arc::new(source),
    ));
    let coordinator = RefreshCoordinator::new(engine.clone());
    let mut controller =
        ReviewController::new(Fixture::builtin(), Arc::new(InMemorySubmitter::new()));

    let RefreshRequest::Started(handle) = coordinator.request_refresh() else {
        panic!("expected a refresh to start");
    };
    controller.validate(DocumentId(3)).unwrap();
    controller.correct(DocumentId(3), "Health").unwrap();
    assert!(matches!(
        coordinator.request_refresh(),
        RefreshRequest::AlreadyInProgress
    ));
    handle.wait().await;

    assert_eq!(
        controller.annotation(DocumentId(3)),
        Some(&Annotation::Corrected {
            category: "Health".to_string()
        })
    );
    assert_eq!(controller.pending_count(), 1);
    assert_eq!(engine.snapshot().await.by_category[0].count, 455);
    assert!(coordinator.trigger_enabled());
}
