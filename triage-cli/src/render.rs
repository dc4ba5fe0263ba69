//! Plain-text rendering of the review list and the summary view.

use triage_core::refresh::RefreshOutcome;
use triage_core::review::DocumentView;
use triage_core::{AggregateSnapshot, ReviewController, SaveStatus};

const BAR_WIDTH: u64 = 30;

pub fn review_list(controller: &ReviewController) -> String {
    let mut out = String::new();
    for view in controller.views() {
        out.push_str(&document_block(&view));
        out.push('\n');
    }

    out.push_str(&format!(
        "{} pending change(s)  [{}]\n",
        controller.pending_count(),
        controller.save_label()
    ));
    if let Some(line) = save_status_line(controller.save_status()) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn document_block(view: &DocumentView<'_>) -> String {
    let doc = view.document;
    let mut out = format!(
        "Document {}\n  {}\n  [{}] {}",
        doc.id,
        doc.text,
        view.tier.badge(),
        doc.prediction_label()
    );
    match view.annotation {
        Some(annotation) => out.push_str(&format!("  => {}", annotation.status_label())),
        None => out.push_str(&format!(
            "\n  correct to: {}",
            view.correction_choices.join(", ")
        )),
    }
    out.push('\n');
    out
}

pub fn save_status_line(status: &SaveStatus) -> Option<String> {
    match status {
        SaveStatus::Idle => None,
        SaveStatus::Saved { count } => Some(format!("Saved {} annotation(s).", count)),
        SaveStatus::Failed { reason } => Some(format!("Save failed: {}", reason)),
    }
}

pub fn dashboard(snapshot: &AggregateSnapshot, average_confidence: Option<u64>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Total annotations: {}\n",
        snapshot.total_annotations()
    ));
    match average_confidence {
        Some(pct) => out.push_str(&format!("Average confidence: {}%\n", pct)),
        None => out.push_str("Average confidence: n/a\n"),
    }

    out.push_str("\nBy category\n");
    let widest = snapshot.by_category.iter().map(|c| c.count).max().unwrap_or(0);
    for entry in &snapshot.by_category {
        out.push_str(&format!(
            "  {:<12} {:>5} {}\n",
            entry.category,
            entry.count,
            bar(entry.count, widest)
        ));
    }

    out.push_str("\nTimeline\n");
    for point in &snapshot.timeline {
        out.push_str(&format!("  {:<12} {:>5}\n", point.date, point.count));
    }

    out.push_str("\nConfidence distribution\n");
    for ((range, share), bucket) in snapshot
        .histogram_shares()
        .into_iter()
        .zip(&snapshot.confidence_histogram)
    {
        out.push_str(&format!("  {:<12} {:>5} ({}%)\n", range, bucket.count, share));
    }
    out
}

fn bar(count: u64, widest: u64) -> String {
    if widest == 0 {
        return String::new();
    }
    "#".repeat((count * BAR_WIDTH / widest) as usize)
}

pub fn refresh_outcome(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Applied { token, snapshot } => format!(
            "Refresh {} applied: {} total annotations",
            token.sequence,
            snapshot.total_annotations()
        ),
        RefreshOutcome::Discarded { token, .. } => {
            format!("Refresh {} discarded (session ended)", token.sequence)
        }
        RefreshOutcome::Failed { token, error } => {
            format!("Refresh {} failed: {}", token.sequence, error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use triage_core::{DocumentId, Fixture, InMemorySubmitter};

    fn controller() -> ReviewController {
        ReviewController::new(Fixture::builtin(), Arc::new(InMemorySubmitter::new()))
    }

    #[test]
    fn test_review_list_shows_choices_until_annotated() {
        let mut controller = controller();
        controller.correct(DocumentId(2), "Politics").unwrap();

        let text = review_list(&controller);

        assert!(text.contains("[success] Technology (95%)"));
        assert!(text.contains("correct to: Finance, Sport, Politics, Health"));
        assert!(text.contains("=> corrected -> Politics"));
        assert!(text.contains("1 pending change(s)  [Save (1)]"));
    }

    #[test]
    fn test_empty_review_list_footer() {
        let text = review_list(&controller());

        assert!(text.contains("0 pending change(s)  [No changes]"));
    }

    #[test]
    fn test_dashboard_lists_every_series() {
        let text = dashboard(&AggregateSnapshot::baseline(), Some(78));

        assert!(text.contains("Total annotations: 1247"));
        assert!(text.contains("Average confidence: 78%"));
        assert!(text.contains("21/11"));
        assert!(text.contains("0-20%"));
        // Largest category gets the full bar
        assert!(text.contains(&"#".repeat(BAR_WIDTH as usize)));
    }

    #[test]
    fn test_bar_of_all_zero_series() {
        assert_eq!(bar(0, 0), "");
    }

    #[test]
    fn test_save_status_lines() {
        assert_eq!(save_status_line(&SaveStatus::Idle), None);
        assert_eq!(
            save_status_line(&SaveStatus::Saved { count: 2 }),
            Some("Saved 2 annotation(s).".to_string())
        );
    }
}
