//! Terminal rendering of a sync report.

use console::style;

use crate::sync::{FileOutcome, SyncAction, SyncReport};

pub fn print_report(report: &SyncReport) {
    if report.outcomes.is_empty() {
        println!("{} No tagged documents to sync", style("→").cyan());
        return;
    }

    for outcome in &report.outcomes {
        println!("  {}", describe(outcome));
    }

    println!(
        "{} {} created, {} updated, {} failed, {} incomplete",
        if report.is_success() {
            style("✓").green()
        } else {
            style("!").yellow()
        },
        report.created(),
        report.updated(),
        report.failed(),
        report.incomplete()
    );
}

fn describe(outcome: &FileOutcome) -> String {
    let label = format!("{} [{}]", outcome.title, outcome.tag);
    match &outcome.action {
        SyncAction::Created {
            page_id,
            append_error: None,
            ..
        } => format!("{} created {} ({})", style("+").green(), label, page_id),
        SyncAction::Created {
            page_id,
            append_error: Some(e),
            ..
        } => format!(
            "{} created {} ({}) but content upload failed: {}",
            style("!").yellow(),
            label,
            page_id,
            e
        ),
        SyncAction::Updated { page_id, outcome: replace } if replace.is_clean() => {
            format!("{} updated {} ({})", style("~").cyan(), label, page_id)
        }
        SyncAction::Updated { page_id, outcome: replace } => {
            let mut problems = Vec::new();
            if !replace.failed_deletions.is_empty() {
                problems.push(format!(
                    "{} of {} old blocks left",
                    replace.failed_deletions.len(),
                    replace.listed
                ));
            }
            if let Some(e) = &replace.list_error {
                problems.push(format!("listing failed: {}", e));
            }
            if let Some(e) = &replace.append_error {
                problems.push(format!("upload failed: {}", e));
            }
            format!(
                "{} updated {} ({}) with problems: {}",
                style("!").yellow(),
                label,
                page_id,
                problems.join("; ")
            )
        }
        SyncAction::Failed(e) => format!("{} {} ({}): {}", style("✗").red(), label, outcome.path, e),
    }
}
