use crate::config::SessionDocument;
use crate::gateway::Evaluation;
use crate::model::SessionKind;
use crate::progress::{Progress, ProgressTracker};
use crate::timer::{format_elapsed, format_remaining, PLACEHOLDER};

/// Plain-text overview of a session document, used by `--check` and for
/// documents that only carry a result.
pub fn summary_lines(doc: &SessionDocument) -> Vec<String> {
    let mut out = vec![format!("Session: {}", doc.title())];

    if let Some(session) = &doc.session {
        let kind = match session.kind {
            SessionKind::Choice => "multiple choice",
            SessionKind::FreeText => "free text",
        };
        let required = session.fields.iter().map(|f| f.id.clone()).collect();
        let mut tracker = ProgressTracker::new(session.total_units(), required);
        let progress = tracker.recompute(&session.restored_answers());

        out.push(format!("Id: {}", session.id));
        out.push(format!("Kind: {}", kind));
        out.push(format!("Time left: {}", format_remaining(session.remaining_seconds)));
        match session.kind {
            SessionKind::Choice => out.push(format!("Questions: {}", session.questions.len())),
            SessionKind::FreeText => out.push(format!("Fields: {}", session.fields.len())),
        }
        out.push(format!("Progress: {} ({}%)", progress.label(), progress.percent()));
        if session.bypass_allowed() {
            out.push("Paste: allowed".to_string());
        }
        if session.eval_url.is_some() {
            out.push("Evaluation: available".to_string());
        }
    }

    if let Some(result) = &doc.result {
        let progress = Progress {
            answered: result.answered,
            total: result.total,
        };
        out.push(format!("Finished in: {}", format_elapsed(result.elapsed_seconds)));
        out.push(format!("Answered: {} ({}%)", progress.label(), progress.percent()));
        out.push(format!("Timer: {}", PLACEHOLDER));
        if result.eval_url.is_some() {
            out.push("Evaluation: available (--evaluate)".to_string());
        }
    }

    out
}

/// One line for the outcome of an evaluate request on a finished session.
pub fn evaluation_line(outcome: Result<&Evaluation, &str>) -> String {
    match outcome {
        Ok(evaluation) => {
            let status = evaluation.status.as_deref().unwrap_or("received");
            match evaluation.total {
                Some(total) => format!("Evaluation: {} (total {})", status, total),
                None => format!("Evaluation: {}", status),
            }
        }
        Err(reason) => format!("Evaluation failed: {}", reason),
    }
}

pub fn print_summary(doc: &SessionDocument) {
    for line in summary_lines(doc) {
        println!("{}", line);
    }
}
