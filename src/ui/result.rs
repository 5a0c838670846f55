use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::controller::{FinishTrigger, SessionPhase};
use crate::state::AppState;
use crate::timer::format_elapsed;

pub fn draw_finishing(f: &mut Frame, area: Rect, state: &AppState) {
    let reason = match state.session.finish_trigger() {
        Some(FinishTrigger::TimeExpired) => "Time is up.",
        _ => "Finishing your session.",
    };
    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Submitting...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(reason),
        Line::from(""),
    ];

    let block = Block::default().borders(Borders::ALL);
    let widget = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(widget, area);
}

pub fn draw_finished(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let accepted = matches!(session.phase(), SessionPhase::Finished { accepted: true });
    let progress = session.progress();

    let mut lines = vec![
        Line::from(""),
        Line::from(""),
        if accepted {
            Line::from(Span::styled(
                "✓ Session finished",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(
                "⚠  Session closed without confirmation",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
        },
        Line::from(""),
    ];

    if let Some(at) = session.finished_at() {
        lines.push(Line::from(format!(
            "Finished: {}",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        )));
    }
    lines.push(Line::from(format!(
        "Time used: {}",
        format_elapsed(session.elapsed_seconds())
    )));
    lines.push(Line::from(format!("Answered: {}", progress.label())));

    if !accepted {
        lines.push(Line::from(""));
        lines.push(Line::from(
            "The server did not confirm the finish request. Answers saved so far are kept.",
        ));
    }

    if session.evaluation_available() {
        lines.push(Line::from(""));
        if session.evaluation_in_flight() {
            lines.push(Line::from(Span::styled(
                "Evaluating...",
                Style::default().fg(Color::Yellow),
            )));
        } else if let Some(evaluation) = session.evaluation() {
            let status = evaluation.status.as_deref().unwrap_or("evaluated");
            let text = match evaluation.total {
                Some(total) => format!("Evaluation: {} (score {})", status, total),
                None => format!("Evaluation: {}", status),
            };
            lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Cyan))));
        } else if let Some(error) = session.evaluation_error() {
            lines.push(Line::from(Span::styled(
                format!("Evaluation failed: {}", error),
                Style::default().fg(Color::Red),
            )));
        }
        if session.can_evaluate() {
            lines.push(Line::from(Span::styled(
                "[Ctrl+E] Evaluate now",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[Enter] Exit",
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default().borders(Borders::ALL);
    let widget = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(widget, area);
}
