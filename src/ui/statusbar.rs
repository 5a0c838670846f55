use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Gauge, Paragraph};
use ratatui::Frame;

use crate::controller::AutosaveStatus;
use crate::integrity::PastePolicy;
use crate::state::{AppState, Screen};

pub fn draw_statusbar(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let progress = session.progress();

    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(10)])
        .split(area);

    // A finished session always shows a full bar.
    let (ratio, percent) = if state.screen == Screen::Finished {
        (1.0, 100)
    } else {
        (progress.ratio(), progress.percent())
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Rgb(30, 30, 30)))
        .ratio(ratio)
        .label(format!("{} ({}%)", progress.label(), percent));
    f.render_widget(gauge, parts[0]);

    let (save_text, save_color) = match session.autosave_status() {
        AutosaveStatus::Idle if session.has_unsaved_changes() => ("● unsaved".to_string(), Color::Yellow),
        AutosaveStatus::Idle => ("  ".to_string(), Color::DarkGray),
        AutosaveStatus::Sending { .. } => ("◌ saving…".to_string(), Color::Yellow),
        AutosaveStatus::Saved { .. } if session.has_unsaved_changes() => {
            ("● unsaved".to_string(), Color::Yellow)
        }
        AutosaveStatus::Saved { .. } => ("✓ saved".to_string(), Color::Green),
        AutosaveStatus::Failed { .. } => ("✗ not saved".to_string(), Color::Red),
    };

    let mut spans = vec![
        Span::raw("  "),
        Span::styled(save_text, Style::default().fg(save_color)),
    ];

    if state.is_free_text() {
        let counters = session.counters();
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            format!("⌨ {}", counters.keypress_count),
            Style::default().fg(Color::White),
        ));
        if session.paste_policy() == PastePolicy::Blocked {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                format!("⎘ {} blocked", counters.paste_event_count),
                Style::default().fg(if counters.paste_event_count > 0 {
                    Color::Red
                } else {
                    Color::DarkGray
                }),
            ));
        }
    }

    if let Some(flash) = &state.flash {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(flash.clone(), Style::default().fg(Color::Yellow)));
    }

    let widget = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(30, 30, 30)));
    f.render_widget(widget, parts[1]);
}
