use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::state::{AppState, Dialog};

pub fn draw_dialog(f: &mut Frame, area: Rect, state: &AppState) {
    let Some(dialog) = state.top_dialog() else {
        return;
    };

    match dialog {
        Dialog::ConfirmSubmit => draw_confirm_submit(f, area, state),
        Dialog::ConfirmQuit => draw_confirm_quit(f, area, state),
        Dialog::TwoMinuteWarning => draw_two_minute_warning(f, area),
        Dialog::Help => draw_help(f, area, state),
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn confirm_row() -> Line<'static> {
    Line::from(vec![
        Span::styled("   [Enter] Confirm", Style::default().fg(Color::Green)),
        Span::raw("    "),
        Span::styled("[Esc] Cancel", Style::default().fg(Color::DarkGray)),
    ])
}

fn render_box(f: &mut Frame, rect: Rect, lines: Vec<Line<'static>>, color: Color, title: Option<&str>) {
    f.render_widget(Clear, rect);
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    if let Some(title) = title {
        block = block.title(title.to_string());
    }
    f.render_widget(Paragraph::new(lines).block(block), rect);
}

fn draw_confirm_submit(f: &mut Frame, area: Rect, state: &AppState) {
    let progress = state.session.progress();
    let mut lines: Vec<Line<'static>> = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Finish the session now?",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    let open = progress.total.saturating_sub(progress.answered);
    if open > 0 {
        let noun = match (state.is_free_text(), open) {
            (true, _) => "part is",
            (false, 1) => "question is",
            (false, _) => "questions are",
        };
        lines.push(Line::from(format!("   {} {} not answered.", open, noun)));
    }
    lines.push(Line::from("   Answers cannot be changed afterwards."));
    lines.push(Line::from(""));
    lines.push(confirm_row());
    lines.push(Line::from(""));

    let rect = centered_rect(46, lines.len() as u16 + 2, area);
    render_box(f, rect, lines, Color::Yellow, None);
}

fn draw_confirm_quit(f: &mut Frame, area: Rect, _state: &AppState) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Leave the session?",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("   Answers are saved; the timer"),
        Line::from("   keeps running on the server."),
        Line::from(""),
        confirm_row(),
        Line::from(""),
    ];

    let rect = centered_rect(40, lines.len() as u16 + 2, area);
    render_box(f, rect, lines, Color::Yellow, None);
}

fn draw_two_minute_warning(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   ⚠  2 MINUTES REMAINING",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("   The session finishes by itself"),
        Line::from("   when time runs out."),
        Line::from(""),
        Line::from(Span::styled(
            "          [Enter] Continue",
            Style::default().fg(Color::Green),
        )),
        Line::from(""),
    ];

    let rect = centered_rect(42, lines.len() as u16 + 2, area);
    render_box(f, rect, lines, Color::Red, None);
}

fn draw_help(f: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Key Bindings",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    let bindings: &[&str] = if state.is_free_text() {
        &[
            "   Tab        Next field",
            "   Shift+Tab  Previous field",
            "   arrows     Move cursor",
            "   Enter      New line",
        ]
    } else {
        &[
            "   ←/→        Previous/Next question",
            "   PgUp/PgDn  Jump 5 questions",
            "   Home/End   First/Last question",
            "   a-z, 1-9   Select answer",
            "   ↑/↓ Space  Move and select",
            "   Tab        Switch panel",
        ]
    };
    lines.extend(bindings.iter().map(|b| Line::from(*b)));
    lines.push(Line::from("   Ctrl+S     Finish session"));
    if state.session.evaluation_available() {
        lines.push(Line::from("   Ctrl+E     Evaluate now"));
    }
    lines.push(Line::from("   Ctrl+Q     Quit"));
    lines.push(Line::from("   F1         This help"));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "        [Esc] Close",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));

    let rect = centered_rect(44, lines.len() as u16 + 2, area);
    render_box(f, rect, lines, Color::Cyan, Some(" Help "));
}
