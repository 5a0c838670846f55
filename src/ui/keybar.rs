use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::state::{AppState, Screen};

pub fn draw_keybar(f: &mut Frame, area: Rect, state: &AppState) {
    let evaluate = state.session.can_evaluate();
    let mut bindings: Vec<(&str, &str)> = match state.screen {
        Screen::Working if state.is_free_text() => vec![
            ("Tab", "next field"),
            ("arrows", "cursor"),
            ("Ctrl+S", "finish"),
            ("Ctrl+Q", "quit"),
            ("F1", "help"),
        ],
        Screen::Working => vec![
            ("a-z", "answer"),
            ("←/→", "prev/next"),
            ("PgUp/PgDn", "jump 5"),
            ("Tab", "panel"),
            ("Ctrl+S", "finish"),
            ("Ctrl+Q", "quit"),
            ("F1", "help"),
        ],
        Screen::Finishing => vec![("Ctrl+Q", "quit")],
        Screen::Finished => vec![("Enter", "exit")],
    };
    if evaluate {
        bindings.insert(bindings.len().saturating_sub(1), ("Ctrl+E", "evaluate"));
    }

    let mut spans: Vec<Span> = vec![Span::raw(" ")];
    for (i, (key, action)) in bindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(
            key.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {}", action)));
    }

    let widget = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(20, 20, 20)));
    f.render_widget(widget, area);
}
