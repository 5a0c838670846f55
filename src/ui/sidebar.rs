use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

use crate::model::Question;
use crate::progress::word_count;
use crate::state::{ActivePanel, AppState};

/// First visible row so that `position` stays on screen.
pub fn scroll_offset(position: usize, len: usize, visible: usize) -> usize {
    if visible == 0 || len <= visible {
        return 0;
    }
    position
        .saturating_sub(visible / 2)
        .min(len - visible)
}

/// One-line label for a question: its first non-empty line, without markup.
pub fn question_label(question: &Question) -> String {
    question
        .text
        .lines()
        .map(|l| l.trim().trim_start_matches('#').trim().replace(['*', '_', '`'], ""))
        .find(|l| !l.is_empty())
        .unwrap_or_default()
}

pub fn draw_sidebar(f: &mut Frame, area: Rect, state: &AppState) {
    if state.is_free_text() {
        draw_fields(f, area, state);
    } else {
        draw_questions(f, area, state);
    }
}

fn draw_questions(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let questions = session.questions();
    let nav = session.navigator();
    let visible = area.height.saturating_sub(2) as usize;
    let offset = scroll_offset(nav.position(), questions.len(), visible);
    let title_max = area.width.saturating_sub(10) as usize;

    let mut lines: Vec<Line> = Vec::new();
    for (i, q) in questions.iter().enumerate().skip(offset).take(visible) {
        let answered = session.answers().selected(q.id).is_some();
        let (icon, color) = if answered {
            ("✓", Color::Green)
        } else {
            ("○", Color::White)
        };
        let is_current = nav.is_active(i);
        let style = if is_current {
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let label = question_label(q);
        let mut shown: String = label.chars().take(title_max).collect();
        if label.chars().count() > title_max && title_max > 0 {
            shown.pop();
            shown.push('…');
        }

        lines.push(Line::from(vec![
            Span::styled(if is_current { " ▸ " } else { "   " }, style),
            Span::styled(format!("{} ", icon), style.fg(color)),
            Span::styled(format!("{:>2}. ", i + 1), style),
            Span::styled(shown, style),
        ]));
    }

    let progress = session.progress();
    let block = Block::default()
        .borders(Borders::RIGHT)
        .title(format!(" {} of {} answered ", progress.answered, progress.total))
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .border_style(panel_border(state));
    f.render_widget(Paragraph::new(lines).block(block), area);

    if questions.len() > visible {
        let scrollbar_area = Rect {
            x: area.x,
            y: area.y + 1,
            width: area.width,
            height: visible as u16,
        };
        let mut scrollbar_state = ScrollbarState::new(questions.len().saturating_sub(1))
            .position(nav.position())
            .viewport_content_length(3);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

fn draw_fields(f: &mut Frame, area: Rect, state: &AppState) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, (field, buffer)) in state
        .session
        .fields()
        .iter()
        .zip(state.buffers.iter())
        .enumerate()
    {
        let focused = i == state.field_focus;
        let style = if focused {
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let words = word_count(&buffer.text);
        let filled = !buffer.text.trim().is_empty();
        lines.push(Line::from(vec![
            Span::styled(if focused { " ▸ " } else { "   " }, style),
            Span::styled(
                if filled { "✓ " } else { "○ " },
                style.fg(if filled { Color::Green } else { Color::White }),
            ),
            Span::styled(field.label().to_string(), style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("     {} {}", words, if words == 1 { "word" } else { "words" }),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default()
        .borders(Borders::RIGHT)
        .title(" Fields ")
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .border_style(panel_border(state));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn panel_border(state: &AppState) -> Style {
    if state.active_panel == ActivePanel::Sidebar {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_keeps_position_visible() {
        assert_eq!(scroll_offset(0, 30, 10), 0);
        assert_eq!(scroll_offset(12, 30, 10), 7);
        assert_eq!(scroll_offset(29, 30, 10), 20);
        assert_eq!(scroll_offset(5, 4, 10), 0);
    }
}
