use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

use crate::state::{AppState, TextBuffer};
use crate::ui::markdown::markdown_to_lines;

pub const PREV_BUTTON: std::ops::Range<usize> = 2..10;
pub const NEXT_BUTTON: std::ops::Range<usize> = 12..20;

/// Maps content lines to clickable elements for mouse handling.
pub struct QuestionHitMap {
    /// (first_content_line, option_index) for each option.
    pub choice_lines: Vec<(usize, usize)>,
    /// First line after the last option.
    pub choices_end: usize,
    pub button_line: usize,
}

pub fn compute_hit_map(state: &AppState, area: Rect) -> Option<QuestionHitMap> {
    build_choice_slide(state, area.width as usize).map(|(_, hit_map)| hit_map)
}

fn build_choice_slide(state: &AppState, width: usize) -> Option<(Vec<Line<'static>>, QuestionHitMap)> {
    let session = &state.session;
    let question = session.current_question()?;
    let nav = session.navigator();
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(Line::from(Span::styled(
        format!("  Question {} of {}", nav.position() + 1, nav.len()),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    let body_width = width.saturating_sub(4);
    for line in markdown_to_lines(&question.text) {
        for wline in wrap_styled_line(line, body_width) {
            lines.push(Line::from(
                std::iter::once(Span::raw("  "))
                    .chain(wline.spans)
                    .collect::<Vec<_>>(),
            ));
        }
    }

    lines.push(Line::from(""));
    let selected = session.answers().selected(question.id);
    let mut choice_lines = Vec::new();
    for (i, option) in question.options.iter().enumerate() {
        choice_lines.push((lines.len(), i));
        let is_selected = selected == Some(option.id);
        let is_cursor = i == state.choice_cursor;
        let letter = (b'A' + (i % 26) as u8) as char;
        let radio = if is_selected { "(●)" } else { "( )" };

        let mut style = if is_selected {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        if is_cursor {
            style = style.add_modifier(Modifier::BOLD);
        }

        let prefix = format!("{}{} {}. ", if is_cursor { "▸ " } else { "  " }, radio, letter);
        let prefix_len = prefix.chars().count();
        let wrapped = wrap_text(&option.text, width.saturating_sub(prefix_len));
        for (li, wline) in wrapped.into_iter().enumerate() {
            let lead = if li == 0 {
                prefix.clone()
            } else {
                " ".repeat(prefix_len)
            };
            lines.push(Line::from(vec![
                Span::styled(lead, style),
                Span::styled(wline, style),
            ]));
        }
    }
    let choices_end = lines.len();

    lines.push(Line::from(""));
    let button_line = lines.len();
    let enabled = Style::default().fg(Color::Cyan);
    let disabled = Style::default().fg(Color::DarkGray);
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("[◂ Prev]", if nav.can_prev() { enabled } else { disabled }),
        Span::raw("  "),
        Span::styled("[Next ▸]", if nav.can_next() { enabled } else { disabled }),
    ]));

    Some((
        lines,
        QuestionHitMap {
            choice_lines,
            choices_end,
            button_line,
        },
    ))
}

pub fn draw_question(f: &mut Frame, area: Rect, state: &AppState) {
    if state.is_free_text() {
        draw_text_fields(f, area, state);
        return;
    }

    let Some((lines, _)) = build_choice_slide(state, area.width as usize) else {
        let p = Paragraph::new("No questions").block(Block::default().borders(Borders::ALL));
        f.render_widget(p, area);
        return;
    };

    let total = lines.len();
    let visible = area.height as usize;
    let scroll = state.question_scroll.min(total.saturating_sub(visible));
    let widget = Paragraph::new(lines).scroll((scroll as u16, 0));
    f.render_widget(widget, area);

    if total > visible {
        let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(visible)).position(scroll);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn draw_text_fields(f: &mut Frame, area: Rect, state: &AppState) {
    let fields = state.session.fields();
    if fields.is_empty() {
        return;
    }
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Ratio(1, fields.len() as u32))
        .collect();
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let editable = state.session.is_active();
    for (i, ((field, buffer), rect)) in fields
        .iter()
        .zip(state.buffers.iter())
        .zip(areas.iter())
        .enumerate()
    {
        let focused = i == state.field_focus;
        let border = if focused && editable {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", field.label()))
            .border_style(border);
        let inner = block.inner(*rect);
        let width = inner.width as usize;
        let height = inner.height as usize;

        let rows = hard_wrap(&buffer.text, width);
        let (cursor_row, cursor_col) = visual_cursor(buffer, width);
        let scroll = if height == 0 {
            0
        } else {
            cursor_row.saturating_sub(height - 1)
        };

        let lines: Vec<Line> = rows
            .into_iter()
            .skip(scroll)
            .take(height)
            .map(Line::from)
            .collect();
        f.render_widget(Paragraph::new(lines).block(block), *rect);

        if focused && editable && !state.has_dialog() && height > 0 {
            f.set_cursor_position(Position::new(
                inner.x + cursor_col as u16,
                inner.y + (cursor_row - scroll) as u16,
            ));
        }
    }
}

/// Splits on newlines, then breaks every row at `width` chars.
fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() || width == 0 {
            rows.push(line.to_string());
            continue;
        }
        for chunk in chars.chunks(width) {
            rows.push(chunk.iter().collect());
        }
        if chars.len() % width == 0 {
            rows.push(String::new());
        }
    }
    rows
}

/// Row and column of the cursor in the `hard_wrap` layout.
fn visual_cursor(buffer: &TextBuffer, width: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for c in buffer.text.chars().take(buffer.cursor) {
        if c == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
            if width > 0 && col == width {
                row += 1;
                col = 0;
            }
        }
    }
    (row, col)
}

/// Wrap a styled Line at `width`, preserving span styles across breaks.
fn wrap_styled_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let chars: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |c| (c, span.style)))
        .collect();
    if width == 0 || chars.len() <= width {
        return vec![line];
    }

    let mut result: Vec<Line<'static>> = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        if chars.len() - pos <= width {
            result.push(styled_chars_to_line(&chars[pos..]));
            break;
        }
        let chunk_end = pos + width;
        let break_at = if chars[chunk_end].0 == ' ' {
            chunk_end
        } else {
            match chars[pos..chunk_end].iter().rposition(|(c, _)| *c == ' ') {
                Some(sp) if sp > 0 => pos + sp,
                _ => chunk_end,
            }
        };
        result.push(styled_chars_to_line(&chars[pos..break_at]));
        pos = break_at;
        if pos < chars.len() && chars[pos].0 == ' ' {
            pos += 1;
        }
    }
    result
}

/// Rebuild a Line from (char, style) pairs, grouping runs of one style.
fn styled_chars_to_line(chars: &[(char, Style)]) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    let mut current_style = chars.first().map(|c| c.1).unwrap_or_default();

    for &(c, style) in chars {
        if style != current_style && !current_text.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut current_text), current_style));
        }
        current_style = style;
        current_text.push(c);
    }
    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, current_style));
    }
    Line::from(spans)
}

/// Word-wrap plain text at `width` columns.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let mut result = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            result.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() || result.is_empty() {
        result.push(current);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_wrap_and_cursor_agree() {
        let buffer = TextBuffer::new("abcdef\ngh");
        assert_eq!(hard_wrap(&buffer.text, 4), vec!["abcd", "ef", "gh"]);
        assert_eq!(visual_cursor(&buffer, 4), (2, 2));

        let exact = TextBuffer::new("abcd");
        assert_eq!(hard_wrap(&exact.text, 4), vec!["abcd", ""]);
        assert_eq!(visual_cursor(&exact, 4), (1, 0));
    }

    #[test]
    fn wrap_text_breaks_on_words() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("", 7), vec![""]);
    }
}
