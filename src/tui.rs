use std::io;
use std::sync::mpsc;
use std::time::Duration;

use ratatui::crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::Rect;
use ratatui::prelude::CrosstermBackend;
use ratatui::Terminal;
use tracing::debug;

use crate::error::AppError;
use crate::gateway::GatewayEvent;
use crate::state::*;
use crate::ui::question::{NEXT_BUTTON, PREV_BUTTON};
use crate::ui::sidebar::scroll_offset;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const PAGE_JUMP: usize = 5;

pub fn run_tui(state: &mut AppState, gateway_rx: &mpsc::Receiver<GatewayEvent>) -> Result<(), AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = main_loop(&mut terminal, state, gateway_rx);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    result
}

fn main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    gateway_rx: &mpsc::Receiver<GatewayEvent>,
) -> Result<(), AppError> {
    loop {
        terminal.draw(|f| crate::ui::draw(f, state))?;

        if state.should_quit {
            break;
        }

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(key, state),
                Event::Paste(content) => handle_paste(&content, state),
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    let area = Rect::new(0, 0, size.width, size.height);
                    handle_mouse(mouse, state, area);
                }
                _ => {}
            }
        }

        for notice in state.session.poll() {
            state.apply_notice(notice);
        }

        while let Ok(ev) = gateway_rx.try_recv() {
            if let Some(notice) = state.session.handle_gateway_event(ev) {
                state.apply_notice(notice);
            }
        }
    }

    Ok(())
}

fn handle_key(key: KeyEvent, state: &mut AppState) {
    if state.has_dialog() {
        handle_dialog_key(key, state);
        return;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl {
        match key.code {
            KeyCode::Char('q') => {
                if state.screen == Screen::Working {
                    state.push_dialog(Dialog::ConfirmQuit);
                } else {
                    state.should_quit = true;
                }
                return;
            }
            KeyCode::Char('s') if state.screen == Screen::Working => {
                state.push_dialog(Dialog::ConfirmSubmit);
                return;
            }
            KeyCode::Char('e') => {
                state.session.evaluate_now();
                return;
            }
            KeyCode::Char('v') if state.is_free_text() => {
                state.paste_shortcut();
                return;
            }
            _ => {}
        }
    }

    if key.code == KeyCode::F(1) {
        state.push_dialog(Dialog::Help);
        return;
    }

    match state.screen {
        Screen::Working => {
            if state.is_free_text() {
                handle_text_key(key, state);
            } else {
                handle_choice_key(key, state);
            }
        }
        Screen::Finishing => {}
        Screen::Finished => match key.code {
            KeyCode::Enter | KeyCode::Char('q') => state.should_quit = true,
            KeyCode::Char('e') => {
                state.session.evaluate_now();
            }
            _ => {}
        },
    }
}

fn handle_choice_key(key: KeyEvent, state: &mut AppState) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return;
    }
    let option_count = state
        .session
        .current_question()
        .map_or(0, |q| q.options.len());

    match key.code {
        KeyCode::Tab => {
            state.active_panel = match state.active_panel {
                ActivePanel::Sidebar => ActivePanel::Main,
                ActivePanel::Main => ActivePanel::Sidebar,
            };
        }
        KeyCode::Left => navigate_prev(state),
        KeyCode::Right => navigate_next(state),
        KeyCode::Up if state.active_panel == ActivePanel::Sidebar => navigate_prev(state),
        KeyCode::Down if state.active_panel == ActivePanel::Sidebar => navigate_next(state),
        KeyCode::Up => {
            state.choice_cursor = state.choice_cursor.saturating_sub(1);
        }
        KeyCode::Down => {
            if state.choice_cursor + 1 < option_count {
                state.choice_cursor += 1;
            }
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let idx = state.choice_cursor;
            state.select_choice(idx);
        }
        KeyCode::Char('?') => state.push_dialog(Dialog::Help),
        KeyCode::Char(c) if c.is_ascii_lowercase() => {
            state.select_choice((c as u8 - b'a') as usize);
        }
        KeyCode::Char(c) if ('1'..='9').contains(&c) => {
            state.select_choice((c as u8 - b'1') as usize);
        }
        _ => handle_page_keys(key, state),
    }
}

fn handle_text_key(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => state.type_char(c),
        KeyCode::Enter => state.type_char('\n'),
        KeyCode::Backspace => state.backspace(),
        KeyCode::Delete => state.delete(),
        KeyCode::Tab => state.focus_next_field(),
        KeyCode::BackTab => state.focus_prev_field(),
        KeyCode::Left => state.cursor_move(TextBuffer::left),
        KeyCode::Right => state.cursor_move(TextBuffer::right),
        KeyCode::Home => state.cursor_move(TextBuffer::home),
        KeyCode::End => state.cursor_move(TextBuffer::end),
        KeyCode::Up => state.cursor_move(|b| move_cursor_vertical(b, -1)),
        KeyCode::Down => state.cursor_move(|b| move_cursor_vertical(b, 1)),
        _ => {}
    }
}

fn handle_paste(content: &str, state: &mut AppState) {
    if state.screen != Screen::Working || state.has_dialog() {
        return;
    }
    if state.is_free_text() {
        state.paste(content);
    } else {
        debug!("paste ignored on a choice slide");
    }
}

/// (row, col) of a char cursor, both counted in chars.
fn cursor_row_col(text: &str, cursor: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for c in text.chars().take(cursor) {
        if c == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (row, col)
}

fn move_cursor_vertical(buffer: &mut TextBuffer, delta: isize) {
    let (row, col) = cursor_row_col(&buffer.text, buffer.cursor);
    let lines: Vec<&str> = buffer.text.split('\n').collect();
    let target_row = row as isize + delta;
    if target_row < 0 || target_row as usize >= lines.len() {
        return;
    }
    let target_row = target_row as usize;
    let target_col = col.min(lines[target_row].chars().count());
    let offset: usize = lines[..target_row]
        .iter()
        .map(|l| l.chars().count() + 1)
        .sum();
    buffer.cursor = offset + target_col;
}

fn handle_page_keys(key: KeyEvent, state: &mut AppState) {
    let position = state.session.navigator().position();
    match key.code {
        KeyCode::PageUp => state.navigate_to(position.saturating_sub(PAGE_JUMP)),
        KeyCode::PageDown => state.navigate_to(position + PAGE_JUMP),
        KeyCode::Home => state.navigate_to(0),
        KeyCode::End => state.navigate_to(usize::MAX),
        _ => {}
    }
}

fn navigate_prev(state: &mut AppState) {
    let before = state.session.navigator().position();
    if state.session.prev_slide() != before {
        state.choice_cursor = 0;
        state.question_scroll = 0;
    }
}

fn navigate_next(state: &mut AppState) {
    let before = state.session.navigator().position();
    if state.session.next_slide() != before {
        state.choice_cursor = 0;
        state.question_scroll = 0;
    }
}

fn handle_dialog_key(key: KeyEvent, state: &mut AppState) {
    let dialog = state.top_dialog().cloned();
    match dialog {
        Some(Dialog::ConfirmSubmit) => match key.code {
            KeyCode::Enter => {
                state.pop_dialog();
                state.session.submit();
                for notice in state.session.poll() {
                    state.apply_notice(notice);
                }
            }
            KeyCode::Esc => {
                state.pop_dialog();
            }
            _ => {}
        },
        Some(Dialog::ConfirmQuit) => match key.code {
            KeyCode::Enter => {
                state.pop_dialog();
                state.should_quit = true;
            }
            KeyCode::Esc => {
                state.pop_dialog();
            }
            _ => {}
        },
        Some(Dialog::TwoMinuteWarning) => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                state.pop_dialog();
            }
        }
        Some(Dialog::Help) => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::F(1) | KeyCode::Char('?')) {
                state.pop_dialog();
            }
        }
        None => {}
    }
}

fn handle_mouse(mouse: MouseEvent, state: &mut AppState, size: Rect) {
    if state.screen != Screen::Working || state.has_dialog() {
        return;
    }

    let layout = crate::ui::layout::compute_layout(size);
    let in_rect = |r: Rect, x: u16, y: u16| x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height;

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let (x, y) = (mouse.column, mouse.row);
            if in_rect(layout.sidebar, x, y) {
                let row = y.saturating_sub(layout.sidebar.y + 1) as usize;
                if state.is_free_text() {
                    // Each field takes a label row and a word-count row.
                    if row / 2 < state.buffers.len() {
                        state.field_focus = row / 2;
                    }
                } else {
                    let nav = state.session.navigator();
                    let visible = layout.sidebar.height.saturating_sub(2) as usize;
                    let target = scroll_offset(nav.position(), nav.len(), visible) + row;
                    if target < nav.len() {
                        state.navigate_to(target);
                        state.active_panel = ActivePanel::Main;
                    }
                }
            } else if in_rect(layout.main, x, y) && !state.is_free_text() {
                let rel_x = x.saturating_sub(layout.main.x) as usize;
                let content_line = y.saturating_sub(layout.main.y) as usize + state.question_scroll;
                let Some(hit_map) = crate::ui::question::compute_hit_map(state, layout.main) else {
                    return;
                };
                if content_line == hit_map.button_line {
                    if PREV_BUTTON.contains(&rel_x) {
                        navigate_prev(state);
                    } else if NEXT_BUTTON.contains(&rel_x) {
                        navigate_next(state);
                    }
                } else if content_line < hit_map.choices_end {
                    let clicked = hit_map
                        .choice_lines
                        .iter()
                        .rev()
                        .find(|(start, _)| content_line >= *start)
                        .map(|&(_, idx)| idx);
                    if let Some(idx) = clicked {
                        state.select_choice(idx);
                    }
                }
            }
        }
        MouseEventKind::ScrollUp => {
            if in_rect(layout.sidebar, mouse.column, mouse.row) && !state.is_free_text() {
                navigate_prev(state);
            } else {
                state.question_scroll = state.question_scroll.saturating_sub(1);
            }
        }
        MouseEventKind::ScrollDown => {
            if in_rect(layout.sidebar, mouse.column, mouse.row) && !state.is_free_text() {
                navigate_next(state);
            } else {
                state.question_scroll += 1;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_moves_keep_column_when_possible() {
        let mut b = TextBuffer::new("abcd\nxy\nlonger");
        b.cursor = 3;
        move_cursor_vertical(&mut b, 1);
        assert_eq!(cursor_row_col(&b.text, b.cursor), (1, 2));
        move_cursor_vertical(&mut b, 1);
        assert_eq!(cursor_row_col(&b.text, b.cursor), (2, 2));
        move_cursor_vertical(&mut b, 1);
        assert_eq!(cursor_row_col(&b.text, b.cursor), (2, 2));
    }
}
