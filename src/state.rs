use crate::controller::{SessionController, SessionNotice};
use crate::integrity::InputEvent;
use crate::model::{FieldId, SessionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Working,
    Finishing,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    ConfirmSubmit,
    ConfirmQuit,
    TwoMinuteWarning,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePanel {
    Sidebar,
    Main,
}

/// Editable text with a cursor counted in chars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    pub text: String,
    pub cursor: usize,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.len_chars() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len_chars());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.len_chars();
    }
}

pub struct AppState {
    pub session: SessionController,
    pub screen: Screen,
    pub dialog_stack: Vec<Dialog>,
    pub active_panel: ActivePanel,
    pub choice_cursor: usize,
    pub field_focus: usize,
    pub buffers: Vec<TextBuffer>,
    pub question_scroll: usize,
    pub flash: Option<String>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(session: SessionController) -> Self {
        let buffers = session
            .fields()
            .iter()
            .map(|f| TextBuffer::new(session.answers().text(&f.id).unwrap_or(&f.text)))
            .collect();
        let mut state = Self {
            session,
            screen: Screen::Working,
            dialog_stack: Vec::new(),
            active_panel: ActivePanel::Main,
            choice_cursor: 0,
            field_focus: 0,
            buffers,
            question_scroll: 0,
            flash: None,
            should_quit: false,
        };
        state.sync_screen();
        state
    }

    pub fn has_dialog(&self) -> bool {
        !self.dialog_stack.is_empty()
    }

    pub fn top_dialog(&self) -> Option<&Dialog> {
        self.dialog_stack.last()
    }

    pub fn push_dialog(&mut self, dialog: Dialog) {
        if self.top_dialog() != Some(&dialog) {
            self.dialog_stack.push(dialog);
        }
    }

    pub fn pop_dialog(&mut self) -> Option<Dialog> {
        self.dialog_stack.pop()
    }

    pub fn is_free_text(&self) -> bool {
        self.session.kind() == SessionKind::FreeText
    }

    pub fn focused_field(&self) -> Option<FieldId> {
        self.session
            .fields()
            .get(self.field_focus)
            .map(|f| f.id.clone())
    }

    pub fn focus_next_field(&mut self) {
        let n = self.buffers.len();
        if n > 0 {
            self.field_focus = (self.field_focus + 1) % n;
        }
    }

    pub fn focus_prev_field(&mut self) {
        let n = self.buffers.len();
        if n > 0 {
            self.field_focus = (self.field_focus + n - 1) % n;
        }
    }

    pub fn navigate_to(&mut self, idx: usize) {
        let before = self.session.navigator().position();
        let after = self.session.show_slide(idx);
        if before != after {
            self.choice_cursor = 0;
            self.question_scroll = 0;
        }
    }

    /// Selects the option at `idx` on the visible question.
    pub fn select_choice(&mut self, idx: usize) -> bool {
        let Some(question) = self.session.current_question() else {
            return false;
        };
        let Some(option) = question.options.get(idx) else {
            return false;
        };
        let (qid, oid) = (question.id, option.id);
        self.choice_cursor = idx;
        self.session.select_answer(qid, oid)
    }

    /// Applies an edit to the focused field once the session accepts it.
    fn edit_focused<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut TextBuffer) -> bool,
    {
        let Some(field) = self.focused_field() else {
            return;
        };
        if !self.session.is_active() {
            return;
        }
        let Some(buffer) = self.buffers.get_mut(self.field_focus) else {
            return;
        };
        if !edit(buffer) {
            return;
        }
        let text = buffer.text.clone();
        self.session.handle_input(&field, &InputEvent::Input);
        self.session.edit_text(&field, &text);
    }

    pub fn type_char(&mut self, c: char) {
        self.edit_focused(|b| {
            b.insert_char(c);
            true
        });
    }

    pub fn backspace(&mut self) {
        self.edit_focused(TextBuffer::backspace);
    }

    pub fn delete(&mut self) {
        self.edit_focused(TextBuffer::delete);
    }

    /// Bracketed paste from the terminal.
    pub fn paste(&mut self, content: &str) {
        if !self.raise(InputEvent::Paste) {
            return;
        }
        let content = content.replace("\r\n", "\n").replace('\r', "\n");
        self.edit_focused(|b| {
            b.insert_str(&content);
            !content.is_empty()
        });
    }

    /// The paste shortcut. The terminal gives no clipboard access, so a
    /// permitted shortcut inserts nothing.
    pub fn paste_shortcut(&mut self) {
        self.raise(InputEvent::Key {
            key: 'v',
            ctrl: true,
            meta: false,
        });
    }

    fn raise(&mut self, event: InputEvent) -> bool {
        let Some(field) = self.focused_field() else {
            return false;
        };
        let verdict = self.session.handle_input(&field, &event);
        if !verdict.proceeds() && self.session.is_active() {
            self.flash = Some("Pasting is disabled for this session".to_string());
        }
        verdict.proceeds()
    }

    pub fn cursor_move<F: FnOnce(&mut TextBuffer)>(&mut self, mv: F) {
        if let Some(buffer) = self.buffers.get_mut(self.field_focus) {
            mv(buffer);
        }
    }

    pub fn apply_notice(&mut self, notice: SessionNotice) {
        match notice {
            SessionNotice::TwoMinuteWarning => self.push_dialog(Dialog::TwoMinuteWarning),
            SessionNotice::FinishStarted(_) | SessionNotice::Finished { .. } => {
                self.dialog_stack
                    .retain(|d| matches!(d, Dialog::ConfirmQuit | Dialog::Help));
            }
            SessionNotice::AutosaveFailed { .. } => {
                self.flash = Some("Autosave failed; retrying shortly".to_string());
            }
            SessionNotice::AutosaveSaved { .. } | SessionNotice::ProgressRefreshed(_) => {
                self.flash = None;
            }
            SessionNotice::EvaluationRefreshed(_) => {
                self.flash = Some("Evaluation updated".to_string());
            }
            SessionNotice::EvaluationFailed(reason) => {
                self.flash = Some(format!("Evaluation failed: {}", reason));
            }
            SessionNotice::Tick(_) => {}
        }
        self.sync_screen();
    }

    fn sync_screen(&mut self) {
        use crate::controller::SessionPhase;
        self.screen = match self.session.phase() {
            SessionPhase::Active => Screen::Working,
            SessionPhase::Finishing => Screen::Finishing,
            SessionPhase::Finished { .. } => Screen::Finished,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_edits_respect_multibyte_chars() {
        let mut b = TextBuffer::new("héllo");
        assert_eq!(b.cursor, 5);
        b.left();
        b.left();
        b.left();
        b.backspace();
        assert_eq!(b.text, "hllo");
        b.insert_str("é");
        assert_eq!(b.text, "héllo");
        assert_eq!(b.cursor, 2);
        b.end();
        assert!(!b.delete());
    }
}
