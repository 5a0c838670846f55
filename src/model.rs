use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(pub u64);

/// Identifier of an editable text surface (e.g. `motivation`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Choice,
    FreeText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// Markdown body.
    pub text: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn has_option(&self, option: OptionId) -> bool {
        self.options.iter().any(|o| o.id == option)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextField {
    pub id: FieldId,
    #[serde(default)]
    pub label: Option<String>,
    /// Text restored from the server when the session is reopened.
    #[serde(default)]
    pub text: String,
}

impl TextField {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Current answers of a session. Last write wins per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerState {
    Choice(BTreeMap<QuestionId, OptionId>),
    FreeText(BTreeMap<FieldId, String>),
}

impl AnswerState {
    pub fn empty(kind: SessionKind) -> Self {
        match kind {
            SessionKind::Choice => AnswerState::Choice(BTreeMap::new()),
            SessionKind::FreeText => AnswerState::FreeText(BTreeMap::new()),
        }
    }

    pub fn kind(&self) -> SessionKind {
        match self {
            AnswerState::Choice(_) => SessionKind::Choice,
            AnswerState::FreeText(_) => SessionKind::FreeText,
        }
    }

    /// Returns false when the state does not hold choices.
    pub fn select(&mut self, question: QuestionId, option: OptionId) -> bool {
        match self {
            AnswerState::Choice(map) => {
                map.insert(question, option);
                true
            }
            AnswerState::FreeText(_) => false,
        }
    }

    /// Returns false when the state does not hold text, or the text is unchanged.
    pub fn set_text(&mut self, field: &FieldId, text: &str) -> bool {
        match self {
            AnswerState::FreeText(map) => {
                if map.get(field).map(String::as_str) == Some(text) {
                    return false;
                }
                map.insert(field.clone(), text.to_string());
                true
            }
            AnswerState::Choice(_) => false,
        }
    }

    pub fn selected(&self, question: QuestionId) -> Option<OptionId> {
        match self {
            AnswerState::Choice(map) => map.get(&question).copied(),
            AnswerState::FreeText(_) => None,
        }
    }

    pub fn text(&self, field: &FieldId) -> Option<&str> {
        match self {
            AnswerState::FreeText(map) => map.get(field).map(String::as_str),
            AnswerState::Choice(_) => None,
        }
    }
}

/// Integrity signals sent with every snapshot. Both counters only grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViolationCounters {
    pub keypress_count: u64,
    pub paste_event_count: u64,
}
