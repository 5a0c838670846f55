//! Session document: what the server hands the client when a session opens.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::autosave::AutosaveTiming;
use crate::error::ConfigError;
use crate::gateway::Endpoints;
use crate::model::{AnswerState, FieldId, OptionId, Question, QuestionId, SessionKind, TextField};

#[derive(Debug, Clone, Deserialize)]
pub struct SessionDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub session: Option<SessionConfig>,
    #[serde(default)]
    pub result: Option<ResultConfig>,
}

impl SessionDocument {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let doc: SessionDocument = serde_yaml::from_str(content)?;
        if let Some(session) = &doc.session {
            session.validate()?;
        }
        if let Some(result) = &doc.result {
            result.endpoints()?;
        }
        Ok(doc)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Session")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimingConfig {
    #[serde(default)]
    pub debounce_ms: Option<u64>,
    #[serde(default)]
    pub flush_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub id: String,
    pub kind: SessionKind,
    pub remaining_seconds: u64,
    #[serde(default)]
    pub total_units: Option<usize>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub allow_paste: bool,
    pub autosave_url: String,
    pub finish_url: String,
    #[serde(default)]
    pub eval_url: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub fields: Vec<TextField>,
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, OptionId>,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoints()?;

        match self.kind {
            SessionKind::Choice => {
                if self.questions.is_empty() {
                    return Err(ConfigError::NoQuestions);
                }
                let mut seen = BTreeSet::new();
                for q in &self.questions {
                    if !seen.insert(q.id) {
                        return Err(ConfigError::DuplicateQuestion(q.id));
                    }
                }
                for (&question, &option) in &self.answers {
                    let q = self
                        .question(question)
                        .ok_or(ConfigError::UnknownQuestion(question))?;
                    if !q.has_option(option) {
                        return Err(ConfigError::UnknownOption { question, option });
                    }
                }
            }
            SessionKind::FreeText => {
                if self.fields.is_empty() {
                    return Err(ConfigError::NoFields);
                }
            }
        }
        Ok(())
    }

    /// Paste interception is skipped entirely in debug sessions or when
    /// pasting is explicitly allowed.
    pub fn bypass_allowed(&self) -> bool {
        self.debug || self.allow_paste
    }

    pub fn total_units(&self) -> usize {
        self.total_units.unwrap_or(match self.kind {
            SessionKind::Choice => self.questions.len(),
            SessionKind::FreeText => 1,
        })
    }

    pub fn timing(&self) -> AutosaveTiming {
        let mut timing = AutosaveTiming::for_kind(self.kind);
        if let Some(ms) = self.timing.debounce_ms {
            timing.debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = self.timing.flush_interval_secs.filter(|s| *s > 0) {
            timing.flush_interval = Duration::from_secs(secs);
        }
        timing
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Answer state as left by an earlier visit to the same session.
    pub fn restored_answers(&self) -> AnswerState {
        let mut state = AnswerState::empty(self.kind);
        match self.kind {
            SessionKind::Choice => {
                for (&q, &o) in &self.answers {
                    state.select(q, o);
                }
            }
            SessionKind::FreeText => {
                for field in &self.fields {
                    state.set_text(&field.id, &field.text);
                }
            }
        }
        state
    }

    pub fn monitored_surfaces(&self) -> Vec<FieldId> {
        match self.kind {
            SessionKind::Choice => Vec::new(),
            SessionKind::FreeText => self.fields.iter().map(|f| f.id.clone()).collect(),
        }
    }

    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        Ok(Endpoints {
            autosave: Some(parse_url("autosave_url", &self.autosave_url)?),
            finish: Some(parse_url("finish_url", &self.finish_url)?),
            evaluate: self
                .eval_url
                .as_deref()
                .map(|u| parse_url("eval_url", u))
                .transpose()?,
            csrf_token: self.csrf_token.clone(),
        })
    }
}

/// Post-completion summary shown when the session has already ended.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultConfig {
    pub elapsed_seconds: u64,
    pub answered: usize,
    pub total: usize,
    #[serde(default)]
    pub eval_url: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

impl ResultConfig {
    /// Only the evaluate endpoint is reachable once a session has ended.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        Ok(Endpoints {
            autosave: None,
            finish: None,
            evaluate: self
                .eval_url
                .as_deref()
                .map(|u| parse_url("result.eval_url", u))
                .transpose()?,
            csrf_token: self.csrf_token.clone(),
        })
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme {
            field,
            scheme: other.to_string(),
        }),
    }
}
