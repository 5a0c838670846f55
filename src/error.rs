use std::path::PathBuf;

use thiserror::Error;

use crate::model::{OptionId, QuestionId};

/// Problems with the session document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid session document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
    #[error("{field} must use http or https, got {scheme}")]
    UnsupportedScheme { field: &'static str, scheme: String },
    #[error("choice session has no questions")]
    NoQuestions,
    #[error("free-text session has no fields")]
    NoFields,
    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),
    #[error("restored answer references unknown question {0}")]
    UnknownQuestion(QuestionId),
    #[error("restored answer for question {question} references unknown option {option}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
}

/// Failures of the HTTP collaborators. Only observable requests surface these.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("{endpoint} request failed with status {status}")]
    HttpStatus {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("{0} endpoint is not configured")]
    NotConfigured(&'static str),
    #[error("{endpoint} response is not valid JSON")]
    InvalidBody { endpoint: &'static str },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors surfaced by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("cannot set up logging: {0}")]
    Logging(String),
    #[error("{} has neither a session nor a result block", .0.display())]
    NothingToShow(PathBuf),
}
