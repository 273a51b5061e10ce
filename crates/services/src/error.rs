//! Shared error types for the services crate.

use thiserror::Error;

use interview_core::model::{ConfigError, QuestionId, RoundPlanError};

pub(crate) const START_FALLBACK: &str = "Failed to start session";
pub(crate) const FETCH_FALLBACK: &str = "Failed to fetch question";
pub(crate) const SUBMIT_FALLBACK: &str = "Failed to submit answer";

/// Errors emitted by question providers and answer evaluators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("provider request failed with status {status}")]
    Status { status: u16, message: Option<String> },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed provider response: missing `{0}`")]
    Malformed(&'static str),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Message supplied by the provider itself, if any.
    #[must_use]
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            ProviderError::Status { message, .. } => message.as_deref(),
            ProviderError::Unavailable(message) => Some(message),
            ProviderError::Http(_) | ProviderError::Malformed(_) => None,
        }
    }

    pub(crate) fn message_or(&self, fallback: &str) -> String {
        self.provider_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_owned()
    }
}

/// Errors emitted by the session engine.
///
/// Provider failures leave the controller where it was, so every variant is
/// recoverable by re-invoking the same operation except `Plan`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("{message}")]
    Start {
        message: String,
        #[source]
        source: ProviderError,
    },
    #[error("{message}")]
    Fetch {
        question_id: QuestionId,
        message: String,
        #[source]
        source: ProviderError,
    },
    #[error("{message}")]
    Submit {
        message: String,
        #[source]
        source: ProviderError,
    },
    #[error(transparent)]
    Plan(#[from] RoundPlanError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("another request is still in flight")]
    Busy,
    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    #[error("the current question has not been answered yet")]
    AwaitingAnswer,
}

impl SessionError {
    pub(crate) fn start(source: ProviderError) -> Self {
        SessionError::Start {
            message: source.message_or(START_FALLBACK),
            source,
        }
    }

    pub(crate) fn fetch(question_id: QuestionId, source: ProviderError) -> Self {
        SessionError::Fetch {
            question_id,
            message: source.message_or(FETCH_FALLBACK),
            source,
        }
    }

    pub(crate) fn submit(source: ProviderError) -> Self {
        SessionError::Submit {
            message: source.message_or(SUBMIT_FALLBACK),
            source,
        }
    }

    /// Message suitable for showing to the candidate.
    ///
    /// Provider failures carry the provider's own message or the operation's
    /// fallback; everything else is described by its display text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Start { message, .. }
            | SessionError::Fetch { message, .. }
            | SessionError::Submit { message, .. } => message.clone(),
            SessionError::Busy => "Please wait for the current request to finish".to_owned(),
            other => other.to_string(),
        }
    }

    /// Whether re-invoking the failed operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::Start { .. }
                | SessionError::Fetch { .. }
                | SessionError::Submit { .. }
                | SessionError::Busy
        )
    }
}

/// Errors emitted while configuring the HTTP provider.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiConfigError {
    #[error("invalid API base URL `{raw}`")]
    InvalidBaseUrl { raw: String },
    #[error("invalid request timeout `{raw}`")]
    InvalidTimeout { raw: String },
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// Errors emitted while exporting a report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("the session has not produced a final summary yet")]
    NotComplete,
    #[error("another request is still in flight")]
    Busy,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
