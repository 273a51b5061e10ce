//! Collaborator contracts for question generation and answer scoring.

mod http;
mod scripted;

use async_trait::async_trait;

use interview_core::model::{
    Attempt, Language, NextQuestion, Question, QuestionId, RoundId, Session, SessionId, UserId,
};

use crate::error::ProviderError;

pub use http::PracticeApiClient;
pub use scripted::{ScriptedOp, ScriptedProvider};

/// Parameters for opening a provider session for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSessionRequest {
    pub user_id: UserId,
    pub topic: String,
    pub level: String,
    pub language: Language,
    pub role: String,
    pub stacks: Vec<String>,
    pub round_id: RoundId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartedSession {
    pub session: Session,
    pub first_question_id: QuestionId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAnswerRequest {
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub content: String,
    pub language: Language,
    pub ai_enabled: bool,
}

/// A scored attempt plus what should come next in the round.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub attempt: Attempt,
    pub next: NextQuestion,
}

/// Creates sessions and serves questions.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Open a session and return the id of its first question.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on transport, status or validation failures.
    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartedSession, ProviderError>;

    /// # Errors
    ///
    /// Returns `ProviderError` on transport, status or validation failures.
    async fn fetch_question(&self, id: QuestionId) -> Result<Question, ProviderError>;
}

/// Scores submitted answers.
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    /// # Errors
    ///
    /// Returns `ProviderError` on transport, status or validation failures.
    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<Evaluation, ProviderError>;
}
