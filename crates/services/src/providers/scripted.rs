use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use interview_core::model::{
    Attempt, AttemptId, NextQuestion, Question, QuestionId, Session, SessionId,
};

use super::{
    AnswerEvaluator, Evaluation, QuestionProvider, StartSessionRequest, StartedSession,
    SubmitAnswerRequest,
};
use crate::error::ProviderError;

/// Provider operations that can be made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptedOp {
    Start,
    Fetch,
    Submit,
}

#[derive(Default)]
struct ScriptedState {
    questions: HashMap<QuestionId, Question>,
    issued: u32,
    scores: VecDeque<f64>,
    exhaust_next: bool,
    failures: HashMap<ScriptedOp, Option<String>>,
    start_requests: Vec<StartSessionRequest>,
    submit_requests: Vec<SubmitAnswerRequest>,
    fetches: Vec<QuestionId>,
}

/// In-memory question provider and evaluator.
///
/// Questions are generated on demand. Scores come from the queue filled by
/// `queue_scores`, falling back to a length-based heuristic, which makes it
/// usable both for tests and for offline practice.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    state: Arc<Mutex<ScriptedState>>,
    latency: Option<Duration>,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, to exercise in-flight request handling.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn queue_scores(&self, scores: impl IntoIterator<Item = f64>) {
        if let Ok(mut state) = self.state.lock() {
            state.scores.extend(scores);
        }
    }

    /// The next evaluation answers with the all-zero next-question id.
    pub fn exhaust_round_on_next_submit(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.exhaust_next = true;
        }
    }

    /// Make the next call of `op` fail, optionally carrying a provider message.
    pub fn fail_next(&self, op: ScriptedOp, message: Option<&str>) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert(op, message.map(str::to_owned));
        }
    }

    #[must_use]
    pub fn start_requests(&self) -> Vec<StartSessionRequest> {
        self.state
            .lock()
            .map(|s| s.start_requests.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn submit_requests(&self) -> Vec<SubmitAnswerRequest> {
        self.state
            .lock()
            .map(|s| s.submit_requests.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn fetched(&self) -> Vec<QuestionId> {
        self.state
            .lock()
            .map(|s| s.fetches.clone())
            .unwrap_or_default()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ScriptedState>, ProviderError> {
        self.state
            .lock()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))
    }
}

impl ScriptedState {
    fn take_failure(&mut self, op: ScriptedOp) -> Result<(), ProviderError> {
        match self.failures.remove(&op) {
            Some(message) => Err(ProviderError::Status {
                status: 503,
                message,
            }),
            None => Ok(()),
        }
    }

    fn issue_question(&mut self, topic: &str, level: &str) -> QuestionId {
        self.issued += 1;
        let question = Question {
            id: QuestionId::random(),
            content: format!("{topic} question #{}", self.issued),
            topic: topic.to_owned(),
            level: level.to_owned(),
            hint: None,
        };
        let id = question.id;
        self.questions.insert(id, question);
        id
    }
}

fn heuristic_score(answer: &str) -> f64 {
    let words = answer.split_whitespace().count();
    #[allow(clippy::cast_precision_loss)]
    let score = 40.0 + words as f64 * 2.0;
    score.min(100.0)
}

#[async_trait]
impl QuestionProvider for ScriptedProvider {
    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartedSession, ProviderError> {
        self.pause().await;
        let mut state = self.lock()?;
        state.take_failure(ScriptedOp::Start)?;
        state.start_requests.push(request.clone());
        let first_question_id = state.issue_question(&request.topic, &request.level);
        Ok(StartedSession {
            session: Session {
                id: SessionId::random(),
                user_id: request.user_id,
                status: "in_progress".into(),
                score: 0.0,
            },
            first_question_id,
        })
    }

    async fn fetch_question(&self, id: QuestionId) -> Result<Question, ProviderError> {
        self.pause().await;
        let mut state = self.lock()?;
        state.take_failure(ScriptedOp::Fetch)?;
        state.fetches.push(id);
        state
            .questions
            .get(&id)
            .cloned()
            .ok_or_else(|| ProviderError::Status {
                status: 404,
                message: Some(format!("question {id} not found")),
            })
    }
}

#[async_trait]
impl AnswerEvaluator for ScriptedProvider {
    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<Evaluation, ProviderError> {
        self.pause().await;
        let mut state = self.lock()?;
        state.take_failure(ScriptedOp::Submit)?;
        state.submit_requests.push(request.clone());

        let score = state
            .scores
            .pop_front()
            .unwrap_or_else(|| heuristic_score(&request.content));

        let next = if std::mem::take(&mut state.exhaust_next) {
            NextQuestion::Exhausted
        } else {
            let (topic, level) = state
                .questions
                .get(&request.question_id)
                .map(|q| (q.topic.clone(), q.level.clone()))
                .unwrap_or_default();
            NextQuestion::Next(state.issue_question(&topic, &level))
        };

        Ok(Evaluation {
            attempt: Attempt {
                id: AttemptId::random(),
                score,
                feedback: format!("Scored {score} for question {}", request.question_id),
                suggested_answer: None,
                suggestions: Vec::new(),
            },
            next,
        })
    }
}
