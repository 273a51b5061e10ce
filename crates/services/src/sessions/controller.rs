use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use interview_core::model::{
    Attempt, AttemptRecord, FinalSummary, NextQuestion, Question, QuestionId, RoundDefinition,
    RoundId, RoundPlan, Session, SessionConfig, SessionConfigDraft, SummaryBuilder,
    ThresholdOverrides,
};
use interview_core::{Clock, ScoreAggregator};

use super::progress::{Advance, SessionProgress, SessionState};
use crate::error::SessionError;
use crate::providers::{
    AnswerEvaluator, QuestionProvider, StartSessionRequest, SubmitAnswerRequest,
};

//
// ─── ROUND CONTEXT ─────────────────────────────────────────────────────────────
//

/// Everything tied to the round currently being played.
#[derive(Debug, Clone)]
struct RoundContext {
    session: Session,
    round_id: RoundId,
    question_id: QuestionId,
    question: Option<Question>,
    attempt: Option<Attempt>,
    next: Option<NextQuestion>,
}

impl RoundContext {
    fn opened(session: Session, round_id: RoundId, first_question_id: QuestionId) -> Self {
        Self {
            session,
            round_id,
            question_id: first_question_id,
            question: None,
            attempt: None,
            next: None,
        }
    }

    fn show(&mut self, question: Question) {
        self.question_id = question.id;
        self.question = Some(question);
        self.attempt = None;
        self.next = None;
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one interview through the round plan.
///
/// The controller is the only owner of cursors, recorded scores and attempt
/// history. Every method that talks to a provider either completes its
/// transition or leaves the controller exactly as it was.
pub struct SessionController {
    plan: RoundPlan,
    provider: Arc<dyn QuestionProvider>,
    evaluator: Arc<dyn AnswerEvaluator>,
    clock: Clock,
    state: SessionState,
    config: Option<SessionConfig>,
    round: Option<RoundContext>,
    scores: ScoreAggregator,
    history: Vec<AttemptRecord>,
    summary: Option<FinalSummary>,
}

impl SessionController {
    #[must_use]
    pub fn new(
        plan: RoundPlan,
        provider: Arc<dyn QuestionProvider>,
        evaluator: Arc<dyn AnswerEvaluator>,
    ) -> Self {
        Self {
            plan,
            provider,
            evaluator,
            clock: Clock::default(),
            state: SessionState::Setup,
            config: None,
            round: None,
            scores: ScoreAggregator::new(),
            history: Vec::new(),
            summary: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn plan(&self) -> &RoundPlan {
        &self.plan
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.round.as_ref().map(|r| &r.session)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.round.as_ref().and_then(|r| r.question.as_ref())
    }

    /// Attempt produced for the current question, if it was answered.
    #[must_use]
    pub fn last_attempt(&self) -> Option<&Attempt> {
        self.round.as_ref().and_then(|r| r.attempt.as_ref())
    }

    #[must_use]
    pub fn current_round(&self) -> Option<&RoundDefinition> {
        self.state
            .round_index()
            .and_then(|index| self.plan.get(index))
    }

    #[must_use]
    pub fn scores(&self) -> &ScoreAggregator {
        &self.scores
    }

    #[must_use]
    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    #[must_use]
    pub fn final_summary(&self) -> Option<&FinalSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        let SessionState::Active {
            round_index,
            question_index,
        } = self.state
        else {
            return None;
        };
        let round = self.plan.get(round_index)?;
        Some(SessionProgress {
            round_id: round.id().clone(),
            round_number: round_index + 1,
            round_count: self.plan.len(),
            question_number: question_index,
            question_count: round.question_count(),
            answered: self.last_attempt().is_some(),
        })
    }

    /// Start a brand-new interview from setup.
    ///
    /// Opens the requested round (the first one by default), clears scores and
    /// history from any previous interview, then fetches the first question.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidState` unless the controller is in setup.
    /// - `SessionError::Plan` if `round` is not in the catalog.
    /// - `SessionError::Start` if the provider refuses; nothing changes.
    /// - `SessionError::Fetch` if the session opened but the first question did
    ///   not load; the controller is active and `retry_fetch` may be used.
    pub async fn start(
        &mut self,
        config: SessionConfig,
        round: Option<RoundId>,
    ) -> Result<Question, SessionError> {
        if self.state != SessionState::Setup {
            return Err(self.invalid("start a session"));
        }

        let round_index = match round {
            Some(id) => self.plan.index_of(&id)?,
            None => 0,
        };
        let context = self.open_round(&config, round_index).await?;

        self.scores.clear();
        self.history.clear();
        self.summary = None;
        self.config = Some(config);
        self.enter_round(round_index, context);
        info!(
            round = %self.plan.definitions()[round_index].id(),
            "interview started"
        );

        self.retry_fetch().await
    }

    /// Validate `draft` against this controller's plan, then `start`.
    ///
    /// # Errors
    ///
    /// `SessionError::Config` if the draft is rejected; nothing is sent to the
    /// provider. Otherwise as for `start`.
    pub async fn start_draft(
        &mut self,
        draft: SessionConfigDraft,
        round: Option<RoundId>,
    ) -> Result<Question, SessionError> {
        let config = draft.validate(&self.plan)?;
        self.start(config, round).await
    }

    /// Fetch the current question again after a failed load.
    ///
    /// Returns the already loaded question when nothing is missing.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidState` outside an active round.
    /// - `SessionError::Fetch` if the provider fails again.
    pub async fn retry_fetch(&mut self) -> Result<Question, SessionError> {
        if !matches!(self.state, SessionState::Active { .. }) {
            return Err(self.invalid("fetch a question"));
        }
        let Some(round) = self.round.as_ref() else {
            return Err(self.invalid("fetch a question"));
        };
        if let Some(question) = &round.question {
            return Ok(question.clone());
        }

        let question_id = round.question_id;
        let question = self.fetch(question_id).await?;
        if let Some(round) = self.round.as_mut() {
            round.show(question.clone());
        }
        Ok(question)
    }

    /// Submit an answer for the current question.
    ///
    /// Returns `Ok(None)` without contacting the evaluator when the answer is
    /// blank or there is no unanswered question on screen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Submit` when the evaluator fails. Nothing is
    /// recorded, so the same answer can be submitted again.
    pub async fn submit(&mut self, answer: &str) -> Result<Option<Attempt>, SessionError> {
        if answer.trim().is_empty() {
            debug!("ignoring blank answer");
            return Ok(None);
        }
        if !matches!(self.state, SessionState::Active { .. }) {
            debug!(state = self.state.name(), "ignoring answer outside an active round");
            return Ok(None);
        }
        let (Some(config), Some(round)) = (self.config.as_ref(), self.round.as_ref()) else {
            return Ok(None);
        };
        let Some(question) = round.question.as_ref() else {
            return Ok(None);
        };
        if round.attempt.is_some() {
            debug!(question = %question.id, "question already answered");
            return Ok(None);
        }

        let request = SubmitAnswerRequest {
            session_id: round.session.id,
            question_id: question.id,
            content: answer.to_owned(),
            language: config.language(),
            ai_enabled: config.ai_enabled(),
        };
        let evaluation = self.evaluator.submit_answer(&request).await.map_err(|e| {
            warn!(error = %e, question = %request.question_id, "answer evaluation failed");
            SessionError::submit(e)
        })?;

        let submitted_at = self.clock.now();
        let Some(round) = self.round.as_mut() else {
            return Ok(None);
        };
        self.scores.record(&round.round_id, evaluation.attempt.score);
        self.history.push(AttemptRecord::new(
            round.round_id.clone(),
            request.question_id,
            &evaluation.attempt,
            submitted_at,
        ));
        round.attempt = Some(evaluation.attempt.clone());
        round.next = Some(evaluation.next);
        info!(
            round = %round.round_id,
            question = %request.question_id,
            score = evaluation.attempt.score,
            "answer scored"
        );

        Ok(Some(evaluation.attempt))
    }

    /// Move past the answered question.
    ///
    /// Stays in the round while questions remain and the evaluator named a next
    /// question. A missing or all-zero next id ends the round early. At a round
    /// boundary the next round is opened, or the interview completes.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidState` outside an active round.
    /// - `SessionError::AwaitingAnswer` if the current question is unanswered.
    /// - `SessionError::Fetch` if the next question does not load; the cursor
    ///   does not move and `advance` can be called again.
    /// - `SessionError::Start` if the next round cannot be opened; the
    ///   controller waits at the boundary for `resolve_boundary`.
    pub async fn advance(&mut self) -> Result<Advance, SessionError> {
        let SessionState::Active {
            round_index,
            question_index,
        } = self.state
        else {
            return Err(self.invalid("advance"));
        };
        let Some(round) = self.round.as_ref() else {
            return Err(self.invalid("advance"));
        };
        if round.attempt.is_none() {
            return Err(SessionError::AwaitingAnswer);
        }

        let question_count = self
            .plan
            .get(round_index)
            .map_or(0, RoundDefinition::question_count);
        if question_index < question_count {
            if let Some(NextQuestion::Next(next_id)) = round.next {
                let question = self.fetch(next_id).await?;
                if let Some(round) = self.round.as_mut() {
                    round.show(question);
                }
                self.state = SessionState::Active {
                    round_index,
                    question_index: question_index + 1,
                };
                return Ok(Advance::NextQuestion {
                    question_index: question_index + 1,
                });
            }
            info!(
                round = %round.round_id,
                answered = question_index,
                expected = question_count,
                "round exhausted early"
            );
        }

        self.state = SessionState::RoundBoundary { round_index };
        self.resolve_boundary().await
    }

    /// Open the next round or complete the interview.
    ///
    /// Scores and history carry over into the next round.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidState` unless waiting at a round boundary.
    /// - `SessionError::Start` / `SessionError::Fetch` as for `start`.
    /// - `SessionError::Plan` if the summary cannot be compiled.
    pub async fn resolve_boundary(&mut self) -> Result<Advance, SessionError> {
        let SessionState::RoundBoundary { round_index } = self.state else {
            return Err(self.invalid("resolve a round boundary"));
        };

        let next_index = round_index + 1;
        if next_index < self.plan.len() {
            let Some(config) = self.config.clone() else {
                return Err(self.invalid("resolve a round boundary"));
            };
            let context = self.open_round(&config, next_index).await?;
            let round_id = context.round_id.clone();
            self.enter_round(next_index, context);
            info!(round = %round_id, "next round started");
            self.retry_fetch().await?;
            return Ok(Advance::NextRound { round_id });
        }

        let summary = self.compile_summary()?;
        let overall_pass = summary.overall_pass();
        self.summary = Some(summary);
        self.state = SessionState::Complete;
        info!(overall_pass, attempts = self.history.len(), "interview complete");
        Ok(Advance::Complete { overall_pass })
    }

    /// Recompute the summary from the recorded scores with different thresholds.
    ///
    /// Recorded scores and history are not touched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Plan` if an override names an unknown round.
    pub fn summary_with_overrides(
        &self,
        overrides: &ThresholdOverrides,
    ) -> Result<FinalSummary, SessionError> {
        for round in overrides.keys() {
            self.plan.index_of(round)?;
        }
        Ok(SummaryBuilder::new(&self.plan, &self.scores).build(overrides, &self.history)?)
    }

    /// Return to setup, discarding the session, question and cursors.
    ///
    /// Scores and history stay until the next `start`.
    pub fn reset(&mut self) {
        self.state = SessionState::Setup;
        self.round = None;
        self.summary = None;
        debug!("returned to setup");
    }

    fn compile_summary(&self) -> Result<FinalSummary, SessionError> {
        let overrides = self
            .config
            .as_ref()
            .map(|c| c.threshold_overrides().clone())
            .unwrap_or_default();
        self.summary_with_overrides(&overrides)
    }

    async fn open_round(
        &self,
        config: &SessionConfig,
        round_index: usize,
    ) -> Result<RoundContext, SessionError> {
        let round = self
            .plan
            .get(round_index)
            .ok_or_else(|| self.invalid("open a round"))?;
        let target = self.plan.topic_and_level_for(round.id(), config)?;
        let request = StartSessionRequest {
            user_id: config.user_id(),
            topic: target.topic,
            level: target.level,
            language: config.language(),
            role: config.role().to_owned(),
            stacks: config.stacks().to_vec(),
            round_id: round.id().clone(),
        };

        let started = self.provider.start_session(&request).await.map_err(|e| {
            warn!(error = %e, round = %request.round_id, "failed to start round");
            SessionError::start(e)
        })?;
        Ok(RoundContext::opened(
            started.session,
            request.round_id,
            started.first_question_id,
        ))
    }

    fn enter_round(&mut self, round_index: usize, context: RoundContext) {
        self.round = Some(context);
        self.state = SessionState::Active {
            round_index,
            question_index: 1,
        };
    }

    async fn fetch(&self, question_id: QuestionId) -> Result<Question, SessionError> {
        self.provider
            .fetch_question(question_id)
            .await
            .map_err(|e| {
                warn!(error = %e, question = %question_id, "failed to fetch question");
                SessionError::fetch(question_id, e)
            })
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("rounds", &self.plan.len())
            .field("session", &self.session().map(|s| s.id))
            .field("history_len", &self.history.len())
            .field("complete", &self.summary.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
