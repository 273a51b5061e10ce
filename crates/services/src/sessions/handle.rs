use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::debug;

use interview_core::model::{
    Attempt, FinalSummary, Question, RoundId, SessionConfig, SessionConfigDraft,
    ThresholdOverrides,
};

use super::controller::SessionController;
use super::draft::AnswerDraft;
use super::progress::{Advance, SessionProgress, SessionState};
use super::report::ReportExporter;
use crate::error::{ReportError, SessionError};

/// Point-in-time copy of what a front end needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub progress: Option<SessionProgress>,
    pub question: Option<Question>,
    pub last_attempt: Option<Attempt>,
    pub summary: Option<FinalSummary>,
}

/// Shared, cloneable entry point to one interview.
///
/// At most one controller operation runs at a time. A call made while another
/// is still awaiting its provider fails with `SessionError::Busy` instead of
/// queueing behind it. The answer draft sits outside that lock so typed input
/// and voice transcripts keep flowing while a request is in flight.
#[derive(Clone)]
pub struct SessionHandle {
    controller: Arc<AsyncMutex<SessionController>>,
    draft: Arc<Mutex<AnswerDraft>>,
}

impl SessionHandle {
    #[must_use]
    pub fn new(controller: SessionController) -> Self {
        Self {
            controller: Arc::new(AsyncMutex::new(controller)),
            draft: Arc::new(Mutex::new(AnswerDraft::new())),
        }
    }

    /// Draft shared with the voice adapter.
    #[must_use]
    pub fn draft(&self) -> Arc<Mutex<AnswerDraft>> {
        Arc::clone(&self.draft)
    }

    /// # Errors
    ///
    /// See `SessionController::start`; `SessionError::Busy` while another
    /// request is in flight.
    pub async fn start(
        &self,
        config: SessionConfig,
        round: Option<RoundId>,
    ) -> Result<Question, SessionError> {
        let mut controller = self.acquire()?;
        let question = controller.start(config, round).await?;
        self.clear_draft();
        Ok(question)
    }

    /// # Errors
    ///
    /// See `SessionController::start_draft`; `SessionError::Busy` while another
    /// request is in flight.
    pub async fn start_draft(
        &self,
        draft: SessionConfigDraft,
        round: Option<RoundId>,
    ) -> Result<Question, SessionError> {
        let mut controller = self.acquire()?;
        let question = controller.start_draft(draft, round).await?;
        self.clear_draft();
        Ok(question)
    }

    /// Submit the current draft.
    ///
    /// The draft is emptied when the request is sent. If the evaluator fails,
    /// the submitted text is put back in front of anything added since.
    ///
    /// # Errors
    ///
    /// See `SessionController::submit`; `SessionError::Busy` while another
    /// request is in flight.
    pub async fn submit_draft(&self) -> Result<Option<Attempt>, SessionError> {
        let mut controller = self.acquire()?;

        let answer = {
            let mut draft = lock_draft(&self.draft);
            if draft.is_blank() {
                return Ok(None);
            }
            draft.take()
        };

        match controller.submit(&answer).await {
            Ok(Some(attempt)) => Ok(Some(attempt)),
            Ok(None) => {
                lock_draft(&self.draft).restore(answer);
                Ok(None)
            }
            Err(e) => {
                debug!("restoring draft after failed submission");
                lock_draft(&self.draft).restore(answer);
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// See `SessionController::advance`.
    pub async fn advance(&self) -> Result<Advance, SessionError> {
        let mut controller = self.acquire()?;
        let advance = controller.advance().await?;
        // Text already in the draft arrived after the last submit and belongs
        // to the next answer.
        lock_draft(&self.draft).set_interim("");
        Ok(advance)
    }

    /// # Errors
    ///
    /// See `SessionController::resolve_boundary`.
    pub async fn resolve_boundary(&self) -> Result<Advance, SessionError> {
        let mut controller = self.acquire()?;
        controller.resolve_boundary().await
    }

    /// # Errors
    ///
    /// See `SessionController::retry_fetch`.
    pub async fn retry_fetch(&self) -> Result<Question, SessionError> {
        let mut controller = self.acquire()?;
        controller.retry_fetch().await
    }

    /// # Errors
    ///
    /// Returns `SessionError::Busy` while another request is in flight.
    pub fn reset(&self) -> Result<(), SessionError> {
        self.acquire()?.reset();
        self.clear_draft();
        Ok(())
    }

    /// # Errors
    ///
    /// See `SessionController::summary_with_overrides`.
    pub fn summary_with_overrides(
        &self,
        overrides: &ThresholdOverrides,
    ) -> Result<FinalSummary, SessionError> {
        self.acquire()?.summary_with_overrides(overrides)
    }

    /// # Errors
    ///
    /// Returns `ReportError::Busy` while another request is in flight, otherwise
    /// see `ReportExporter::export`.
    pub fn export_report(&self, exporter: &ReportExporter) -> Result<PathBuf, ReportError> {
        let controller = self.controller.try_lock().map_err(|_| ReportError::Busy)?;
        exporter.export(&controller)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Busy` while another request is in flight.
    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let controller = self.acquire()?;
        Ok(SessionSnapshot {
            state: controller.state(),
            progress: controller.progress(),
            question: controller.current_question().cloned(),
            last_attempt: controller.last_attempt().cloned(),
            summary: controller.final_summary().cloned(),
        })
    }

    /// Replace the draft with typed text.
    pub fn set_answer(&self, text: impl Into<String>) {
        lock_draft(&self.draft).set(text);
    }

    #[must_use]
    pub fn answer_text(&self) -> String {
        lock_draft(&self.draft).text().to_owned()
    }

    fn acquire(&self) -> Result<AsyncMutexGuard<'_, SessionController>, SessionError> {
        self.controller.try_lock().map_err(|_| {
            debug!("rejecting request while another is in flight");
            SessionError::Busy
        })
    }

    fn clear_draft(&self) {
        lock_draft(&self.draft).set(String::new());
    }
}

/// Lock the draft, recovering it if a writer panicked.
pub(crate) fn lock_draft(draft: &Mutex<AnswerDraft>) -> MutexGuard<'_, AnswerDraft> {
    draft
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
