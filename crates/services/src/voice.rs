//! Voice input and speech output.
//!
//! Speech recognition and synthesis are platform capabilities; this module only
//! defines the contracts and the bridge that feeds recognized text into the
//! shared [`AnswerDraft`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use interview_core::model::{Attempt, Language, Question};

use crate::sessions::{lock_draft, AnswerDraft};

/// One event pushed by a speech recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Partial hypothesis; replaced by the next interim or final result.
    Interim(String),
    Final(String),
    /// Recognition stopped on its own.
    Ended,
    Failed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VoiceError {
    #[error("speech recognition is not available")]
    Unsupported,
    #[error("speech recognition failed: {0}")]
    Recognition(String),
}

/// A push-based speech recognizer.
#[async_trait]
pub trait TranscriptSource: Send {
    /// # Errors
    ///
    /// Returns `VoiceError::Unsupported` when recognition cannot start.
    fn start(&mut self, locale: &str) -> Result<(), VoiceError>;

    /// Stop listening, delivering any pending final result.
    fn stop(&mut self);

    /// Stop listening and discard pending results.
    fn cancel(&mut self);

    /// Next event without waiting, if one is ready.
    fn try_next_event(&mut self) -> Option<TranscriptEvent>;

    /// Wait for the next event. `None` once the source is gone.
    async fn next_event(&mut self) -> Option<TranscriptEvent>;
}

/// Fire-and-forget speech output.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str, locale: &str);
    fn cancel(&self);
}

//
// ─── CHANNEL SOURCE ────────────────────────────────────────────────────────────
//

/// Transcript source fed through a channel by whatever performs recognition.
///
/// Events sent while the source is not listening are dropped.
#[derive(Debug)]
pub struct ChannelTranscriptSource {
    rx: mpsc::UnboundedReceiver<TranscriptEvent>,
    listening: bool,
}

impl ChannelTranscriptSource {
    #[must_use]
    pub fn channel() -> (mpsc::UnboundedSender<TranscriptEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                rx,
                listening: false,
            },
        )
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    fn discard_pending(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

#[async_trait]
impl TranscriptSource for ChannelTranscriptSource {
    fn start(&mut self, locale: &str) -> Result<(), VoiceError> {
        if self.rx.is_closed() && self.rx.is_empty() {
            return Err(VoiceError::Unsupported);
        }
        self.discard_pending();
        self.listening = true;
        debug!(locale, "transcript channel listening");
        Ok(())
    }

    fn stop(&mut self) {
        self.listening = false;
    }

    fn cancel(&mut self) {
        self.listening = false;
        self.discard_pending();
    }

    fn try_next_event(&mut self) -> Option<TranscriptEvent> {
        // Events already queued at `stop` still belong to the utterance.
        self.rx.try_recv().ok()
    }

    async fn next_event(&mut self) -> Option<TranscriptEvent> {
        self.rx.recv().await
    }
}

//
// ─── LOG SINK ──────────────────────────────────────────────────────────────────
//

/// Speech sink that writes what would be spoken to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSpeechSink;

impl SpeechSink for LogSpeechSink {
    fn speak(&self, text: &str, locale: &str) {
        info!(locale, text, "speak");
    }

    fn cancel(&self) {
        debug!("speech cancelled");
    }
}

//
// ─── ADAPTER ───────────────────────────────────────────────────────────────────
//

/// Bridges a transcript source and a speech sink to the answer draft.
pub struct VoiceInputAdapter {
    source: Box<dyn TranscriptSource>,
    sink: Arc<dyn SpeechSink>,
    draft: Arc<Mutex<AnswerDraft>>,
    locale: &'static str,
    listening: bool,
    speak_aloud: bool,
}

impl VoiceInputAdapter {
    #[must_use]
    pub fn new(
        source: Box<dyn TranscriptSource>,
        sink: Arc<dyn SpeechSink>,
        draft: Arc<Mutex<AnswerDraft>>,
        language: Language,
    ) -> Self {
        Self {
            source,
            sink,
            draft,
            locale: language.speech_locale(),
            listening: false,
            speak_aloud: true,
        }
    }

    /// Read questions and feedback aloud (on by default).
    #[must_use]
    pub fn with_speech(mut self, enabled: bool) -> Self {
        self.speak_aloud = enabled;
        self
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    #[must_use]
    pub fn locale(&self) -> &'static str {
        self.locale
    }

    /// # Errors
    ///
    /// Propagates the source's refusal to start.
    pub fn start(&mut self) -> Result<(), VoiceError> {
        if self.listening {
            return Ok(());
        }
        self.source.start(self.locale)?;
        self.listening = true;
        Ok(())
    }

    /// Stop listening; results already delivered are still applied by `pump`.
    pub fn stop(&mut self) {
        self.source.stop();
        self.listening = false;
    }

    /// Stop listening and drop the interim preview.
    pub fn cancel(&mut self) {
        self.source.cancel();
        self.listening = false;
        lock_draft(&self.draft).set_interim("");
    }

    /// Apply one recognizer event to the draft.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::Recognition` for a failure event; listening stops.
    pub fn apply(&mut self, event: TranscriptEvent) -> Result<(), VoiceError> {
        match event {
            TranscriptEvent::Interim(text) => lock_draft(&self.draft).set_interim(&text),
            TranscriptEvent::Final(text) => lock_draft(&self.draft).append_final(&text),
            TranscriptEvent::Ended => {
                self.listening = false;
                lock_draft(&self.draft).set_interim("");
            }
            TranscriptEvent::Failed(reason) => {
                warn!(%reason, "speech recognition failed");
                self.listening = false;
                lock_draft(&self.draft).set_interim("");
                return Err(VoiceError::Recognition(reason));
            }
        }
        Ok(())
    }

    /// Apply every event that is ready without waiting. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Stops at the first failure event.
    pub fn pump(&mut self) -> Result<usize, VoiceError> {
        let mut applied = 0;
        while let Some(event) = self.source.try_next_event() {
            self.apply(event)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Apply events as they arrive until recognition ends or the source closes.
    ///
    /// # Errors
    ///
    /// Returns the first failure event.
    pub async fn listen(&mut self) -> Result<(), VoiceError> {
        while let Some(event) = self.source.next_event().await {
            let ended = event == TranscriptEvent::Ended;
            self.apply(event)?;
            if ended {
                return Ok(());
            }
        }
        self.listening = false;
        Ok(())
    }

    pub fn speak_question(&self, question: &Question) {
        if self.speak_aloud {
            self.sink.cancel();
            self.sink.speak(&question.content, self.locale);
        }
    }

    pub fn speak_feedback(&self, attempt: &Attempt) {
        if self.speak_aloud && !attempt.feedback.trim().is_empty() {
            self.sink.cancel();
            self.sink.speak(&attempt.feedback, self.locale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::model::{AttemptId, QuestionId};

    #[derive(Default)]
    struct RecordingSink {
        spoken: Mutex<Vec<(String, String)>>,
    }

    impl SpeechSink for RecordingSink {
        fn speak(&self, text: &str, locale: &str) {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_owned(), locale.to_owned()));
        }

        fn cancel(&self) {}
    }

    fn adapter(
        language: Language,
    ) -> (
        VoiceInputAdapter,
        mpsc::UnboundedSender<TranscriptEvent>,
        Arc<Mutex<AnswerDraft>>,
        Arc<RecordingSink>,
    ) {
        let (tx, source) = ChannelTranscriptSource::channel();
        let draft = Arc::new(Mutex::new(AnswerDraft::new()));
        let sink = Arc::new(RecordingSink::default());
        let adapter = VoiceInputAdapter::new(
            Box::new(source),
            sink.clone(),
            Arc::clone(&draft),
            language,
        );
        (adapter, tx, draft, sink)
    }

    #[test]
    fn finals_append_and_interims_preview() {
        let (mut adapter, tx, draft, _) = adapter(Language::En);
        adapter.start().unwrap();

        tx.send(TranscriptEvent::Interim("I would".into())).unwrap();
        assert_eq!(adapter.pump().unwrap(), 1);
        assert_eq!(draft.lock().unwrap().interim(), Some("I would"));
        assert_eq!(draft.lock().unwrap().text(), "");

        tx.send(TranscriptEvent::Final("I would shard".into())).unwrap();
        tx.send(TranscriptEvent::Final("by user id".into())).unwrap();
        adapter.pump().unwrap();

        let draft = draft.lock().unwrap();
        assert_eq!(draft.text(), "I would shard by user id");
        assert_eq!(draft.interim(), None);
    }

    #[test]
    fn failure_stops_listening() {
        let (mut adapter, tx, _, _) = adapter(Language::En);
        adapter.start().unwrap();
        tx.send(TranscriptEvent::Failed("no-speech".into())).unwrap();

        assert_eq!(
            adapter.pump(),
            Err(VoiceError::Recognition("no-speech".into()))
        );
        assert!(!adapter.is_listening());
    }

    #[test]
    fn cancel_discards_queued_results() {
        let (mut adapter, tx, draft, _) = adapter(Language::En);
        adapter.start().unwrap();
        tx.send(TranscriptEvent::Final("never mind".into())).unwrap();

        adapter.cancel();
        assert_eq!(adapter.pump().unwrap(), 0);
        assert_eq!(draft.lock().unwrap().text(), "");
    }

    #[test]
    fn closed_channel_cannot_start() {
        let (mut adapter, tx, _, _) = adapter(Language::En);
        drop(tx);
        assert_eq!(adapter.start(), Err(VoiceError::Unsupported));
    }

    #[tokio::test]
    async fn listen_runs_until_ended() {
        let (mut adapter, tx, draft, _) = adapter(Language::Vi);
        adapter.start().unwrap();
        tx.send(TranscriptEvent::Final("xin chào".into())).unwrap();
        tx.send(TranscriptEvent::Ended).unwrap();

        adapter.listen().await.unwrap();
        assert!(!adapter.is_listening());
        assert_eq!(draft.lock().unwrap().text(), "xin chào");
    }

    #[test]
    fn speaks_in_session_locale() {
        let (adapter, _, _, sink) = adapter(Language::Vi);
        adapter.speak_question(&Question {
            id: QuestionId::random(),
            content: "Explain goroutines".into(),
            topic: "Golang".into(),
            level: "Medium".into(),
            hint: None,
        });
        adapter.speak_feedback(&Attempt {
            id: AttemptId::random(),
            score: 80.0,
            feedback: "Clear answer".into(),
            suggested_answer: None,
            suggestions: Vec::new(),
        });

        let spoken = sink.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 2);
        assert_eq!(spoken[0], ("Explain goroutines".into(), "vi-VN".into()));
        assert_eq!(spoken[1].0, "Clear answer");
    }

    #[test]
    fn silent_adapter_speaks_nothing() {
        let (adapter, _, _, sink) = adapter(Language::En);
        let adapter = adapter.with_speech(false);
        adapter.speak_feedback(&Attempt {
            id: AttemptId::random(),
            score: 10.0,
            feedback: "Too short".into(),
            suggested_answer: None,
            suggestions: Vec::new(),
        });
        assert!(sink.spoken.lock().unwrap().is_empty());
    }
}
