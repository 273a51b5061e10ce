#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod providers;
pub mod sessions;
pub mod voice;

pub use interview_core::Clock;

pub use config::ApiConfig;
pub use error::{ApiConfigError, ProviderError, ReportError, SessionError};
pub use providers::{
    AnswerEvaluator, PracticeApiClient, QuestionProvider, ScriptedOp, ScriptedProvider,
};
pub use sessions::{
    Advance, AnswerDraft, ReportExporter, SessionController, SessionHandle, SessionProgress,
    SessionSnapshot, SessionState,
};
pub use voice::{
    ChannelTranscriptSource, LogSpeechSink, SpeechSink, TranscriptEvent, TranscriptSource,
    VoiceError, VoiceInputAdapter,
};
