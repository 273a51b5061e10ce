mod attempt;
mod config;
mod ids;
mod question;
mod round;
mod session;
mod summary;

pub use ids::{AttemptId, ParseIdError, QuestionId, RoundId, SessionId, UserId};

pub use attempt::{Attempt, AttemptRecord};
pub use config::{ConfigError, Language, SessionConfig, SessionConfigDraft, ThresholdOverrides};
pub use question::{NextQuestion, Question};
pub use round::{RoundDefinition, RoundPlan, RoundPlanError, RoundTarget, TopicRule};
pub use session::Session;
pub use summary::{FinalSummary, RoundResult, SummaryBuilder};
