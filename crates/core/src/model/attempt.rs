use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AttemptId, QuestionId, RoundId};

/// The evaluator's scored response to one submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    /// 0-100 scale.
    pub score: f64,
    pub feedback: String,
    pub suggested_answer: Option<String>,
    pub suggestions: Vec<String>,
}

/// One entry of the chronological attempt history used for report export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub round_id: RoundId,
    pub question_id: QuestionId,
    pub score: f64,
    pub feedback: String,
    pub submitted_at: DateTime<Utc>,
}

impl AttemptRecord {
    #[must_use]
    pub fn new(
        round_id: RoundId,
        question_id: QuestionId,
        attempt: &Attempt,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            round_id,
            question_id,
            score: attempt.score,
            feedback: attempt.feedback.clone(),
            submitted_at,
        }
    }
}
