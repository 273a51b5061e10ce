use serde::{Deserialize, Serialize};

use crate::model::QuestionId;

/// A question served by the question provider. Never mutated once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub content: String,
    pub topic: String,
    pub level: String,
    pub hint: Option<String>,
}

/// What the evaluator says should follow the question just answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextQuestion {
    Next(QuestionId),
    /// The round has no further question, whatever its nominal count says.
    Exhausted,
}

impl NextQuestion {
    /// Interpret the provider's optional next id; missing and all-zero ids both end the round.
    #[must_use]
    pub fn from_wire(id: Option<QuestionId>) -> Self {
        match id {
            Some(id) if !id.is_sentinel() => NextQuestion::Next(id),
            _ => NextQuestion::Exhausted,
        }
    }

    #[must_use]
    pub fn id(self) -> Option<QuestionId> {
        match self {
            NextQuestion::Next(id) => Some(id),
            NextQuestion::Exhausted => None,
        }
    }
}
