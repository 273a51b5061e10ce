use interview_core::model::RoundId;

/// Where the engine is in the interview state machine.
///
/// ```text
/// Setup ──start──▶ Active(r, 1) ──advance──▶ Active(r, q+1)
///                       │
///                       └─count reached / round exhausted─▶ RoundBoundary(r)
///                                                             ├─more rounds─▶ Active(r+1, 1)
///                                                             └─last round──▶ Complete
/// Complete ──reset──▶ Setup
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Setup,
    /// `question_index` is 1-based and never exceeds the round's question count.
    Active {
        round_index: usize,
        question_index: u32,
    },
    RoundBoundary {
        round_index: usize,
    },
    Complete,
}

impl SessionState {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Setup => "in setup",
            SessionState::Active { .. } => "active",
            SessionState::RoundBoundary { .. } => "between rounds",
            SessionState::Complete => "complete",
        }
    }

    #[must_use]
    pub fn round_index(self) -> Option<usize> {
        match self {
            SessionState::Active { round_index, .. }
            | SessionState::RoundBoundary { round_index } => Some(round_index),
            SessionState::Setup | SessionState::Complete => None,
        }
    }
}

/// Aggregated view of interview progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub round_id: RoundId,
    pub round_number: usize,
    pub round_count: usize,
    pub question_number: u32,
    pub question_count: u32,
    pub answered: bool,
}

/// Result of `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    NextQuestion { question_index: u32 },
    NextRound { round_id: RoundId },
    Complete { overall_pass: bool },
}
