use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{RoundId, SessionConfig};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum RoundPlanError {
    #[error("round `{id}` is not part of the round plan")]
    NotFound { id: RoundId },

    #[error("round plan must contain at least one round")]
    Empty,

    #[error("round `{id}` is defined more than once")]
    DuplicateId { id: RoundId },

    #[error("round `{id}` must ask at least one question")]
    InvalidQuestionCount { id: RoundId },

    #[error("round `{id}` threshold {threshold} is outside 0..=100")]
    InvalidThreshold { id: RoundId, threshold: f64 },
}

/// How a round derives the topic it asks the question provider for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicRule {
    /// Always ask for the same topic label.
    Fixed(String),
    /// Ask about the candidate's selected stack, falling back to their role.
    SelectedStack,
}

/// One themed phase of the interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDefinition {
    id: RoundId,
    title: String,
    question_count: u32,
    default_threshold: f64,
    topic: TopicRule,
    level: String,
}

impl RoundDefinition {
    #[must_use]
    pub fn new(
        id: impl Into<RoundId>,
        title: impl Into<String>,
        question_count: u32,
        default_threshold: f64,
        topic: TopicRule,
        level: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            question_count,
            default_threshold,
            topic,
            level: level.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &RoundId {
        &self.id
    }

    /// Human readable name used in reports.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn default_threshold(&self) -> f64 {
        self.default_threshold
    }

    #[must_use]
    pub fn topic_rule(&self) -> &TopicRule {
        &self.topic
    }

    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }
}

/// Parameters the question provider needs to open a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTarget {
    pub topic: String,
    pub level: String,
    pub question_count: u32,
}

/// Immutable, ordered catalog of rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundPlan {
    rounds: Vec<RoundDefinition>,
}

impl RoundPlan {
    /// Build a plan from an ordered list of definitions.
    ///
    /// # Errors
    ///
    /// Returns `RoundPlanError` when the list is empty, an id repeats, a round asks
    /// no questions, or a threshold lies outside `0..=100`.
    pub fn new(rounds: Vec<RoundDefinition>) -> Result<Self, RoundPlanError> {
        if rounds.is_empty() {
            return Err(RoundPlanError::Empty);
        }

        let mut seen = HashSet::new();
        for round in &rounds {
            if !seen.insert(round.id.clone()) {
                return Err(RoundPlanError::DuplicateId {
                    id: round.id.clone(),
                });
            }
            if round.question_count == 0 {
                return Err(RoundPlanError::InvalidQuestionCount {
                    id: round.id.clone(),
                });
            }
            if !(0.0..=100.0).contains(&round.default_threshold) {
                return Err(RoundPlanError::InvalidThreshold {
                    id: round.id.clone(),
                    threshold: round.default_threshold,
                });
            }
        }

        Ok(Self { rounds })
    }

    /// The five-round loop used by the practice app.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            rounds: vec![
                RoundDefinition::new(
                    "recruiter",
                    "Round 1: Recruiter Screen",
                    3,
                    60.0,
                    TopicRule::Fixed("Behavioral".into()),
                    "Junior",
                ),
                RoundDefinition::new(
                    "technical",
                    "Round 2: Technical Phone Screen",
                    2,
                    65.0,
                    TopicRule::SelectedStack,
                    "Medium",
                ),
                RoundDefinition::new(
                    "ds_algo",
                    "Round 3: Data Structures & Algorithms",
                    2,
                    65.0,
                    TopicRule::Fixed("Algorithms".into()),
                    "Medium",
                ),
                RoundDefinition::new(
                    "system_design",
                    "Round 3: System Design",
                    1,
                    70.0,
                    TopicRule::Fixed("System Design".into()),
                    "Senior",
                ),
                RoundDefinition::new(
                    "leadership",
                    "Round 3: Googleyness & Leadership",
                    3,
                    60.0,
                    TopicRule::Fixed("Leadership".into()),
                    "Senior",
                ),
            ],
        }
    }

    #[must_use]
    pub fn definitions(&self) -> &[RoundDefinition] {
        &self.rounds
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RoundDefinition> {
        self.rounds.get(index)
    }

    /// Position of a round in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `RoundPlanError::NotFound` for ids outside the catalog.
    pub fn index_of(&self, id: &RoundId) -> Result<usize, RoundPlanError> {
        self.rounds
            .iter()
            .position(|round| &round.id == id)
            .ok_or_else(|| RoundPlanError::NotFound { id: id.clone() })
    }

    /// # Errors
    ///
    /// Returns `RoundPlanError::NotFound` for ids outside the catalog.
    pub fn resolve(&self, id: &RoundId) -> Result<&RoundDefinition, RoundPlanError> {
        let index = self.index_of(id)?;
        Ok(&self.rounds[index])
    }

    /// Map a round plus the session configuration to what the provider expects.
    ///
    /// # Errors
    ///
    /// Returns `RoundPlanError::NotFound` for ids outside the catalog.
    pub fn topic_and_level_for(
        &self,
        id: &RoundId,
        config: &SessionConfig,
    ) -> Result<RoundTarget, RoundPlanError> {
        let round = self.resolve(id)?;
        let topic = match &round.topic {
            TopicRule::Fixed(label) => label.clone(),
            TopicRule::SelectedStack => config
                .primary_stack()
                .unwrap_or_else(|| config.role())
                .to_owned(),
        };
        Ok(RoundTarget {
            topic,
            level: round.level.clone(),
            question_count: round.question_count,
        })
    }
}

impl Default for RoundPlan {
    fn default() -> Self {
        Self::standard()
    }
}
