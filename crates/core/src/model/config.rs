use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{RoundId, RoundPlan, UserId};

/// Interview language sent to the provider and used for speech locales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Vi,
}

impl Language {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Vi => "vi",
        }
    }

    /// BCP-47 locale handed to speech capabilities.
    #[must_use]
    pub fn speech_locale(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Vi => "vi-VN",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "vi" => Ok(Language::Vi),
            other => Err(ConfigError::UnsupportedLanguage(other.to_owned())),
        }
    }
}

/// Per-round pass bars that replace the catalog defaults.
pub type ThresholdOverrides = BTreeMap<RoundId, f64>;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("a user id is required to start a session")]
    MissingUser,

    #[error("unsupported interview language `{0}`")]
    UnsupportedLanguage(String),

    #[error("threshold override for unknown round `{0}`")]
    UnknownRound(RoundId),

    #[error("threshold override {threshold} for `{round}` is outside 0..=100")]
    InvalidThreshold { round: RoundId, threshold: f64 },
}

/// Setup choices as the user enters them.
#[derive(Debug, Clone)]
pub struct SessionConfigDraft {
    pub user_id: Option<UserId>,
    pub role: String,
    pub level: String,
    pub stacks: Vec<String>,
    pub language: Language,
    pub ai_enabled: bool,
    pub voice_enabled: bool,
    pub threshold_overrides: ThresholdOverrides,
}

impl Default for SessionConfigDraft {
    fn default() -> Self {
        Self {
            user_id: None,
            role: String::new(),
            level: String::new(),
            stacks: Vec::new(),
            language: Language::En,
            ai_enabled: true,
            voice_enabled: false,
            threshold_overrides: ThresholdOverrides::new(),
        }
    }
}

impl SessionConfigDraft {
    /// Validate and normalize the draft against the round catalog.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the user is missing or an override names an
    /// unknown round or lies outside `0..=100`.
    pub fn validate(self, plan: &RoundPlan) -> Result<SessionConfig, ConfigError> {
        let user_id = self.user_id.ok_or(ConfigError::MissingUser)?;

        for (round, threshold) in &self.threshold_overrides {
            if plan.index_of(round).is_err() {
                return Err(ConfigError::UnknownRound(round.clone()));
            }
            if !(0.0..=100.0).contains(threshold) {
                return Err(ConfigError::InvalidThreshold {
                    round: round.clone(),
                    threshold: *threshold,
                });
            }
        }

        let stacks = self
            .stacks
            .into_iter()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(SessionConfig {
            user_id,
            role: self.role.trim().to_owned(),
            level: self.level.trim().to_owned(),
            stacks,
            language: self.language,
            ai_enabled: self.ai_enabled,
            voice_enabled: self.voice_enabled,
            threshold_overrides: self.threshold_overrides,
        })
    }
}

/// Validated, immutable session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    user_id: UserId,
    role: String,
    level: String,
    stacks: Vec<String>,
    language: Language,
    ai_enabled: bool,
    voice_enabled: bool,
    threshold_overrides: ThresholdOverrides,
}

impl SessionConfig {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Seniority the candidate targets.
    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }

    #[must_use]
    pub fn stacks(&self) -> &[String] {
        &self.stacks
    }

    #[must_use]
    pub fn primary_stack(&self) -> Option<&str> {
        self.stacks.first().map(String::as_str)
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn ai_enabled(&self) -> bool {
        self.ai_enabled
    }

    #[must_use]
    pub fn voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    #[must_use]
    pub fn threshold_overrides(&self) -> &ThresholdOverrides {
        &self.threshold_overrides
    }
}
