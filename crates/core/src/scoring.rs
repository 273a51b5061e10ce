//! Per-round score accumulation and pass/fail evaluation.

use std::collections::HashMap;

use crate::model::{RoundId, RoundPlan, RoundPlanError, ThresholdOverrides};

/// Running total of the scores recorded for one round.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoundStat {
    pub sum: f64,
    pub count: u32,
}

/// Accumulates `(sum, count)` per round. Every `record` is a real increment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreAggregator {
    stats: HashMap<RoundId, RoundStat>,
}

impl ScoreAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, round: &RoundId, score: f64) {
        let stat = self.stats.entry(round.clone()).or_default();
        stat.sum += score;
        stat.count = stat.count.saturating_add(1);
    }

    #[must_use]
    pub fn stat(&self, round: &RoundId) -> RoundStat {
        self.stats.get(round).copied().unwrap_or_default()
    }

    /// Mean score rounded half-up to one decimal; `0.0` when nothing was recorded.
    #[must_use]
    pub fn average(&self, round: &RoundId) -> f64 {
        let stat = self.stat(round);
        if stat.count == 0 {
            return 0.0;
        }
        round_one_decimal(stat.sum / f64::from(stat.count))
    }

    /// Override when present, otherwise the catalog default.
    ///
    /// # Errors
    ///
    /// Returns `RoundPlanError::NotFound` for ids outside the catalog.
    pub fn threshold(
        &self,
        plan: &RoundPlan,
        round: &RoundId,
        overrides: &ThresholdOverrides,
    ) -> Result<f64, RoundPlanError> {
        if let Some(threshold) = overrides.get(round) {
            return Ok(*threshold);
        }
        Ok(plan.resolve(round)?.default_threshold())
    }

    /// # Errors
    ///
    /// Returns `RoundPlanError::NotFound` for ids outside the catalog.
    pub fn passed(
        &self,
        plan: &RoundPlan,
        round: &RoundId,
        overrides: &ThresholdOverrides,
    ) -> Result<bool, RoundPlanError> {
        Ok(self.average(round) >= self.threshold(plan, round, overrides)?)
    }

    pub fn clear(&mut self) {
        self.stats.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

fn round_one_decimal(value: f64) -> f64 {
    // Scores are non-negative, so `round` (half away from zero) is half-up here.
    (value * 10.0).round() / 10.0
}
