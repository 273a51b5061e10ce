use serde::{Deserialize, Serialize};

use crate::model::{AttemptRecord, RoundId, RoundPlan, RoundPlanError, ThresholdOverrides};
use crate::scoring::ScoreAggregator;

/// Outcome of a single round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_id: RoundId,
    pub title: String,
    pub average: f64,
    pub threshold: f64,
    pub pass: bool,
    pub attempts: u32,
}

/// Final report for one traversal of the round plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSummary {
    results: Vec<RoundResult>,
    overall_pass: bool,
    history: Vec<AttemptRecord>,
}

impl FinalSummary {
    /// Per-round results in catalog order.
    #[must_use]
    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    #[must_use]
    pub fn result(&self, round: &RoundId) -> Option<&RoundResult> {
        self.results.iter().find(|r| &r.round_id == round)
    }

    /// True only when every round passed.
    #[must_use]
    pub fn overall_pass(&self) -> bool {
        self.overall_pass
    }

    /// Attempts in submission order.
    #[must_use]
    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }
}

/// Compiles a `FinalSummary` from recorded scores.
pub struct SummaryBuilder<'a> {
    plan: &'a RoundPlan,
    scores: &'a ScoreAggregator,
}

impl<'a> SummaryBuilder<'a> {
    #[must_use]
    pub fn new(plan: &'a RoundPlan, scores: &'a ScoreAggregator) -> Self {
        Self { plan, scores }
    }

    /// One result per round of the plan, including rounds that recorded nothing.
    ///
    /// # Errors
    ///
    /// Returns `RoundPlanError` if the plan and aggregator disagree on round ids.
    pub fn build(
        self,
        overrides: &ThresholdOverrides,
        history: &[AttemptRecord],
    ) -> Result<FinalSummary, RoundPlanError> {
        let mut results = Vec::with_capacity(self.plan.len());
        for round in self.plan.definitions() {
            let id = round.id();
            let threshold = self.scores.threshold(self.plan, id, overrides)?;
            let average = self.scores.average(id);
            results.push(RoundResult {
                round_id: id.clone(),
                title: round.title().to_owned(),
                average,
                threshold,
                pass: average >= threshold,
                attempts: self.scores.stat(id).count,
            });
        }

        let overall_pass = results.iter().all(|r| r.pass);
        Ok(FinalSummary {
            results,
            overall_pass,
            history: history.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RoundDefinition, TopicRule};

    fn plan() -> RoundPlan {
        RoundPlan::new(vec![
            RoundDefinition::new("A", "Round A", 2, 60.0, TopicRule::SelectedStack, "Medium"),
            RoundDefinition::new("B", "Round B", 1, 70.0, TopicRule::SelectedStack, "Medium"),
        ])
        .unwrap()
    }

    #[test]
    fn single_failing_round_fails_overall() {
        let plan = plan();
        let mut scores = ScoreAggregator::new();
        scores.record(&RoundId::new("A"), 50.0);
        scores.record(&RoundId::new("A"), 80.0);
        scores.record(&RoundId::new("B"), 60.0);

        let summary = SummaryBuilder::new(&plan, &scores)
            .build(&ThresholdOverrides::new(), &[])
            .unwrap();

        let a = summary.result(&RoundId::new("A")).unwrap();
        assert_eq!(a.average, 65.0);
        assert!(a.pass);
        let b = summary.result(&RoundId::new("B")).unwrap();
        assert_eq!(b.average, 60.0);
        assert!(!b.pass);
        assert!(!summary.overall_pass());
    }

    #[test]
    fn rounds_without_attempts_are_reported_and_fail() {
        let plan = plan();
        let mut scores = ScoreAggregator::new();
        scores.record(&RoundId::new("B"), 95.0);

        let summary = SummaryBuilder::new(&plan, &scores)
            .build(&ThresholdOverrides::new(), &[])
            .unwrap();

        assert_eq!(summary.results().len(), 2);
        assert_eq!(summary.results()[0].round_id, RoundId::new("A"));
        assert_eq!(summary.results()[0].attempts, 0);
        assert!(!summary.results()[0].pass);
        assert!(!summary.overall_pass());
    }

    #[test]
    fn all_rounds_passing_passes_overall() {
        let plan = plan();
        let mut scores = ScoreAggregator::new();
        scores.record(&RoundId::new("A"), 60.0);
        scores.record(&RoundId::new("B"), 70.0);

        let summary = SummaryBuilder::new(&plan, &scores)
            .build(&ThresholdOverrides::new(), &[])
            .unwrap();
        assert!(summary.overall_pass());
    }
}
