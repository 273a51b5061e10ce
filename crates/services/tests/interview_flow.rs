use std::sync::Arc;

use interview_core::model::{
    RoundDefinition, RoundId, RoundPlan, SessionConfig, SessionConfigDraft, ThresholdOverrides,
    TopicRule, UserId,
};
use interview_core::time::fixed_clock;
use services::{Advance, ReportExporter, ScriptedProvider, SessionController, SessionState};

fn ab_plan() -> RoundPlan {
    RoundPlan::new(vec![
        RoundDefinition::new("A", "Round A", 2, 60.0, TopicRule::SelectedStack, "Medium"),
        RoundDefinition::new("B", "Round B", 1, 70.0, TopicRule::SelectedStack, "Medium"),
    ])
    .unwrap()
}

fn config(plan: &RoundPlan, overrides: ThresholdOverrides) -> SessionConfig {
    SessionConfigDraft {
        user_id: Some(UserId::random()),
        role: "Backend Engineer".into(),
        level: "Medium".into(),
        stacks: vec!["Golang".into()],
        threshold_overrides: overrides,
        ..SessionConfigDraft::default()
    }
    .validate(plan)
    .unwrap()
}

fn controller(provider: &ScriptedProvider, plan: RoundPlan) -> SessionController {
    SessionController::new(plan, Arc::new(provider.clone()), Arc::new(provider.clone()))
        .with_clock(fixed_clock())
}

async fn answer_and_advance(ctl: &mut SessionController, answer: &str) -> Advance {
    ctl.submit(answer).await.unwrap().unwrap();
    ctl.advance().await.unwrap()
}

#[tokio::test]
async fn failing_round_fails_the_interview_and_report_says_so() {
    let provider = ScriptedProvider::new();
    provider.queue_scores([50.0, 80.0, 60.0]);
    let plan = ab_plan();
    let mut ctl = controller(&provider, plan.clone());

    ctl.start(config(&plan, ThresholdOverrides::new()), None)
        .await
        .unwrap();
    assert_eq!(
        answer_and_advance(&mut ctl, "first").await,
        Advance::NextQuestion { question_index: 2 }
    );
    assert_eq!(
        answer_and_advance(&mut ctl, "second").await,
        Advance::NextRound {
            round_id: RoundId::new("B")
        }
    );
    assert_eq!(
        answer_and_advance(&mut ctl, "third").await,
        Advance::Complete {
            overall_pass: false
        }
    );

    let summary = ctl.final_summary().unwrap();
    let a = summary.result(&RoundId::new("A")).unwrap();
    assert_eq!(a.average, 65.0);
    assert!(a.pass);
    let b = summary.result(&RoundId::new("B")).unwrap();
    assert_eq!(b.average, 60.0);
    assert!(!b.pass);
    assert_eq!(summary.history().len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let path = ReportExporter::new(dir.path()).export(&ctl).unwrap();
    let report = std::fs::read_to_string(path).unwrap();
    assert!(report.starts_with("# Result: Failed Interview"));
    assert!(report.contains("- Round A: Avg 65.0 / Threshold 60 - Pass"));
    assert!(report.contains("- Round B: Avg 60.0 / Threshold 70 - Fail"));
    assert!(report.contains("### Q3 (Round B) - Score: 60"));
}

#[tokio::test]
async fn threshold_override_flips_result_without_new_attempts() {
    let provider = ScriptedProvider::new();
    provider.queue_scores([50.0, 80.0, 75.0]);
    let plan = ab_plan();
    let mut ctl = controller(&provider, plan.clone());

    ctl.start(config(&plan, ThresholdOverrides::new()), None)
        .await
        .unwrap();
    answer_and_advance(&mut ctl, "first").await;
    answer_and_advance(&mut ctl, "second").await;
    let done = answer_and_advance(&mut ctl, "third").await;
    assert_eq!(done, Advance::Complete { overall_pass: true });

    let mut overrides = ThresholdOverrides::new();
    overrides.insert(RoundId::new("A"), 70.0);
    let recomputed = ctl.summary_with_overrides(&overrides).unwrap();

    let a = recomputed.result(&RoundId::new("A")).unwrap();
    assert_eq!(a.average, 65.0);
    assert_eq!(a.threshold, 70.0);
    assert!(!a.pass);
    assert!(!recomputed.overall_pass());
    assert_eq!(ctl.history().len(), 3);
    assert_eq!(ctl.scores().stat(&RoundId::new("A")).count, 2);
    assert!(ctl.final_summary().unwrap().overall_pass());
}

#[tokio::test]
async fn configured_override_applies_at_completion() {
    let provider = ScriptedProvider::new();
    provider.queue_scores([50.0, 80.0, 75.0]);
    let plan = ab_plan();
    let mut overrides = ThresholdOverrides::new();
    overrides.insert(RoundId::new("A"), 70.0);
    let mut ctl = controller(&provider, plan.clone());

    ctl.start(config(&plan, overrides), None).await.unwrap();
    answer_and_advance(&mut ctl, "first").await;
    answer_and_advance(&mut ctl, "second").await;
    let done = answer_and_advance(&mut ctl, "third").await;

    assert_eq!(done, Advance::Complete { overall_pass: false });
}

#[tokio::test]
async fn sentinel_on_first_of_three_questions_ends_round() {
    let provider = ScriptedProvider::new();
    let plan = RoundPlan::new(vec![RoundDefinition::new(
        "solo",
        "Only Round",
        3,
        60.0,
        TopicRule::SelectedStack,
        "Medium",
    )])
    .unwrap();
    let mut ctl = controller(&provider, plan.clone());
    ctl.start(config(&plan, ThresholdOverrides::new()), None)
        .await
        .unwrap();

    provider.queue_scores([58.0]);
    provider.exhaust_round_on_next_submit();
    let done = answer_and_advance(&mut ctl, "just one").await;

    assert_eq!(done, Advance::Complete { overall_pass: false });
    let result = ctl
        .final_summary()
        .unwrap()
        .result(&RoundId::new("solo"))
        .unwrap()
        .clone();
    assert_eq!(result.attempts, 1);
    assert_eq!(result.average, 58.0);
}

#[tokio::test]
async fn standard_catalog_is_traversed_in_order() {
    let provider = ScriptedProvider::new();
    let plan = RoundPlan::standard();
    let mut ctl = controller(&provider, plan.clone());
    ctl.start(config(&plan, ThresholdOverrides::new()), None)
        .await
        .unwrap();

    let mut rounds_entered = vec![RoundId::new("recruiter")];
    let mut answered = 0;
    loop {
        provider.queue_scores([90.0]);
        answered += 1;
        match answer_and_advance(&mut ctl, "a thorough answer").await {
            Advance::NextQuestion { .. } => {}
            Advance::NextRound { round_id } => rounds_entered.push(round_id),
            Advance::Complete { overall_pass } => {
                assert!(overall_pass);
                break;
            }
        }
    }

    let expected: Vec<RoundId> = plan.definitions().iter().map(|r| r.id().clone()).collect();
    assert_eq!(rounds_entered, expected);
    assert_eq!(answered, 11);
    assert_eq!(ctl.state(), SessionState::Complete);

    let topics: Vec<String> = provider
        .start_requests()
        .into_iter()
        .map(|r| r.topic)
        .collect();
    assert_eq!(
        topics,
        ["Behavioral", "Golang", "Algorithms", "System Design", "Leadership"]
    );
}

#[tokio::test]
async fn late_start_still_reports_every_round() {
    let provider = ScriptedProvider::new();
    let plan = RoundPlan::standard();
    let mut ctl = controller(&provider, plan.clone());
    ctl.start(
        config(&plan, ThresholdOverrides::new()),
        Some(RoundId::new("leadership")),
    )
    .await
    .unwrap();

    provider.queue_scores([90.0, 90.0, 90.0]);
    answer_and_advance(&mut ctl, "one").await;
    answer_and_advance(&mut ctl, "two").await;
    let done = answer_and_advance(&mut ctl, "three").await;

    assert_eq!(done, Advance::Complete { overall_pass: false });
    let summary = ctl.final_summary().unwrap();
    assert_eq!(summary.results().len(), 5);
    let recruiter = summary.result(&RoundId::new("recruiter")).unwrap();
    assert_eq!(recruiter.attempts, 0);
    assert_eq!(recruiter.average, 0.0);
    assert!(!recruiter.pass);
    assert!(summary.result(&RoundId::new("leadership")).unwrap().pass);
}

#[tokio::test]
async fn reset_after_completion_allows_a_fresh_interview() {
    let provider = ScriptedProvider::new();
    let plan = ab_plan();
    let mut ctl = controller(&provider, plan.clone());
    ctl.start(config(&plan, ThresholdOverrides::new()), None)
        .await
        .unwrap();
    answer_and_advance(&mut ctl, "first").await;
    answer_and_advance(&mut ctl, "second").await;
    answer_and_advance(&mut ctl, "third").await;
    assert!(ctl.is_complete());

    ctl.reset();
    assert_eq!(ctl.state(), SessionState::Setup);
    assert!(ctl.final_summary().is_none());

    ctl.start(config(&plan, ThresholdOverrides::new()), None)
        .await
        .unwrap();
    assert!(ctl.history().is_empty());
    assert_eq!(ctl.progress().unwrap().round_number, 1);
}
