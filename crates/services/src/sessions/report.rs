use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use interview_core::model::{FinalSummary, RoundPlan, SessionConfig};
use interview_core::tips::improvement_tips;

use super::controller::SessionController;
use crate::error::ReportError;

/// `interview-summary-<YYYY-MM-DD>.md`
#[must_use]
pub fn file_name(date: NaiveDate) -> String {
    format!("interview-summary-{}.md", date.format("%Y-%m-%d"))
}

/// Everything needed to render one summary document.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub plan: &'a RoundPlan,
    pub summary: &'a FinalSummary,
    pub config: Option<&'a SessionConfig>,
    pub generated_at: DateTime<Utc>,
}

impl<'a> ReportInput<'a> {
    /// Gather the report input from a completed controller.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotComplete` before the final summary exists.
    pub fn from_controller(controller: &'a SessionController) -> Result<Self, ReportError> {
        let summary = controller.final_summary().ok_or(ReportError::NotComplete)?;
        Ok(Self {
            plan: controller.plan(),
            summary,
            config: controller.config(),
            generated_at: controller.clock().now(),
        })
    }
}

/// Render the markdown summary.
#[must_use]
pub fn render(input: &ReportInput<'_>) -> String {
    let summary = input.summary;
    let stacks = input.config.map(SessionConfig::stacks).unwrap_or_default();
    let mut out = String::new();

    let verdict = if summary.overall_pass() {
        "Result: Passed Interview"
    } else {
        "Result: Failed Interview"
    };
    let _ = writeln!(out, "# {verdict}");
    let _ = writeln!(
        out,
        "Date: {}",
        input.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "Tech Stack: {}", tech_stack(input.config));
    out.push('\n');

    out.push_str("## Summary Details\n");
    for result in summary.results() {
        let _ = writeln!(
            out,
            "- {}: Avg {:.1} / Threshold {} - {}",
            result.title,
            result.average,
            number(result.threshold),
            if result.pass { "Pass" } else { "Fail" }
        );
    }
    out.push('\n');

    out.push_str("## Improvement Tips\n");
    for round in input.plan.definitions() {
        let tips = improvement_tips(round.id(), stacks);
        if tips.is_empty() {
            continue;
        }
        let _ = writeln!(out, "### {}", round.title());
        for tip in tips {
            let _ = writeln!(out, "- {tip}");
        }
        out.push('\n');
    }

    out.push_str("## Attempts History\n");
    for (index, record) in summary.history().iter().enumerate() {
        let title = input
            .plan
            .resolve(&record.round_id)
            .map_or(record.round_id.as_str(), |r| r.title());
        let _ = writeln!(
            out,
            "### Q{} ({title}) - Score: {}",
            index + 1,
            number(record.score)
        );
        out.push_str("**Feedback:**\n");
        let _ = writeln!(out, "{}", record.feedback);
        out.push('\n');
    }

    out
}

fn tech_stack(config: Option<&SessionConfig>) -> String {
    match config {
        Some(config) if !config.stacks().is_empty() => config.stacks().join(", "),
        Some(config) => config.role().to_owned(),
        None => String::new(),
    }
}

/// Whole numbers print without a fractional part.
fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Writes summary documents into a directory.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    dir: PathBuf,
}

impl ReportExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render the report and write it, returning the created path.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Io` if the directory or file cannot be written.
    pub fn write_to(&self, input: &ReportInput<'_>) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(file_name(input.generated_at.date_naive()));
        std::fs::write(&path, render(input))?;
        info!(path = %path.display(), "summary exported");
        Ok(path)
    }

    /// Export the summary of a completed controller.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotComplete` before completion, or `ReportError::Io`.
    pub fn export(&self, controller: &SessionController) -> Result<PathBuf, ReportError> {
        let input = ReportInput::from_controller(controller)?;
        self.write_to(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use interview_core::model::{
        Attempt, AttemptId, AttemptRecord, QuestionId, RoundDefinition, RoundId,
        SessionConfigDraft, SummaryBuilder, ThresholdOverrides, TopicRule, UserId,
    };
    use interview_core::ScoreAggregator;

    fn plan() -> RoundPlan {
        RoundPlan::new(vec![
            RoundDefinition::new(
                "technical",
                "Round 2: Technical Phone Screen",
                2,
                60.0,
                TopicRule::SelectedStack,
                "Medium",
            ),
            RoundDefinition::new(
                "custom",
                "Bonus Round",
                1,
                70.0,
                TopicRule::Fixed("Trivia".into()),
                "Junior",
            ),
        ])
        .unwrap()
    }

    fn record(round: &str, score: f64, feedback: &str) -> AttemptRecord {
        let attempt = Attempt {
            id: AttemptId::random(),
            score,
            feedback: feedback.into(),
            suggested_answer: None,
            suggestions: Vec::new(),
        };
        AttemptRecord::new(
            RoundId::new(round),
            QuestionId::random(),
            &attempt,
            interview_core::time::fixed_now(),
        )
    }

    fn summary(plan: &RoundPlan) -> FinalSummary {
        let history = vec![
            record("technical", 50.0, "Too shallow"),
            record("technical", 80.0, "Good depth"),
            record("custom", 60.5, "Close"),
        ];
        let mut scores = ScoreAggregator::new();
        for r in &history {
            scores.record(&r.round_id, r.score);
        }
        SummaryBuilder::new(plan, &scores)
            .build(&ThresholdOverrides::new(), &history)
            .unwrap()
    }

    fn config(plan: &RoundPlan) -> SessionConfig {
        SessionConfigDraft {
            user_id: Some(UserId::random()),
            role: "Backend Engineer".into(),
            stacks: vec!["Python".into(), "Golang".into()],
            ..SessionConfigDraft::default()
        }
        .validate(plan)
        .unwrap()
    }

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(file_name(date), "interview-summary-2024-03-09.md");
    }

    #[test]
    fn renders_every_section() {
        let plan = plan();
        let summary = summary(&plan);
        let config = config(&plan);
        let input = ReportInput {
            plan: &plan,
            summary: &summary,
            config: Some(&config),
            generated_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap(),
        };

        let text = render(&input);

        assert!(text.starts_with("# Result: Failed Interview\n"));
        assert!(text.contains("Date: 2024-03-09 14:05:00 UTC\n"));
        assert!(text.contains("Tech Stack: Python, Golang\n"));
        assert!(text.contains("- Round 2: Technical Phone Screen: Avg 65.0 / Threshold 60 - Pass\n"));
        assert!(text.contains("- Bonus Round: Avg 60.5 / Threshold 70 - Fail\n"));
        assert!(text.contains("### Round 2: Technical Phone Screen\n- Structure answers"));
        assert!(text.contains("- Explain GIL and concurrency impact\n"));
        assert!(text.contains("- Use goroutines/channels for concurrency\n"));
        assert!(!text.contains("### Bonus Round\n-"));
        assert!(text.contains("### Q1 (Round 2: Technical Phone Screen) - Score: 50\n**Feedback:**\nToo shallow\n"));
        assert!(text.contains("### Q3 (Bonus Round) - Score: 60.5\n"));

        let details = text.find("## Summary Details").unwrap();
        let tips = text.find("## Improvement Tips").unwrap();
        let history = text.find("## Attempts History").unwrap();
        assert!(details < tips && tips < history);
    }

    #[test]
    fn role_stands_in_for_missing_stack() {
        let plan = plan();
        let summary = summary(&plan);
        let config = SessionConfigDraft {
            user_id: Some(UserId::random()),
            role: "Data Engineer".into(),
            ..SessionConfigDraft::default()
        }
        .validate(&plan)
        .unwrap();
        let input = ReportInput {
            plan: &plan,
            summary: &summary,
            config: Some(&config),
            generated_at: interview_core::time::fixed_now(),
        };
        assert!(render(&input).contains("Tech Stack: Data Engineer\n"));
    }

    #[test]
    fn writes_into_directory() {
        let plan = plan();
        let summary = summary(&plan);
        let dir = tempfile::tempdir().unwrap();
        let exporter = ReportExporter::new(dir.path().join("reports"));
        let input = ReportInput {
            plan: &plan,
            summary: &summary,
            config: None,
            generated_at: interview_core::time::fixed_now(),
        };

        let path = exporter.write_to(&input).unwrap();

        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("interview-summary-2023-11-14.md")
        );
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render(&input));
    }
}
