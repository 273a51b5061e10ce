use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use interview_core::model::{
    Attempt, AttemptId, Language, NextQuestion, Question, QuestionId, RoundId, Session, SessionId,
    UserId,
};

use super::{
    AnswerEvaluator, Evaluation, QuestionProvider, StartSessionRequest, StartedSession,
    SubmitAnswerRequest,
};
use crate::config::ApiConfig;
use crate::error::{ApiConfigError, ProviderError};

/// HTTP client for the practice API; serves as both question provider and evaluator.
#[derive(Clone)]
pub struct PracticeApiClient {
    client: Client,
    base_url: String,
}

impl PracticeApiClient {
    /// # Errors
    ///
    /// Returns `ApiConfigError::Client` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiConfigError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl QuestionProvider for PracticeApiClient {
    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartedSession, ProviderError> {
        let payload = StartSessionBody::from(request);
        debug!(topic = %request.topic, level = %request.level, "requesting practice session");
        let response = self
            .client
            .post(self.url("sessions"))
            .json(&payload)
            .send()
            .await?;
        let body: StartSessionResponse = read_json(response).await?;
        body.into_started(request.user_id)
    }

    async fn fetch_question(&self, id: QuestionId) -> Result<Question, ProviderError> {
        let response = self
            .client
            .get(self.url(&format!("questions/{id}")))
            .send()
            .await?;
        let body: QuestionBody = read_json(response).await?;
        body.into_question()
    }
}

#[async_trait]
impl AnswerEvaluator for PracticeApiClient {
    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<Evaluation, ProviderError> {
        let payload = SubmitAnswerBody {
            question_id: request.question_id,
            content: &request.content,
            language: request.language,
            ai_enabled: request.ai_enabled,
        };
        let response = self
            .client
            .post(self.url(&format!("sessions/{}/answers", request.session_id)))
            .json(&payload)
            .send()
            .await?;
        let body: SubmitAnswerResponse = read_json(response).await?;
        body.into_evaluation()
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text);
        warn!(status = status.as_u16(), ?message, "practice API request failed");
        return Err(ProviderError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, ProviderError> {
    value.ok_or(ProviderError::Malformed(field))
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct StartSessionBody<'a> {
    user_id: UserId,
    topic_id: &'a str,
    level: &'a str,
    language: Language,
    config: StartConfigBody<'a>,
}

#[derive(Debug, Serialize)]
struct StartConfigBody<'a> {
    role: &'a str,
    stacks: &'a [String],
    round_id: &'a RoundId,
}

impl<'a> From<&'a StartSessionRequest> for StartSessionBody<'a> {
    fn from(request: &'a StartSessionRequest) -> Self {
        Self {
            user_id: request.user_id,
            topic_id: &request.topic,
            level: &request.level,
            language: request.language,
            config: StartConfigBody {
                role: &request.role,
                stacks: &request.stacks,
                round_id: &request.round_id,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StartSessionResponse {
    session: Option<SessionBody>,
    first_question_id: Option<QuestionId>,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    id: Option<SessionId>,
    user_id: Option<UserId>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

impl StartSessionResponse {
    fn into_started(self, requested_user: UserId) -> Result<StartedSession, ProviderError> {
        let session = require(self.session, "session")?;
        let first_question_id = require(self.first_question_id, "first_question_id")?;
        Ok(StartedSession {
            session: Session {
                id: require(session.id, "session.id")?,
                user_id: session.user_id.unwrap_or(requested_user),
                status: session.status.unwrap_or_default(),
                score: session.score.unwrap_or_default(),
            },
            first_question_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct QuestionBody {
    id: Option<QuestionId>,
    content: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl QuestionBody {
    fn into_question(self) -> Result<Question, ProviderError> {
        Ok(Question {
            id: require(self.id, "id")?,
            content: require(self.content, "content")?,
            topic: self.topic.unwrap_or_default(),
            level: self.level.unwrap_or_default(),
            hint: self.hint.filter(|h| !h.trim().is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
struct SubmitAnswerBody<'a> {
    question_id: QuestionId,
    content: &'a str,
    language: Language,
    ai_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct SubmitAnswerResponse {
    attempt: Option<AttemptBody>,
    #[serde(default)]
    next_question_id: Option<QuestionId>,
}

#[derive(Debug, Deserialize)]
struct AttemptBody {
    id: Option<AttemptId>,
    score: Option<f64>,
    feedback: Option<String>,
    #[serde(default)]
    improved_answer: Option<String>,
    #[serde(default)]
    suggestions: Option<Vec<String>>,
}

impl SubmitAnswerResponse {
    fn into_evaluation(self) -> Result<Evaluation, ProviderError> {
        let attempt = require(self.attempt, "attempt")?;
        let score = require(attempt.score, "attempt.score")?;
        if !(0.0..=100.0).contains(&score) {
            return Err(ProviderError::Malformed("attempt.score"));
        }
        Ok(Evaluation {
            attempt: Attempt {
                id: require(attempt.id, "attempt.id")?,
                score,
                feedback: require(attempt.feedback, "attempt.feedback")?,
                suggested_answer: attempt.improved_answer.filter(|a| !a.trim().is_empty()),
                suggestions: attempt.suggestions.unwrap_or_default(),
            },
            next: NextQuestion::from_wire(self.next_question_id),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_body_matches_wire_shape() {
        let request = StartSessionRequest {
            user_id: "123e4567-e89b-12d3-a456-426614174000".parse().unwrap(),
            topic: "Golang".into(),
            level: "Medium".into(),
            language: Language::Vi,
            role: "Backend Engineer".into(),
            stacks: vec!["Golang".into()],
            round_id: RoundId::new("technical"),
        };
        let value = serde_json::to_value(StartSessionBody::from(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "user_id": "123e4567-e89b-12d3-a456-426614174000",
                "topic_id": "Golang",
                "level": "Medium",
                "language": "vi",
                "config": {
                    "role": "Backend Engineer",
                    "stacks": ["Golang"],
                    "round_id": "technical"
                }
            })
        );
    }

    #[test]
    fn start_response_requires_session_id() {
        let body: StartSessionResponse = serde_json::from_value(json!({
            "session": { "user_id": "123e4567-e89b-12d3-a456-426614174000" },
            "first_question_id": "7d3c2f0e-4b8a-4c1e-9d7f-2a6b5c4d3e2f"
        }))
        .unwrap();
        let err = body.into_started(UserId::random()).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed("session.id")));
    }

    #[test]
    fn submit_response_maps_sentinel_to_exhausted() {
        let body: SubmitAnswerResponse = serde_json::from_value(json!({
            "attempt": {
                "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                "score": 72,
                "feedback": "Solid answer",
                "improved_answer": ""
            },
            "next_question_id": "00000000-0000-0000-0000-000000000000"
        }))
        .unwrap();
        let evaluation = body.into_evaluation().unwrap();
        assert_eq!(evaluation.next, NextQuestion::Exhausted);
        assert_eq!(evaluation.attempt.score, 72.0);
        assert_eq!(evaluation.attempt.suggested_answer, None);
    }

    #[test]
    fn submit_response_without_score_is_malformed() {
        let body: SubmitAnswerResponse = serde_json::from_value(json!({
            "attempt": {
                "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                "feedback": "Solid answer"
            }
        }))
        .unwrap();
        assert!(matches!(
            body.into_evaluation(),
            Err(ProviderError::Malformed("attempt.score"))
        ));
    }

    #[test]
    fn submit_response_with_out_of_range_score_is_malformed() {
        for score in [250.0, -5.0] {
            let body: SubmitAnswerResponse = serde_json::from_value(json!({
                "attempt": {
                    "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                    "score": score,
                    "feedback": "Solid answer"
                },
                "next_question_id": "7d3c2f0e-4b8a-4c1e-9d7f-2a6b5c4d3e2f"
            }))
            .unwrap();
            assert!(matches!(
                body.into_evaluation(),
                Err(ProviderError::Malformed("attempt.score"))
            ));
        }
    }

    #[test]
    fn submit_response_accepts_scale_bounds() {
        for score in [0.0, 100.0] {
            let body: SubmitAnswerResponse = serde_json::from_value(json!({
                "attempt": {
                    "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                    "score": score,
                    "feedback": "Solid answer"
                }
            }))
            .unwrap();
            assert_eq!(body.into_evaluation().unwrap().attempt.score, score);
        }
    }

    #[test]
    fn question_body_drops_blank_hint() {
        let body: QuestionBody = serde_json::from_value(json!({
            "id": "7d3c2f0e-4b8a-4c1e-9d7f-2a6b5c4d3e2f",
            "content": "Explain channels",
            "topic": "Golang",
            "level": "Medium",
            "hint": ""
        }))
        .unwrap();
        let question = body.into_question().unwrap();
        assert_eq!(question.content, "Explain channels");
        assert_eq!(question.hint, None);
    }

    #[test]
    fn error_body_message_is_extracted() {
        assert_eq!(
            error_message(r#"{"error":"Invalid question ID format"}"#).as_deref(),
            Some("Invalid question ID format")
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn urls_are_joined_without_double_slashes() {
        let client = PracticeApiClient::new(&ApiConfig {
            base_url: "http://localhost:8081/api/v1/".into(),
            timeout: None,
        })
        .unwrap();
        assert_eq!(client.url("/sessions"), "http://localhost:8081/api/v1/sessions");
    }
}
