use std::env;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{Question, QuizResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::repository::{ApiError, GenerationRequest, QuestionGenerator, ResultRecorder};
use crate::user::{AuthHeader, UserContext};

mod mapping;

use mapping::{GenerationResponse, ResultRecord, into_questions};

const GENERATE_PATH: &str = "generate-qa";
const RESULTS_PATH: &str = "quiz-results";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct QuizApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl QuizApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `STUDYMATE_API_URL` and the optional `STUDYMATE_API_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let base_url = lookup("STUDYMATE_API_URL")?;
        if base_url.trim().is_empty() {
            return None;
        }
        let timeout = lookup("STUDYMATE_API_TIMEOUT_SECS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Some(Self {
            base_url: base_url.trim().to_string(),
            timeout: Duration::from_secs(timeout),
        })
    }
}

/// REST client for question generation and result persistence.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    base_url: String,
}

impl HttpQuizApi {
    /// # Errors
    ///
    /// Returns `ApiError::NotConfigured` for a blank base URL, or
    /// `ApiError::Http` if the client cannot be built.
    pub fn new(config: QuizApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authorized(builder: RequestBuilder, user: &UserContext) -> RequestBuilder {
        let builder = builder
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .header(reqwest::header::PRAGMA, "no-cache");
        match user.auth_header() {
            AuthHeader::Bearer(token) => builder.bearer_auth(token),
            AuthHeader::UserId(id) => builder.header("x-user-id", id),
        }
    }

    fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        tracing::warn!(%status, url = %response.url(), "quiz api request rejected");
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(status));
        }
        Err(ApiError::HttpStatus(status))
    }
}

#[async_trait]
impl QuestionGenerator for HttpQuizApi {
    async fn generate(
        &self,
        user: &UserContext,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, ApiError> {
        tracing::info!(
            topic = %request.topic,
            kind = %request.kind,
            count = request.count,
            "requesting generated questions"
        );
        let builder = self.client.post(self.endpoint(GENERATE_PATH)).json(request);
        let response = Self::authorized(builder, user).send().await?;
        let response = Self::check_status(response)?;

        let body = response.bytes().await?;
        let parsed: GenerationResponse = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        let questions = into_questions(parsed.into_records(), request.kind)?;
        tracing::debug!(count = questions.len(), "generated questions accepted");
        Ok(questions)
    }
}

#[async_trait]
impl ResultRecorder for HttpQuizApi {
    async fn record_result(
        &self,
        user: &UserContext,
        result: &QuizResult,
    ) -> Result<(), ApiError> {
        let record = ResultRecord::from_result(result);
        let builder = self.client.post(self.endpoint(RESULTS_PATH)).json(&record);
        let response = Self::authorized(builder, user).send().await?;
        Self::check_status(response)?;
        tracing::info!(
            topic = %result.topic,
            score = result.score,
            total = result.total_questions,
            "quiz result saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_requires_base_url() {
        assert!(QuizApiConfig::from_lookup(|_| None).is_none());
        assert!(QuizApiConfig::from_lookup(|_| Some("  ".into())).is_none());
    }

    #[test]
    fn config_reads_timeout_override() {
        let config = QuizApiConfig::from_lookup(|key| match key {
            "STUDYMATE_API_URL" => Some("http://localhost:5000/api".into()),
            "STUDYMATE_API_TIMEOUT_SECS" => Some("5".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_timeout_uses_default() {
        let config = QuizApiConfig::from_lookup(|key| match key {
            "STUDYMATE_API_URL" => Some("http://localhost".into()),
            "STUDYMATE_API_TIMEOUT_SECS" => Some("0".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let api = HttpQuizApi::new(QuizApiConfig::new("http://localhost:5000/api/")).unwrap();
        assert_eq!(api.endpoint(GENERATE_PATH), "http://localhost:5000/api/generate-qa");
    }

    #[test]
    fn blank_base_url_is_not_configured() {
        assert!(matches!(
            HttpQuizApi::new(QuizApiConfig::new(" ")),
            Err(ApiError::NotConfigured)
        ));
    }
}
