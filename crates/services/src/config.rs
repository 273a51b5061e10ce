use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ApiConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081/api/v1";

/// Connection settings for the practice API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: None,
        }
    }
}

impl ApiConfig {
    /// Read `INTERVIEW_API_BASE_URL` and `INTERVIEW_API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ApiConfigError` if either variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ApiConfigError> {
        Self::from_vars(
            env::var("INTERVIEW_API_BASE_URL").ok(),
            env::var("INTERVIEW_API_TIMEOUT_SECS").ok(),
        )
    }

    /// # Errors
    ///
    /// Returns `ApiConfigError` if the URL does not parse or the timeout is not
    /// a positive number of seconds.
    pub fn from_vars(
        base_url: Option<String>,
        timeout_secs: Option<String>,
    ) -> Result<Self, ApiConfigError> {
        let base_url = base_url
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        if Url::parse(&base_url).is_err() {
            return Err(ApiConfigError::InvalidBaseUrl { raw: base_url });
        }

        let timeout = match timeout_secs.map(|raw| raw.trim().to_owned()) {
            None => None,
            Some(raw) if raw.is_empty() => None,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => return Err(ApiConfigError::InvalidTimeout { raw }),
            },
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout,
        })
    }
}
