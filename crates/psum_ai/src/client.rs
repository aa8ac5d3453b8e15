use std::time::Duration;

use psum_core::config::{is_allowed_api_base, ProviderConfig};
use psum_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Connection settings for an OpenAI-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl ProviderClient {
    /// Remote endpoints must use https; plain http is restricted to `127.0.0.1`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if !is_allowed_api_base(&base_url) {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "Provider base URL must be https or http://127.0.0.1",
            )
            .with_details(format!("base_url={base_url}")));
        }
        if api_key.trim().is_empty() {
            return Err(AppError::new("CONFIG_INVALID", "Provider API key is empty"));
        }

        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            timeout,
        })
    }

    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, AppError> {
        Self::new(&cfg.api_base, &cfg.api_key()?, cfg.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/models", self.base_url);
        let resp = ureq::get(&url)
            .timeout(Duration::from_secs(5))
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .call();

        match resp {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(
                "AI_PROVIDER_UNHEALTHY",
                "Provider health check failed",
            )
            .with_details(format!("status={status}"))
            .with_retryable(is_retryable_status(status))),
            Err(e) => Err(
                AppError::new("AI_PROVIDER_UNREACHABLE", "Failed to reach provider")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }

    /// POST `body` as JSON to `path` and decode the JSON reply. Failures carry `code`.
    pub(crate) fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        code: &str,
    ) -> Result<R, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let payload = serde_json::to_value(body).map_err(|e| {
            AppError::new(code, "Failed to encode provider request").with_details(e.to_string())
        })?;

        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(payload);

        match resp {
            Ok(r) => r.into_json::<R>().map_err(|e| {
                AppError::new(code, "Failed to decode provider response")
                    .with_details(e.to_string())
                    .with_retryable(true)
            }),
            Err(ureq::Error::Status(status, r)) => {
                let body = r.into_string().unwrap_or_default();
                Err(AppError::new(code, "Provider request failed")
                    .with_details(format!("status={status}; body={}", snippet(&body, 300)))
                    .with_retryable(is_retryable_status(status)))
            }
            Err(e) => Err(AppError::new(code, "Failed to call provider endpoint")
                .with_details(e.to_string())
                .with_retryable(true)),
        }
    }
}

/// Rate limits, timeouts and server-side failures are worth another attempt.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

fn snippet(text: &str, max_chars: usize) -> String {
    let t = text.trim();
    match t.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &t[..idx]),
        None => t.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_tls_or_loopback_base_url() {
        let t = Duration::from_secs(1);
        assert!(ProviderClient::new("https://api.openai.com/v1", "k", t).is_ok());
        assert!(ProviderClient::new("http://127.0.0.1:11434/v1/", "k", t).is_ok());

        assert!(ProviderClient::new("http://api.openai.com/v1", "k", t).is_err());
        assert!(ProviderClient::new("http://127.0.0.1.evil.com:11434", "k", t).is_err());
        assert!(ProviderClient::new("https://api.openai.com/v1", "  ", t).is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let c = ProviderClient::new("https://api.openai.com/v1/", "k", Duration::from_secs(1))
            .expect("client");
        assert_eq!(c.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn classifies_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(401));
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        assert_eq!(snippet("héllo", 2), "hé...");
        assert_eq!(snippet(" ok ", 10), "ok");
    }
}
