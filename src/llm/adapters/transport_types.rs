//! Transport types
//!
//! Error type and transport trait shared by every adapter.

/// Adapter errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
    /// Network error (connection refused, timeout, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP error (non-2xx status)
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Credentials rejected by the provider
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limited
    #[error("Rate limited{retry_after}")]
    RateLimited { retry_after: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider reported an error in the response body
    #[error("Provider error: {code} - {message}")]
    Provider { code: String, message: String },

    /// Adapter cannot be built from the given settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Json(err.to_string())
    }
}

impl From<ureq::Error> for AdapterError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(401, _) => {
                AdapterError::Authentication("API key rejected".to_string())
            }
            ureq::Error::Status(429, response) => AdapterError::RateLimited {
                retry_after: response
                    .header("retry-after")
                    .map(|secs| format!(" (retry after {}s)", secs))
                    .unwrap_or_default(),
            },
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                AdapterError::Http {
                    status: code,
                    message: truncate(body.trim(), 200),
                }
            }
            ureq::Error::Transport(err) => AdapterError::Network(err.to_string()),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Synchronous HTTP transport
///
/// Abstraction over the HTTP client so adapters can be tested with
/// `FakeTransport`.
pub trait SyncTransport: Send + Sync {
    /// POST a JSON body and return the response body
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_error_display() {
        let err = AdapterError::Network("refused".to_string());
        assert_eq!(err.to_string(), "Network error: refused");

        let err = AdapterError::Http {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: overloaded");

        let err = AdapterError::RateLimited {
            retry_after: " (retry after 30s)".to_string(),
        };
        assert_eq!(err.to_string(), "Rate limited (retry after 30s)");
    }

    #[test]
    fn test_truncate_long_bodies() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
