//! Real HTTP transport using ureq
//!
//! Blocking client; each request carries its own timeout.

use std::time::Duration;
use tracing::debug;

use crate::llm::adapters::transport_types::{AdapterError, SyncTransport};

/// Real HTTP transport using ureq
#[derive(Debug, Clone)]
pub struct UreqTransport {
    timeout: Duration,
}

impl UreqTransport {
    /// Default timeout (60s)
    pub fn new() -> Self {
        Self::with_timeout(60)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for UreqTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, AdapterError> {
        debug!(url, body_len = body.len(), timeout_secs = self.timeout.as_secs(), "POST");

        let mut request = ureq::request("POST", url).timeout(self.timeout);
        for (key, value) in headers {
            request = request.set(key, value);
        }

        // Non-2xx statuses arrive as ureq::Error::Status and map via From
        let response = request.send_string(body)?;
        debug!(status = response.status(), "response received");

        Ok(response.into_string()?)
    }
}
