//! Fake transport for testing
//!
//! Returns a fixture body (or a forced error) and records every request.
//! Clones share the same request log, so a test can keep a handle after
//! moving the transport into an adapter.

use std::sync::{Arc, Mutex};

use crate::llm::adapters::transport_types::{AdapterError, SyncTransport};

/// One request as seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON (Null if it is not JSON)
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or_default()
    }
}

/// Fake transport for testing
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    /// Response body to return
    pub response_body: String,
    /// Error to return instead (if set)
    pub error: Option<AdapterError>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeTransport {
    pub fn new(response: &str) -> Self {
        Self {
            response_body: response.to_string(),
            ..Self::default()
        }
    }

    pub fn with_error(error: AdapterError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests().pop()
    }
}

impl SyncTransport for FakeTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, AdapterError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(RecordedRequest {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.to_string(),
            });
        }

        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.response_body.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_transport_returns_fixture_and_records() {
        let transport = FakeTransport::new("fixture");
        let handle = transport.clone();

        let result = transport.post_json("http://test/x", &[("X-Key", "1")], r#"{"a":1}"#);
        assert_eq!(result.unwrap(), "fixture");

        let request = handle.last_request().unwrap();
        assert_eq!(request.url, "http://test/x");
        assert_eq!(request.header("x-key"), Some("1"));
        assert_eq!(request.json()["a"], 1);
    }

    #[test]
    fn test_fake_transport_with_error() {
        let transport = FakeTransport::with_error(AdapterError::Network("down".to_string()));
        let result = transport.post_json("http://test", &[], "{}");
        assert_eq!(result, Err(AdapterError::Network("down".to_string())));
        assert_eq!(transport.requests().len(), 1);
    }
}
