#![forbid(unsafe_code)]

//! Thin client for the YouTube Data API v3.
//!
//! Every request goes through [`ApiTransport`] so the pipeline can be driven
//! by canned JSON in tests. [`DataApi`] owns the credential and the fixed
//! post-request delay that keeps a run under the API's rate limits.

use std::thread;
use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CollectorError, Result};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_API_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues GET requests and decodes the JSON body.
///
/// Implementations must map non-success statuses and transport failures to
/// [`CollectorError::Transport`].
pub trait ApiTransport {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value>;
}

/// Blocking transport backed by a shared `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiTransport for UreqTransport {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(response) => response
                .into_json::<Value>()
                .map_err(|err| CollectorError::transport(url, format!("decoding body: {err}"))),
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(CollectorError::transport(url, describe_status(code, &body)))
            }
            Err(ureq::Error::Transport(err)) => Err(CollectorError::transport(url, err.to_string())),
        }
    }
}

/// Formats a failed response, surfacing the API's own `error.message` (quota
/// exhausted, invalid key, ...) when the body carries one.
fn describe_status(code: u16, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value["error"]["message"]
            .as_str()
            .filter(|message| !message.is_empty())
            .map(str::to_owned)
    });

    match detail {
        Some(message) => format!("HTTP {code}: {message}"),
        None => format!("HTTP {code}"),
    }
}

/// Sleeps for `delay` unless it is zero.
pub(crate) fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

pub struct DataApi<T> {
    transport: T,
    api_key: String,
    delay: Duration,
}

impl<T: ApiTransport> DataApi<T> {
    pub fn new(transport: T, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            delay: DEFAULT_API_DELAY,
        }
    }

    /// Overrides the delay applied after each successful request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Requests `<base>/<resource>` with `params` plus the API key, then
    /// waits out the configured delay.
    pub(crate) fn get(&self, resource: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{API_BASE}/{resource}");
        debug!("GET {resource} {params:?}");

        let mut query = params.to_vec();
        query.push(("key", self.api_key.as_str()));
        let value = self.transport.get_json(&url, &query)?;

        pause(self.delay);
        Ok(value)
    }

    /// Same as [`DataApi::get`] but decodes the body into `R`.
    pub(crate) fn get_as<R: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<R> {
        let value = self.get(resource, params)?;
        serde_json::from_value(value).map_err(|err| {
            CollectorError::transport(resource, format!("unexpected response shape: {err}"))
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeTransport, fake_api};
    use super::*;
    use serde_json::json;

    #[test]
    fn get_appends_api_key_and_builds_url() {
        let api = fake_api(FakeTransport::new().respond("channels", json!({"items": []})));
        api.get("channels", &[("part", "id")]).unwrap();

        let calls = api.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].resource, "channels");
        assert_eq!(calls[0].param("part"), Some("id"));
        assert_eq!(calls[0].param("key"), Some("test-key"));
    }

    #[test]
    fn get_propagates_transport_errors() {
        let api = fake_api(FakeTransport::new().fail("videos", "HTTP 403: quota exceeded"));
        let err = api.get("videos", &[]).unwrap_err();
        assert!(matches!(err, CollectorError::Transport { .. }));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn get_as_reports_unexpected_shapes_as_transport_errors() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Page {
            items: Vec<String>,
        }

        let api = fake_api(FakeTransport::new().respond("videos", json!({"items": 7})));
        let err = api.get_as::<Page>("videos", &[]).unwrap_err();
        assert!(err.to_string().contains("unexpected response shape"));
    }

    #[test]
    fn describe_status_prefers_api_message() {
        let body = r#"{"error": {"code": 403, "message": "The request cannot be completed because you have exceeded your quota."}}"#;
        assert_eq!(
            describe_status(403, body),
            "HTTP 403: The request cannot be completed because you have exceeded your quota."
        );
        assert_eq!(describe_status(500, "<html>oops</html>"), "HTTP 500");
        assert_eq!(describe_status(404, r#"{"error": {"message": ""}}"#), "HTTP 404");
    }

    #[test]
    fn default_delay_is_one_second() {
        let api = DataApi::new(FakeTransport::new(), "key");
        assert_eq!(api.delay(), Duration::from_secs(1));
        let api = api.with_delay(Duration::from_millis(250));
        assert_eq!(api.delay(), Duration::from_millis(250));
    }
}
