/// HTTP client for the dashboard backend.
///
/// Talks to the survey backend with the synchronous `ureq` client. Every
/// endpoint is a plain `GET` returning JSON; any transport failure or
/// non-success status is reported as [`LoadError::SourceUnavailable`] and
/// never retried.
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::{
    CountMap, CrossTabRow, DataSource, Endpoint, LoadError, RawRecord, ReasonsAnalysis,
    parse_records,
};
use crate::config::schema::SourceConfig;

/// Synchronous backend client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    timeout: Duration,
}

impl HttpSource {
    /// Build a client from the resolved `[source]` config.
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        // "localhost" may resolve to ::1 first while the backend binds IPv4 only.
        format!("{}{}", self.base_url, endpoint.path()).replace("://localhost", "://127.0.0.1")
    }

    /// `GET` an endpoint and decode its JSON body.
    fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, LoadError> {
        let url = self.url(endpoint);
        let resp = ureq::get(&url)
            .timeout(self.timeout)
            .call()
            .map_err(|e| LoadError::SourceUnavailable {
                endpoint: url.clone(),
                reason: describe_ureq_error(&e),
            })?;

        resp.into_json::<T>()
            .map_err(|e| LoadError::MalformedPayload {
                endpoint: url,
                reason: e.to_string(),
            })
    }

    /// Quick reachability check for `classpulse health`.
    pub fn is_reachable(&self) -> bool {
        ureq::get(&self.url(Endpoint::Data))
            .timeout(Duration::from_secs(5))
            .call()
            .is_ok()
    }
}

impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn fetch_records(&self) -> Result<Vec<RawRecord>, LoadError> {
        let payload: serde_json::Value = self.get_json(Endpoint::Data)?;
        parse_records(&self.url(Endpoint::Data), payload)
    }

    fn fetch_reasons(&self) -> Result<ReasonsAnalysis, LoadError> {
        self.get_json(Endpoint::ReasonsAnalysis)
    }

    fn fetch_year_wise(&self) -> Result<Vec<CrossTabRow>, LoadError> {
        self.get_json(Endpoint::YearWiseAnalysis)
    }

    fn fetch_count_map(&self, endpoint: Endpoint) -> Result<CountMap, LoadError> {
        self.get_json(endpoint)
    }
}

fn describe_ureq_error(err: &ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, _) => format!("HTTP error status {code}"),
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let config = SourceConfig::default();
        let client = HttpSource::from_config(&config);
        assert_eq!(client.base_url, "http://127.0.0.1:5000");
        assert_eq!(client.timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = HttpSource::new("http://example.test:5000/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://example.test:5000");
        assert_eq!(
            client.url(Endpoint::Attitude),
            "http://example.test:5000/api/attitude"
        );
    }

    #[test]
    fn localhost_is_pinned_to_ipv4() {
        let client = HttpSource::new("http://localhost:5000", Duration::from_secs(1));
        assert_eq!(client.url(Endpoint::Data), "http://127.0.0.1:5000/api/data");
    }

    #[test]
    fn unreachable_backend_is_source_unavailable() {
        // Port 9 (discard) is closed on any sane test host.
        let client = HttpSource::new("http://127.0.0.1:9", Duration::from_millis(500));
        let err = client.fetch_records().unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { .. }));
    }
}
