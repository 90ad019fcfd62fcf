//! Thin JSON-over-HTTP client shared by the provider clients.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{IngestError, Result};

const USER_AGENT: &str = concat!("dora/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A blocking client bound to one API base URL and a fixed set of headers.
#[derive(Clone)]
pub struct ApiClient {
    provider: &'static str,
    agent: ureq::Agent,
    base_url: String,
    headers: Vec<(&'static str, String)>,
}

impl ApiClient {
    pub fn new(provider: &'static str, base_url: impl Into<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(DEFAULT_TIMEOUT))
            .build()
            .into();
        Self {
            provider,
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers: vec![("User-Agent", USER_AGENT.to_string())],
        }
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issues a GET and decodes the JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        debug!(provider = self.provider, %url, "GET");

        let mut request = self.agent.get(&url);
        for (name, value) in &self.headers {
            request = request.header(*name, value.as_str());
        }
        for (key, value) in query {
            request = request.query(*key, value.as_str());
        }

        let mut response = request
            .call()
            .map_err(|e| IngestError::http(self.provider, &url, e))?;
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| IngestError::http(self.provider, &url, e))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
