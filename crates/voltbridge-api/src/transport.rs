// Resilient HTTP transport shared by all vendor clients.
//
// Owns a reqwest::Client bound to one base URL with fixed default
// headers, and retries connection-level failures (timeouts, refused
// connections) immediately up to a bounded attempt count. Everything
// else -- including non-2xx statuses -- is handed back to the caller
// untouched; interpreting payloads is the vendor client's job.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::{Method, Response};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;

/// Configuration for building a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base address every request path is joined onto.
    pub base_url: Url,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Maximum attempts per request (minimum 1).
    pub max_attempts: u32,
    /// Cookie jar shared across requests (session auth).
    pub cookie_jar: Option<Arc<Jar>>,
}

impl TransportConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            cookie_jar: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Attach a fresh cookie jar (for session-cookie auth flows).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }
}

/// HTTP transport with bounded retry on connection-level failures.
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    max_attempts: u32,
}

impl Transport {
    /// Build a transport from config plus the client's default headers.
    pub fn new(config: TransportConfig, default_headers: HeaderMap) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent("voltbridge/0.1.0")
            .default_headers(default_headers);

        if let Some(ref jar) = config.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        let http = builder.build().map_err(Error::Transport)?;

        Ok(Self {
            http,
            base_url: config.base_url,
            timeout: config.timeout,
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// The base URL requests are issued against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full URL for an endpoint path.
    fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&full).map_err(Error::InvalidUrl)
    }

    /// Issue a request, retrying connection-level failures.
    ///
    /// Timeouts and connection errors are retried immediately (no
    /// backoff) up to the configured attempt count; exhausting the
    /// budget raises [`Error::Fetch`] carrying the last failure. Any
    /// HTTP response, whatever its status, is returned unmodified.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        json: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<Response, Error> {
        let url = self.url(path)?;
        let mut last_err: Option<reqwest::Error> = None;

        for attempt in 1..=self.max_attempts {
            debug!(%url, attempt, max = self.max_attempts, "HTTP request");

            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .timeout(self.timeout)
                .headers(headers.clone());
            if let Some(body) = json {
                builder = builder.json(body);
            }

            match builder.send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_timeout() || e.is_connect() => {
                    warn!(%url, attempt, error = %e, "HTTP request failed, retrying");
                    last_err = Some(e);
                }
                Err(e) => return Err(Error::Transport(e)),
            }
        }

        warn!(%url, attempts = self.max_attempts, "HTTP request failed after retries");

        let source = last_err.expect("max_attempts >= 1 guarantees at least one attempt");
        Err(Error::Fetch {
            attempts: self.max_attempts,
            source,
        })
    }
}
