use thiserror::Error;

/// Top-level error type for the `voltbridge-api` crate.
///
/// Covers every failure mode of the vendor wire clients: transport,
/// authentication, and payload decoding. `voltbridge-core` maps these
/// into the caller-facing provider error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login endpoint answered with a non-success HTTP status.
    #[error("authentication failed (HTTP {status})")]
    AuthFailed { status: u16, body: String },

    /// Login was accepted by the transport but rejected by the vendor
    /// (application-level `success: false`).
    #[error("authentication rejected by vendor: {message:?} (failCode {fail_code:?})")]
    AuthRejected {
        message: Option<String>,
        fail_code: Option<i64>,
    },

    /// Login succeeded but the expected session token was not issued.
    #[error("login response did not set a session token cookie")]
    TokenMissing,

    // ── Transport ───────────────────────────────────────────────────
    /// All attempts failed with timeouts or connection errors.
    #[error("request failed after {attempts} attempts: {source}")]
    Fetch {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP transport error outside the retry loop (request building,
    /// body reads, TLS setup).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Vendor API ──────────────────────────────────────────────────
    /// The vendor answered with an application-level failure
    /// (`success: false` with `message`/`failCode`).
    #[error("vendor API call failed: {message:?} (failCode {fail_code:?})")]
    Api {
        message: Option<String>,
        fail_code: Option<i64>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying
    /// after backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
