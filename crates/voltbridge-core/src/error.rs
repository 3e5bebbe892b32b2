// ── Caller-facing error taxonomy ──
//
// Two families: `ProviderError` for registry/factory/adapter failures,
// `WizardError` for the onboarding flow. Every variant maps to one
// distinct caller-visible outcome -- a machine code, an HTTP-like
// status, and structured details -- so the embedding HTTP layer can
// translate without inspecting messages. The `From<voltbridge_api::Error>`
// impl translates wire-layer errors into this taxonomy.

use serde_json::{Value, json};
use thiserror::Error;

use crate::vendor::Vendor;

/// Failures of the provider layer: transport, configuration,
/// registry resolution, and vendor authentication.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream fetch exhausted its retry budget. Retryable by the
    /// caller after backoff; never retried automatically beyond the
    /// transport's own bounded loop.
    #[error("{message}")]
    Fetch { message: String, details: Value },

    /// Supplied provider configuration failed schema validation.
    #[error("{message}")]
    Config { message: String, details: Value },

    /// Unknown vendor, or a vendor with no adapter implementation.
    #[error("provider '{vendor}' is not supported")]
    NotSupported { vendor: Vendor },

    /// Vendor authentication failed, after the adapter's own single
    /// forced re-login attempt.
    #[error("{message}")]
    Auth {
        message: String,
        code: &'static str,
        status: u16,
        details: Value,
    },

    /// The vendor API rejected an authenticated call.
    #[error("{message}")]
    Api {
        message: String,
        code: &'static str,
        status: u16,
        details: Value,
    },
}

impl ProviderError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "PROVIDER_FETCH_ERROR",
            Self::Config { .. } => "PROVIDER_CONFIG_ERROR",
            Self::NotSupported { .. } => "PROVIDER_NOT_SUPPORTED",
            Self::Auth { code, .. } | Self::Api { code, .. } => code,
        }
    }

    /// HTTP-like status the embedding layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Fetch { .. } => 502,
            Self::Config { .. } => 400,
            Self::NotSupported { .. } => 404,
            Self::Auth { status, .. } | Self::Api { status, .. } => *status,
        }
    }

    /// Structured details for diagnostics (never secret material).
    pub fn details(&self) -> Value {
        match self {
            Self::Fetch { details, .. }
            | Self::Config { details, .. }
            | Self::Auth { details, .. }
            | Self::Api { details, .. } => details.clone(),
            Self::NotSupported { vendor } => json!({ "vendor": vendor }),
        }
    }
}

// ── Conversion from wire-layer errors ────────────────────────────────

impl From<voltbridge_api::Error> for ProviderError {
    fn from(err: voltbridge_api::Error) -> Self {
        use voltbridge_api::Error as Api;

        match err {
            Api::Fetch { attempts, source } => ProviderError::Fetch {
                message: "provider request failed after retries".into(),
                details: json!({ "attempts": attempts, "error": source.to_string() }),
            },
            Api::Transport(e) => ProviderError::Fetch {
                message: "provider transport error".into(),
                details: json!({ "error": e.to_string() }),
            },
            Api::AuthFailed { status, body } => ProviderError::Auth {
                message: "FusionSolar authentication failed".into(),
                code: "HUAWEI_AUTH_FAILED",
                status,
                details: json!({ "body": body }),
            },
            Api::AuthRejected { message, fail_code } => ProviderError::Auth {
                message: "FusionSolar authentication rejected".into(),
                code: "HUAWEI_AUTH_REJECTED",
                status: 401,
                details: json!({ "message": message, "failCode": fail_code }),
            },
            Api::TokenMissing => ProviderError::Auth {
                message: "FusionSolar login did not return a session token".into(),
                code: "HUAWEI_XSRF_MISSING",
                status: 502,
                details: Value::Null,
            },
            Api::Api { message, fail_code } => ProviderError::Api {
                message: "FusionSolar API error".into(),
                code: "HUAWEI_API_ERROR",
                status: 502,
                details: json!({ "message": message, "failCode": fail_code }),
            },
            Api::Deserialization { message, body } => ProviderError::Api {
                message: "FusionSolar returned an unreadable payload".into(),
                code: "HUAWEI_API_ERROR",
                status: 502,
                details: json!({ "error": message, "body": body }),
            },
            Api::InvalidUrl(e) => ProviderError::Config {
                message: format!("invalid provider URL: {e}"),
                details: Value::Null,
            },
        }
    }
}

/// Failures of the onboarding wizard.
#[derive(Debug, Error)]
pub enum WizardError {
    /// The vendor declares no wizard, or the session belongs to a
    /// different vendor.
    #[error("{0}")]
    NotConfigured(String),

    /// The named step does not exist in the vendor's step graph.
    #[error("{0}")]
    StepNotFound(String),

    /// Missing or stale session id -- the caller must restart the flow
    /// from the entry step.
    #[error("{0}")]
    SessionExpired(String),

    /// Step payload failed schema validation, or the session lacks the
    /// state a step needs.
    #[error("{message}")]
    SessionState { message: String, details: Value },

    /// A step handler violated the next-step/completion contract.
    /// A defect in the handler, not a user input problem.
    #[error("{0}")]
    ResultContract(String),

    /// A provider failure surfaced through a step handler, unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl WizardError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "WIZARD_NOT_CONFIGURED",
            Self::StepNotFound(_) => "WIZARD_STEP_NOT_FOUND",
            Self::SessionExpired(_) => "WIZARD_SESSION_EXPIRED",
            Self::SessionState { .. } => "WIZARD_SESSION_STATE",
            Self::ResultContract(_) => "WIZARD_RESULT_CONTRACT",
            Self::Provider(inner) => inner.code(),
        }
    }

    /// HTTP-like status the embedding layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotConfigured(_) | Self::StepNotFound(_) => 404,
            Self::SessionExpired(_) => 410,
            Self::SessionState { .. } => 422,
            Self::ResultContract(_) => 500,
            Self::Provider(inner) => inner.status_code(),
        }
    }

    /// Structured details for diagnostics.
    pub fn details(&self) -> Value {
        match self {
            Self::SessionState { details, .. } => details.clone(),
            Self::Provider(inner) => inner.details(),
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_distinct_code_and_status() {
        let fetch = ProviderError::Fetch {
            message: "x".into(),
            details: Value::Null,
        };
        assert_eq!(fetch.code(), "PROVIDER_FETCH_ERROR");
        assert_eq!(fetch.status_code(), 502);

        let missing = ProviderError::NotSupported {
            vendor: Vendor::Goodwe,
        };
        assert_eq!(missing.code(), "PROVIDER_NOT_SUPPORTED");
        assert_eq!(missing.status_code(), 404);
        assert_eq!(missing.details(), json!({ "vendor": "goodwe" }));

        let expired = WizardError::SessionExpired("gone".into());
        assert_eq!(expired.code(), "WIZARD_SESSION_EXPIRED");
        assert_eq!(expired.status_code(), 410);
    }

    #[test]
    fn provider_errors_pass_through_the_wizard_unchanged() {
        let wrapped = WizardError::from(ProviderError::Auth {
            message: "rejected".into(),
            code: "HUAWEI_AUTH_REJECTED",
            status: 401,
            details: Value::Null,
        });
        assert_eq!(wrapped.code(), "HUAWEI_AUTH_REJECTED");
        assert_eq!(wrapped.status_code(), 401);
    }
}
