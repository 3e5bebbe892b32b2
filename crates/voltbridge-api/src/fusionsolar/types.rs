//! FusionSolar wire types.
//!
//! Responses use the `{ success, failCode, message, data }` envelope.
//! Field names are camelCase via `#[serde(rename_all = "camelCase")]`.
//! Discovery payloads are normalized into [`Station`] / [`StationDevice`];
//! the original vendor payload is preserved in `raw` for diagnostics.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Application-level relogin demand (session ended server-side).
pub(crate) const RELOGIN_FAIL_CODE: i64 = 20010;
pub(crate) const RELOGIN_MESSAGE: &str = "USER_MUST_RELOGIN";

/// Account credentials for the northbound API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// The `{ success, failCode, message, data }` envelope wrapping every
/// FusionSolar response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub fail_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl FusionEnvelope {
    /// The server unilaterally ended the session and demands a fresh login.
    pub(crate) fn must_relogin(&self) -> bool {
        self.message.as_deref() == Some(RELOGIN_MESSAGE)
            || self.fail_code == Some(RELOGIN_FAIL_CODE)
    }
}

// ── Raw discovery payloads ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStation {
    station_code: String,
    #[serde(default)]
    station_name: Option<String>,
    #[serde(default)]
    capacity: Option<f64>,
    #[serde(default)]
    grid_connected_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDevice {
    dev_id: i64,
    #[serde(default)]
    dev_name: Option<String>,
    #[serde(default)]
    station_code: Option<String>,
    #[serde(default)]
    dev_type_id: Option<i64>,
}

// ── Normalized shapes ────────────────────────────────────────────────

/// A plant/station, normalized from `getStationList`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub code: String,
    pub name: String,
    pub capacity_kw: Option<f64>,
    pub grid_connected_at: Option<String>,
    /// Original vendor payload, kept for diagnostics only.
    pub raw: Value,
}

impl Station {
    pub(crate) fn from_raw(raw: Value) -> Result<Self, Error> {
        let fields: RawStation =
            serde_json::from_value(raw.clone()).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: raw.to_string(),
            })?;
        let name = fields
            .station_name
            .unwrap_or_else(|| fields.station_code.clone());
        Ok(Self {
            code: fields.station_code,
            name,
            capacity_kw: fields.capacity,
            grid_connected_at: fields.grid_connected_time,
            raw,
        })
    }
}

/// A device within a station, normalized from `getDevList`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationDevice {
    pub id: String,
    pub name: String,
    pub station_code: Option<String>,
    pub type_id: Option<i64>,
    /// Original vendor payload, kept for diagnostics only.
    pub raw: Value,
}

impl StationDevice {
    pub(crate) fn from_raw(raw: Value) -> Result<Self, Error> {
        let fields: RawDevice =
            serde_json::from_value(raw.clone()).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: raw.to_string(),
            })?;
        let id = fields.dev_id.to_string();
        let name = fields.dev_name.unwrap_or_else(|| id.clone());
        Ok(Self {
            id,
            name,
            station_code: fields.station_code,
            type_id: fields.dev_type_id,
            raw,
        })
    }
}
