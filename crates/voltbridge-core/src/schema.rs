// ── Provider configuration schemas ──
//
// Each vendor's final configuration is a typed struct: serde handles
// shape validation and default filling, `check()` handles range
// invariants, and schemars produces the JSON Schema description the
// discovery and wizard surfaces expose. `ConfigSchema` is the typed
// dispatch table -- one variant per schema, no reflection.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::vendor::MeasurementUnit;

/// Produce the JSON Schema description for a payload type.
pub(crate) fn schema_value<P: JsonSchema>() -> Value {
    let schema = schemars::r#gen::SchemaGenerator::default().into_root_schema_for::<P>();
    serde_json::to_value(schema).unwrap_or(Value::Null)
}

/// A configuration payload with invariants serde cannot express.
pub trait ConfigPayload: DeserializeOwned + Serialize + JsonSchema {
    /// Range/consistency checks applied after deserialization.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

fn normalize<C: ConfigPayload>(config: Value) -> Result<Value, ProviderError> {
    let parsed: C = serde_json::from_value(config).map_err(|e| ProviderError::Config {
        message: "provider configuration failed validation".into(),
        details: json!({ "error": e.to_string() }),
    })?;
    parsed.check().map_err(|error| ProviderError::Config {
        message: "provider configuration failed validation".into(),
        details: json!({ "error": error }),
    })?;
    serde_json::to_value(parsed).map_err(|e| ProviderError::Config {
        message: "provider configuration could not be normalized".into(),
        details: json!({ "error": e.to_string() }),
    })
}

// ── Config payload types ─────────────────────────────────────────────

fn default_max_power_kw() -> f64 {
    20.0
}

/// Final configuration of a FusionSolar provider: one device within
/// one station, with power clamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HuaweiProviderConfig {
    pub station_code: String,
    pub device_id: String,
    #[serde(default = "default_max_power_kw")]
    pub max_power_kw: f64,
    #[serde(default)]
    pub min_power_kw: f64,
}

impl ConfigPayload for HuaweiProviderConfig {
    fn check(&self) -> Result<(), String> {
        if self.max_power_kw <= 0.0 {
            return Err("max_power_kw must be greater than zero".into());
        }
        if self.min_power_kw < 0.0 {
            return Err("min_power_kw must not be negative".into());
        }
        Ok(())
    }
}

/// Final configuration of a GoodWe SEMS provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GoodWeProviderConfig {
    pub username: String,
    pub password: String,
    pub station_id: String,
    #[serde(default)]
    pub inverter_sn: Option<String>,
    #[serde(default = "default_max_power_kw")]
    pub max_power_kw: f64,
}

impl ConfigPayload for GoodWeProviderConfig {
    fn check(&self) -> Result<(), String> {
        if self.max_power_kw <= 0.0 {
            return Err("max_power_kw must be greater than zero".into());
        }
        Ok(())
    }
}

/// Alerting thresholds for a local sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SensorThresholdConfig {
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    pub unit: MeasurementUnit,
}

impl ConfigPayload for SensorThresholdConfig {
    fn check(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min >= max {
                return Err("min_value must be lower than max_value".into());
            }
        }
        Ok(())
    }
}

/// Login credentials shape advertised for API providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UsernamePasswordCredentials {
    pub username: String,
    pub password: String,
}

// ── Typed dispatch ───────────────────────────────────────────────────

/// Which configuration schema a vendor's final output must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSchema {
    Huawei,
    GoodWe,
    SensorThreshold,
}

impl ConfigSchema {
    /// JSON Schema description for discovery surfaces.
    pub fn describe(self) -> Value {
        match self {
            Self::Huawei => schema_value::<HuaweiProviderConfig>(),
            Self::GoodWe => schema_value::<GoodWeProviderConfig>(),
            Self::SensorThreshold => schema_value::<SensorThresholdConfig>(),
        }
    }

    /// Validate a configuration value, filling defaults and returning
    /// the normalized form.
    pub fn validate(self, config: Value) -> Result<Value, ProviderError> {
        match self {
            Self::Huawei => normalize::<HuaweiProviderConfig>(config),
            Self::GoodWe => normalize::<GoodWeProviderConfig>(config),
            Self::SensorThreshold => normalize::<SensorThresholdConfig>(config),
        }
    }
}

/// Which credentials shape a vendor expects during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsSchema {
    UsernamePassword,
}

impl CredentialsSchema {
    pub fn describe(self) -> Value {
        match self {
            Self::UsernamePassword => schema_value::<UsernamePasswordCredentials>(),
        }
    }
}
