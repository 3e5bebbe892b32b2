// ── FusionSolar onboarding flow ──
//
// Three steps: auth (verify credentials, list stations), station (pick
// one, list its devices), device (pick one, emit the final provider
// configuration). Credentials are stashed in the session's private data
// after the auth step; later steps resolve the cached adapter from
// there.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use schemars::JsonSchema;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use voltbridge_api::Credentials;

use crate::adapter::ProviderAdapter;
use crate::error::WizardError;
use crate::factory::AdapterFactory;
use crate::registry::AdapterOverrides;
use crate::vendor::Vendor;
use crate::wizard::steps::{
    SelectOption, StepContext, StepPayload, WizardFlow, WizardHandlerResult, WizardStep, decode,
};

/// Step names, in flow order.
pub const STEP_AUTH: &str = "auth";
pub const STEP_STATION: &str = "station";
pub const STEP_DEVICE: &str = "device";

/// The FusionSolar step graph.
pub fn flow() -> WizardFlow {
    WizardFlow::new(STEP_AUTH)
        .with_step(STEP_AUTH, WizardStep::new::<AuthStepPayload>(auth_step))
        .with_step(
            STEP_STATION,
            WizardStep::new::<StationStepPayload>(station_step),
        )
        .with_step(STEP_DEVICE, WizardStep::new::<DeviceStepPayload>(device_step))
}

// ── Step payloads ────────────────────────────────────────────────────

/// FusionSolar account credentials.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AuthStepPayload {
    pub username: String,
    pub password: String,
}

impl StepPayload for AuthStepPayload {
    fn check(&self) -> Result<(), String> {
        if self.username.is_empty() {
            return Err("username must not be empty".into());
        }
        if self.password.is_empty() {
            return Err("password must not be empty".into());
        }
        Ok(())
    }
}

/// Station selected by the operator.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StationStepPayload {
    pub station_code: String,
}

impl StepPayload for StationStepPayload {}

/// Device selected by the operator; the station code may ride along or
/// fall back to the one recorded in the session.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeviceStepPayload {
    #[serde(default)]
    pub station_code: Option<String>,
    pub device_id: String,
}

impl StepPayload for DeviceStepPayload {}

// ── Handlers ─────────────────────────────────────────────────────────

fn auth_step(
    ctx: StepContext<'_>,
) -> BoxFuture<'_, Result<WizardHandlerResult, WizardError>> {
    Box::pin(async move {
        let input: AuthStepPayload = decode(&ctx.payload)?;

        let credentials = Credentials {
            username: input.username.clone(),
            password: SecretString::from(input.password.clone()),
        };
        let adapter = ctx
            .factory
            .create(Vendor::Huawei, credentials, &input.username, None)?;

        let stations = adapter.stations().await?;

        let options = stations
            .iter()
            .map(|station| SelectOption {
                value: Value::String(station.code.clone()),
                label: station.name.clone(),
            })
            .collect();

        Ok(WizardHandlerResult::advance(STEP_STATION)
            .with_options("stations", options)
            .with_session_update(
                "credentials",
                json!({ "username": input.username, "password": input.password }),
            ))
    })
}

fn station_step(
    ctx: StepContext<'_>,
) -> BoxFuture<'_, Result<WizardHandlerResult, WizardError>> {
    Box::pin(async move {
        let input: StationStepPayload = decode(&ctx.payload)?;

        let adapter = adapter_from_session(ctx.factory, ctx.session_data)?;
        let devices = adapter.devices(&input.station_code).await?;

        let options = devices
            .iter()
            .map(|device| SelectOption {
                value: Value::String(device.id.clone()),
                label: device.name.clone(),
            })
            .collect();

        Ok(WizardHandlerResult::advance(STEP_DEVICE)
            .with_options("devices", options)
            .with_session_update("station_code", Value::String(input.station_code.clone()))
            .with_context("station_code", Value::String(input.station_code)))
    })
}

fn device_step(
    ctx: StepContext<'_>,
) -> BoxFuture<'_, Result<WizardHandlerResult, WizardError>> {
    Box::pin(async move {
        let input: DeviceStepPayload = decode(&ctx.payload)?;

        if !ctx.session_data.contains_key("credentials") {
            return Err(missing_state("missing FusionSolar credentials in wizard session"));
        }

        let station_code = input
            .station_code
            .or_else(|| {
                ctx.session_data
                    .get("station_code")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            })
            .ok_or_else(|| missing_state("missing station_code in wizard session"))?;

        let final_config = json!({
            "station_code": station_code,
            "device_id": input.device_id,
            "max_power_kw": 20.0,
            "min_power_kw": 0.0,
        });

        Ok(WizardHandlerResult::complete(final_config)
            .with_session_update("device_id", Value::String(input.device_id.clone()))
            .with_context("device_id", Value::String(input.device_id)))
    })
}

// ── Session helpers ──────────────────────────────────────────────────

/// Recover the cached adapter from credentials stashed by the auth step.
fn adapter_from_session(
    factory: &AdapterFactory,
    session_data: &Map<String, Value>,
) -> Result<Arc<dyn ProviderAdapter>, WizardError> {
    let credentials = session_data
        .get("credentials")
        .and_then(Value::as_object)
        .ok_or_else(|| missing_state("missing FusionSolar credentials in wizard session"))?;

    let username = credentials
        .get("username")
        .and_then(Value::as_str)
        .filter(|username| !username.is_empty())
        .ok_or_else(|| missing_state("missing username in wizard session credentials"))?;
    let password = credentials
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let overrides = session_data
        .get("adapter_overrides")
        .map(|value| serde_json::from_value::<AdapterOverrides>(value.clone()))
        .transpose()
        .map_err(|e| missing_state(format!("invalid adapter overrides in wizard session: {e}")))?;

    factory
        .create(
            Vendor::Huawei,
            Credentials {
                username: username.to_owned(),
                password: SecretString::from(password.to_string()),
            },
            username,
            overrides.as_ref(),
        )
        .map_err(WizardError::from)
}

fn missing_state(message: impl Into<String>) -> WizardError {
    WizardError::SessionState {
        message: message.into(),
        details: Value::Null,
    }
}
