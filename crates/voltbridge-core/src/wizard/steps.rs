// ── Wizard step building blocks ──
//
// A step pairs a payload schema with a handler. Handlers are free
// functions of (validated payload, session private data) -> result;
// they are the only place adapter calls occur during a wizard run.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::WizardError;
use crate::factory::AdapterFactory;
use crate::schema::schema_value;

/// A step payload with invariants serde cannot express.
pub trait StepPayload: DeserializeOwned + JsonSchema {
    /// Extra checks applied after deserialization.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Everything a step handler gets to work with.
pub struct StepContext<'a> {
    /// Factory for obtaining (cached) vendor adapters.
    pub factory: &'a AdapterFactory,
    /// The payload, already validated against the step schema.
    pub payload: Value,
    /// The session's accumulated private data.
    pub session_data: &'a Map<String, Value>,
}

/// Handler function: validated payload + session data in, result out.
pub type StepHandler =
    for<'a> fn(StepContext<'a>) -> BoxFuture<'a, Result<WizardHandlerResult, WizardError>>;

/// One option presented to the operator for a selection step.
#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

/// What a step handler returns: either the next step to present (with
/// options), or completion with a final configuration -- never both.
#[derive(Debug, Default)]
pub struct WizardHandlerResult {
    pub next_step: Option<String>,
    pub options: Map<String, Value>,
    pub context: Map<String, Value>,
    pub session_updates: Map<String, Value>,
    pub final_config: Option<Value>,
    pub is_complete: bool,
}

impl WizardHandlerResult {
    /// Advance the flow to `next_step`.
    pub fn advance(next_step: impl Into<String>) -> Self {
        Self {
            next_step: Some(next_step.into()),
            ..Self::default()
        }
    }

    /// Complete the flow with a final configuration.
    pub fn complete(final_config: Value) -> Self {
        Self {
            final_config: Some(final_config),
            is_complete: true,
            ..Self::default()
        }
    }

    pub fn with_options(mut self, key: impl Into<String>, options: Vec<SelectOption>) -> Self {
        self.options.insert(
            key.into(),
            serde_json::to_value(options).unwrap_or(Value::Null),
        );
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_session_update(mut self, key: impl Into<String>, value: Value) -> Self {
        self.session_updates.insert(key.into(), value);
        self
    }
}

/// Definition of a single wizard step: payload schema + handler.
#[derive(Clone, Copy)]
pub struct WizardStep {
    pub(crate) validate: fn(&Value) -> Result<(), String>,
    pub(crate) schema: fn() -> Value,
    pub(crate) handler: StepHandler,
}

impl WizardStep {
    /// Declare a step whose payload deserializes into `P`.
    pub fn new<P: StepPayload>(handler: StepHandler) -> Self {
        Self {
            validate: validate_as::<P>,
            schema: schema_value::<P>,
            handler,
        }
    }
}

fn validate_as<P: StepPayload>(payload: &Value) -> Result<(), String> {
    let parsed: P = serde_json::from_value(payload.clone()).map_err(|e| e.to_string())?;
    parsed.check()
}

/// Decode an already-validated payload inside a handler.
pub fn decode<P: StepPayload>(payload: &Value) -> Result<P, WizardError> {
    let parsed: P = serde_json::from_value(payload.clone()).map_err(|e| {
        WizardError::SessionState {
            message: "invalid payload for wizard step".into(),
            details: json!({ "error": e.to_string() }),
        }
    })?;
    parsed.check().map_err(|error| WizardError::SessionState {
        message: "invalid payload for wizard step".into(),
        details: json!({ "error": error }),
    })?;
    Ok(parsed)
}

/// The ordered graph of named steps a vendor declares for onboarding.
/// No step exists outside this graph.
#[derive(Clone)]
pub struct WizardFlow {
    entry: &'static str,
    steps: HashMap<&'static str, WizardStep>,
}

impl WizardFlow {
    /// A flow whose first step is `entry`.
    pub fn new(entry: &'static str) -> Self {
        Self {
            entry,
            steps: HashMap::new(),
        }
    }

    pub fn with_step(mut self, name: &'static str, step: WizardStep) -> Self {
        self.steps.insert(name, step);
        self
    }

    /// The step a caller may start the flow with.
    pub fn entry(&self) -> &'static str {
        self.entry
    }

    pub fn step(&self, name: &str) -> Option<&WizardStep> {
        self.steps.get(name)
    }
}
