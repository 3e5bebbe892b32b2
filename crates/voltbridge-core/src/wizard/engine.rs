// ── Wizard engine ──
//
// Drives the step-by-step onboarding state machine. The response
// contract: `step` is the step the operator must fill NOW, `schema` is
// that step's payload schema, `options` are the choices for it. Session
// state is persisted only after a step fully succeeds, so a failed step
// leaves the session exactly as it was and the caller can safely retry.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::error::WizardError;
use crate::factory::AdapterFactory;
use crate::registry::Registry;
use crate::vendor::Vendor;
use crate::wizard::steps::{StepContext, WizardFlow};
use crate::wizard::store::{WizardSession, WizardSessionStore};

/// The response envelope of one wizard step execution.
///
/// Exactly one of `step` (with `schema`/`options`) or `final_config` is
/// meaningful, per `is_complete`.
#[derive(Debug, Clone, Serialize)]
pub struct WizardStepResponse {
    pub vendor: Vendor,
    pub step: Option<String>,
    pub schema: Option<Value>,
    pub options: Map<String, Value>,
    pub context: Map<String, Value>,
    pub is_complete: bool,
    pub final_config: Option<Value>,
}

/// Coordinates wizard execution across the registry, the adapter
/// factory, and the session store.
pub struct WizardEngine {
    registry: Arc<Registry>,
    factory: Arc<AdapterFactory>,
    store: Arc<WizardSessionStore>,
}

impl WizardEngine {
    pub fn new(
        registry: Arc<Registry>,
        factory: Arc<AdapterFactory>,
        store: Arc<WizardSessionStore>,
    ) -> Self {
        Self {
            registry,
            factory,
            store,
        }
    }

    /// The session store backing this engine.
    pub fn store(&self) -> &Arc<WizardSessionStore> {
        &self.store
    }

    /// Execute a single wizard step.
    pub async fn run_step(
        &self,
        vendor: Vendor,
        step_name: &str,
        payload: Value,
        context: Map<String, Value>,
    ) -> Result<WizardStepResponse, WizardError> {
        info!(vendor = %vendor, step = step_name, "wizard step start");

        // Resolve provider + wizard + step.
        let definition = self.registry.definition(vendor).ok_or_else(|| {
            WizardError::NotConfigured(format!("no wizard declared for provider {vendor}"))
        })?;
        let flow = definition.wizard.as_ref().ok_or_else(|| {
            WizardError::NotConfigured(format!("no wizard declared for provider {vendor}"))
        })?;
        let step = flow.step(step_name).ok_or_else(|| {
            WizardError::StepNotFound(format!(
                "step '{step_name}' is not available for provider {vendor}"
            ))
        })?;

        let mut session = self.resolve_session(vendor, &context, flow, step_name)?;

        // Validate the payload against the CURRENT step schema.
        (step.validate)(&payload).map_err(|error| {
            warn!(vendor = %vendor, step = step_name, error, "wizard payload validation failed");
            WizardError::SessionState {
                message: "invalid payload for wizard step".into(),
                details: json!({ "error": error }),
            }
        })?;

        // Execute the step handler.
        let result = (step.handler)(StepContext {
            factory: self.factory.as_ref(),
            payload,
            session_data: &session.session_data,
        })
        .await?;

        // Merge session updates and persist.
        for (key, value) in result.session_updates {
            session.session_data.insert(key, value);
        }
        for (key, value) in result.context {
            session.context.insert(key, value);
        }
        session.context.insert(
            "wizard_session_id".to_owned(),
            Value::String(session.id.clone()),
        );
        session.last_step = Some(step_name.to_owned());
        self.store.persist(session.clone());

        // Completion.
        let is_complete = result.is_complete || result.final_config.is_some();
        if is_complete {
            if result.next_step.is_some() {
                return Err(WizardError::ResultContract(
                    "wizard step cannot report completion while next_step is set".into(),
                ));
            }

            let final_config = result
                .final_config
                .map(|config| definition.config_schema.validate(config))
                .transpose()?;

            info!(vendor = %vendor, step = step_name, "wizard flow complete");

            return Ok(WizardStepResponse {
                vendor,
                step: None,
                schema: None,
                options: Map::new(),
                context: session.context,
                is_complete: true,
                final_config,
            });
        }

        // Resolve the NEXT step -- the one the operator fills now.
        let next_step = result.next_step.ok_or_else(|| {
            WizardError::ResultContract(
                "wizard step must define next_step or set is_complete".into(),
            )
        })?;
        let next = flow.step(&next_step).ok_or_else(|| {
            WizardError::StepNotFound(format!(
                "next step '{next_step}' not found for provider {vendor}"
            ))
        })?;

        info!(vendor = %vendor, step = step_name, next = %next_step, "wizard step completed");

        Ok(WizardStepResponse {
            vendor,
            step: Some(next_step),
            schema: Some((next.schema)()),
            options: result.options,
            context: session.context,
            is_complete: false,
            final_config: None,
        })
    }

    /// Resolve the session for this call: load it by id, or create one
    /// when the caller is starting the flow at its entry step.
    fn resolve_session(
        &self,
        vendor: Vendor,
        context: &Map<String, Value>,
        flow: &WizardFlow,
        step_name: &str,
    ) -> Result<WizardSession, WizardError> {
        let session_id = context
            .get("wizard_session_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());

        let Some(session_id) = session_id else {
            if step_name == flow.entry() {
                return Ok(self.store.create(vendor));
            }
            return Err(WizardError::SessionExpired(
                "wizard_session_id is required for this step".into(),
            ));
        };

        let session = self.store.get(session_id).ok_or_else(|| {
            WizardError::SessionExpired("wizard session has expired, start again".into())
        })?;

        if session.vendor != vendor {
            return Err(WizardError::NotConfigured(
                "wizard session vendor mismatch".into(),
            ));
        }

        Ok(session)
    }
}
