// Wizard subsystem: step graph definitions, the session store, and the
// engine that drives the onboarding state machine.

pub mod engine;
pub mod huawei;
pub mod steps;
pub mod store;

pub use engine::{WizardEngine, WizardStepResponse};
pub use steps::{
    SelectOption, StepContext, StepHandler, StepPayload, WizardFlow, WizardHandlerResult,
    WizardStep, decode,
};
pub use store::{WizardSession, WizardSessionStore};
