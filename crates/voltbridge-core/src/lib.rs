// voltbridge-core: provider registry, caching adapter factory, and the
// onboarding wizard engine over voltbridge-api vendor clients.

pub mod adapter;
pub mod error;
pub mod factory;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod vendor;
pub mod wizard;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::ProviderAdapter;
pub use error::{ProviderError, WizardError};
pub use factory::AdapterFactory;
pub use registry::{
    AdapterKind, AdapterOverrides, AdapterSettings, AdapterSpec, ProviderDefinition,
    ProviderDescriptor, Registry,
};
pub use schema::{
    ConfigSchema, CredentialsSchema, GoodWeProviderConfig, HuaweiProviderConfig,
    SensorThresholdConfig, UsernamePasswordCredentials,
};
pub use settings::ProviderSettings;
pub use vendor::{MeasurementUnit, ProviderKind, ProviderType, SensorType, Vendor};
pub use wizard::{
    WizardEngine, WizardFlow, WizardHandlerResult, WizardSession, WizardSessionStore, WizardStep,
    WizardStepResponse,
};

// Wire-level types consumers commonly need alongside the core.
pub use voltbridge_api::{Credentials, Station, StationDevice};
