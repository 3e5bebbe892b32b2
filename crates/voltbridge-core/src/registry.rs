// ── Static provider registry ──
//
// One immutable definition per vendor: classification, config schema,
// adapter binding, and wizard flow. Built once at startup; read-only
// lookups after that. Absence of a definition is not an error at this
// layer -- callers decide policy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use voltbridge_api::{Credentials, FusionSolarClient, TransportConfig};

use crate::adapter::ProviderAdapter;
use crate::error::ProviderError;
use crate::schema::{ConfigSchema, CredentialsSchema};
use crate::settings::ProviderSettings;
use crate::vendor::{MeasurementUnit, ProviderKind, ProviderType, Vendor};
use crate::wizard::{self, WizardFlow};

/// Constructor settings for a vendor adapter.
///
/// Typed, not a free-form map: each [`AdapterKind`] constructor consumes
/// exactly the fields it understands.
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub base_url: Url,
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl AdapterSettings {
    /// Apply caller overrides on top of these defaults.
    pub fn merged(&self, overrides: Option<&AdapterOverrides>) -> Self {
        let mut merged = self.clone();
        if let Some(overrides) = overrides {
            if let Some(ref base_url) = overrides.base_url {
                merged.base_url = base_url.clone();
            }
            if let Some(timeout_secs) = overrides.timeout_secs {
                merged.timeout = Duration::from_secs_f64(timeout_secs);
            }
            if let Some(max_attempts) = overrides.max_attempts {
                merged.max_attempts = max_attempts;
            }
        }
        merged
    }
}

/// Caller-supplied overrides of [`AdapterSettings`], e.g. stashed in a
/// wizard session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterOverrides {
    #[serde(default)]
    pub base_url: Option<Url>,
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

/// Concrete adapter implementations, dispatched through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    FusionSolar,
}

impl AdapterKind {
    /// Instantiate the concrete client. No network I/O happens here.
    pub(crate) fn build(
        self,
        credentials: Credentials,
        settings: &AdapterSettings,
    ) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
        match self {
            Self::FusionSolar => {
                let config = TransportConfig::new(settings.base_url.clone())
                    .with_timeout(settings.timeout)
                    .with_max_attempts(settings.max_attempts);
                let client = FusionSolarClient::new(credentials, config)?;
                Ok(Arc::new(client))
            }
        }
    }
}

/// The adapter binding of a provider: implementation plus its default
/// constructor settings.
#[derive(Debug, Clone)]
pub struct AdapterSpec {
    pub kind: AdapterKind,
    pub settings: AdapterSettings,
}

/// Immutable metadata for one vendor.
pub struct ProviderDefinition {
    pub label: &'static str,
    pub provider_type: ProviderType,
    pub kind: ProviderKind,
    pub default_unit: MeasurementUnit,
    pub requires_wizard: bool,
    pub config_schema: ConfigSchema,
    pub credentials_schema: Option<CredentialsSchema>,
    pub adapter: Option<AdapterSpec>,
    pub wizard: Option<WizardFlow>,
}

/// Read-only description of one provider, for discovery/listing
/// endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderDescriptor {
    pub vendor: Vendor,
    pub label: &'static str,
    pub provider_type: ProviderType,
    pub kind: ProviderKind,
    pub default_unit: MeasurementUnit,
    pub requires_wizard: bool,
    pub config_schema: Value,
    pub credentials_schema: Option<Value>,
}

/// Static, process-wide provider table. Explicitly constructed so tests
/// can build isolated instances with custom definitions.
pub struct Registry {
    definitions: HashMap<Vendor, ProviderDefinition>,
}

impl Registry {
    /// Build a registry from explicit definitions.
    pub fn new(definitions: HashMap<Vendor, ProviderDefinition>) -> Self {
        Self { definitions }
    }

    /// The builtin production table.
    pub fn builtin(settings: &ProviderSettings) -> Self {
        let mut definitions = HashMap::new();

        definitions.insert(
            Vendor::Huawei,
            ProviderDefinition {
                label: "Huawei FusionSolar",
                provider_type: ProviderType::Api,
                kind: ProviderKind::Power,
                default_unit: MeasurementUnit::Kilowatt,
                requires_wizard: true,
                config_schema: ConfigSchema::Huawei,
                credentials_schema: Some(CredentialsSchema::UsernamePassword),
                adapter: Some(AdapterSpec {
                    kind: AdapterKind::FusionSolar,
                    settings: AdapterSettings {
                        base_url: settings.huawei_base_url.clone(),
                        timeout: settings.huawei_timeout,
                        max_attempts: settings.huawei_max_attempts,
                    },
                }),
                wizard: Some(wizard::huawei::flow()),
            },
        );

        definitions.insert(
            Vendor::Goodwe,
            ProviderDefinition {
                label: "GoodWe SEMS",
                provider_type: ProviderType::Api,
                kind: ProviderKind::Power,
                default_unit: MeasurementUnit::Kilowatt,
                requires_wizard: false,
                config_schema: ConfigSchema::GoodWe,
                credentials_schema: Some(CredentialsSchema::UsernamePassword),
                adapter: None,
                wizard: None,
            },
        );

        definitions.insert(
            Vendor::Dht22,
            sensor_definition("DHT22 Sensor", ProviderKind::Temperature, MeasurementUnit::Celsius),
        );
        definitions.insert(
            Vendor::Bme280,
            sensor_definition("BME280 Sensor", ProviderKind::Temperature, MeasurementUnit::Celsius),
        );
        definitions.insert(
            Vendor::Bh1750,
            sensor_definition("BH1750 Light Sensor", ProviderKind::Light, MeasurementUnit::Lux),
        );

        Self { definitions }
    }

    /// Look up one vendor's definition.
    pub fn definition(&self, vendor: Vendor) -> Option<&ProviderDefinition> {
        self.definitions.get(&vendor)
    }

    /// Vendors matching a classification, for listing endpoints.
    pub fn vendors_by_type(&self, provider_type: ProviderType) -> Vec<Vendor> {
        let mut vendors: Vec<Vendor> = self
            .definitions
            .iter()
            .filter(|(_, definition)| definition.provider_type == provider_type)
            .map(|(vendor, _)| *vendor)
            .collect();
        vendors.sort_by_key(|vendor| vendor.to_string());
        vendors
    }

    /// Read-only descriptors for every registered provider.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        let mut descriptors: Vec<ProviderDescriptor> = self
            .definitions
            .iter()
            .map(|(vendor, definition)| ProviderDescriptor {
                vendor: *vendor,
                label: definition.label,
                provider_type: definition.provider_type,
                kind: definition.kind,
                default_unit: definition.default_unit,
                requires_wizard: definition.requires_wizard,
                config_schema: definition.config_schema.describe(),
                credentials_schema: definition
                    .credentials_schema
                    .map(CredentialsSchema::describe),
            })
            .collect();
        descriptors.sort_by_key(|descriptor| descriptor.vendor.to_string());
        descriptors
    }
}

fn sensor_definition(
    label: &'static str,
    kind: ProviderKind,
    default_unit: MeasurementUnit,
) -> ProviderDefinition {
    ProviderDefinition {
        label,
        provider_type: ProviderType::Sensor,
        kind,
        default_unit,
        requires_wizard: false,
        config_schema: ConfigSchema::SensorThreshold,
        credentials_schema: None,
        adapter: None,
        wizard: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_every_vendor() {
        let registry = Registry::builtin(&ProviderSettings::default());
        for vendor in Vendor::ALL {
            assert!(registry.definition(vendor).is_some(), "{vendor} missing");
        }
    }

    #[test]
    fn huawei_requires_a_wizard_and_carries_an_adapter() {
        let registry = Registry::builtin(&ProviderSettings::default());
        let definition = registry.definition(Vendor::Huawei).unwrap();

        assert!(definition.requires_wizard);
        assert!(definition.wizard.is_some());
        assert_eq!(
            definition.adapter.as_ref().map(|spec| spec.kind),
            Some(AdapterKind::FusionSolar)
        );
    }

    #[test]
    fn sensors_are_listed_separately_from_apis() {
        let registry = Registry::builtin(&ProviderSettings::default());

        assert_eq!(
            registry.vendors_by_type(ProviderType::Api),
            vec![Vendor::Goodwe, Vendor::Huawei]
        );
        assert_eq!(
            registry.vendors_by_type(ProviderType::Sensor),
            vec![Vendor::Bh1750, Vendor::Bme280, Vendor::Dht22]
        );
    }

    #[test]
    fn descriptors_expose_config_schemas() {
        let registry = Registry::builtin(&ProviderSettings::default());
        let descriptors = registry.descriptors();

        assert_eq!(descriptors.len(), Vendor::ALL.len());
        let huawei = descriptors
            .iter()
            .find(|d| d.vendor == Vendor::Huawei)
            .unwrap();
        assert_eq!(huawei.label, "Huawei FusionSolar");
        assert!(huawei.config_schema.pointer("/properties/station_code").is_some());
        assert!(huawei.credentials_schema.is_some());

        let dht22 = descriptors
            .iter()
            .find(|d| d.vendor == Vendor::Dht22)
            .unwrap();
        assert!(dht22.credentials_schema.is_none());
    }

    #[test]
    fn overrides_merge_field_by_field() {
        let settings = AdapterSettings {
            base_url: "https://example.test/api".parse().unwrap(),
            timeout: Duration::from_secs(10),
            max_attempts: 3,
        };

        let merged = settings.merged(Some(&AdapterOverrides {
            timeout_secs: Some(2.5),
            ..AdapterOverrides::default()
        }));

        assert_eq!(merged.base_url, settings.base_url);
        assert_eq!(merged.timeout, Duration::from_millis(2500));
        assert_eq!(merged.max_attempts, 3);
    }
}
