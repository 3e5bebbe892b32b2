// ── Vendor identity and classification ──
//
// `Vendor` is the universal key: registry lookups, adapter cache keys,
// and wizard sessions are all addressed by it. Classification enums
// describe what a provider measures and how it is reached.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An external data-source integration: a remote monitoring API or a
/// physical sensor type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Vendor {
    Huawei,
    Goodwe,
    Dht22,
    Bme280,
    Bh1750,
}

impl Vendor {
    pub const ALL: [Self; 5] = [
        Self::Huawei,
        Self::Goodwe,
        Self::Dht22,
        Self::Bme280,
        Self::Bh1750,
    ];
}

/// How a provider is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Remote vendor API over the network.
    Api,
    /// Physical sensor attached to local hardware.
    Sensor,
}

/// What a provider measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Power,
    Temperature,
    Light,
}

/// Unit of the measured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    Kilowatt,
    Celsius,
    Lux,
}

/// Sensor hardware families, for vendors that refer to local hardware
/// rather than a remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SensorType {
    Dht22,
    Bme280,
    Bh1750,
}

impl Vendor {
    /// The sensor hardware family, if this vendor is a physical sensor.
    pub fn sensor_type(self) -> Option<SensorType> {
        match self {
            Self::Dht22 => Some(SensorType::Dht22),
            Self::Bme280 => Some(SensorType::Bme280),
            Self::Bh1750 => Some(SensorType::Bh1750),
            Self::Huawei | Self::Goodwe => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn vendor_strings_round_trip() {
        for vendor in Vendor::ALL {
            let parsed = Vendor::from_str(&vendor.to_string()).unwrap();
            assert_eq!(parsed, vendor);
        }
    }

    #[test]
    fn only_hardware_vendors_resolve_a_sensor_type() {
        assert_eq!(Vendor::Dht22.sensor_type(), Some(SensorType::Dht22));
        assert_eq!(Vendor::Bh1750.sensor_type(), Some(SensorType::Bh1750));
        assert_eq!(Vendor::Huawei.sensor_type(), None);
        assert_eq!(Vendor::Goodwe.sensor_type(), None);
    }

    #[test]
    fn vendor_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Vendor::Huawei).unwrap(),
            serde_json::json!("huawei")
        );
    }
}
