// Huawei FusionSolar northbound API client.
//
// Cookie-based session auth with a fixed validity window, plus the
// discovery and live-measurement endpoints the onboarding wizard and
// polling layers consume.

pub mod client;
pub mod types;

pub use client::FusionSolarClient;
pub use types::{Credentials, Station, StationDevice};
