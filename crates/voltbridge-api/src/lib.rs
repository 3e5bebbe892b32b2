// voltbridge-api: Async Rust clients for energy-monitoring vendor APIs.

pub mod error;
pub mod fusionsolar;
pub mod transport;

pub use error::Error;
pub use fusionsolar::{Credentials, FusionSolarClient, Station, StationDevice};
pub use transport::{Transport, TransportConfig};
