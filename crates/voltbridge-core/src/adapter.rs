// ── Vendor capability surface ──
//
// One polymorphic trait per-vendor clients implement; the factory hands
// out `Arc<dyn ProviderAdapter>` so callers never branch on concrete
// types. Methods return boxed futures to stay object-safe.

use futures_util::future::BoxFuture;
use voltbridge_api::{FusionSolarClient, Station, StationDevice};

use crate::error::ProviderError;
use crate::vendor::Vendor;

/// The capability surface every vendor adapter offers: connect,
/// discover stations and devices, read one live value.
pub trait ProviderAdapter: Send + Sync {
    /// The vendor this adapter talks to.
    fn vendor(&self) -> Vendor;

    /// Verify credentials / establish a session eagerly.
    fn connect(&self) -> BoxFuture<'_, Result<(), ProviderError>>;

    /// List the stations visible to the configured account.
    fn stations(&self) -> BoxFuture<'_, Result<Vec<Station>, ProviderError>>;

    /// List the devices attached to one station.
    fn devices<'a>(
        &'a self,
        station_code: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StationDevice>, ProviderError>>;

    /// Read the live measurement for one device.
    fn current_power<'a>(
        &'a self,
        device_id: &'a str,
        dev_type_id: i64,
    ) -> BoxFuture<'a, Result<f64, ProviderError>>;
}

impl ProviderAdapter for FusionSolarClient {
    fn vendor(&self) -> Vendor {
        Vendor::Huawei
    }

    fn connect(&self) -> BoxFuture<'_, Result<(), ProviderError>> {
        Box::pin(async move { self.connect().await.map_err(ProviderError::from) })
    }

    fn stations(&self) -> BoxFuture<'_, Result<Vec<Station>, ProviderError>> {
        Box::pin(async move { self.list_stations().await.map_err(ProviderError::from) })
    }

    fn devices<'a>(
        &'a self,
        station_code: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StationDevice>, ProviderError>> {
        Box::pin(async move {
            self.list_devices(station_code)
                .await
                .map_err(ProviderError::from)
        })
    }

    fn current_power<'a>(
        &'a self,
        device_id: &'a str,
        dev_type_id: i64,
    ) -> BoxFuture<'a, Result<f64, ProviderError>> {
        Box::pin(async move {
            self.current_power(device_id, dev_type_id)
                .await
                .map_err(ProviderError::from)
        })
    }
}
