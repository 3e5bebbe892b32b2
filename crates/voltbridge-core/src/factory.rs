// ── Caching adapter factory ──
//
// Resolves registry metadata into live adapter instances, one per
// (vendor, cache key) pair. Construction is cheap and network-free
// (login is lazy), so the cache lock is held across the check-then-create
// sequence and the same key can never race two instances into existence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};
use voltbridge_api::Credentials;

use crate::adapter::ProviderAdapter;
use crate::error::ProviderError;
use crate::registry::{AdapterOverrides, Registry};
use crate::vendor::Vendor;

type CacheKey = (Vendor, String);

/// Creates and caches provider adapters based on registry metadata.
///
/// Explicitly constructed and lifetime-scoped: one instance per server
/// process, handed by reference to whoever needs adapters.
pub struct AdapterFactory {
    registry: Arc<Registry>,
    cache: Mutex<HashMap<CacheKey, Arc<dyn ProviderAdapter>>>,
}

impl AdapterFactory {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The registry this factory resolves against.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Create or return the cached adapter for `(vendor, cache_key)`.
    ///
    /// `cache_key` scopes the adapter's lifetime to one credential set
    /// (e.g. the account username). Fails with
    /// [`ProviderError::NotSupported`] when the vendor has no definition
    /// or no adapter implementation.
    pub fn create(
        &self,
        vendor: Vendor,
        credentials: Credentials,
        cache_key: &str,
        overrides: Option<&AdapterOverrides>,
    ) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
        let mut cache = self.cache.lock().expect("adapter cache lock poisoned");

        let cache_id = (vendor, cache_key.to_owned());
        if let Some(adapter) = cache.get(&cache_id) {
            debug!(vendor = %vendor, cache_key, "using cached provider adapter");
            return Ok(Arc::clone(adapter));
        }

        let definition = self
            .registry
            .definition(vendor)
            .ok_or(ProviderError::NotSupported { vendor })?;
        let spec = definition
            .adapter
            .as_ref()
            .ok_or(ProviderError::NotSupported { vendor })?;

        let settings = spec.settings.merged(overrides);

        info!(
            vendor = %vendor,
            adapter = ?spec.kind,
            cache_key,
            "creating provider adapter"
        );

        let adapter = spec.kind.build(credentials, &settings).inspect_err(|_| {
            // Parameter names only -- never credential values.
            warn!(
                vendor = %vendor,
                adapter = ?spec.kind,
                settings = ?settings,
                credential_fields = ?["username", "password"],
                "failed to instantiate provider adapter"
            );
        })?;

        cache.insert(cache_id, Arc::clone(&adapter));
        Ok(adapter)
    }

    /// Drop every cached adapter unconditionally. Administrative
    /// operation.
    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .expect("adapter cache lock poisoned")
            .clear();
        warn!("provider adapter cache cleared");
    }
}
