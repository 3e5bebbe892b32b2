// ── Runtime provider settings ──
//
// Tuning for the builtin provider table and the wizard session store.
// Plain data the embedding server constructs -- this crate never reads
// config files or the environment.

use std::time::Duration;

use url::Url;

/// Settings consumed by [`Registry::builtin`](crate::Registry::builtin)
/// and [`WizardSessionStore`](crate::WizardSessionStore).
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// FusionSolar northbound API root.
    pub huawei_base_url: Url,
    /// Per-attempt request timeout for FusionSolar calls.
    pub huawei_timeout: Duration,
    /// Attempt budget for FusionSolar calls (minimum 1).
    pub huawei_max_attempts: u32,
    /// Maximum idle lifetime of a wizard session.
    pub session_ttl: Duration,
    /// Hard cap on concurrently stored wizard sessions.
    pub max_sessions: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            huawei_base_url: "https://eu5.fusionsolar.huawei.com/thirdData"
                .parse()
                .expect("builtin FusionSolar URL is valid"),
            huawei_timeout: Duration::from_secs(10),
            huawei_max_attempts: 3,
            session_ttl: Duration::from_secs(600),
            max_sessions: 512,
        }
    }
}
