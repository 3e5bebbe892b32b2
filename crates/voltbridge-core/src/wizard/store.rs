// ── In-memory wizard session store ──
//
// Keeps onboarding state between requests. One mutex guards the whole
// map, so create/get/persist/delete are atomic with respect to each
// other. Expiry is lazy (swept on every `get`) plus an optional
// periodic background sweep so idle sessions stay bounded in memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::vendor::Vendor;

/// The accumulated state of one in-progress wizard run.
///
/// A session belongs to exactly one vendor for its entire lifetime.
#[derive(Debug, Clone)]
pub struct WizardSession {
    pub id: String,
    pub vendor: Vendor,
    /// Private state accumulated across steps (e.g. cached credentials).
    pub session_data: Map<String, Value>,
    /// Echoed back to the caller; always carries `wizard_session_id`.
    pub context: Map<String, Value>,
    pub last_step: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Concurrency-safe, time-bounded store of in-flight wizard sessions.
pub struct WizardSessionStore {
    sessions: Mutex<HashMap<String, WizardSession>>,
    ttl: TimeDelta,
    max_sessions: usize,
}

impl WizardSessionStore {
    /// A store evicting sessions idle for longer than `ttl`, holding at
    /// most `max_sessions` at a time.
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Create a fresh session for `vendor` with an unguessable id.
    pub fn create(&self, vendor: Vendor) -> WizardSession {
        let mut sessions = self.lock();

        if sessions.len() >= self.max_sessions {
            if let Some(stalest) = sessions
                .values()
                .min_by_key(|session| session.updated_at)
                .map(|session| session.id.clone())
            {
                warn!(session_id = %stalest, "wizard session store full, evicting stalest session");
                sessions.remove(&stalest);
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let mut context = Map::new();
        context.insert("wizard_session_id".to_owned(), Value::String(id.clone()));

        let session = WizardSession {
            id: id.clone(),
            vendor,
            session_data: Map::new(),
            context,
            last_step: None,
            created_at: now,
            updated_at: now,
        };
        sessions.insert(id, session.clone());
        session
    }

    /// Fetch a session, sweeping expired entries first. A hit refreshes
    /// the idle timer.
    pub fn get(&self, session_id: &str) -> Option<WizardSession> {
        let mut sessions = self.lock();
        Self::sweep_locked(&mut sessions, self.ttl);

        let session = sessions.get_mut(session_id)?;
        session.updated_at = Utc::now();
        Some(session.clone())
    }

    /// Overwrite the stored entry, refreshing the idle timer.
    pub fn persist(&self, mut session: WizardSession) {
        session.updated_at = Utc::now();
        self.lock().insert(session.id.clone(), session);
    }

    /// Remove a session unconditionally.
    pub fn delete(&self, session_id: &str) {
        self.lock().remove(session_id);
    }

    /// Number of stored sessions (expired entries included until swept).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sweep expired sessions now; returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let mut sessions = self.lock();
        Self::sweep_locked(&mut sessions, self.ttl)
    }

    /// Spawn a periodic sweep so idle sessions are evicted even absent
    /// client traffic. Runs until the token is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let swept = store.sweep_expired();
                        if swept > 0 {
                            debug!(swept, "expired wizard sessions removed");
                        }
                    }
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, WizardSession>> {
        self.sessions.lock().expect("wizard session store lock poisoned")
    }

    fn sweep_locked(sessions: &mut HashMap<String, WizardSession>, ttl: TimeDelta) -> usize {
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, session| now - session.updated_at <= ttl);
        before - sessions.len()
    }
}
