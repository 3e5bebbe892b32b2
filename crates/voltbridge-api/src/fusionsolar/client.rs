// FusionSolar northbound client.
//
// Session lifecycle: `POST login` with `{userName, systemCode}` sets an
// XSRF-TOKEN cookie that must be echoed back as a header on every
// subsequent call. Tokens are valid for a fixed window; the server may
// also end a session unilaterally (HTTP 401 or USER_MUST_RELOGIN), in
// which case exactly one re-login is forced and the call retried once.

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::fusionsolar::types::{Credentials, FusionEnvelope, Station, StationDevice};
use crate::transport::{Transport, TransportConfig};

/// Session tokens are refreshed after this many minutes.
const TOKEN_VALIDITY_MINUTES: i64 = 25;

/// Cookie set by the login endpoint; echoed back as a header.
const XSRF_COOKIE: &str = "XSRF-TOKEN";
const XSRF_HEADER: HeaderName = HeaderName::from_static("xsrf-token");

#[derive(Debug, Default)]
struct AuthState {
    logged_in: bool,
    expires_at: Option<DateTime<Utc>>,
    xsrf: Option<HeaderValue>,
}

impl AuthState {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|t| Utc::now() >= t)
    }

    fn refresh_expiry(&mut self) {
        self.expires_at = Some(Utc::now() + Duration::minutes(TOKEN_VALIDITY_MINUTES));
    }
}

/// Client for the Huawei FusionSolar northbound API.
pub struct FusionSolarClient {
    transport: Transport,
    credentials: Credentials,
    auth: Mutex<AuthState>,
}

impl FusionSolarClient {
    /// Build a client. No network I/O happens here -- login is lazy,
    /// triggered by the first authenticated call.
    pub fn new(credentials: Credentials, config: TransportConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let transport = Transport::new(config.with_cookie_jar(), headers)?;

        Ok(Self {
            transport,
            credentials,
            auth: Mutex::new(AuthState::default()),
        })
    }

    /// Force a login now. Used to verify credentials eagerly.
    pub async fn connect(&self) -> Result<(), Error> {
        let mut auth = self.auth.lock().await;
        self.login_locked(&mut auth).await
    }

    // ── Login handling ───────────────────────────────────────────────

    async fn ensure_login(&self) -> Result<(), Error> {
        let mut auth = self.auth.lock().await;
        if auth.logged_in && !auth.is_expired() {
            return Ok(());
        }
        info!("fusionsolar login required");
        self.login_locked(&mut auth).await
    }

    async fn force_login(&self) -> Result<(), Error> {
        let mut auth = self.auth.lock().await;
        self.login_locked(&mut auth).await
    }

    async fn login_locked(&self, auth: &mut AuthState) -> Result<(), Error> {
        debug!("fusionsolar login start");

        let payload = json!({
            "userName": self.credentials.username,
            "systemCode": self.credentials.password.expose_secret(),
        });

        let response = self
            .transport
            .request(Method::POST, "login", Some(&payload), HeaderMap::new())
            .await?;

        let status = response.status();
        let xsrf = response
            .cookies()
            .find(|c| c.name() == XSRF_COOKIE)
            .map(|c| c.value().to_owned());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AuthFailed {
                status: status.as_u16(),
                body,
            });
        }

        let envelope = Self::parse(response).await?;
        if !envelope.success {
            return Err(Error::AuthRejected {
                message: envelope.message,
                fail_code: envelope.fail_code,
            });
        }

        let Some(token) = xsrf else {
            return Err(Error::TokenMissing);
        };

        auth.xsrf = Some(HeaderValue::from_str(&token).map_err(|_| Error::TokenMissing)?);
        auth.logged_in = true;
        auth.refresh_expiry();

        info!("fusionsolar login successful");
        Ok(())
    }

    // ── Request plumbing ─────────────────────────────────────────────

    async fn send(&self, endpoint: &str, payload: &Value) -> Result<Response, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.auth.lock().await.xsrf.clone() {
            headers.insert(XSRF_HEADER, token);
        }
        self.transport
            .request(Method::POST, endpoint, Some(payload), headers)
            .await
    }

    async fn parse(response: Response) -> Result<FusionEnvelope, Error> {
        let body = response.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Authenticated POST with a single forced re-login on session loss.
    ///
    /// Session loss is signalled either as HTTP 401 or as an
    /// application-level relogin demand in the envelope. Either way the
    /// call is retried exactly once after a fresh login; a second
    /// failure propagates as [`Error::Api`].
    async fn post(&self, endpoint: &str, payload: Value) -> Result<FusionEnvelope, Error> {
        self.ensure_login().await?;

        let mut response = self.send(endpoint, &payload).await?;
        let mut retried = false;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(endpoint, "fusionsolar session rejected (401), forcing re-login");
            self.force_login().await?;
            response = self.send(endpoint, &payload).await?;
            retried = true;
        }

        let mut envelope = Self::parse(response).await?;

        if envelope.must_relogin() && !retried {
            warn!(
                endpoint,
                fail_code = ?envelope.fail_code,
                "fusionsolar demands re-login, retrying once"
            );
            self.force_login().await?;
            let response = self.send(endpoint, &payload).await?;
            envelope = Self::parse(response).await?;
        }

        if !envelope.success {
            return Err(Error::Api {
                message: envelope.message,
                fail_code: envelope.fail_code,
            });
        }

        self.auth.lock().await.refresh_expiry();
        Ok(envelope)
    }

    // ── Discovery ────────────────────────────────────────────────────

    /// List all stations visible to the account.
    ///
    /// `POST getStationList`
    pub async fn list_stations(&self) -> Result<Vec<Station>, Error> {
        debug!("fusionsolar: listing stations");
        let envelope = self.post("getStationList", json!({})).await?;
        let items = match envelope.data {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        items.into_iter().map(Station::from_raw).collect()
    }

    /// List the devices attached to one station.
    ///
    /// `POST getDevList` with `{"stationCodes": station_code}`
    pub async fn list_devices(&self, station_code: &str) -> Result<Vec<StationDevice>, Error> {
        debug!(station_code, "fusionsolar: listing devices");
        let payload = json!({ "stationCodes": station_code });
        let envelope = self.post("getDevList", payload).await?;
        let items = match envelope.data {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        items.into_iter().map(StationDevice::from_raw).collect()
    }

    // ── Measurements ─────────────────────────────────────────────────

    /// Read the live active-power value for one device, in kW.
    ///
    /// `POST getDevRealKpi` with `{"devIds": ..., "devTypeId": ...}`
    pub async fn current_power(&self, device_id: &str, dev_type_id: i64) -> Result<f64, Error> {
        debug!(device_id, dev_type_id, "fusionsolar: reading live power");
        let payload = json!({ "devIds": device_id, "devTypeId": dev_type_id });
        let envelope = self.post("getDevRealKpi", payload).await?;

        envelope
            .data
            .pointer("/0/dataItemMap/active_power")
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::Deserialization {
                message: "getDevRealKpi response missing active_power".into(),
                body: envelope.data.to_string(),
            })
    }
}
