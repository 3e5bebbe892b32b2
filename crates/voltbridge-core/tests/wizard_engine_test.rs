// Integration tests for `WizardEngine`: the full FusionSolar onboarding
// flow against a wiremock controller, plus the engine's session and
// result-contract rules driven through custom step graphs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voltbridge_core::wizard::{StepContext, StepPayload, WizardHandlerResult, WizardStep};
use voltbridge_core::{
    AdapterFactory, ConfigSchema, MeasurementUnit, ProviderDefinition, ProviderKind,
    ProviderSettings, ProviderType, Registry, Vendor, WizardEngine, WizardError, WizardFlow,
    WizardSessionStore,
};

// ── Fixtures ────────────────────────────────────────────────────────

fn engine_for(registry: Registry, session_ttl: Duration) -> WizardEngine {
    let registry = Arc::new(registry);
    let factory = Arc::new(AdapterFactory::new(Arc::clone(&registry)));
    let store = Arc::new(WizardSessionStore::new(session_ttl, 64));
    WizardEngine::new(registry, factory, store)
}

fn builtin_engine(server: &MockServer) -> WizardEngine {
    let settings = ProviderSettings {
        huawei_base_url: server.uri().parse().unwrap(),
        huawei_timeout: Duration::from_secs(2),
        huawei_max_attempts: 1,
        ..ProviderSettings::default()
    };
    engine_for(Registry::builtin(&settings), Duration::from_secs(60))
}

async fn mock_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true }))
                .insert_header("set-cookie", "XSRF-TOKEN=tok-1; Path=/"),
        )
        .mount(server)
        .await;
}

// ── End-to-end onboarding ───────────────────────────────────────────

#[tokio::test]
async fn full_onboarding_run_produces_a_validated_config() {
    let server = MockServer::start().await;
    let engine = builtin_engine(&server);

    mock_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/getStationList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "stationCode": "NE=101", "stationName": "Rooftop Alpha", "capacity": 9.8 },
                { "stationCode": "NE=102", "stationName": "Rooftop Beta" },
            ],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getDevList"))
        .and(body_json(json!({ "stationCodes": "NE=101" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "devId": 7001, "devName": "Inverter-01", "stationCode": "NE=101", "devTypeId": 1 },
            ],
        })))
        .mount(&server)
        .await;

    // Step 1: auth -- no session id yet, one is created for us.
    let auth = engine
        .run_step(
            Vendor::Huawei,
            "auth",
            json!({ "username": "nb-user", "password": "nb-pass" }),
            Map::new(),
        )
        .await
        .unwrap();

    assert!(!auth.is_complete);
    assert_eq!(auth.step.as_deref(), Some("station"));
    assert!(
        auth.schema
            .as_ref()
            .unwrap()
            .pointer("/properties/station_code")
            .is_some()
    );
    assert_eq!(
        auth.options.get("stations"),
        Some(&json!([
            { "value": "NE=101", "label": "Rooftop Alpha" },
            { "value": "NE=102", "label": "Rooftop Beta" },
        ]))
    );
    let session_id = auth
        .context
        .get("wizard_session_id")
        .and_then(Value::as_str)
        .unwrap()
        .to_owned();

    // Step 2: station -- the session id threads through context.
    let station = engine
        .run_step(
            Vendor::Huawei,
            "station",
            json!({ "station_code": "NE=101" }),
            auth.context.clone(),
        )
        .await
        .unwrap();

    assert!(!station.is_complete);
    assert_eq!(station.step.as_deref(), Some("device"));
    assert_eq!(
        station.options.get("devices"),
        Some(&json!([{ "value": "7001", "label": "Inverter-01" }]))
    );
    assert_eq!(station.context.get("station_code"), Some(&json!("NE=101")));
    assert_eq!(
        station.context.get("wizard_session_id"),
        Some(&json!(session_id.clone()))
    );

    // Step 3: device -- completes with a schema-normalized config.
    let device = engine
        .run_step(
            Vendor::Huawei,
            "device",
            json!({ "device_id": "7001" }),
            station.context.clone(),
        )
        .await
        .unwrap();

    assert!(device.is_complete);
    assert!(device.step.is_none());
    assert!(device.schema.is_none());
    assert_eq!(
        device.final_config,
        Some(json!({
            "station_code": "NE=101",
            "device_id": "7001",
            "max_power_kw": 20.0,
            "min_power_kw": 0.0,
        }))
    );
}

#[tokio::test]
async fn invalid_step_payload_is_a_session_state_error() {
    let server = MockServer::start().await;
    let engine = builtin_engine(&server);

    let result = engine
        .run_step(
            Vendor::Huawei,
            "auth",
            json!({ "username": "nb-user" }),
            Map::new(),
        )
        .await;

    match result {
        Err(WizardError::SessionState { .. }) => {}
        other => panic!("expected SessionState, got: {other:?}"),
    }
}

#[tokio::test]
async fn provider_auth_failures_propagate_through_the_engine() {
    let server = MockServer::start().await;
    let engine = builtin_engine(&server);

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "failCode": 20001,
            "message": "user or password invalid",
        })))
        .mount(&server)
        .await;

    let result = engine
        .run_step(
            Vendor::Huawei,
            "auth",
            json!({ "username": "nb-user", "password": "wrong" }),
            Map::new(),
        )
        .await;

    match result {
        Err(WizardError::Provider(ref inner)) => {
            assert_eq!(inner.code(), "HUAWEI_AUTH_REJECTED");
            assert_eq!(inner.status_code(), 401);
        }
        other => panic!("expected Provider error, got: {other:?}"),
    }
}

// ── Session rules ───────────────────────────────────────────────────

#[tokio::test]
async fn only_the_entry_step_may_bootstrap_a_session() {
    let server = MockServer::start().await;
    let engine = builtin_engine(&server);

    let result = engine
        .run_step(
            Vendor::Huawei,
            "station",
            json!({ "station_code": "NE=101" }),
            Map::new(),
        )
        .await;

    assert!(
        matches!(result, Err(WizardError::SessionExpired(_))),
        "{result:?}"
    );
}

#[tokio::test]
async fn a_stale_session_id_is_reported_expired() {
    let server = MockServer::start().await;
    let engine = builtin_engine(&server);

    let mut context = Map::new();
    context.insert("wizard_session_id".into(), json!("no-such-session"));

    let result = engine
        .run_step(
            Vendor::Huawei,
            "station",
            json!({ "station_code": "NE=101" }),
            context,
        )
        .await;

    assert!(
        matches!(result, Err(WizardError::SessionExpired(_))),
        "{result:?}"
    );
}

#[tokio::test]
async fn unknown_steps_and_unconfigured_vendors_are_distinct_errors() {
    let server = MockServer::start().await;
    let engine = builtin_engine(&server);

    let unknown = engine
        .run_step(Vendor::Huawei, "bogus", json!({}), Map::new())
        .await;
    assert!(
        matches!(unknown, Err(WizardError::StepNotFound(_))),
        "{unknown:?}"
    );

    // GoodWe is registered but declares no wizard.
    let unconfigured = engine
        .run_step(Vendor::Goodwe, "auth", json!({}), Map::new())
        .await;
    assert!(
        matches!(unconfigured, Err(WizardError::NotConfigured(_))),
        "{unconfigured:?}"
    );
}

// ── Custom step graphs: result contract and vendor affinity ─────────

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct NoopPayload {}

impl StepPayload for NoopPayload {}

fn contradictory_step(
    _ctx: StepContext<'_>,
) -> BoxFuture<'_, Result<WizardHandlerResult, WizardError>> {
    Box::pin(async move {
        let mut result = WizardHandlerResult::advance("auth");
        result.is_complete = true;
        Ok(result)
    })
}

fn looping_step(
    _ctx: StepContext<'_>,
) -> BoxFuture<'_, Result<WizardHandlerResult, WizardError>> {
    Box::pin(async move { Ok(WizardHandlerResult::advance("auth")) })
}

fn test_definition(flow: WizardFlow) -> ProviderDefinition {
    ProviderDefinition {
        label: "Test Provider",
        provider_type: ProviderType::Api,
        kind: ProviderKind::Power,
        default_unit: MeasurementUnit::Kilowatt,
        requires_wizard: true,
        config_schema: ConfigSchema::Huawei,
        credentials_schema: None,
        adapter: None,
        wizard: Some(flow),
    }
}

#[tokio::test]
async fn completion_with_a_next_step_violates_the_result_contract() {
    let flow = WizardFlow::new("auth")
        .with_step("auth", WizardStep::new::<NoopPayload>(contradictory_step));
    let mut definitions = HashMap::new();
    definitions.insert(Vendor::Huawei, test_definition(flow));

    let engine = engine_for(Registry::new(definitions), Duration::from_secs(60));

    let result = engine
        .run_step(Vendor::Huawei, "auth", json!({}), Map::new())
        .await;

    assert!(
        matches!(result, Err(WizardError::ResultContract(_))),
        "{result:?}"
    );
}

#[tokio::test]
async fn a_session_is_bound_to_its_vendor() {
    let mut definitions = HashMap::new();
    definitions.insert(
        Vendor::Huawei,
        test_definition(
            WizardFlow::new("auth").with_step("auth", WizardStep::new::<NoopPayload>(looping_step)),
        ),
    );
    definitions.insert(
        Vendor::Goodwe,
        test_definition(
            WizardFlow::new("auth").with_step("auth", WizardStep::new::<NoopPayload>(looping_step)),
        ),
    );

    let engine = engine_for(Registry::new(definitions), Duration::from_secs(60));

    let goodwe = engine
        .run_step(Vendor::Goodwe, "auth", json!({}), Map::new())
        .await
        .unwrap();

    // Replay the GoodWe session against the Huawei wizard.
    let result = engine
        .run_step(Vendor::Huawei, "auth", json!({}), goodwe.context.clone())
        .await;

    assert!(
        matches!(result, Err(WizardError::NotConfigured(_))),
        "{result:?}"
    );
}

#[tokio::test]
async fn a_failed_step_leaves_the_session_untouched() {
    let server = MockServer::start().await;
    let engine = builtin_engine(&server);

    mock_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/getStationList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "stationCode": "NE=101", "stationName": "Rooftop Alpha" }],
        })))
        .mount(&server)
        .await;

    let auth = engine
        .run_step(
            Vendor::Huawei,
            "auth",
            json!({ "username": "nb-user", "password": "nb-pass" }),
            Map::new(),
        )
        .await
        .unwrap();
    let session_id = auth
        .context
        .get("wizard_session_id")
        .and_then(Value::as_str)
        .unwrap()
        .to_owned();

    // Device listing fails upstream; the station step must not commit
    // anything to the session.
    Mock::given(method("POST"))
        .and(path("/getDevList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "failCode": 305,
        })))
        .mount(&server)
        .await;

    let failed = engine
        .run_step(
            Vendor::Huawei,
            "station",
            json!({ "station_code": "NE=101" }),
            auth.context.clone(),
        )
        .await;
    assert!(matches!(failed, Err(WizardError::Provider(_))), "{failed:?}");

    let session = engine.store().get(&session_id).unwrap();
    assert_eq!(session.last_step.as_deref(), Some("auth"));
    assert!(!session.session_data.contains_key("station_code"));
}
