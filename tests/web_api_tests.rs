//! Integration tests for the web API.
//!
//! These tests drive the full router, auth middleware included, against a
//! mock layout.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use trackside::config::{AuthConfig, Config};
use trackside::layout::MockLayout;
use trackside::services::api::{ApiResponse, CommandResponse, RegistrationResponse};
use trackside::services::web::{build_router, AppState};
use trackside::commands::{AccessoryCommand, CommandCode};
use trackside::{CommandScope, ComponentState, Dialect};

const MASTER: &str = "test-master-token";

fn test_config() -> Config {
    Config::default().with_auth(
        AuthConfig::default()
            .with_secret_key("integration-test-key")
            .with_master_token(MASTER)
            .with_server_id("yard-1"),
    )
}

fn create_test_app() -> (axum::Router, Arc<MockLayout>, AppState) {
    let layout = Arc::new(MockLayout::new());
    layout.add_movable(CommandScope::Engine, 12, Dialect::Classic);
    layout.add_movable(CommandScope::Engine, 18, Dialect::Legacy);
    layout.add_movable(CommandScope::Train, 501, Dialect::Legacy);
    layout.add(ComponentState::fixed(CommandScope::Switch, 31));
    layout.add(ComponentState::fixed(CommandScope::Accessory, 8));
    layout.add(ComponentState::fixed(CommandScope::Route, 9));

    let state = AppState::new(&test_config(), layout.clone(), layout.clone());
    let router = build_router(state.clone());
    (router, layout, state)
}

fn authed(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {MASTER}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ============================================================================
// Auth guard
// ============================================================================

#[tokio::test]
async fn unauthenticated_action_is_rejected() {
    let (app, layout, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/engine/12/stop")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(layout.submitted().is_empty());
}

#[tokio::test]
async fn master_token_admits() {
    let (app, layout, _) = create_test_app();

    let response = app
        .oneshot(authed("POST", "/v1/engine/12/stop"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: ApiResponse<CommandResponse> = body_json(response).await;
    assert!(json.success);
    assert!(json.data.unwrap().accepted);
    assert_eq!(layout.submitted().len(), 1);
}

#[tokio::test]
async fn expired_token_gets_its_own_status() {
    let (app, _, _) = create_test_app();

    // Mint a handshake token that is already stale.
    let stale_config = AuthConfig::default()
        .with_secret_key("integration-test-key")
        .with_server_id("yard-1")
        .with_handshake_ttl_secs(-60);
    let stale_auth = trackside::Authenticator::new(
        stale_config,
        Arc::new(trackside::ClientRegistry::new()),
    );
    let stale = stale_auth.issue_handshake_token().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/engine/12/stop")
                .header("Authorization", format!("Bearer {stale}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // 498: expired, distinct from 401 invalid.
    assert_eq!(response.status().as_u16(), 498);
}

// ============================================================================
// Registration handshake
// ============================================================================

#[tokio::test]
async fn registration_mints_and_replays_idempotently() {
    let (app, _, state) = create_test_app();
    let handshake = state.authenticator.issue_handshake_token().unwrap();

    let register = |token: String| {
        Request::builder()
            .method("POST")
            .uri("/register")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    let first = app
        .clone()
        .oneshot(register(handshake.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first: ApiResponse<RegistrationResponse> = body_json(first).await;
    let first = first.data.unwrap();

    let second = app.clone().oneshot(register(handshake)).await.unwrap();
    let second: ApiResponse<RegistrationResponse> = body_json(second).await;
    let second = second.data.unwrap();

    assert_eq!(first.guid, second.guid);
    assert_eq!(first.token, second.token);

    // The minted token now drives the layout.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/engine/12/stop")
                .header("Authorization", format!("Bearer {}", first.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_without_credential_is_rejected() {
    let (app, _, _) = create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Component state
// ============================================================================

#[tokio::test]
async fn get_engine_state() {
    let (app, _, _) = create_test_app();

    let response = app.oneshot(authed("GET", "/v1/engine/12")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: ApiResponse<ComponentState> = body_json(response).await;
    let component = json.data.unwrap();
    assert_eq!(component.id, 12);
    assert_eq!(component.dialect, Some(Dialect::Classic));
}

#[tokio::test]
async fn unknown_component_is_404() {
    let (app, _, _) = create_test_app();
    let response = app.oneshot(authed("GET", "/v1/engine/77")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_range_switch_id_is_400() {
    let (app, layout, _) = create_test_app();
    let response = app
        .oneshot(authed("POST", "/v1/switch/9999/thru"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(layout.submitted().is_empty());
}

// ============================================================================
// Actions
// ============================================================================

#[tokio::test]
async fn classic_speed_rejects_legacy_range() {
    let (app, _, _) = create_test_app();
    let response = app
        .oneshot(authed("POST", "/v1/engine/12/speed/45"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn legacy_speed_preset_by_name() {
    let (app, layout, _) = create_test_app();
    let response = app
        .oneshot(authed("POST", "/v1/engine/18/speed/medium?immediate=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(layout.submitted()[0].data, Some(92));
}

#[tokio::test]
async fn speed_preset_by_sentinel() {
    let (app, layout, _) = create_test_app();
    // 207 is the highball sentinel; Classic highball is step 31.
    let response = app
        .oneshot(authed("POST", "/v1/engine/12/speed/207"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(layout.submitted()[0].data, Some(31));
}

#[tokio::test]
async fn classic_bell_once_rings_plainly() {
    let (app, layout, _) = create_test_app();
    let response = app
        .oneshot(authed("POST", "/v1/engine/12/bell?option=once"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let submitted = layout.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].data, None);
}

#[tokio::test]
async fn legacy_quilling_horn_via_train_route() {
    let (app, layout, _) = create_test_app();
    let response = app
        .oneshot(authed(
            "POST",
            "/v1/train/501/horn?option=quilling&intensity=15",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let submitted = layout.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].data, Some(15));
}

#[tokio::test]
async fn quilling_horn_rejects_intensity_over_15() {
    let (app, _, _) = create_test_app();
    let response = app
        .oneshot(authed(
            "POST",
            "/v1/train/501/horn?option=quilling&intensity=16",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn long_accessory_pulse_splits() {
    let (app, layout, _) = create_test_app();
    let response = app
        .oneshot(authed("POST", "/v1/accessory/8/pulse?state=on&duration=5.0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(layout.submitted().len(), 2);
}

#[tokio::test]
async fn accessory_power_district_on_off() {
    let (app, layout, _) = create_test_app();
    let response = app
        .clone()
        .oneshot(authed("POST", "/v1/accessory/8/power?state=on"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .oneshot(authed("POST", "/v1/accessory/8/power?state=off"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let submitted = layout.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(
        submitted[0].code,
        CommandCode::Accessory(AccessoryCommand::PowerDistrict)
    );
    assert_eq!(submitted[0].data, Some(1));
    assert_eq!(submitted[1].data, Some(0));
    assert_eq!(submitted[0].duration_secs, None);
}

#[tokio::test]
async fn refuel_via_reset_hold() {
    let (app, layout, _) = create_test_app();
    let response = app
        .oneshot(authed("POST", "/v1/engine/18/reset?hold=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(layout.submitted()[0].repeat, 40);
}

#[tokio::test]
async fn switch_and_route_actions() {
    let (app, layout, _) = create_test_app();
    let response = app
        .clone()
        .oneshot(authed("POST", "/v1/switch/31/out"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .oneshot(authed("POST", "/v1/route/9/fire"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(layout.submitted().len(), 2);
}

#[tokio::test]
async fn system_halt_and_stop() {
    let (app, layout, _) = create_test_app();
    let response = app
        .clone()
        .oneshot(authed("GET", "/v1/system/halt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .oneshot(authed("POST", "/v1/system/stop"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // 1 halt + 3 universal stops.
    assert_eq!(layout.submitted().len(), 4);
}

#[tokio::test]
async fn sink_failure_surfaces_as_502() {
    let (app, layout, _) = create_test_app();
    layout.set_fail_submissions(true);
    let response = app
        .oneshot(authed("POST", "/v1/engine/18/forward"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _, _) = create_test_app();
    let response = app.oneshot(authed("GET", "/v1/nonsense")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
