//! Axum-based HTTP server for the layout control API.
//!
//! All action routes live under `/v1` and are guarded by the access
//! controller via a middleware layer; `POST /register` is the one
//! unauthenticated route (it validates its own handshake token).
//!
//! Engines and trains share one route table, mounted twice with the scope
//! injected as an extension; switches, accessories, and routes each get
//! their own smaller table. Responses use the [`ApiResponse`] envelope;
//! errors short-circuit through [`Error`]'s `IntoResponse` with the status
//! classification from the error taxonomy.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::auth::{Authenticator, ClientRegistry};
use crate::config::Config;
use crate::dialect::SpeedValue;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::intents::{
    AccessoryAction, AuxOption, BellOption, HornOption, MovableAction, OnOffOption, RouteAction,
    SmokeOption, SwitchAction,
};
use crate::layout::{CommandSink, ComponentState, LayoutState};
use crate::scope::CommandScope;
use crate::translator::TranslatorOptions;

use super::api::{ApiResponse, CommandResponse, RegistrationResponse};

// ============================================================================
// Shared State
// ============================================================================

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Validated-intent dispatcher.
    pub dispatcher: Dispatcher,
    /// Access controller.
    pub authenticator: Authenticator,
}

impl AppState {
    /// Wire up the service from configuration and the layout collaborators.
    pub fn new(
        config: &Config,
        layout: Arc<dyn LayoutState>,
        sink: Arc<dyn CommandSink>,
    ) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let options = TranslatorOptions::default().clamp_speed(config.clamp_speed);
        AppState {
            dispatcher: Dispatcher::new(layout, sink, options),
            authenticator: Authenticator::new(config.auth.clone(), registry),
        }
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

fn default_intensity() -> u8 {
    10
}

#[derive(Debug, Deserialize)]
struct SpeedFlags {
    #[serde(default)]
    immediate: bool,
    #[serde(default)]
    dialog: bool,
}

#[derive(Debug, Deserialize)]
struct DialogFlag {
    #[serde(default)]
    dialog: bool,
}

#[derive(Debug, Deserialize)]
struct BellQuery {
    #[serde(default)]
    option: BellOption,
}

#[derive(Debug, Deserialize)]
struct HornQuery {
    #[serde(default)]
    option: HornOption,
    #[serde(default = "default_intensity")]
    intensity: u8,
}

#[derive(Debug, Deserialize)]
struct SmokeQuery {
    level: SmokeOption,
}

#[derive(Debug, Deserialize)]
struct HoldFlag {
    #[serde(default)]
    hold: bool,
}

#[derive(Debug, Deserialize)]
struct NumericQuery {
    number: u8,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AuxQuery {
    option: AuxOption,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PulseQuery {
    state: OnOffOption,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PowerQuery {
    state: OnOffOption,
}

#[derive(Debug, Deserialize)]
struct DurationQuery {
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RelativeSpeedQuery {
    speed: i8,
    #[serde(default)]
    duration: Option<f64>,
}

// ============================================================================
// Auth Middleware
// ============================================================================

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Reject the request before it reaches a handler unless the credential
/// validates.
async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let credential = bearer_token(request.headers()).unwrap_or_default();
    match state.authenticator.authenticate(credential) {
        Ok(_) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

type CommandResult = Result<Json<ApiResponse<CommandResponse>>>;

fn dispatched(confirmation: String) -> CommandResult {
    Ok(Json(ApiResponse::ok(CommandResponse::accepted(
        confirmation,
    ))))
}

/// GET `/v1/{scope}/:id` - component state, read fresh from the layout
async fn get_component(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
) -> Result<Json<ApiResponse<ComponentState>>> {
    let component = state.dispatcher.component_state(scope, id)?;
    Ok(Json(ApiResponse::ok(component)))
}

/// POST `/v1/{engine|train}/:id/speed/:speed` - numeric step or preset name
async fn set_speed(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path((id, speed)): Path<(u16, String)>,
    Query(flags): Query<SpeedFlags>,
) -> CommandResult {
    let value = SpeedValue::parse(&speed)?;
    dispatched(state.dispatcher.movable(
        scope,
        id,
        MovableAction::Speed {
            value,
            immediate: flags.immediate,
            dialog: flags.dialog,
        },
    )?)
}

/// POST `/v1/{engine|train}/:id/startup`
async fn startup(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
    Query(flag): Query<DialogFlag>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::Startup { dialog: flag.dialog })?,
    )
}

/// POST `/v1/{engine|train}/:id/shutdown`
async fn shutdown(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
    Query(flag): Query<DialogFlag>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::Shutdown { dialog: flag.dialog })?,
    )
}

/// POST `/v1/{engine|train}/:id/stop`
async fn stop(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
) -> CommandResult {
    dispatched(state.dispatcher.movable(scope, id, MovableAction::Stop)?)
}

/// POST `/v1/{engine|train}/:id/forward`
async fn forward(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
) -> CommandResult {
    dispatched(state.dispatcher.movable(scope, id, MovableAction::Forward)?)
}

/// POST `/v1/{engine|train}/:id/reverse`
async fn reverse(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
) -> CommandResult {
    dispatched(state.dispatcher.movable(scope, id, MovableAction::Reverse)?)
}

/// POST `/v1/{engine|train}/:id/toggle_direction`
async fn toggle_direction(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::ToggleDirection)?,
    )
}

/// POST `/v1/{engine|train}/:id/bell`
async fn bell(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
    Query(query): Query<BellQuery>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::Bell(query.option))?,
    )
}

/// POST `/v1/{engine|train}/:id/horn`
async fn horn(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
    Query(query): Query<HornQuery>,
) -> CommandResult {
    dispatched(state.dispatcher.movable(
        scope,
        id,
        MovableAction::Horn {
            option: query.option,
            intensity: query.intensity,
        },
    )?)
}

/// POST `/v1/{engine|train}/:id/smoke`
async fn smoke(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
    Query(query): Query<SmokeQuery>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::Smoke(query.level))?,
    )
}

/// POST `/v1/{engine|train}/:id/front_coupler`
async fn front_coupler(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::FrontCoupler)?,
    )
}

/// POST `/v1/{engine|train}/:id/rear_coupler`
async fn rear_coupler(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::RearCoupler)?,
    )
}

/// POST `/v1/{engine|train}/:id/volume_up`
async fn volume_up(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
) -> CommandResult {
    dispatched(state.dispatcher.movable(scope, id, MovableAction::VolumeUp)?)
}

/// POST `/v1/{engine|train}/:id/volume_down`
async fn volume_down(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::VolumeDown)?,
    )
}

/// POST `/v1/{engine|train}/:id/reset` - `hold=true` is the refuel gesture
async fn reset(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
    Query(flag): Query<HoldFlag>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::Reset { hold: flag.hold })?,
    )
}

/// POST `/v1/{engine|train}/:id/numeric`
async fn numeric(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
    Query(query): Query<NumericQuery>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::Numeric(query.number))?,
    )
}

/// POST `/v1/{engine|train}/:id/aux`
async fn movable_aux(
    State(state): State<AppState>,
    Extension(scope): Extension<CommandScope>,
    Path(id): Path<u16>,
    Query(query): Query<AuxQuery>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .movable(scope, id, MovableAction::Aux(query.option))?,
    )
}

/// POST `/v1/accessory/:id/pulse`
async fn accessory_pulse(
    State(state): State<AppState>,
    Path(id): Path<u16>,
    Query(query): Query<PulseQuery>,
) -> CommandResult {
    dispatched(state.dispatcher.accessory(
        id,
        AccessoryAction::Pulse {
            state: query.state,
            duration: query.duration,
        },
    )?)
}

/// POST `/v1/accessory/:id/power`
async fn accessory_power(
    State(state): State<AppState>,
    Path(id): Path<u16>,
    Query(query): Query<PowerQuery>,
) -> CommandResult {
    dispatched(
        state
            .dispatcher
            .accessory(id, AccessoryAction::Power { state: query.state })?,
    )
}

/// POST `/v1/accessory/:id/boost`
async fn accessory_boost(
    State(state): State<AppState>,
    Path(id): Path<u16>,
    Query(query): Query<DurationQuery>,
) -> CommandResult {
    dispatched(state.dispatcher.accessory(
        id,
        AccessoryAction::Boost {
            duration: query.duration,
        },
    )?)
}

/// POST `/v1/accessory/:id/brake`
async fn accessory_brake(
    State(state): State<AppState>,
    Path(id): Path<u16>,
    Query(query): Query<DurationQuery>,
) -> CommandResult {
    dispatched(state.dispatcher.accessory(
        id,
        AccessoryAction::Brake {
            duration: query.duration,
        },
    )?)
}

/// POST `/v1/accessory/:id/front_coupler`
async fn accessory_front_coupler(
    State(state): State<AppState>,
    Path(id): Path<u16>,
    Query(query): Query<DurationQuery>,
) -> CommandResult {
    dispatched(state.dispatcher.accessory(
        id,
        AccessoryAction::FrontCoupler {
            duration: query.duration,
        },
    )?)
}

/// POST `/v1/accessory/:id/rear_coupler`
async fn accessory_rear_coupler(
    State(state): State<AppState>,
    Path(id): Path<u16>,
    Query(query): Query<DurationQuery>,
) -> CommandResult {
    dispatched(state.dispatcher.accessory(
        id,
        AccessoryAction::RearCoupler {
            duration: query.duration,
        },
    )?)
}

/// POST `/v1/accessory/:id/numeric`
async fn accessory_numeric(
    State(state): State<AppState>,
    Path(id): Path<u16>,
    Query(query): Query<NumericQuery>,
) -> CommandResult {
    dispatched(state.dispatcher.accessory(
        id,
        AccessoryAction::Numeric {
            number: query.number,
            duration: query.duration,
        },
    )?)
}

/// POST `/v1/accessory/:id/relative_speed`
async fn accessory_relative_speed(
    State(state): State<AppState>,
    Path(id): Path<u16>,
    Query(query): Query<RelativeSpeedQuery>,
) -> CommandResult {
    dispatched(state.dispatcher.accessory(
        id,
        AccessoryAction::RelativeSpeed {
            speed: query.speed,
            duration: query.duration,
        },
    )?)
}

/// POST `/v1/accessory/:id/aux`
async fn accessory_aux(
    State(state): State<AppState>,
    Path(id): Path<u16>,
    Query(query): Query<AuxQuery>,
) -> CommandResult {
    dispatched(state.dispatcher.accessory(
        id,
        AccessoryAction::Aux {
            option: query.option,
            duration: query.duration,
        },
    )?)
}

/// POST `/v1/switch/:id/thru`
async fn switch_thru(State(state): State<AppState>, Path(id): Path<u16>) -> CommandResult {
    dispatched(state.dispatcher.switch(id, SwitchAction::Thru)?)
}

/// POST `/v1/switch/:id/out`
async fn switch_out(State(state): State<AppState>, Path(id): Path<u16>) -> CommandResult {
    dispatched(state.dispatcher.switch(id, SwitchAction::Out)?)
}

/// POST `/v1/route/:id/fire`
async fn route_fire(State(state): State<AppState>, Path(id): Path<u16>) -> CommandResult {
    dispatched(state.dispatcher.route(id, RouteAction::Fire)?)
}

/// GET or POST `/v1/system/halt` - emergency halt
async fn system_halt(State(state): State<AppState>) -> CommandResult {
    dispatched(state.dispatcher.halt()?)
}

/// POST `/v1/system/stop` - stop every engine and train
async fn system_stop(State(state): State<AppState>) -> CommandResult {
    dispatched(state.dispatcher.stop_all()?)
}

/// POST `/register` - registration handshake, unauthenticated
async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<RegistrationResponse>>> {
    let handshake =
        bearer_token(&headers).ok_or_else(|| Error::unauthorized("missing credential"))?;
    let registration = state.authenticator.register(handshake)?;
    Ok(Json(ApiResponse::ok(RegistrationResponse {
        guid: registration.guid,
        token: registration.token,
    })))
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Router
// ============================================================================

fn movable_routes(scope: CommandScope) -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_component))
        .route("/:id/speed/:speed", post(set_speed))
        .route("/:id/startup", post(startup))
        .route("/:id/shutdown", post(shutdown))
        .route("/:id/stop", post(stop))
        .route("/:id/forward", post(forward))
        .route("/:id/reverse", post(reverse))
        .route("/:id/toggle_direction", post(toggle_direction))
        .route("/:id/bell", post(bell))
        .route("/:id/horn", post(horn))
        .route("/:id/smoke", post(smoke))
        .route("/:id/front_coupler", post(front_coupler))
        .route("/:id/rear_coupler", post(rear_coupler))
        .route("/:id/volume_up", post(volume_up))
        .route("/:id/volume_down", post(volume_down))
        .route("/:id/reset", post(reset))
        .route("/:id/numeric", post(numeric))
        .route("/:id/aux", post(movable_aux))
        .layer(Extension(scope))
}

fn accessory_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_component))
        .route("/:id/pulse", post(accessory_pulse))
        .route("/:id/power", post(accessory_power))
        .route("/:id/boost", post(accessory_boost))
        .route("/:id/brake", post(accessory_brake))
        .route("/:id/front_coupler", post(accessory_front_coupler))
        .route("/:id/rear_coupler", post(accessory_rear_coupler))
        .route("/:id/numeric", post(accessory_numeric))
        .route("/:id/relative_speed", post(accessory_relative_speed))
        .route("/:id/aux", post(accessory_aux))
        .layer(Extension(CommandScope::Accessory))
}

fn switch_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_component))
        .route("/:id/thru", post(switch_thru))
        .route("/:id/out", post(switch_out))
        .layer(Extension(CommandScope::Switch))
}

fn route_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_component))
        .route("/:id/fire", post(route_fire))
        .layer(Extension(CommandScope::Route))
}

/// Build the Axum router with all routes
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/system/halt", get(system_halt).post(system_halt))
        .route("/system/stop", post(system_stop))
        .nest("/engine", movable_routes(CommandScope::Engine))
        .nest("/train", movable_routes(CommandScope::Train))
        .nest("/accessory", accessory_routes())
        .nest("/switch", switch_routes())
        .nest("/route", route_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .nest("/v1", v1)
        .route("/register", post(register))
        .fallback(not_found)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Start the web server
///
/// This function blocks until the server is shut down.
pub async fn run_server(
    config: &Config,
    layout: Arc<dyn LayoutState>,
    sink: Arc<dyn CommandSink>,
) -> std::io::Result<()> {
    let state = AppState::new(config, layout, sink);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.web.bind_addr()).await?;
    info!(addr = %config.web.bind_addr(), "web server listening");

    axum::serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn missing_or_malformed_authorization() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def"));
        assert_eq!(bearer_token(&headers), None);
    }
}
