use crate::adapters::SystemTimeProvider;
use crate::config;
use crate::error::{ConfigurationError, NotFoundError, ValidationError};
use crate::ports;
use crate::push as push_service;
use crate::state;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::get;
use axum::routing::post;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

mod notifications;
mod subscriptions;

/// Builds the relay router with the production Web Push sender.
///
/// Fails when the VAPID signing material is missing or inconsistent; the
/// relay does not serve push endpoints it cannot authenticate.
pub fn app(config: config::AppConfig) -> Result<Router, ConfigurationError> {
    let (vapid, sender) = push_service::init_sender(&config)?;
    let state = state::AppState::new(&config, &vapid.public_key, sender, SystemTimeProvider);
    Ok(router(state, &config))
}

pub fn router<S, T>(state: state::AppState<S, T>, config: &config::AppConfig) -> Router
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    Router::new()
        .route(
            "/subscriptions",
            post(subscriptions::subscribe::<S, T>).delete(subscriptions::unsubscribe::<S, T>),
        )
        .route(
            "/subscriptions/count",
            get(subscriptions::subscription_count::<S, T>),
        )
        .route(
            "/notifications/broadcast",
            post(notifications::broadcast::<S, T>),
        )
        .route("/notifications/send", post(notifications::send::<S, T>))
        .route(
            "/notifications/vapid-public-key",
            get(notifications::vapid_public_key::<S, T>),
        )
        .route("/health", get(health::<S, T>))
        .with_state(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(origin = %origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) subscribers: usize,
}

pub(crate) async fn health<S, T>(State(state): State<state::AppState<S, T>>) -> Json<HealthResponse>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    Json(HealthResponse {
        status: "ok",
        subscribers: state.registry.count(),
    })
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

pub(crate) fn bad_request(err: ValidationError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, err)
}

pub(crate) fn not_found(err: NotFoundError) -> ApiError {
    api_error(StatusCode::NOT_FOUND, err)
}

pub(crate) fn read_json<R>(body: Result<Json<R>, JsonRejection>) -> Result<R, ApiError> {
    match body {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => Err(bad_request(ValidationError::InvalidBody(
            rejection.body_text(),
        ))),
    }
}
