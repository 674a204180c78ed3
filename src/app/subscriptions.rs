use super::{ApiError, bad_request, not_found, read_json};
use crate::error::{NotFoundError, ValidationError};
use crate::ports;
use crate::registry::Upsert;
use crate::state;
use crate::types::subscription::Subscription;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscribeRequest {
    pub(crate) subscriber_id: Option<String>,
    pub(crate) subscription: Option<Subscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UnsubscribeRequest {
    pub(crate) subscriber_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriptionResponse {
    pub(crate) status: &'static str,
    pub(crate) subscriber_id: String,
}

#[derive(Serialize)]
pub(crate) struct CountResponse {
    pub(crate) count: usize,
}

pub(crate) async fn subscribe<S, T>(
    State(state): State<state::AppState<S, T>>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ApiError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let request = read_json(body)?;
    let subscriber_id = request
        .subscriber_id
        .ok_or(ValidationError::MissingSubscriberId)
        .map_err(bad_request)?;
    let subscription = request
        .subscription
        .ok_or(ValidationError::MissingSubscription)
        .map_err(bad_request)?;

    let upsert = state
        .registry
        .upsert(&subscriber_id, subscription)
        .map_err(bad_request)?;
    info!(
        subscriber_id = %subscriber_id,
        replaced = upsert == Upsert::Replaced,
        subscribers = state.registry.count(),
        "push subscription stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse {
            status: "subscribed",
            subscriber_id,
        }),
    ))
}

pub(crate) async fn unsubscribe<S, T>(
    State(state): State<state::AppState<S, T>>,
    body: Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscriptionResponse>, ApiError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let request = read_json(body)?;
    let subscriber_id = request
        .subscriber_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ValidationError::MissingSubscriberId)
        .map_err(bad_request)?;

    if !state.registry.remove(&subscriber_id) {
        return Err(not_found(NotFoundError::Subscriber(subscriber_id)));
    }
    info!(subscriber_id = %subscriber_id, "push subscription removed");

    Ok(Json(SubscriptionResponse {
        status: "unsubscribed",
        subscriber_id,
    }))
}

pub(crate) async fn subscription_count<S, T>(
    State(state): State<state::AppState<S, T>>,
) -> Json<CountResponse>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    Json(CountResponse {
        count: state.registry.count(),
    })
}
