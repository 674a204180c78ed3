use super::{ApiError, bad_request, not_found, read_json};
use crate::error::ValidationError;
use crate::ports;
use crate::push::adapter;
use crate::state;
use crate::types::delivery::DeliveryResult;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct BroadcastRequest {
    pub(crate) notification: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendRequest {
    pub(crate) subscriber_id: Option<String>,
    pub(crate) notification: Option<Value>,
}

#[derive(Serialize)]
pub(crate) struct BroadcastAccepted {
    pub(crate) status: &'static str,
    pub(crate) recipients: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendResponse {
    pub(crate) subscriber_id: String,
    pub(crate) result: DeliveryResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

/// Queues a broadcast and answers before any delivery has happened.
pub(crate) async fn broadcast<S, T>(
    State(state): State<state::AppState<S, T>>,
    body: Result<Json<BroadcastRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BroadcastAccepted>), ApiError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let request = read_json(body)?;
    let payload = adapter::payload_from_raw(request.notification).map_err(bad_request)?;
    let recipients = state.registry.count();
    info!(
        recipients,
        title = payload.title.as_deref().unwrap_or_default(),
        "broadcast accepted"
    );
    drop(state.push.spawn(payload));

    Ok((
        StatusCode::ACCEPTED,
        Json(BroadcastAccepted {
            status: "accepted",
            recipients,
        }),
    ))
}

/// Delivers to one subscriber and reports the outcome synchronously.
pub(crate) async fn send<S, T>(
    State(state): State<state::AppState<S, T>>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, ApiError>
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
    let payload = adapter::payload_from_raw(request.notification).map_err(bad_request)?;

    let outcome = state
        .push
        .deliver_to(&subscriber_id, &payload)
        .await
        .map_err(not_found)?;

    Ok(Json(SendResponse {
        subscriber_id: outcome.subscriber_id,
        result: outcome.result,
        status_code: outcome.status_code,
        error: outcome.error,
    }))
}

pub(crate) async fn vapid_public_key<S, T>(
    State(state): State<state::AppState<S, T>>,
) -> Json<PublicKeyResponse>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    Json(PublicKeyResponse {
        public_key: state.vapid_public_key.to_string(),
    })
}
