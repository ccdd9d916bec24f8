//! `/wishlist` - a session-scoped list of flights the client is tracking.

use airline::model::FlightId;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{envelope, AuthedSession};
use crate::context::Context;
use crate::error::Result;

pub fn router() -> Router<Context> {
    Router::new()
        .route("/wishlist", get(wishlist_handler).post(add_handler))
        .route("/wishlist/:flight_id", axum::routing::delete(remove_handler))
}

async fn wishlist_handler(
    State(ctx): State<Context>,
    AuthedSession(session): AuthedSession,
) -> Result<impl IntoResponse> {
    let flights = ctx.flights.lock().await;
    let mut resolved = Vec::with_capacity(session.wishlist.len());
    for id in &session.wishlist {
        if let Some(flight) = flights.find_by_id(*id)? {
            resolved.push(flight);
        }
    }
    Ok(envelope(resolved))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddRequest {
    flight_id: FlightId,
}

async fn add_handler(
    State(ctx): State<Context>,
    AuthedSession(session): AuthedSession,
    Json(request): Json<AddRequest>,
) -> Result<impl IntoResponse> {
    ctx.node
        .mutate_session(&session.id, |s| {
            if !s.wishlist.contains(&request.flight_id) {
                s.wishlist.push(request.flight_id);
            }
        })
        .await;
    Ok(envelope(serde_json::json!({ "msg": "added" })))
}

async fn remove_handler(
    State(ctx): State<Context>,
    AuthedSession(session): AuthedSession,
    Path(flight_id): Path<FlightId>,
) -> Result<impl IntoResponse> {
    ctx.node
        .mutate_session(&session.id, |s| {
            s.wishlist.retain(|id| *id != flight_id);
        })
        .await;
    Ok(envelope(serde_json::json!({ "msg": "removed" })))
}
