//! `/server/database` - catalog replication: pull, push, and remove-by-company.

use airline::message::Message;
use airline::model::{Flight, FlightId};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::context::Context;
use crate::error::{ApiError, Result};

pub fn router() -> Router<Context> {
    Router::new().route(
        "/server/database",
        get(pull_handler).put(push_handler).delete(delete_handler),
    )
}

/// `GET /server/database` - return this node's own catalog (rows whose
/// `company` equals this node's name).
async fn pull_handler(
    State(ctx): State<Context>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse> {
    ctx.node.merge_clock(&message.vector_clock).await;

    let flights = ctx.flights.lock().await;
    let own: Vec<Flight> = flights.find_by_company(&ctx.config.name)?;

    let clock = ctx.node.bump_clock().await;
    let reply = Message::new(ctx.node.id, Some(message.from), clock, own);
    Ok(Json(reply))
}

/// `PUT /server/database` - insert or upsert (by `uniqueId`) every flight
/// the sender owns, with the local row id zeroed so a fresh id is assigned.
async fn push_handler(
    State(ctx): State<Context>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse> {
    ctx.node.merge_clock(&message.vector_clock).await;

    let incoming: Vec<Flight> = message
        .body_as()
        .map_err(|_| ApiError::BadRequest("malformed database push body".into()))?;

    let mut flights = ctx.flights.lock().await;
    for mut flight in incoming {
        flight.id = 0 as FlightId;
        flights.upsert(flight)?;
    }

    Ok(Json(json!({ "msg": "Received database" })))
}

#[derive(Deserialize)]
struct DeleteBody {
    company: String,
}

/// `DELETE /server/database` - remove every replicated flight owned by the
/// named company (used after a remote peer leaves).
async fn delete_handler(
    State(ctx): State<Context>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse> {
    ctx.node.merge_clock(&message.vector_clock).await;

    let body: DeleteBody = message
        .body_as()
        .map_err(|_| ApiError::BadRequest("malformed database delete body".into()))?;

    let mut flights = ctx.flights.lock().await;
    flights.remove_by_company(&body.company)?;

    Ok(Json(json!({ "msg": "Database deleted" })))
}
