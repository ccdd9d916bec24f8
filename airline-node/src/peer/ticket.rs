//! `/server/ticket/*` - remote purchase/cancel against a flight this node
//! owns. Both mutate under the node lock, then fan a broadcast out to every
//! peer after releasing it. The node lock is never held across I/O.

use airline::coordinator;
use airline::message::Message;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::context::Context;
use crate::error::{ApiError, Result};
use crate::outbound;

pub fn router() -> Router<Context> {
    Router::new()
        .route("/server/ticket/purchase", post(purchase_handler))
        .route("/server/ticket/cancel", delete(cancel_handler))
}

async fn purchase_handler(
    State(ctx): State<Context>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse> {
    ctx.node.merge_clock(&message.vector_clock).await;

    let unique_id: String = message
        .body_as()
        .map_err(|_| ApiError::BadRequest("malformed purchase body".into()))?;

    let flight = {
        let mut flights = ctx.flights.lock().await;
        coordinator::decrement_seats(&ctx.node, &mut **flights, &unique_id).await?
    };

    let broadcast_flight = flight.clone();
    ctx.spawn_broadcast({
        let ctx = ctx.clone();
        async move { outbound::broadcast(&ctx, &broadcast_flight).await }
    });

    let clock = ctx.node.bump_clock().await;
    let reply = Message::new(ctx.node.id, Some(message.from), clock, flight);
    Ok(Json(reply))
}

async fn cancel_handler(
    State(ctx): State<Context>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse> {
    ctx.node.merge_clock(&message.vector_clock).await;

    let unique_id: String = message
        .body_as()
        .map_err(|_| ApiError::BadRequest("malformed cancel body".into()))?;

    let flight = {
        let mut flights = ctx.flights.lock().await;
        coordinator::increment_seats(&ctx.node, &mut **flights, &unique_id).await?
    };

    let broadcast_flight = flight.clone();
    ctx.spawn_broadcast({
        let ctx = ctx.clone();
        async move { outbound::broadcast(&ctx, &broadcast_flight).await }
    });

    let clock = ctx.node.bump_clock().await;
    let reply = Message::new(ctx.node.id, Some(message.from), clock, flight);
    Ok(Json(reply))
}
