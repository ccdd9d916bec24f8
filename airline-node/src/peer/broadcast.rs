//! `POST /server/broadcast` - apply an owner's seat update to our replica.

use airline::coordinator;
use airline::message::Message;
use airline::model::Flight;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::context::Context;
use crate::error::{ApiError, Result};

pub fn router() -> Router<Context> {
    Router::new().route("/server/broadcast", post(broadcast_handler))
}

async fn broadcast_handler(
    State(ctx): State<Context>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse> {
    let incoming: Flight = message
        .body_as()
        .map_err(|_| ApiError::BadRequest("malformed broadcast body".into()))?;

    let updated = {
        let mut flights = ctx.flights.lock().await;
        coordinator::apply_broadcast(
            &ctx.node,
            &mut **flights,
            &incoming.unique_id,
            &message.vector_clock,
            incoming.seats,
        )
        .await?
    };

    tracing::info!(unique_id = %updated.unique_id, seats = updated.seats, "broadcast applied");

    let clock = ctx.node.bump_clock().await;
    let reply = Message::new(ctx.node.id, Some(message.from), clock, updated);
    Ok(Json(reply))
}
