//! `DELETE /server/disconnect` - leave handshake: remove the peer and
//! discard its replicated catalog.

use airline::message::Message;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::delete;
use axum::{Json, Router};
use serde::Deserialize;

use crate::context::Context;
use crate::error::{ApiError, Result};

#[derive(Deserialize)]
struct DisconnectBody {
    name: String,
}

pub fn router() -> Router<Context> {
    Router::new().route("/server/disconnect", delete(disconnect_handler))
}

async fn disconnect_handler(
    State(ctx): State<Context>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse> {
    let body: DisconnectBody = message
        .body_as()
        .map_err(|_| ApiError::BadRequest("malformed disconnect body".into()))?;

    ctx.node.merge_clock(&message.vector_clock).await;
    ctx.node.remove_peer(&message.from).await;

    let mut flights = ctx.flights.lock().await;
    flights.remove_by_company(&body.name)?;

    tracing::info!(peer = %body.name, "peer disconnected");
    Ok("disconnected")
}
