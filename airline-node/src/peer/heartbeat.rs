//! `POST /server/heartbeat` - liveness probe. Always a fast, lock-only path.

use airline::message::Message;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use crate::context::Context;
use crate::error::Result;

pub fn router() -> Router<Context> {
    Router::new().route("/server/heartbeat", post(heartbeat_handler))
}

async fn heartbeat_handler(
    State(ctx): State<Context>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse> {
    ctx.node.merge_clock(&message.vector_clock).await;
    let clock = ctx.node.bump_clock().await;
    let reply = Message::new(ctx.node.id, Some(message.from), clock, json!("Healthy"));
    Ok(Json(reply))
}
