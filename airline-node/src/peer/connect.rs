//! `POST /server/connect` - join handshake.

use airline::message::Message;
use airline::registry::Connection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::context::Context;
use crate::error::{ApiError, Result};

#[derive(Deserialize)]
struct ConnectBody {
    name: String,
    address: String,
    port: u16,
}

pub fn router() -> Router<Context> {
    Router::new().route("/server/connect", post(connect_handler))
}

async fn connect_handler(
    State(ctx): State<Context>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse> {
    let body: ConnectBody = message
        .body_as()
        .map_err(|_| ApiError::BadRequest("malformed connect body".into()))?;

    ctx.node.merge_clock(&message.vector_clock).await;
    ctx.node
        .add_peer(
            message.from,
            Connection {
                name: body.name.clone(),
                address: body.address,
                port: body.port,
                is_online: true,
            },
        )
        .await;

    tracing::info!(peer = %body.name, "peer connected");

    let clock = ctx.node.bump_clock().await;
    let reply = Message::new(
        ctx.node.id,
        Some(message.from),
        clock,
        json!({ "name": ctx.config.name }),
    );
    Ok((axum::http::StatusCode::CREATED, Json(reply)))
}
