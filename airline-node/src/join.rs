//! The initiator side of the join/leave protocol: dial a peer's
//! `/server/connect`, record it under the id the receiver replies with, then
//! pull and push catalogs. `/server/connect` etc. (the receiver side) live in
//! [`crate::peer`]; this module is everything a node does when it decides,
//! on its own, to join or leave a federation. Exposed as a tiny HTTP admin
//! surface - CLI administration proper is out of scope - and reused at
//! startup for the `--peer` flag.

use airline::registry::Connection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::context::Context;
use crate::error::{ApiError, Result};
use crate::outbound;

pub fn router(ctx: Context) -> Router {
    Router::new()
        .route("/admin/peers", post(join_handler))
        .route("/admin/peers/:name", delete(leave_handler))
        .with_state(ctx)
}

#[derive(Deserialize)]
struct JoinRequest {
    address: String,
    port: u16,
}

async fn join_handler(
    State(ctx): State<Context>,
    Json(request): Json<JoinRequest>,
) -> Result<impl IntoResponse> {
    initiate_join(&ctx, &request.address, request.port).await?;
    Ok(Json(json!({ "msg": "joined" })))
}

async fn leave_handler(
    State(ctx): State<Context>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    initiate_leave(&ctx, &name).await?;
    Ok(Json(json!({ "msg": "left" })))
}

#[derive(Deserialize)]
struct ConnectAck {
    name: String,
}

/// Dial `address:port`, record the peer under the id it replies with, then
/// exchange catalogs. A failed handshake leaves local state untouched; a
/// handshake that succeeds but whose catalog exchange fails leaves the peer
/// registered online - a retry of this call restarts the exchange.
pub async fn initiate_join(ctx: &Context, address: &str, port: u16) -> Result<()> {
    let dial = Connection {
        name: String::new(),
        address: address.to_string(),
        port,
        is_online: true,
    };

    let reply = outbound::connect(ctx, &dial).await.map_err(|err| {
        tracing::warn!(%address, port, error = %err, "join handshake failed");
        ApiError::PeerUnreachable(err.to_string())
    })?;
    ctx.node.merge_clock(&reply.vector_clock).await;

    let ack: ConnectAck = reply
        .body_as()
        .map_err(|_| ApiError::BadRequest("malformed connect reply".into()))?;

    let conn = Connection {
        name: ack.name.clone(),
        address: address.to_string(),
        port,
        is_online: true,
    };
    ctx.node.add_peer(reply.from, conn.clone()).await;
    tracing::info!(peer = %ack.name, %address, port, "joined peer");

    let theirs = outbound::pull_database(ctx, &conn).await.map_err(|err| {
        tracing::warn!(peer = %ack.name, error = %err, "catalog pull failed");
        ApiError::PeerUnreachable(err.to_string())
    })?;
    {
        let mut flights = ctx.flights.lock().await;
        for mut flight in theirs {
            flight.id = 0;
            flights.upsert(flight)?;
        }
    }

    let ours = {
        let flights = ctx.flights.lock().await;
        flights.find_by_company(&ctx.config.name)?
    };
    outbound::push_database(ctx, &conn, ours)
        .await
        .map_err(|err| {
            tracing::warn!(peer = %ack.name, error = %err, "catalog push failed");
            ApiError::PeerUnreachable(err.to_string())
        })?;

    Ok(())
}

/// Leave a peer found by name in the registry: send the disconnect
/// handshake, and only on success mirror it locally - remove the peer and
/// drop its replicated catalog. Failure leaves local state untouched.
pub async fn initiate_leave(ctx: &Context, name: &str) -> Result<()> {
    let (id, conn) = ctx
        .node
        .peer_by_name(name)
        .await
        .ok_or_else(|| ApiError::Core(airline::Error::PeerNotFound(name.to_string())))?;

    outbound::disconnect(ctx, &conn).await.map_err(|err| {
        tracing::warn!(peer = %name, error = %err, "disconnect handshake failed");
        ApiError::PeerUnreachable(err.to_string())
    })?;

    ctx.node.remove_peer(&id).await;
    {
        let mut flights = ctx.flights.lock().await;
        flights.remove_by_company(name)?;
    }
    tracing::info!(peer = %name, "left peer");
    Ok(())
}
