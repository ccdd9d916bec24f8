//! The outbound half of the peer wire protocol: everything this node sends
//! to another node's `/server/*` endpoints. One `reqwest::Client` (built
//! with a 10s default timeout, 3s for heartbeats specifically) is shared
//! across all peers via [`crate::context::Context`].

use airline::message::Message;
use airline::model::Flight;
use airline::registry::Connection;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::context::Context;

#[derive(Debug, thiserror::Error)]
pub enum OutboundError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("peer responded {0}")]
    Status(StatusCode),
}

type Result<T> = std::result::Result<T, OutboundError>;

fn base_url(conn: &Connection) -> String {
    format!("http://{}:{}", conn.address, conn.port)
}

async fn expect_ok(response: reqwest::Response) -> Result<Message> {
    let status = response.status();
    if !status.is_success() {
        return Err(OutboundError::Status(status));
    }
    Ok(response.json::<Message>().await?)
}

pub async fn connect(ctx: &Context, conn: &Connection) -> Result<Message> {
    let clock = ctx.node.bump_clock().await;
    let body = Message::new(
        ctx.node.id,
        None,
        clock,
        json!({
            "name": ctx.config.name,
            "address": ctx.config.address,
            "port": ctx.config.port,
        }),
    );
    let response = ctx
        .http
        .post(format!("{}/server/connect", base_url(conn)))
        .json(&body)
        .send()
        .await?;
    expect_ok(response).await
}

pub async fn disconnect(ctx: &Context, conn: &Connection) -> Result<()> {
    let clock = ctx.node.bump_clock().await;
    let body = Message::new(
        ctx.node.id,
        None,
        clock,
        json!({
            "name": ctx.config.name,
            "address": ctx.config.address,
            "port": ctx.config.port,
        }),
    );
    let response = ctx
        .http
        .delete(format!("{}/server/disconnect", base_url(conn)))
        .json(&body)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(OutboundError::Status(response.status()));
    }
    Ok(())
}

pub async fn heartbeat(ctx: &Context, peer_id: &Uuid, conn: &Connection) -> Result<Message> {
    let clock = ctx.node.bump_clock().await;
    let body = Message::new(ctx.node.id, Some(*peer_id), clock, json!("Heartbeat"));
    let response = ctx
        .http
        .post(format!("{}/server/heartbeat", base_url(conn)))
        .timeout(airline::config::HEARTBEAT_TIMEOUT)
        .json(&body)
        .send()
        .await?;
    expect_ok(response).await
}

pub async fn pull_database(ctx: &Context, conn: &Connection) -> Result<Vec<Flight>> {
    let clock = ctx.node.bump_clock().await;
    let body = Message::new(ctx.node.id, None, clock, serde_json::Value::Null);
    let response = ctx
        .http
        .get(format!("{}/server/database", base_url(conn)))
        .json(&body)
        .send()
        .await?;
    let message = expect_ok(response).await?;
    Ok(message.body_as::<Vec<Flight>>().unwrap_or_default())
}

pub async fn push_database(ctx: &Context, conn: &Connection, flights: Vec<Flight>) -> Result<()> {
    let clock = ctx.node.bump_clock().await;
    let body = Message::new(ctx.node.id, None, clock, flights);
    let response = ctx
        .http
        .put(format!("{}/server/database", base_url(conn)))
        .json(&body)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(OutboundError::Status(response.status()));
    }
    Ok(())
}

pub async fn delete_database(ctx: &Context, conn: &Connection, company: &str) -> Result<()> {
    let clock = ctx.node.bump_clock().await;
    let body = Message::new(ctx.node.id, None, clock, json!({ "company": company }));
    let response = ctx
        .http
        .delete(format!("{}/server/database", base_url(conn)))
        .json(&body)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(OutboundError::Status(response.status()));
    }
    Ok(())
}

pub async fn purchase_ticket(ctx: &Context, conn: &Connection, unique_id: &str) -> Result<Flight> {
    let clock = ctx.node.bump_clock().await;
    let body = Message::new(ctx.node.id, None, clock, json!(unique_id));
    let response = ctx
        .http
        .post(format!("{}/server/ticket/purchase", base_url(conn)))
        .json(&body)
        .send()
        .await?;
    let message = expect_ok(response).await?;
    message
        .body_as::<Flight>()
        .map_err(|_| OutboundError::Status(StatusCode::BAD_GATEWAY))
}

pub async fn cancel_ticket(ctx: &Context, conn: &Connection, unique_id: &str) -> Result<Flight> {
    let clock = ctx.node.bump_clock().await;
    let body = Message::new(ctx.node.id, None, clock, json!(unique_id));
    let response = ctx
        .http
        .delete(format!("{}/server/ticket/cancel", base_url(conn)))
        .json(&body)
        .send()
        .await?;
    let message = expect_ok(response).await?;
    message
        .body_as::<Flight>()
        .map_err(|_| OutboundError::Status(StatusCode::BAD_GATEWAY))
}

/// Fan out the updated flight to every peer concurrently, joining on all of
/// them the way a wait-group would. A failed peer is logged, not retried,
/// and does not abort the fan-out for the others.
pub async fn broadcast(ctx: &Context, flight: &Flight) {
    let peers = ctx.node.peers().await;
    let unique_id = flight.unique_id.clone();
    let sends = peers.into_iter().map(|(id, conn)| {
        let flight = flight.clone();
        let unique_id = unique_id.clone();
        async move {
            let clock = ctx.node.bump_clock().await;
            let body = Message::new(ctx.node.id, Some(id), clock, flight);
            let result = ctx
                .http
                .post(format!("{}/server/broadcast", base_url(&conn)))
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(peer = %conn.name, %unique_id, "broadcast delivered");
                }
                Ok(response) => {
                    tracing::warn!(peer = %conn.name, status = %response.status(), %unique_id, "broadcast rejected");
                }
                Err(err) => {
                    tracing::warn!(peer = %conn.name, error = %err, %unique_id, "broadcast failed");
                }
            }
        }
    });
    futures::future::join_all(sends).await;
}
