//! The peer wire protocol: everything another node's `airline-node` talks
//! to on this one. Mirrors the client surface's router-per-concern layout.

mod broadcast;
mod connect;
mod database;
mod disconnect;
mod heartbeat;
mod ticket;

use axum::Router;

use crate::context::Context;

pub fn router(ctx: Context) -> Router {
    Router::new()
        .merge(connect::router())
        .merge(disconnect::router())
        .merge(heartbeat::router())
        .merge(database::router())
        .merge(ticket::router())
        .merge(broadcast::router())
        .with_state(ctx)
}
