//! `GET /flights` - the node's merged view of the federation's catalog
//! (owned rows plus whatever replicas have arrived via catalog transfer).

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use super::envelope;
use crate::context::Context;
use crate::error::Result;

pub fn router() -> Router<Context> {
    Router::new().route("/flights", get(flights_handler))
}

async fn flights_handler(State(ctx): State<Context>) -> Result<impl IntoResponse> {
    let flights = ctx.flights.lock().await;
    Ok(envelope(flights.all()?))
}
