//! `GET /airports` - the fixture-loaded airport directory.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use super::envelope;
use crate::context::Context;
use crate::error::Result;

pub fn router() -> Router<Context> {
    Router::new().route("/airports", get(airports_handler))
}

async fn airports_handler(State(ctx): State<Context>) -> Result<impl IntoResponse> {
    let airports = ctx.airports.lock().await;
    Ok(envelope(airports.all()?))
}
