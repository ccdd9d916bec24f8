//! `GET /route?src=&dest=` - direct adjacency lookup against the replicated
//! catalog. A full airport/route graph search is out of scope.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use super::envelope;
use crate::context::Context;
use crate::error::Result;

pub fn router() -> Router<Context> {
    Router::new().route("/route", get(route_handler))
}

#[derive(Deserialize)]
struct RouteQuery {
    src: String,
    dest: String,
}

async fn route_handler(
    State(ctx): State<Context>,
    Query(query): Query<RouteQuery>,
) -> Result<impl IntoResponse> {
    let flights = ctx.flights.lock().await;
    let matches: Vec<_> = flights
        .all()?
        .into_iter()
        .filter(|f| f.origin == query.src && f.destination == query.dest)
        .collect();

    Ok(envelope(matches))
}
