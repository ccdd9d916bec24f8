//! The client-facing REST surface: sessions, flights, airports, routes,
//! wishlist, tickets. Every response is the envelope `{error, data, status}`.

mod airports;
mod auth;
mod flights;
mod routes;
mod tickets;
mod wishlist;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Json, Router};
use serde::Serialize;
use serde_json::json;

use crate::context::Context;
use crate::error::ApiError;

pub fn router(ctx: Context) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(flights::router())
        .merge(airports::router())
        .merge(routes::router())
        .merge(wishlist::router())
        .merge(tickets::router())
        .with_state(ctx)
}

/// Wrap a successful payload in the `{error, data, status}` envelope at 200.
pub fn envelope<T: Serialize>(data: T) -> impl IntoResponse {
    Json(json!({
        "error": serde_json::Value::Null,
        "data": data,
        "status": StatusCode::OK.as_u16(),
    }))
}

/// The authenticated client behind a bearer token, re-extracted and
/// `touch`ed (activity timestamp refreshed) on every request that needs it.
pub struct AuthedSession(pub airline::session::Session);

#[async_trait]
impl FromRequestParts<Context> for AuthedSession {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, ctx: &Context) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value))
            .ok_or(ApiError::MissingAuth)
            .map_err(IntoResponse::into_response)?;

        let session = ctx
            .node
            .session_by_token(token)
            .await
            .ok_or_else(|| ApiError::Core(airline::Error::SessionNotFound).into_response())?;

        Ok(AuthedSession(session))
    }
}
