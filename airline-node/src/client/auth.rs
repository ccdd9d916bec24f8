//! `/login`, `/logout`, `/user` - the client session lifecycle.

use airline::Error as CoreError;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::{envelope, AuthedSession};
use crate::context::Context;
use crate::error::{ApiError, Result};

pub fn router() -> Router<Context> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/user", get(user_handler))
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login_handler(
    State(ctx): State<Context>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let clients = ctx.clients.lock().await;
    let client = clients
        .find_by_username(&request.username)?
        .filter(|c| c.password == request.password)
        .ok_or(ApiError::Core(CoreError::InvalidCredentials))?;

    let token = ctx
        .node
        .create_session(client.id)
        .await
        .ok_or(ApiError::Core(CoreError::AlreadyLoggedIn))?;

    Ok(envelope(json!({ "token": token, "name": client.name })))
}

async fn logout_handler(
    State(ctx): State<Context>,
    AuthedSession(session): AuthedSession,
) -> Result<impl IntoResponse> {
    ctx.node.remove_session(&session.id).await;
    Ok(envelope(json!({ "msg": "logged out" })))
}

async fn user_handler(AuthedSession(session): AuthedSession) -> Result<impl IntoResponse> {
    Ok(envelope(json!({
        "clientId": session.client_id,
        "wishlist": session.wishlist,
    })))
}

#[cfg(test)]
mod routes {
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::json;

    use crate::test::{self, DEMO_PASSWORD, DEMO_USERNAME};

    fn app() -> Router {
        super::super::router(test::context("acme"))
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let app = app();
        let response = test::post(
            &app,
            "/login",
            json!({ "username": DEMO_USERNAME, "password": "wrong" }),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_then_user() {
        let app = app();
        let response = test::post(
            &app,
            "/login",
            json!({ "username": DEMO_USERNAME, "password": DEMO_PASSWORD }),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.json().await;
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let response = test::get(&app, "/user", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_second_login_rejected_while_session_open() {
        let app = app();
        let first = test::post(
            &app,
            "/login",
            json!({ "username": DEMO_USERNAME, "password": DEMO_PASSWORD }),
            None,
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = test::post(
            &app,
            "/login",
            json!({ "username": DEMO_USERNAME, "password": DEMO_PASSWORD }),
            None,
        )
        .await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_user_without_token_rejected() {
        let app = app();
        let response = test::get(&app, "/user", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let app = app();
        let login = test::post(
            &app,
            "/login",
            json!({ "username": DEMO_USERNAME, "password": DEMO_PASSWORD }),
            None,
        )
        .await
        .json()
        .await;
        let token = login["data"]["token"].as_str().unwrap().to_string();

        let response = test::post(&app, "/logout", json!({}), Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = test::get(&app, "/user", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
