//! Shared harness for in-process router tests: build a [`Context`] backed by
//! the in-memory stores and drive it with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use airline::config::Config;
use airline::node::Node;
use airline::store::{
    Client, MemoryAirportStore, MemoryClientStore, MemoryFlightStore, MemoryTicketStore,
};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::context::Context;

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "demo";

/// A fresh [`Context`] named `company`, with one seeded client and no
/// flights, running entirely in memory.
pub fn context(company: &str) -> Context {
    let node = Node::new(Uuid::new_v4(), company.to_string(), "127.0.0.1".into(), 9999);
    let mut config = Config::default();
    config.name = company.to_string();
    config.ephemeral = true;

    let mut clients = MemoryClientStore::new();
    clients
        .seed(vec![Client {
            id: Uuid::new_v4(),
            username: DEMO_USERNAME.into(),
            password: DEMO_PASSWORD.into(),
            name: "Demo Traveler".into(),
        }])
        .unwrap();

    Context::new(
        Arc::new(node),
        Box::new(MemoryFlightStore::new()),
        Box::new(MemoryTicketStore::new()),
        Box::new(MemoryAirportStore::new()),
        Box::new(clients),
        config,
    )
}

fn request(path: impl ToString, method: Method, body: Option<Body>, auth: Option<&str>) -> Request<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(path.to_string())
        .header("content-type", "application/json");
    if let Some(token) = auth {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    request.body(body.unwrap_or_else(Body::empty)).unwrap()
}

pub async fn get(app: &Router, path: impl ToString, auth: Option<&str>) -> Response {
    Response(
        app.clone()
            .oneshot(request(path, Method::GET, None, auth))
            .await
            .unwrap(),
    )
}

pub async fn post(app: &Router, path: impl ToString, body: Value, auth: Option<&str>) -> Response {
    Response(
        app.clone()
            .oneshot(request(
                path,
                Method::POST,
                Some(Body::from(body.to_string())),
                auth,
            ))
            .await
            .unwrap(),
    )
}

pub async fn delete(app: &Router, path: impl ToString, auth: Option<&str>) -> Response {
    Response(
        app.clone()
            .oneshot(request(path, Method::DELETE, None, auth))
            .await
            .unwrap(),
    )
}

pub struct Response(axum::response::Response);

impl Response {
    pub fn status(&self) -> axum::http::StatusCode {
        self.0.status()
    }

    pub async fn json(self) -> Value {
        let body = axum::body::to_bytes(self.0.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}
