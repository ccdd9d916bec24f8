//! `/tickets`, `/ticket` - purchase and cancellation, routed to whichever
//! node actually owns the flight.

use airline::coordinator;
use airline::model::{FlightId, TicketId};
use airline::store::{AirportStore, FlightStore, TicketStore};
use airline::Error as CoreError;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{envelope, AuthedSession};
use crate::context::Context;
use crate::error::{ApiError, Result};
use crate::outbound;

pub fn router() -> Router<Context> {
    Router::new()
        .route("/tickets", get(tickets_handler))
        .route("/ticket", post(purchase_handler))
        .route("/ticket/:id", axum::routing::delete(cancel_handler))
}

async fn tickets_handler(
    State(ctx): State<Context>,
    AuthedSession(session): AuthedSession,
) -> Result<impl IntoResponse> {
    let tickets = ctx.tickets.lock().await;
    Ok(envelope(tickets.find_by_client(session.client_id)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseRequest {
    flight_id: FlightId,
}

async fn city_of(ctx: &Context, airport_id: &str) -> String {
    let airports = ctx.airports.lock().await;
    airports
        .find_by_id(airport_id)
        .ok()
        .flatten()
        .map(|a| a.city.name)
        .unwrap_or_else(|| airport_id.to_string())
}

async fn purchase_handler(
    State(ctx): State<Context>,
    AuthedSession(session): AuthedSession,
    Json(request): Json<PurchaseRequest>,
) -> Result<impl IntoResponse> {
    let flight = {
        let flights = ctx.flights.lock().await;
        flights
            .find_by_id(request.flight_id)?
            .ok_or_else(|| ApiError::Core(CoreError::FlightNotFound(request.flight_id.to_string())))?
    };

    let updated = if flight.is_owned_by(&ctx.config.name) {
        let updated = {
            let mut flights = ctx.flights.lock().await;
            coordinator::decrement_seats(&ctx.node, &mut **flights, &flight.unique_id).await?
        };
        let broadcast_flight = updated.clone();
        ctx.spawn_broadcast({
            let ctx = ctx.clone();
            async move { outbound::broadcast(&ctx, &broadcast_flight).await }
        });
        updated
    } else {
        let (_, conn) = ctx
            .node
            .peer_by_name(&flight.company)
            .await
            .filter(|(_, conn)| conn.is_online)
            .ok_or_else(|| ApiError::Core(CoreError::PeerNotFound(flight.company.clone())))?;

        let owner_flight = outbound::purchase_ticket(&ctx, &conn, &flight.unique_id)
            .await
            .map_err(|e| ApiError::PeerUnreachable(e.to_string()))?;

        let mut flights = ctx.flights.lock().await;
        flights.update_seats(&owner_flight.unique_id, owner_flight.seats)?
    };

    let source_city = city_of(&ctx, &updated.origin).await;
    let destination_city = city_of(&ctx, &updated.destination).await;

    let ticket = {
        let mut tickets = ctx.tickets.lock().await;
        coordinator::record_ticket(
            &mut **tickets,
            session.client_id,
            &updated,
            source_city,
            destination_city,
        )?
    };

    Ok(envelope(ticket))
}

async fn cancel_handler(
    State(ctx): State<Context>,
    AuthedSession(_session): AuthedSession,
    Path(ticket_id): Path<TicketId>,
) -> Result<impl IntoResponse> {
    let ticket = {
        let tickets = ctx.tickets.lock().await;
        tickets
            .find_by_id(ticket_id)?
            .ok_or(ApiError::Core(CoreError::TicketNotFound))?
    };

    let flight = {
        let flights = ctx.flights.lock().await;
        coordinator::flight_for_ticket(&**flights, ticket.flight_id)?
    };

    if flight.is_owned_by(&ctx.config.name) {
        let updated = {
            let mut flights = ctx.flights.lock().await;
            coordinator::increment_seats(&ctx.node, &mut **flights, &flight.unique_id).await?
        };
        let broadcast_flight = updated.clone();
        ctx.spawn_broadcast({
            let ctx = ctx.clone();
            async move { outbound::broadcast(&ctx, &broadcast_flight).await }
        });
    } else {
        let online_owner = ctx
            .node
            .peer_by_name(&flight.company)
            .await
            .filter(|(_, conn)| conn.is_online);

        match online_owner {
            Some((_, conn)) => {
                let owner_flight = outbound::cancel_ticket(&ctx, &conn, &flight.unique_id)
                    .await
                    .map_err(|e| ApiError::PeerUnreachable(e.to_string()))?;
                let mut flights = ctx.flights.lock().await;
                flights.update_seats(&owner_flight.unique_id, owner_flight.seats)?;
            }
            // Owner offline: bump the local replica and let the next
            // broadcast or round-trip reconcile it.
            None => {
                let mut flights = ctx.flights.lock().await;
                coordinator::increment_seats(&ctx.node, &mut **flights, &flight.unique_id).await?;
            }
        }
    }

    let mut tickets = ctx.tickets.lock().await;
    tickets.delete(ticket_id)?;

    Ok(envelope(serde_json::json!({ "msg": "cancelled" })))
}

#[cfg(test)]
mod routes {
    use airline::model::Flight;
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::json;

    use crate::test::{self, DEMO_PASSWORD, DEMO_USERNAME};

    fn app() -> Router {
        super::super::router(test::context("acme"))
    }

    async fn login(app: &Router) -> String {
        let response = test::post(
            app,
            "/login",
            json!({ "username": DEMO_USERNAME, "password": DEMO_PASSWORD }),
            None,
        )
        .await
        .json()
        .await;
        response["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_purchase_decrements_owned_seats_and_issues_ticket() {
        let ctx = test::context("acme");
        {
            let mut flights = ctx.flights.lock().await;
            flights
                .upsert(Flight {
                    id: 0,
                    unique_id: "acme-GRU-JFK".into(),
                    company: "acme".into(),
                    origin: "GRU".into(),
                    destination: "JFK".into(),
                    price: 1000,
                    seats: 1,
                })
                .unwrap();
        }
        let app = super::super::router(ctx.clone());
        let token = login(&app).await;

        let flight_id = {
            let flights = ctx.flights.lock().await;
            flights
                .find_by_unique_id("acme-GRU-JFK")
                .unwrap()
                .unwrap()
                .id
        };

        let response = test::post(
            &app,
            "/ticket",
            json!({ "flightId": flight_id }),
            Some(&token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let remaining = {
            let flights = ctx.flights.lock().await;
            flights.find_by_id(flight_id).unwrap().unwrap().seats
        };
        assert_eq!(remaining, 0);

        let response = test::post(
            &app,
            "/ticket",
            json!({ "flightId": flight_id }),
            Some(&token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[tokio::test]
    async fn test_unknown_flight_returns_not_found() {
        let app = app();
        let token = login(&app).await;

        let response = test::post(&app, "/ticket", json!({ "flightId": 999 }), Some(&token)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
