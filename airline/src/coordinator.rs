//! Seat-mutation decision logic shared by every transport-facing handler.
//! These functions hold the node's write lock around the clock bump and the
//! store mutation together, so two concurrent decrements of the same flight
//! serialize through the same exclusion the clock and registry use. Routing
//! a purchase/cancel to the right node (self, remote owner, or a remote peer
//! over HTTP) is transport-level and lives in `airline-node`; this module
//! only answers "what happens to the seat count and the ticket row,
//! assuming this node is the one mutating them".

use crate::clock::VectorClock;
use crate::error::{Error, Result};
use crate::log::{Kind, Status};
use crate::model::{Flight, FlightId, Ticket, TicketId};
use crate::node::Node;
use crate::store::{FlightStore, TicketStore};

/// Decrement the seat count for the flight identified by `unique_id`,
/// refusing if none remain. Re-checks `seats > 0` under the node's write
/// lock immediately before mutating, closing the race the reference
/// implementation leaves open (see DESIGN.md).
pub async fn decrement_seats(
    node: &Node,
    flights: &mut dyn FlightStore,
    unique_id: &str,
) -> Result<Flight> {
    let mut state = node.write().await;
    state.clock.increment(node.id);

    let flight = flights
        .find_by_unique_id(unique_id)?
        .ok_or_else(|| Error::FlightNotFound(unique_id.to_string()))?;
    if flight.seats == 0 {
        state
            .log
            .record(Kind::Transaction, Status::Rejected, unique_id);
        return Err(Error::NoSeatsAvailable);
    }

    let updated = flights.update_seats(unique_id, flight.seats - 1)?;
    state
        .log
        .record(Kind::Transaction, Status::Commited, unique_id);
    Ok(updated)
}

/// Increment the seat count for the flight identified by `unique_id`. Used
/// both on the true owner (a normal cancel) and on a non-owner node when the
/// owner is unreachable: the local replica is bumped preemptively and
/// self-heals on the next broadcast.
pub async fn increment_seats(
    node: &Node,
    flights: &mut dyn FlightStore,
    unique_id: &str,
) -> Result<Flight> {
    let mut state = node.write().await;
    state.clock.increment(node.id);

    let flight = flights
        .find_by_unique_id(unique_id)?
        .ok_or_else(|| Error::FlightNotFound(unique_id.to_string()))?;
    let updated = flights.update_seats(unique_id, flight.seats + 1)?;
    state
        .log
        .record(Kind::Transaction, Status::Commited, unique_id);
    Ok(updated)
}

/// Apply an incoming broadcast to the local replica, resolving concurrent
/// updates via [`Node::accept_broadcast`] and merging the sender's clock.
pub async fn apply_broadcast(
    node: &Node,
    flights: &mut dyn FlightStore,
    unique_id: &str,
    incoming_clock: &VectorClock,
    incoming_seats: u32,
) -> Result<Flight> {
    let current = flights
        .find_by_unique_id(unique_id)?
        .ok_or_else(|| Error::FlightNotFound(unique_id.to_string()))?;

    let accepted_seats = node
        .accept_broadcast(unique_id, incoming_clock, current.seats, incoming_seats)
        .await;
    node.merge_clock(incoming_clock).await;
    node.record(Kind::Message, Status::Commited, unique_id).await;

    Ok(flights.update_seats(unique_id, accepted_seats)?)
}

/// Record a purchased ticket against `flight`. Separate from
/// [`decrement_seats`] because the caller may have decremented on a remote
/// owner and only needs the local ticket row recorded here.
pub fn record_ticket(
    tickets: &mut dyn TicketStore,
    client_id: uuid::Uuid,
    flight: &Flight,
    source_city: String,
    destination_city: String,
) -> Result<Ticket> {
    Ok(tickets.insert(Ticket {
        id: 0,
        unique_id: flight.unique_id.clone(),
        client_id,
        flight_id: flight.id,
        source_city,
        destination_city,
    })?)
}

/// Look up and remove a ticket row, returning the removed ticket so the
/// caller can resolve the owning flight.
pub fn take_ticket(tickets: &mut dyn TicketStore, ticket_id: TicketId) -> Result<Ticket> {
    let ticket = tickets
        .find_by_id(ticket_id)?
        .ok_or(Error::TicketNotFound)?;
    tickets.delete(ticket_id)?;
    Ok(ticket)
}

/// Resolve a ticket's flight id without removing the ticket; used by the
/// cancel flow to find the owning flight's company before deciding who
/// coordinates the seat increment.
pub fn flight_for_ticket(
    flights: &dyn FlightStore,
    flight_id: FlightId,
) -> Result<Flight> {
    flights
        .find_by_id(flight_id)?
        .ok_or_else(|| Error::FlightNotFound(flight_id.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use uuid::Uuid;

    use super::*;
    use crate::store::MemoryFlightStore;

    fn seed(store: &mut MemoryFlightStore, unique_id: &str, seats: u32) -> Flight {
        store
            .upsert(Flight {
                id: 0,
                unique_id: unique_id.into(),
                company: "Acme".into(),
                origin: "GRU".into(),
                destination: "JFK".into(),
                price: 1000,
                seats,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn decrement_refuses_when_no_seats_left() {
        let node = Node::new(Uuid::new_v4(), "alpha".into(), "127.0.0.1".into(), 9999);
        let mut flights = MemoryFlightStore::new();
        seed(&mut flights, "u1", 1);

        let first = decrement_seats(&node, &mut flights, "u1").await.unwrap();
        assert_eq!(first.seats, 0);

        let second = decrement_seats(&node, &mut flights, "u1").await;
        assert!(matches!(second, Err(Error::NoSeatsAvailable)));
    }

    #[tokio::test]
    async fn purchase_then_cancel_restores_seat_count() {
        let node = Node::new(Uuid::new_v4(), "alpha".into(), "127.0.0.1".into(), 9999);
        let mut flights = MemoryFlightStore::new();
        let mut tickets = crate::store::MemoryTicketStore::new();
        seed(&mut flights, "u1", 2);

        let flight = decrement_seats(&node, &mut flights, "u1").await.unwrap();
        let ticket = record_ticket(
            &mut tickets,
            Uuid::new_v4(),
            &flight,
            "Sao Paulo".into(),
            "New York".into(),
        )
        .unwrap();
        assert_eq!(flights.find_by_unique_id("u1").unwrap().unwrap().seats, 1);

        let removed = take_ticket(&mut tickets, ticket.id).unwrap();
        let restored = increment_seats(&node, &mut flights, &removed.unique_id)
            .await
            .unwrap();
        assert_eq!(restored.seats, 2);
    }

    #[tokio::test]
    async fn broadcast_merges_clock_and_resolves_concurrency() {
        let node = Node::new(Uuid::new_v4(), "alpha".into(), "127.0.0.1".into(), 9999);
        let mut flights = MemoryFlightStore::new();
        seed(&mut flights, "u1", 5);

        let peer = Uuid::new_v4();
        let clock = VectorClock::from(HashMap::from([(peer, 1)]));
        let updated = apply_broadcast(&node, &mut flights, "u1", &clock, 4)
            .await
            .unwrap();
        assert_eq!(updated.seats, 4);
        assert_eq!(node.clock_snapshot().await.get(&peer), 1);
    }
}
