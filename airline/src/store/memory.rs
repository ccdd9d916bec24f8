//! In-memory DAO implementations, used by tests and the `--ephemeral` run
//! mode. Mirror the `sqlite_store` implementations' semantics exactly.

use std::collections::HashMap;

use uuid::Uuid;

use super::{AirportStore, Client, ClientStore, FlightStore, TicketStore};
use crate::model::{Airport, Flight, FlightId, Ticket, TicketId};
use crate::store::Result;

#[derive(Debug, Default)]
pub struct MemoryFlightStore {
    rows: HashMap<FlightId, Flight>,
    next_id: FlightId,
}

impl MemoryFlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_id_by_unique(&self, unique_id: &str) -> Option<FlightId> {
        self.rows
            .values()
            .find(|f| f.unique_id == unique_id)
            .map(|f| f.id)
    }
}

impl FlightStore for MemoryFlightStore {
    fn upsert(&mut self, mut flight: Flight) -> Result<Flight> {
        if let Some(existing_id) = self.find_id_by_unique(&flight.unique_id) {
            let existing = self.rows.get_mut(&existing_id).expect("row exists");
            existing.seats = flight.seats;
            return Ok(existing.clone());
        }
        self.next_id += 1;
        flight.id = self.next_id;
        self.rows.insert(flight.id, flight.clone());
        Ok(flight)
    }

    fn find_by_id(&self, id: FlightId) -> Result<Option<Flight>> {
        Ok(self.rows.get(&id).cloned())
    }

    fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<Flight>> {
        Ok(self.rows.values().find(|f| f.unique_id == unique_id).cloned())
    }

    fn find_by_company(&self, company: &str) -> Result<Vec<Flight>> {
        Ok(self
            .rows
            .values()
            .filter(|f| f.company == company)
            .cloned()
            .collect())
    }

    fn update_seats(&mut self, unique_id: &str, seats: u32) -> Result<Flight> {
        let id = self
            .find_id_by_unique(unique_id)
            .ok_or(super::StorageError::NotFound)?;
        let row = self.rows.get_mut(&id).expect("row exists");
        row.seats = seats;
        Ok(row.clone())
    }

    fn remove_by_company(&mut self, company: &str) -> Result<usize> {
        let before = self.rows.len();
        self.rows.retain(|_, f| f.company != company);
        Ok(before - self.rows.len())
    }

    fn all(&self) -> Result<Vec<Flight>> {
        Ok(self.rows.values().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTicketStore {
    rows: HashMap<TicketId, Ticket>,
    next_id: TicketId,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TicketStore for MemoryTicketStore {
    fn insert(&mut self, mut ticket: Ticket) -> Result<Ticket> {
        self.next_id += 1;
        ticket.id = self.next_id;
        self.rows.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>> {
        Ok(self.rows.get(&id).cloned())
    }

    fn find_by_client(&self, client_id: Uuid) -> Result<Vec<Ticket>> {
        Ok(self
            .rows
            .values()
            .filter(|t| t.client_id == client_id)
            .cloned()
            .collect())
    }

    fn delete(&mut self, id: TicketId) -> Result<bool> {
        Ok(self.rows.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct MemoryAirportStore {
    rows: HashMap<String, Airport>,
}

impl MemoryAirportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AirportStore for MemoryAirportStore {
    fn seed(&mut self, airports: Vec<Airport>) -> Result<()> {
        for airport in airports {
            self.rows.insert(airport.id.clone(), airport);
        }
        Ok(())
    }

    fn all(&self) -> Result<Vec<Airport>> {
        Ok(self.rows.values().cloned().collect())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Airport>> {
        Ok(self.rows.get(id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryClientStore {
    rows: HashMap<String, Client>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryClientStore {
    fn seed(&mut self, clients: Vec<Client>) -> Result<()> {
        for client in clients {
            self.rows.insert(client.username.clone(), client);
        }
        Ok(())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Client>> {
        Ok(self.rows.get(username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(unique_id: &str, company: &str, seats: u32) -> Flight {
        Flight {
            id: 0,
            unique_id: unique_id.into(),
            company: company.into(),
            origin: "GRU".into(),
            destination: "JFK".into(),
            price: 1000,
            seats,
        }
    }

    #[test]
    fn upsert_on_existing_unique_id_only_touches_seats() {
        let mut store = MemoryFlightStore::new();
        let inserted = store.upsert(flight("u1", "Acme", 3)).unwrap();
        assert_eq!(inserted.seats, 3);

        let mut changed = flight("u1", "Acme", 1);
        changed.origin = "LAX".into(); // must be ignored by upsert
        let updated = store.upsert(changed).unwrap();

        assert_eq!(updated.seats, 1);
        assert_eq!(updated.origin, "GRU", "only seats update on upsert");
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn remove_by_company_drops_only_that_companys_rows() {
        let mut store = MemoryFlightStore::new();
        store.upsert(flight("u1", "Acme", 3)).unwrap();
        store.upsert(flight("u2", "Globex", 3)).unwrap();

        let removed = store.remove_by_company("Acme").unwrap();
        assert_eq!(removed, 1);
        assert!(store.find_by_unique_id("u1").unwrap().is_none());
        assert!(store.find_by_unique_id("u2").unwrap().is_some());
    }
}
