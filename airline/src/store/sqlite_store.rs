//! `sqlite`-backed DAO implementations: a schema bootstrapped via
//! `include_str!`, and a connection held directly (a `sqlite::Connection` is
//! `Send` but not `Sync`; callers serialize access through the node's own
//! lock, so no further synchronization is needed inside the store itself).

use std::path::Path;

use uuid::Uuid;

use super::{AirportStore, Client, ClientStore, FlightStore, TicketStore};
use crate::error::StorageError;
use crate::model::{Airport, City, Flight, FlightId, Ticket, TicketId};
use crate::store::Result;

pub struct SqliteFlightStore {
    db: sqlite::Connection,
}

impl SqliteFlightStore {
    const SCHEMA: &'static str = include_str!("schema/flights.sql");

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sqlite::Connection::open(path)?;
        db.execute(Self::SCHEMA)?;
        Ok(Self { db })
    }

    pub fn memory() -> Result<Self> {
        let db = sqlite::Connection::open(":memory:")?;
        db.execute(Self::SCHEMA)?;
        Ok(Self { db })
    }

    fn row_to_flight(row: &sqlite::Row) -> Flight {
        Flight {
            id: row.read::<i64, _>("id") as FlightId,
            unique_id: row.read::<&str, _>("unique_id").to_string(),
            company: row.read::<&str, _>("company").to_string(),
            origin: row.read::<&str, _>("origin").to_string(),
            destination: row.read::<&str, _>("destination").to_string(),
            price: row.read::<i64, _>("price") as u64,
            seats: row.read::<i64, _>("seats") as u32,
        }
    }
}

impl FlightStore for SqliteFlightStore {
    fn upsert(&mut self, flight: Flight) -> Result<Flight> {
        if let Some(existing) = self.find_by_unique_id(&flight.unique_id)? {
            return self.update_seats(&existing.unique_id, flight.seats);
        }
        self.db
            .prepare(
                "INSERT INTO flights (unique_id, company, origin, destination, price, seats)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )?
            .into_iter()
            .bind((1, flight.unique_id.as_str()))?
            .bind((2, flight.company.as_str()))?
            .bind((3, flight.origin.as_str()))?
            .bind((4, flight.destination.as_str()))?
            .bind((5, flight.price as i64))?
            .bind((6, flight.seats as i64))?
            .try_for_each(|row| row.map(|_| ()))?;

        self.find_by_unique_id(&flight.unique_id)?
            .ok_or(StorageError::NotFound)
    }

    fn find_by_id(&self, id: FlightId) -> Result<Option<Flight>> {
        let mut found = None;
        self.db
            .prepare("SELECT * FROM flights WHERE id = ?")?
            .into_iter()
            .bind((1, id as i64))?
            .try_for_each(|row| {
                found = Some(Self::row_to_flight(&row?));
                Ok::<_, sqlite::Error>(())
            })?;
        Ok(found)
    }

    fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<Flight>> {
        let mut found = None;
        self.db
            .prepare("SELECT * FROM flights WHERE unique_id = ?")?
            .into_iter()
            .bind((1, unique_id))?
            .try_for_each(|row| {
                found = Some(Self::row_to_flight(&row?));
                Ok::<_, sqlite::Error>(())
            })?;
        Ok(found)
    }

    fn find_by_company(&self, company: &str) -> Result<Vec<Flight>> {
        let mut rows = Vec::new();
        self.db
            .prepare("SELECT * FROM flights WHERE company = ?")?
            .into_iter()
            .bind((1, company))?
            .try_for_each(|row| {
                rows.push(Self::row_to_flight(&row?));
                Ok::<_, sqlite::Error>(())
            })?;
        Ok(rows)
    }

    fn update_seats(&mut self, unique_id: &str, seats: u32) -> Result<Flight> {
        self.db
            .prepare("UPDATE flights SET seats = ? WHERE unique_id = ?")?
            .into_iter()
            .bind((1, seats as i64))?
            .bind((2, unique_id))?
            .try_for_each(|row| row.map(|_| ()))?;

        self.find_by_unique_id(unique_id)?.ok_or(StorageError::NotFound)
    }

    fn remove_by_company(&mut self, company: &str) -> Result<usize> {
        let before = self.find_by_company(company)?.len();
        self.db
            .prepare("DELETE FROM flights WHERE company = ?")?
            .into_iter()
            .bind((1, company))?
            .try_for_each(|row| row.map(|_| ()))?;
        Ok(before)
    }

    fn all(&self) -> Result<Vec<Flight>> {
        let mut rows = Vec::new();
        self.db
            .prepare("SELECT * FROM flights")?
            .into_iter()
            .try_for_each(|row| {
                rows.push(Self::row_to_flight(&row?));
                Ok::<_, sqlite::Error>(())
            })?;
        Ok(rows)
    }
}

pub struct SqliteTicketStore {
    db: sqlite::Connection,
}

impl SqliteTicketStore {
    const SCHEMA: &'static str = include_str!("schema/tickets.sql");

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sqlite::Connection::open(path)?;
        db.execute(Self::SCHEMA)?;
        Ok(Self { db })
    }

    pub fn memory() -> Result<Self> {
        let db = sqlite::Connection::open(":memory:")?;
        db.execute(Self::SCHEMA)?;
        Ok(Self { db })
    }

    fn row_to_ticket(row: &sqlite::Row) -> Result<Ticket> {
        Ok(Ticket {
            id: row.read::<i64, _>("id") as TicketId,
            unique_id: row.read::<&str, _>("unique_id").to_string(),
            client_id: Uuid::parse_str(row.read::<&str, _>("client_id"))
                .map_err(|_| StorageError::NotFound)?,
            flight_id: row.read::<i64, _>("flight_id") as FlightId,
            source_city: row.read::<&str, _>("source_city").to_string(),
            destination_city: row.read::<&str, _>("destination_city").to_string(),
        })
    }
}

impl TicketStore for SqliteTicketStore {
    fn insert(&mut self, ticket: Ticket) -> Result<Ticket> {
        self.db
            .prepare(
                "INSERT INTO tickets (unique_id, client_id, flight_id, source_city, destination_city)
                 VALUES (?, ?, ?, ?, ?)",
            )?
            .into_iter()
            .bind((1, ticket.unique_id.as_str()))?
            .bind((2, ticket.client_id.to_string().as_str()))?
            .bind((3, ticket.flight_id as i64))?
            .bind((4, ticket.source_city.as_str()))?
            .bind((5, ticket.destination_city.as_str()))?
            .try_for_each(|row| row.map(|_| ()))?;

        let mut found = None;
        self.db
            .prepare("SELECT * FROM tickets WHERE id = last_insert_rowid()")?
            .into_iter()
            .try_for_each(|row| {
                found = Some(Self::row_to_ticket(&row?)?);
                Ok::<_, StorageError>(())
            })?;
        found.ok_or(StorageError::NotFound)
    }

    fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>> {
        let mut found = None;
        self.db
            .prepare("SELECT * FROM tickets WHERE id = ?")?
            .into_iter()
            .bind((1, id as i64))?
            .try_for_each(|row| {
                found = Some(Self::row_to_ticket(&row?)?);
                Ok::<_, StorageError>(())
            })?;
        Ok(found)
    }

    fn find_by_client(&self, client_id: Uuid) -> Result<Vec<Ticket>> {
        let mut rows = Vec::new();
        self.db
            .prepare("SELECT * FROM tickets WHERE client_id = ?")?
            .into_iter()
            .bind((1, client_id.to_string().as_str()))?
            .try_for_each(|row| {
                rows.push(Self::row_to_ticket(&row?)?);
                Ok::<_, StorageError>(())
            })?;
        Ok(rows)
    }

    fn delete(&mut self, id: TicketId) -> Result<bool> {
        self.db
            .prepare("DELETE FROM tickets WHERE id = ?")?
            .into_iter()
            .bind((1, id as i64))?
            .try_for_each(|row| row.map(|_| ()))?;
        Ok(self.db.change_count() > 0)
    }
}

pub struct SqliteAirportStore {
    db: sqlite::Connection,
}

impl SqliteAirportStore {
    const SCHEMA: &'static str = include_str!("schema/airports.sql");

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sqlite::Connection::open(path)?;
        db.execute(Self::SCHEMA)?;
        Ok(Self { db })
    }

    pub fn memory() -> Result<Self> {
        let db = sqlite::Connection::open(":memory:")?;
        db.execute(Self::SCHEMA)?;
        Ok(Self { db })
    }

    fn row_to_airport(row: &sqlite::Row) -> Airport {
        Airport {
            id: row.read::<&str, _>("id").to_string(),
            name: row.read::<&str, _>("name").to_string(),
            city: City {
                name: row.read::<&str, _>("city").to_string(),
                state: row.read::<&str, _>("state").to_string(),
                country: row.read::<&str, _>("country").to_string(),
                latitude: row.read::<f64, _>("latitude"),
                longitude: row.read::<f64, _>("longitude"),
            },
        }
    }
}

impl AirportStore for SqliteAirportStore {
    fn seed(&mut self, airports: Vec<Airport>) -> Result<()> {
        for airport in airports {
            self.db
                .prepare(
                    "INSERT OR REPLACE INTO airports (id, name, city, state, country, latitude, longitude)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )?
                .into_iter()
                .bind((1, airport.id.as_str()))?
                .bind((2, airport.name.as_str()))?
                .bind((3, airport.city.name.as_str()))?
                .bind((4, airport.city.state.as_str()))?
                .bind((5, airport.city.country.as_str()))?
                .bind((6, airport.city.latitude))?
                .bind((7, airport.city.longitude))?
                .try_for_each(|row| row.map(|_| ()))?;
        }
        Ok(())
    }

    fn all(&self) -> Result<Vec<Airport>> {
        let mut rows = Vec::new();
        self.db
            .prepare("SELECT * FROM airports")?
            .into_iter()
            .try_for_each(|row| {
                rows.push(Self::row_to_airport(&row?));
                Ok::<_, sqlite::Error>(())
            })?;
        Ok(rows)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Airport>> {
        let mut found = None;
        self.db
            .prepare("SELECT * FROM airports WHERE id = ?")?
            .into_iter()
            .bind((1, id))?
            .try_for_each(|row| {
                found = Some(Self::row_to_airport(&row?));
                Ok::<_, sqlite::Error>(())
            })?;
        Ok(found)
    }
}

pub struct SqliteClientStore {
    db: sqlite::Connection,
}

impl SqliteClientStore {
    const SCHEMA: &'static str = include_str!("schema/clients.sql");

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sqlite::Connection::open(path)?;
        db.execute(Self::SCHEMA)?;
        Ok(Self { db })
    }

    pub fn memory() -> Result<Self> {
        let db = sqlite::Connection::open(":memory:")?;
        db.execute(Self::SCHEMA)?;
        Ok(Self { db })
    }

    fn row_to_client(row: &sqlite::Row) -> Result<Client> {
        Ok(Client {
            id: Uuid::parse_str(row.read::<&str, _>("id")).map_err(|_| StorageError::NotFound)?,
            username: row.read::<&str, _>("username").to_string(),
            password: row.read::<&str, _>("password").to_string(),
            name: row.read::<&str, _>("name").to_string(),
        })
    }
}

impl ClientStore for SqliteClientStore {
    fn seed(&mut self, clients: Vec<Client>) -> Result<()> {
        for client in clients {
            self.db
                .prepare(
                    "INSERT OR REPLACE INTO clients (id, username, password, name)
                     VALUES (?, ?, ?, ?)",
                )?
                .into_iter()
                .bind((1, client.id.to_string().as_str()))?
                .bind((2, client.username.as_str()))?
                .bind((3, client.password.as_str()))?
                .bind((4, client.name.as_str()))?
                .try_for_each(|row| row.map(|_| ()))?;
        }
        Ok(())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Client>> {
        let mut found = None;
        self.db
            .prepare("SELECT * FROM clients WHERE username = ?")?
            .into_iter()
            .bind((1, username))?
            .try_for_each(|row| {
                found = Some(Self::row_to_client(&row?)?);
                Ok::<_, StorageError>(())
            })?;
        Ok(found)
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
    fn upsert_then_find_round_trips() {
        let mut store = SqliteFlightStore::memory().unwrap();
        let inserted = store.upsert(flight("u1", "Acme", 3)).unwrap();
        assert_ne!(inserted.id, 0);

        let same = store.upsert(flight("u1", "Acme", 1)).unwrap();
        assert_eq!(same.id, inserted.id);
        assert_eq!(same.seats, 1);
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn remove_by_company() {
        let mut store = SqliteFlightStore::memory().unwrap();
        store.upsert(flight("u1", "Acme", 3)).unwrap();
        store.upsert(flight("u2", "Globex", 1)).unwrap();

        assert_eq!(store.remove_by_company("Acme").unwrap(), 1);
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn ticket_insert_find_delete() {
        let mut store = SqliteTicketStore::memory().unwrap();
        let ticket = Ticket {
            id: 0,
            unique_id: "u1".into(),
            client_id: Uuid::new_v4(),
            flight_id: 1,
            source_city: "Sao Paulo".into(),
            destination_city: "New York".into(),
        };
        let inserted = store.insert(ticket).unwrap();
        assert!(store.find_by_id(inserted.id).unwrap().is_some());
        assert!(store.delete(inserted.id).unwrap());
        assert!(store.find_by_id(inserted.id).unwrap().is_none());
    }
}
