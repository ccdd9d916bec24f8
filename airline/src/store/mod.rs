//! The persistence adapter: DAO traits standing in for the (out-of-scope)
//! relational layer, plus an in-memory and a `sqlite`-backed implementation
//! of each. Callers depend only on the traits.

mod memory;
mod sqlite_store;

pub use memory::{MemoryAirportStore, MemoryClientStore, MemoryFlightStore, MemoryTicketStore};
pub use sqlite_store::{SqliteAirportStore, SqliteClientStore, SqliteFlightStore, SqliteTicketStore};

use uuid::Uuid;

use crate::error::StorageError;
use crate::model::{Airport, Flight, FlightId, Ticket, TicketId};

pub type Result<T> = std::result::Result<T, StorageError>;

/// A registered client, seeded from fixtures; not mutated by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub name: String,
}

pub trait FlightStore: Send {
    /// Insert or, if a row with the same `unique_id` already exists, upsert
    /// it: overwrite `seats` and leave every other field unchanged. Returns
    /// the stored row with its (possibly freshly-assigned) local id.
    fn upsert(&mut self, flight: Flight) -> Result<Flight>;
    fn find_by_id(&self, id: FlightId) -> Result<Option<Flight>>;
    fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<Flight>>;
    fn find_by_company(&self, company: &str) -> Result<Vec<Flight>>;
    fn update_seats(&mut self, unique_id: &str, seats: u32) -> Result<Flight>;
    fn remove_by_company(&mut self, company: &str) -> Result<usize>;
    fn all(&self) -> Result<Vec<Flight>>;
}

pub trait TicketStore: Send {
    fn insert(&mut self, ticket: Ticket) -> Result<Ticket>;
    fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>>;
    fn find_by_client(&self, client_id: Uuid) -> Result<Vec<Ticket>>;
    fn delete(&mut self, id: TicketId) -> Result<bool>;
}

pub trait AirportStore: Send {
    fn seed(&mut self, airports: Vec<Airport>) -> Result<()>;
    fn all(&self) -> Result<Vec<Airport>>;
    fn find_by_id(&self, id: &str) -> Result<Option<Airport>>;
}

pub trait ClientStore: Send {
    fn seed(&mut self, clients: Vec<Client>) -> Result<()>;
    fn find_by_username(&self, username: &str) -> Result<Option<Client>>;
}
