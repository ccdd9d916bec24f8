use thiserror::Error;

/// Errors raised by the coordination core. The HTTP surface (in `airline-node`)
/// maps these onto status codes; this crate has no notion of HTTP.
#[derive(Error, Debug)]
pub enum Error {
    #[error("flight not found: {0}")]
    FlightNotFound(String),

    #[error("ticket not found")]
    TicketNotFound,

    #[error("peer not found: {0}")]
    PeerNotFound(String),

    #[error("not available seats")]
    NoSeatsAvailable,

    #[error("session not found")]
    SessionNotFound,

    #[error("client already has an active session")]
    AlreadyLoggedIn,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("client not found")]
    ClientNotFound,

    #[error("malformed message body: {0}")]
    MalformedBody(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the persistence adapter (`crate::store`).
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlite::Error),
    #[error("row not found")]
    NotFound,
}

/// Errors from loading or saving the node's vars snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("(de)serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
