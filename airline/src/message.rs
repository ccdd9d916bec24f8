//! The peer wire envelope. Bodies are intentionally polymorphic (a string,
//! a map, a [`crate::model::Flight`], or a list of flights); handlers
//! re-parse the expected shape out of the raw JSON value and reject
//! anything else as a protocol error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::clock::VectorClock;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub from: Uuid,
    /// Empty string when the message has no specific recipient in mind
    /// (e.g. a reply), mirroring the reference wire format.
    #[serde(default)]
    pub to: Option<Uuid>,
    pub vector_clock: VectorClock,
    pub body: Value,
}

impl Message {
    /// Stamp a new outbound message. The caller must increment its own
    /// clock counter *before* calling this, per the clock's contract.
    pub fn new(from: Uuid, to: Option<Uuid>, clock: VectorClock, body: impl Serialize) -> Self {
        Self {
            id: Uuid::now_v7(),
            from,
            to,
            vector_clock: clock,
            body: serde_json::to_value(body).unwrap_or(Value::Null),
        }
    }

    /// Parse the body into `T`, failing with a descriptive protocol error.
    pub fn body_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, crate::Error> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| crate::Error::MalformedBody(e.to_string()))
    }
}
