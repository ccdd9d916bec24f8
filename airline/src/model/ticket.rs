use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FlightId;

pub type TicketId = u64;

/// A ticket, owned by the node where the purchase was initiated.
/// `unique_id` ties it to the flight across the federation even though
/// `flight_id` is only meaningful as a local row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(default)]
    pub id: TicketId,
    pub unique_id: String,
    pub client_id: Uuid,
    pub flight_id: FlightId,
    pub source_city: String,
    pub destination_city: String,
}
