use serde::{Deserialize, Serialize};

/// Local surrogate row id. `0` means "not yet assigned a local row"; catalog
/// transfer zeroes it so the receiver assigns a fresh local id on insert.
pub type FlightId = u64;

/// A flight. Exactly one node -- the one named by `company` -- is the
/// authoritative owner of `seats`; every other node holds a replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    #[serde(default)]
    pub id: FlightId,
    pub unique_id: String,
    pub company: String,
    pub origin: String,
    pub destination: String,
    pub price: u64,
    pub seats: u32,
}

impl Flight {
    pub fn is_owned_by(&self, name: &str) -> bool {
        self.company == name
    }
}
