//! Persisted node variables: the subset of [`crate::node::NodeState`] that
//! survives a restart. Everything else (sessions, listen address/port) is
//! re-derived from [`crate::config::Config`] on the next startup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::VectorClock;
use crate::error::SnapshotError;
use crate::log::LogRing;
use crate::registry::Registry;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub server_name: String,
    pub server_id: Uuid,
    pub address: String,
    pub port: u16,
    pub log: LogRing,
    pub vector_clock: VectorClock,
    pub connections: Registry,
}

impl Snapshot {
    pub fn fresh(server_name: String, server_id: Uuid, address: String, port: u16) -> Self {
        Self {
            server_name,
            server_id,
            address,
            port,
            log: LogRing::new(),
            vector_clock: VectorClock::new(),
            connections: Registry::new(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load the snapshot at `path`. A missing or malformed file is not an
    /// error here: callers fall back to [`Snapshot::fresh`] (see
    /// `load_or_fresh`) rather than failing startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Load the snapshot at `path`, or synthesize a fresh identity if it is
    /// missing or fails to parse. Logs at `warn` on the fallback path.
    pub fn load_or_fresh(
        path: impl AsRef<Path>,
        server_name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        match Self::load(&path) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!(
                    "no usable snapshot at {}: {err}; starting with a fresh identity",
                    path.as_ref().display()
                );
                Self::fresh(server_name.into(), Uuid::new_v4(), address.into(), port)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.json");

        let snapshot = Snapshot::fresh("alpha".into(), Uuid::new_v4(), "127.0.0.1".into(), 9999);
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.server_name, "alpha");
        assert_eq!(loaded.server_id, snapshot.server_id);
    }

    #[test]
    fn missing_file_falls_back_to_fresh_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");

        let snapshot = Snapshot::load_or_fresh(&path, "alpha", "127.0.0.1", 9999);
        assert_eq!(snapshot.server_name, "alpha");
        assert!(snapshot.connections.is_empty());
    }

    #[test]
    fn malformed_file_falls_back_to_fresh_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.json");
        std::fs::write(&path, b"not json").unwrap();

        let snapshot = Snapshot::load_or_fresh(&path, "alpha", "127.0.0.1", 9999);
        assert_eq!(snapshot.server_name, "alpha");
    }
}
