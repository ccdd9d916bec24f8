//! Membership registry: the map of known peers and their liveness.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A known peer's connection details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub is_online: bool,
}

/// Peer-id -> [`Connection`]. `self.id` must never appear as a key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry(HashMap<Uuid, Connection>);

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Connection> {
        self.0.get(id)
    }

    pub fn insert(&mut self, id: Uuid, conn: Connection) {
        self.0.insert(id, conn);
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Connection> {
        self.0.remove(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.0.contains_key(id)
    }

    /// Linear scan by name; federation size is small enough that this is fine.
    pub fn find_by_name(&self, name: &str) -> Option<(Uuid, &Connection)> {
        self.0
            .iter()
            .find(|(_, conn)| conn.name == name)
            .map(|(id, conn)| (*id, conn))
    }

    pub fn set_online(&mut self, id: &Uuid, online: bool) {
        if let Some(conn) = self.0.get_mut(id) {
            conn.is_online = online;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &Connection)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<Uuid, Connection> {
        &self.0
    }
}

impl From<HashMap<Uuid, Connection>> for Registry {
    fn from(map: HashMap<Uuid, Connection>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_id_is_never_inserted_by_the_registry_itself() {
        // The registry has no notion of "self"; callers are responsible for
        // never inserting their own id. This test documents that the type
        // imposes no such check, and exercises basic CRUD instead.
        let mut reg = Registry::new();
        let id = Uuid::new_v4();
        reg.insert(
            id,
            Connection {
                name: "alpha".into(),
                address: "10.0.0.1".into(),
                port: 9999,
                is_online: true,
            },
        );
        assert!(reg.contains(&id));
        assert_eq!(reg.find_by_name("alpha").unwrap().0, id);

        reg.set_online(&id, false);
        assert!(!reg.get(&id).unwrap().is_online);

        reg.remove(&id);
        assert!(!reg.contains(&id));
    }
}
