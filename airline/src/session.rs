//! In-memory client sessions: token -> session, with an idle-reaping sweeper.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::FlightId;

/// Sessions idle longer than this are reaped by the sweeper.
pub const SESSION_TIME_LIMIT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub client_id: Uuid,
    pub last_active: SystemTime,
    pub wishlist: Vec<FlightId>,
}

impl Session {
    pub fn new(client_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            last_active: SystemTime::now(),
            wishlist: Vec::new(),
        }
    }

    pub fn is_idle(&self, limit: Duration, now: SystemTime) -> bool {
        now.duration_since(self.last_active).unwrap_or_default() > limit
    }

    fn touch(&mut self, now: SystemTime) {
        self.last_active = now;
    }
}

/// Token (session id) -> [`Session`]. Part of the node's single lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStore(HashMap<Uuid, Session>);

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// At most one active session per client.
    pub fn find_by_client(&self, client_id: Uuid) -> Option<&Session> {
        self.0.values().find(|s| s.client_id == client_id)
    }

    pub fn insert(&mut self, session: Session) -> Uuid {
        let id = session.id;
        self.0.insert(id, session);
        id
    }

    /// Parses `token` as a session id, refreshes `last_active` and returns it.
    pub fn session_if_exists(&mut self, token: &str) -> Option<&Session> {
        let id = Uuid::parse_str(token).ok()?;
        let session = self.0.get_mut(&id)?;
        session.touch(SystemTime::now());
        Some(&*session)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Session> {
        self.0.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Session> {
        self.0.get_mut(id)
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Session> {
        self.0.remove(id)
    }

    /// Remove and return sessions idle longer than `limit` as of `now`.
    pub fn sweep(&mut self, limit: Duration, now: SystemTime) -> Vec<Session> {
        let expired: Vec<Uuid> = self
            .0
            .iter()
            .filter(|(_, s)| s.is_idle(limit, now))
            .map(|(id, _)| *id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.0.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_reaps_only_idle_sessions() {
        let mut store = SessionStore::new();
        let fresh = Session::new(Uuid::new_v4());
        let mut stale = Session::new(Uuid::new_v4());
        stale.last_active = SystemTime::now() - Duration::from_secs(3600);

        let fresh_id = store.insert(fresh);
        let stale_id = store.insert(stale);

        let reaped = store.sweep(SESSION_TIME_LIMIT, SystemTime::now());
        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].id, stale_id);
        assert!(store.get(&fresh_id).is_some());
        assert!(store.get(&stale_id).is_none());
    }

    #[test]
    fn at_most_one_session_per_client() {
        let mut store = SessionStore::new();
        let client = Uuid::new_v4();
        store.insert(Session::new(client));

        assert!(store.find_by_client(client).is_some());
    }
}
