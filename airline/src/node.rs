//! The node: the single point of shared mutable state. Clock, membership
//! registry, session store and coordination log sit behind one
//! `tokio::sync::RwLock` (`NodeState`); every mutation takes exclusive mode,
//! and the lock is never held across an outbound network call.

use std::collections::HashMap;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::clock::{Ordering, VectorClock};
use crate::log::{Kind, LogRing, Status};
use crate::registry::{Connection, Registry};
use crate::session::{Session, SessionStore};
use crate::snapshot::Snapshot;

/// Everything a node mutates as a unit. Readers take shared mode; every
/// mutating operation (connection add/remove/status, clock increment/merge,
/// session insert/delete, log append) takes exclusive mode.
#[derive(Debug)]
pub struct NodeState {
    pub server_name: String,
    pub address: String,
    pub port: u16,
    pub clock: VectorClock,
    pub registry: Registry,
    pub sessions: SessionStore,
    pub log: LogRing,
    /// Per-flight (keyed by `uniqueId`) clock last applied by a broadcast, used
    /// to break ties when two broadcasts for the same flight arrive
    /// CONCURRENT: the receiver then keeps the lower seat count.
    pub last_seen_clocks: HashMap<String, VectorClock>,
}

/// A node: stable identity plus the single lock guarding its mutable state.
#[derive(Debug)]
pub struct Node {
    pub id: Uuid,
    state: RwLock<NodeState>,
}

impl Node {
    pub fn new(id: Uuid, server_name: String, address: String, port: u16) -> Self {
        Self {
            id,
            state: RwLock::new(NodeState {
                server_name,
                address,
                port,
                clock: VectorClock::new(),
                registry: Registry::new(),
                sessions: SessionStore::new(),
                log: LogRing::new(),
                last_seen_clocks: HashMap::new(),
            }),
        }
    }

    /// Rehydrate a node from a persisted snapshot. Listen address/port are
    /// taken from the snapshot as well, but callers that override them from
    /// fresh configuration should do so immediately after construction.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            id: snapshot.server_id,
            state: RwLock::new(NodeState {
                server_name: snapshot.server_name,
                address: snapshot.address,
                port: snapshot.port,
                clock: snapshot.vector_clock,
                registry: snapshot.connections,
                sessions: SessionStore::new(),
                log: snapshot.log,
                last_seen_clocks: HashMap::new(),
            }),
        }
    }

    /// Snapshot the persisted subset of state, for writing to disk on
    /// shutdown. Sessions are deliberately excluded: a restart invalidates
    /// all tokens.
    pub async fn to_snapshot(&self) -> Snapshot {
        let state = self.state.read().await;
        Snapshot {
            server_name: state.server_name.clone(),
            server_id: self.id,
            address: state.address.clone(),
            port: state.port,
            log: state.log.clone(),
            vector_clock: state.clock.clone(),
            connections: state.registry.clone(),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.state.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.state.write().await
    }

    pub async fn name(&self) -> String {
        self.state.read().await.server_name.clone()
    }

    /// Increment this node's own counter and return a snapshot of the clock,
    /// for stamping an outbound message. Per the clock's contract this must
    /// happen before the message is built.
    pub async fn bump_clock(&self) -> VectorClock {
        let mut state = self.state.write().await;
        state.clock.increment(self.id);
        state.clock.clone()
    }

    pub async fn merge_clock(&self, received: &VectorClock) {
        let mut state = self.state.write().await;
        state.clock.merge(received);
    }

    pub async fn clock_snapshot(&self) -> VectorClock {
        self.state.read().await.clock.clone()
    }

    /// Register a newly-joined peer as online. Refuses to insert `self.id`
    /// as a peer, so a node that dials its own address never ends up
    /// heartbeating or broadcasting to itself.
    pub async fn add_peer(&self, id: Uuid, conn: Connection) {
        if id == self.id {
            return;
        }
        let mut state = self.state.write().await;
        state.registry.insert(id, conn);
    }

    pub async fn remove_peer(&self, id: &Uuid) -> Option<Connection> {
        let mut state = self.state.write().await;
        state.registry.remove(id)
    }

    pub async fn set_peer_online(&self, id: &Uuid, online: bool) {
        let mut state = self.state.write().await;
        state.registry.set_online(id, online);
    }

    pub async fn peer_by_name(&self, name: &str) -> Option<(Uuid, Connection)> {
        let state = self.state.read().await;
        state
            .registry
            .find_by_name(name)
            .map(|(id, conn)| (id, conn.clone()))
    }

    pub async fn peers(&self) -> Vec<(Uuid, Connection)> {
        let state = self.state.read().await;
        state
            .registry
            .iter()
            .map(|(id, conn)| (*id, conn.clone()))
            .collect()
    }

    pub async fn create_session(&self, client_id: Uuid) -> Option<Uuid> {
        let mut state = self.state.write().await;
        if state.sessions.find_by_client(client_id).is_some() {
            return None;
        }
        Some(state.sessions.insert(Session::new(client_id)))
    }

    pub async fn session_by_token(&self, token: &str) -> Option<Session> {
        let mut state = self.state.write().await;
        state.sessions.session_if_exists(token).cloned()
    }

    pub async fn remove_session(&self, id: &Uuid) -> Option<Session> {
        let mut state = self.state.write().await;
        state.sessions.remove(id)
    }

    /// Apply `f` to the session `id`, if it exists, returning its result.
    /// Used for wishlist mutation without exposing the session map directly.
    pub async fn mutate_session<R>(&self, id: &Uuid, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut state = self.state.write().await;
        state.sessions.get_mut(id).map(f)
    }

    pub async fn sweep_sessions(&self, limit: std::time::Duration) -> Vec<Session> {
        let mut state = self.state.write().await;
        state.sessions.sweep(limit, std::time::SystemTime::now())
    }

    pub async fn record(&self, kind: Kind, status: Status, payload: impl Into<String>) {
        let mut state = self.state.write().await;
        state.log.record(kind, status, payload);
    }

    /// Decide whether an incoming broadcast's seat count should replace the
    /// replica's current one, applying the concurrent-update tie-break:
    /// last-write-wins, except when the incoming clock compares CONCURRENT
    /// against the last clock seen for this flight, in which case the lower
    /// seat count is kept.
    pub async fn accept_broadcast(
        &self,
        unique_id: &str,
        incoming_clock: &VectorClock,
        current_seats: u32,
        incoming_seats: u32,
    ) -> u32 {
        let mut state = self.state.write().await;
        let accepted = match state.last_seen_clocks.get(unique_id) {
            Some(last) if VectorClock::compare(last, incoming_clock) == Ordering::Concurrent => {
                current_seats.min(incoming_seats)
            }
            _ => incoming_seats,
        };
        state
            .last_seen_clocks
            .insert(unique_id.to_string(), incoming_clock.clone());
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bump_clock_is_monotonic_under_concurrent_callers() {
        let node = Node::new(Uuid::new_v4(), "alpha".into(), "127.0.0.1".into(), 9999);
        let mut last = 0;
        for _ in 0..10 {
            let clock = node.bump_clock().await;
            let current = clock.get(&node.id);
            assert!(current > last);
            last = current;
        }
    }

    #[tokio::test]
    async fn concurrent_broadcast_keeps_the_lower_seat_count() {
        let node = Node::new(Uuid::new_v4(), "alpha".into(), "127.0.0.1".into(), 9999);
        let peer_a = Uuid::new_v4();
        let peer_b = Uuid::new_v4();

        let first_clock = VectorClock::from(HashMap::from([(peer_a, 1), (peer_b, 0)]));
        let accepted_first = node
            .accept_broadcast("u1", &first_clock, 5, 4)
            .await;
        assert_eq!(accepted_first, 4, "first broadcast just applies last-write-wins");

        let concurrent_clock = VectorClock::from(HashMap::from([(peer_a, 0), (peer_b, 1)]));
        let accepted_second = node
            .accept_broadcast("u1", &concurrent_clock, 4, 6)
            .await;
        assert_eq!(
            accepted_second, 4,
            "concurrent update must keep the lower seat count"
        );
    }

    #[tokio::test]
    async fn sequential_broadcast_applies_last_write_wins() {
        let node = Node::new(Uuid::new_v4(), "alpha".into(), "127.0.0.1".into(), 9999);
        let peer = Uuid::new_v4();

        let earlier = VectorClock::from(HashMap::from([(peer, 1)]));
        node.accept_broadcast("u1", &earlier, 5, 4).await;

        let later = VectorClock::from(HashMap::from([(peer, 2)]));
        let accepted = node.accept_broadcast("u1", &later, 4, 2).await;
        assert_eq!(accepted, 2);
    }

    #[tokio::test]
    async fn at_most_one_session_per_client() {
        let node = Node::new(Uuid::new_v4(), "alpha".into(), "127.0.0.1".into(), 9999);
        let client = Uuid::new_v4();

        assert!(node.create_session(client).await.is_some());
        assert!(node.create_session(client).await.is_none());
    }

    #[tokio::test]
    async fn add_peer_refuses_to_insert_self() {
        let id = Uuid::new_v4();
        let node = Node::new(id, "alpha".into(), "127.0.0.1".into(), 9999);

        node.add_peer(
            id,
            Connection {
                name: "alpha".into(),
                address: "127.0.0.1".into(),
                port: 9999,
                is_online: true,
            },
        )
        .await;

        assert!(node.peers().await.is_empty());
    }
}
