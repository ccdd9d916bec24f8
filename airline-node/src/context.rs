//! Shared state handed into the axum router: one `Arc`-wrapped value,
//! cloned cheaply per request.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use airline::config::Config;
use airline::node::Node;
use airline::store::{AirportStore, ClientStore, FlightStore, TicketStore};
use tokio::sync::{Mutex, Notify};

pub struct ContextInner {
    pub node: Arc<Node>,
    pub flights: Mutex<Box<dyn FlightStore>>,
    pub tickets: Mutex<Box<dyn TicketStore>>,
    pub airports: Mutex<Box<dyn AirportStore>>,
    pub clients: Mutex<Box<dyn ClientStore>>,
    pub http: reqwest::Client,
    pub config: Config,
    /// The async analogue of a wait group: every broadcast fan-out spawned
    /// via [`Context::spawn_broadcast`] is counted here so shutdown can
    /// drain outstanding sends before snapshotting.
    outstanding_broadcasts: AtomicUsize,
    broadcasts_idle: Notify,
}

#[derive(Clone)]
pub struct Context(Arc<ContextInner>);

impl Context {
    pub fn new(
        node: Arc<Node>,
        flights: Box<dyn FlightStore>,
        tickets: Box<dyn TicketStore>,
        airports: Box<dyn AirportStore>,
        clients: Box<dyn ClientStore>,
        config: Config,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with static configuration");

        Self(Arc::new(ContextInner {
            node,
            flights: Mutex::new(flights),
            tickets: Mutex::new(tickets),
            airports: Mutex::new(airports),
            clients: Mutex::new(clients),
            http,
            config,
            outstanding_broadcasts: AtomicUsize::new(0),
            broadcasts_idle: Notify::new(),
        }))
    }

    /// Spawn a broadcast fan-out as its own task, the way a wait group would
    /// track an outbound send, so [`Context::drain_broadcasts`] can wait for
    /// it on shutdown without holding any lock across the send.
    pub fn spawn_broadcast(&self, fut: impl Future<Output = ()> + Send + 'static) {
        self.0.outstanding_broadcasts.fetch_add(1, Ordering::SeqCst);
        let inner = self.0.clone();
        tokio::spawn(async move {
            fut.await;
            if inner.outstanding_broadcasts.fetch_sub(1, Ordering::SeqCst) == 1 {
                inner.broadcasts_idle.notify_waiters();
            }
        });
    }

    /// Wait for every outstanding broadcast to finish, or `timeout` to
    /// elapse, whichever comes first.
    pub async fn drain_broadcasts(&self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.0.outstanding_broadcasts.load(Ordering::SeqCst) > 0 {
            if tokio::time::timeout_at(deadline, self.0.broadcasts_idle.notified())
                .await
                .is_err()
            {
                tracing::warn!("timed out draining broadcasts on shutdown");
                break;
            }
        }
    }
}

impl std::ops::Deref for Context {
    type Target = ContextInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
