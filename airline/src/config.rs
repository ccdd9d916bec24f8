//! Tunables for the coordination core. `airline-node` layers environment
//! variables and CLI flags on top of these defaults; the core itself only
//! ever sees the merged, immutable [`Config`].

use std::time::Duration;

/// Liveness monitor tick interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Per-peer heartbeat request timeout.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(3);

/// Session sweeper tick interval.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default listen port when neither env nor CLI override it.
pub const DEFAULT_PORT: u16 = 9999;

/// Default directory for the vars snapshot and the sqlite database file.
pub const DEFAULT_HOME: &str = "./data";

/// Node-wide runtime configuration, assembled once at startup and shared
/// read-only for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub home: String,
    pub heartbeat_interval: Duration,
    pub sweep_interval: Duration,
    pub session_limit: Duration,
    pub ephemeral: bool,
    /// Seed the demo airport/client/flight fixtures on startup.
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "airline-node".to_string(),
            address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            home: DEFAULT_HOME.to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            session_limit: crate::session::SESSION_TIME_LIMIT,
            ephemeral: false,
            seed: false,
        }
    }
}
