//! Process entry point: merge configuration (env then CLI), rehydrate or
//! create the node, assemble persistence, bind the HTTP surface (client REST
//! plus peer wire protocol), and run the heartbeat/sweeper/shutdown
//! lifecycle.

mod client;
mod context;
mod error;
mod fixtures;
mod join;
mod liveness;
mod outbound;
mod peer;
mod shutdown;
mod singleton;
mod sweeper;
#[cfg(test)]
mod test;

use std::net::SocketAddr;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use airline::config::Config;
use airline::node::Node;
use airline::snapshot::Snapshot;
use airline::store::{
    AirportStore, ClientStore, FlightStore, MemoryAirportStore, MemoryClientStore,
    MemoryFlightStore, MemoryTicketStore, SqliteAirportStore, SqliteClientStore,
    SqliteFlightStore, SqliteTicketStore, TicketStore,
};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::Router;
use tower_http::cors::{self, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use context::Context;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (config, peers) = match parse_options() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("airline-node: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = run(config, peers).await {
        tracing::error!("fatal: {err:#}");
        process::exit(1);
    }
}

/// A `host:port` peer to auto-join at startup, e.g. `--peer 10.0.0.2:9999`.
fn parse_peer(value: &str) -> anyhow::Result<(String, u16)> {
    let (address, port) = value
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("peer must be host:port, got {value:?}"))?;
    let port: u16 = port.parse()?;
    Ok((address.to_string(), port))
}

/// Detect the machine's non-loopback IPv4 address so peers dialing us back
/// see a routable address rather than `127.0.0.1`. Connecting a UDP socket
/// never sends a packet; it only asks the kernel which local interface
/// would be used to route to the given remote, which is enough to read back
/// our outbound address. Falls back to loopback on any failure (no network
/// interface, sandboxed environment, ...).
fn detect_local_address() -> String {
    use std::net::UdpSocket;

    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Build the layered [`Config`]: defaults, then environment variables
/// (`PORT`, `AIRLINE_HOME`), then CLI flags, each overriding the last. Also
/// collects `--peer` values, which are a startup instruction rather than a
/// durable config tunable.
fn parse_options() -> anyhow::Result<(Config, Vec<(String, u16)>)> {
    use lexopt::prelude::*;

    let mut config = Config::default();
    config.address = detect_local_address();

    if let Ok(port) = std::env::var("PORT") {
        if let Ok(port) = port.parse() {
            config.port = port;
        }
    }
    if let Ok(home) = std::env::var("AIRLINE_HOME") {
        config.home = home;
    }

    let mut peers = Vec::new();
    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Long("name") => config.name = parser.value()?.parse()?,
            Long("address") => config.address = parser.value()?.parse()?,
            Long("port") => config.port = parser.value()?.parse()?,
            Long("listen") => {
                let value: String = parser.value()?.parse()?;
                let (address, port) = parse_peer(&value)?;
                config.address = address;
                config.port = port;
            }
            Long("home") => config.home = parser.value()?.parse()?,
            Long("heartbeat-interval") => {
                let secs: u64 = parser.value()?.parse()?;
                config.heartbeat_interval = Duration::from_secs(secs);
            }
            Long("session-limit") => {
                let secs: u64 = parser.value()?.parse()?;
                config.session_limit = Duration::from_secs(secs);
            }
            Long("peer") => {
                let value: String = parser.value()?.parse()?;
                peers.push(parse_peer(&value)?);
            }
            Long("ephemeral") => config.ephemeral = true,
            Long("seed") => config.seed = true,
            Long("help") | Short('h') => {
                println!(
                    "usage: airline-node [--name <name>] [--address <addr>] [--port <port>] \
                     [--listen <addr:port>] [--home <dir>] [--heartbeat-interval <secs>] \
                     [--session-limit <secs>] [--peer <addr:port>]... [--ephemeral] [--seed]"
                );
                process::exit(0);
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok((config, peers))
}

async fn run(config: Config, peers: Vec<(String, u16)>) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.home)?;
    let _home_lock = singleton::HomeLock::acquire(&config.home)?;
    let vars_path = Path::new(&config.home).join("vars.json");

    let snapshot = Snapshot::load_or_fresh(
        &vars_path,
        config.name.clone(),
        config.address.clone(),
        config.port,
    );
    let node = Node::from_snapshot(snapshot);
    {
        // CLI/env configuration always wins over whatever address/port the
        // snapshot persisted. Only the identity survives a restart.
        let mut state = node.write().await;
        state.server_name = config.name.clone();
        state.address = config.address.clone();
        state.port = config.port;
    }
    let node = Arc::new(node);

    let (flights, tickets, airports, clients): (
        Box<dyn FlightStore>,
        Box<dyn TicketStore>,
        Box<dyn AirportStore>,
        Box<dyn ClientStore>,
    ) = if config.ephemeral {
        (
            Box::new(MemoryFlightStore::new()),
            Box::new(MemoryTicketStore::new()),
            Box::new(MemoryAirportStore::new()),
            Box::new(MemoryClientStore::new()),
        )
    } else {
        let home = Path::new(&config.home);
        (
            Box::new(SqliteFlightStore::open(home.join("flights.db"))?),
            Box::new(SqliteTicketStore::open(home.join("tickets.db"))?),
            Box::new(SqliteAirportStore::open(home.join("airports.db"))?),
            Box::new(SqliteClientStore::open(home.join("clients.db"))?),
        )
    };

    let ctx = Context::new(node, flights, tickets, airports, clients, config.clone());

    if config.seed {
        fixtures::seed(&ctx).await?;
    }

    let app = Router::new()
        .merge(client::router(ctx.clone()))
        .merge(peer::router(ctx.clone()))
        .merge(join::router(ctx.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION]),
        );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, name = %config.name, "airline-node listening");

    tokio::spawn(liveness::run(ctx.clone(), config.heartbeat_interval));
    tokio::spawn(sweeper::run(
        ctx.clone(),
        airline::config::DEFAULT_SWEEP_INTERVAL,
        config.session_limit,
    ));

    for (address, port) in peers {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(err) = join::initiate_join(&ctx, &address, port).await {
                tracing::warn!(%address, port, error = %err, "startup peer join failed");
            }
        });
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await?;

    ctx.drain_broadcasts(Duration::from_secs(10)).await;

    let snapshot = ctx.node.to_snapshot().await;
    if let Err(err) = snapshot.save(&vars_path) {
        tracing::error!(error = %err, "failed to save snapshot on shutdown");
    }

    Ok(())
}
