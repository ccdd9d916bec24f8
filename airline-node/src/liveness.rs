//! The heartbeat scheduler: one periodic tick that snapshots the registry
//! under a read lock and dispatches an independent send per peer.

use std::time::Duration;

use crate::context::Context;
use crate::outbound;

pub async fn run(ctx: Context, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let peers = ctx.node.peers().await;
        for (id, conn) in peers {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                match outbound::heartbeat(&ctx, &id, &conn).await {
                    Ok(_) => ctx.node.set_peer_online(&id, true).await,
                    Err(err) => {
                        tracing::warn!(peer = %conn.name, error = %err, "heartbeat failed");
                        ctx.node.set_peer_online(&id, false).await;
                    }
                }
            });
        }
    }
}
