//! The session sweeper: reaps sessions idle longer than the session limit.

use std::time::Duration;

use crate::context::Context;

pub async fn run(ctx: Context, interval: Duration, session_limit: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let reaped = ctx.node.sweep_sessions(session_limit).await;
        if !reaped.is_empty() {
            tracing::info!(count = reaped.len(), "reaped idle sessions");
        }
    }
}
