//! Background reaper: periodically expires queries, evicts idle nodes, and
//! caps memory, sharing the single global mutex with request handlers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::info;

use crate::clock::Clock;
use crate::config::Config;
use crate::core::Core;

/// Spawns the sweep loop as a cooperative background task.
///
/// The task never blocks handlers beyond the single mutex it shares with
/// them, and it never panics the process: any would-be error is a no-op
/// count of zero, since `Core::sweep` itself cannot fail. It stops as soon
/// as `shutdown` is notified, mirroring the teacher's graceful-shutdown
/// signal handling in `server.rs`.
pub fn spawn(
    core: Arc<tokio::sync::Mutex<Core>>,
    config: Arc<Config>,
    clock: Arc<Clock>,
    shutdown: Arc<Notify>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval = Duration::from_secs(config.sweep_interval_secs.max(1));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.notified() => {
                    info!("reaper stopping");
                    break;
                }
            }

            let now = clock.now();
            let summary = {
                let mut guard = core.lock().await;
                guard.sweep(&config, now)
            };

            if summary.expired_queries > 0 || summary.evicted_nodes > 0 || summary.capped_queries > 0
            {
                info!(
                    expired_queries = summary.expired_queries,
                    evicted_nodes = summary.evicted_nodes,
                    capped_queries = summary.capped_queries,
                    "reaper sweep completed"
                );
            }
        }
    })
}
