use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::processor::QueueProcessor;

/// Handle to `n` independent poll loops sharing one processor.
/// - `request_shutdown` stops them taking new messages; in-flight work finishes
/// - dropping the group also stops every loop
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    pub fn spawn(n: usize, processor: Arc<QueueProcessor>, poll_interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let joins = (0..n)
            .map(|worker_id| {
                let processor = Arc::clone(&processor);
                let rx = shutdown_rx.clone();
                tokio::spawn(poll_loop(worker_id, processor, poll_interval, rx))
            })
            .collect();

        Self { shutdown_tx, joins }
    }

    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// True once every loop has exited (shutdown or fatal error).
    pub fn is_finished(&self) -> bool {
        self.joins.iter().all(|j| j.is_finished())
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            if let Err(err) = join.await {
                warn!(error = %err, "poll loop ended abnormally");
            }
        }
    }
}

async fn poll_loop(
    worker_id: usize,
    processor: Arc<QueueProcessor>,
    poll_interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        match processor.poll_once().await {
            Ok(_) => {}
            Err(err) if err.is_fatal() => {
                error!(worker_id, error = %err, "fatal error, stopping poll loop");
                break;
            }
            Err(err) => warn!(worker_id, error = %err, "poll failed"),
        }
    }
    info!(worker_id, "poll loop stopped");
}
