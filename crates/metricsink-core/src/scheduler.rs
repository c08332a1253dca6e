use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::EtlPipeline;

/// Start the recurring full-pipeline trigger. The first run fires
/// immediately, then every `interval`; a failing run is logged and never
/// stops the timer.
pub fn schedule_jobs(pipeline: Arc<EtlPipeline>, interval: Duration) -> SchedulerHandle {
    info!(interval_secs = interval.as_secs(), "scheduling pipeline runs");

    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => match pipeline.run_full_pipeline().await {
                    Ok(results) => {
                        let failed = results.iter().filter(|r| !r.success).count();
                        info!(
                            synced = results.len() - failed,
                            failed,
                            "scheduled pipeline run finished"
                        );
                    }
                    Err(e) => error!(error = %e, "scheduled pipeline run errored"),
                },
            }
        }
    });

    SchedulerHandle { cancel, task }
}

/// Handle for a scheduled run loop. Cancelling stops future ticks; a run
/// already in flight completes.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel and wait for the loop task to wind down.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}
