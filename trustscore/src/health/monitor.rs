//! Periodic probe cycle as an owned, cancellable task.

use super::registry::HealthRegistry;
use crate::registry::PipelineRegistry;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Handle to the background probe loop.
///
/// The loop runs a probe cycle immediately, then once per interval. Each tick
/// also sweeps expired records from the pipeline registry when one is
/// attached. Call [`HealthMonitor::shutdown`] for a clean stop; dropping the
/// handle aborts the task.
pub struct HealthMonitor {
    shutdown_tx: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Spawn the loop on the current tokio runtime.
    pub fn spawn(
        health: Arc<HealthRegistry>,
        pipelines: Option<PipelineRegistry>,
        period: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(run_loop(health, pipelines, period, shutdown_rx));
        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signal the loop to stop and wait for it to exit. An in-flight probe
    /// cycle is allowed to finish first.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "Health monitor task ended abnormally");
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_loop(
    health: Arc<HealthRegistry>,
    pipelines: Option<PipelineRegistry>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(
        interval_secs = period.as_secs(),
        dependencies = health.len(),
        "Health monitor started"
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            result = shutdown.recv() => {
                match result {
                    Ok(()) | Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Health monitor received shutdown signal");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::debug!(missed = n, "Health monitor shutdown receiver lagged");
                    }
                }
            }

            _ = ticker.tick() => {
                let snapshot = health.run_probe_cycle().await;
                if snapshot.overall.is_healthy() {
                    tracing::info!(
                        total = snapshot.dependencies.len(),
                        "All dependencies healthy"
                    );
                } else {
                    tracing::warn!(
                        overall = ?snapshot.overall,
                        active = snapshot.active_count(),
                        total = snapshot.dependencies.len(),
                        "Dependency health degraded"
                    );
                }

                if let Some(pipelines) = &pipelines {
                    pipelines.sweep_expired(Utc::now());
                }
            }
        }
    }

    tracing::info!("Health monitor stopped");
}
