//! Retry runner: main loop that sweeps for due work.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time;
use tracing;

use bloodlink_core::config::WorkerConfig;
use bloodlink_core::result::AppResult;
use bloodlink_engine::{AlertDispatcher, AlertService};

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Alerts moved to `Expired`.
    pub expired_alerts: usize,
    /// Retry sends started.
    pub retries_issued: usize,
}

/// Periodic expiry and retry sweeps.
#[derive(Debug)]
pub struct RetryRunner {
    /// Dispatcher that owns delivery sends
    dispatcher: Arc<AlertDispatcher>,
    /// Alert lifecycle
    alerts: AlertService,
    /// Worker configuration
    config: WorkerConfig,
}

impl RetryRunner {
    /// Create a new retry runner
    pub fn new(dispatcher: Arc<AlertDispatcher>, alerts: AlertService, config: WorkerConfig) -> Self {
        Self {
            dispatcher,
            alerts,
            config,
        }
    }

    /// Run sweeps until the cancel signal is received, then drain sends
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            "Retry runner started with poll_interval={}s",
            self.config.poll_interval_seconds
        );

        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds.max(1));

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Retry runner received shutdown signal");
                        break;
                    }
                }
                _ = self.sweep_logged() => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                tracing::info!("Retry runner shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        tracing::info!(
            "Retry runner waiting for {} in-flight sends to complete...",
            self.dispatcher.in_flight()
        );

        let drain_timeout = Duration::from_secs(self.config.drain_timeout_seconds);
        if !self.dispatcher.drain_timeout(drain_timeout).await {
            tracing::warn!(
                "Retry runner gave up on {} sends after {}s",
                self.dispatcher.in_flight(),
                self.config.drain_timeout_seconds
            );
        }

        tracing::info!("Retry runner shut down complete");
    }

    /// Expire overdue alerts, then re-issue due deliveries
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let expired_alerts = self.alerts.expire_overdue(Utc::now()).await?;
        let retries_issued = self.dispatcher.retry_due().await?;
        Ok(SweepReport {
            expired_alerts,
            retries_issued,
        })
    }

    async fn sweep_logged(&self) {
        match self.sweep().await {
            Ok(report) if report == SweepReport::default() => {
                tracing::trace!("Sweep found no due work");
            }
            Ok(report) => {
                tracing::info!(
                    "Sweep expired {} alerts and issued {} retries",
                    report.expired_alerts,
                    report.retries_issued
                );
            }
            Err(e) => {
                tracing::error!("Sweep failed: {}", e);
            }
        }
    }
}
