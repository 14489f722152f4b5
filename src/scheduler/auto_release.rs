//! Background service driving the escrow auto-release sweep.
//!
//! Runs the sweep on a fixed interval. Each tick is independent; a failed
//! sweep is logged and the next tick runs as scheduled. Listens for a
//! shutdown signal and finishes the current sweep before stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::application::AutoReleaseSweepHandler;

/// Configuration for the auto-release scheduler.
#[derive(Debug, Clone)]
pub struct AutoReleaseSchedulerConfig {
    /// How often to run the sweep.
    pub sweep_interval: Duration,
}

impl Default for AutoReleaseSchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

impl AutoReleaseSchedulerConfig {
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Periodic runner for the auto-release sweep.
pub struct AutoReleaseScheduler {
    handler: Arc<AutoReleaseSweepHandler>,
    config: AutoReleaseSchedulerConfig,
}

impl AutoReleaseScheduler {
    pub fn new(handler: Arc<AutoReleaseSweepHandler>) -> Self {
        Self {
            handler,
            config: AutoReleaseSchedulerConfig::default(),
        }
    }

    pub fn with_config(
        handler: Arc<AutoReleaseSweepHandler>,
        config: AutoReleaseSchedulerConfig,
    ) -> Self {
        Self { handler, config }
    }

    /// Run the sweep loop until the shutdown signal is received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.sweep_interval);
        // The first tick fires immediately; skip it so startup does not race
        // migrations or pool warmup.
        interval.tick().await;

        tracing::info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            "Auto-release scheduler started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("Auto-release scheduler stopping");
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    async fn sweep_once(&self) {
        match self.handler.handle().await {
            Ok(report) => {
                if report.released > 0 || report.blocked > 0 || report.failed > 0 {
                    tracing::info!(
                        released = report.released,
                        blocked = report.blocked,
                        failed = report.failed,
                        "Auto-release sweep completed"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Auto-release sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::gateway::MockGateway;
    use crate::adapters::memory::{InMemoryLedger, StaticDisputeLookup};
    use crate::application::ReleaseEscrowHandler;

    fn scheduler_with_empty_ledger() -> AutoReleaseScheduler {
        let ledger = Arc::new(InMemoryLedger::new());
        let releaser = Arc::new(ReleaseEscrowHandler::new(
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            Arc::new(MockGateway::new()),
            Arc::new(InMemoryEventBus::new()),
        ));
        let handler = Arc::new(AutoReleaseSweepHandler::new(
            ledger,
            Arc::new(StaticDisputeLookup::new()),
            releaser,
        ));
        AutoReleaseScheduler::with_config(
            handler,
            AutoReleaseSchedulerConfig::default().with_sweep_interval(Duration::from_millis(10)),
        )
    }

    #[tokio::test]
    async fn scheduler_stops_on_shutdown_signal() {
        let scheduler = scheduler_with_empty_ledger();
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(async move { scheduler.run(rx).await });
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("scheduler did not stop on shutdown")
            .unwrap();
    }
}
