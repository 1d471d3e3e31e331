//! Background inactivity sweep.
//!
//! A single task wakes on a fixed period and asks the [`PresenceManager`] to
//! evict stale participants. It talks to request handlers only through the
//! store.

use crate::participant::now_millis;
use crate::presence::{PresenceManager, SweepReport, DEFAULT_TIMEOUT};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(15_000);

/// Callback invoked with the outcome of every successful sweep.
pub type SweepObserver = Arc<dyn Fn(&SweepReport) + Send + Sync>;

/// Sweep timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time between sweeps.
    pub interval: Duration,
    /// Inactivity after which a participant is evicted.
    pub timeout: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Runs [`PresenceManager::sweep`] on a fixed period.
pub struct SweepScheduler {
    presence: PresenceManager,
    config: SweepConfig,
    observer: Option<SweepObserver>,
}

impl SweepScheduler {
    /// Create a scheduler with the given timing.
    #[must_use]
    pub fn new(presence: PresenceManager, config: SweepConfig) -> Self {
        Self {
            presence,
            config,
            observer: None,
        }
    }

    /// Attach a callback that receives every sweep report.
    #[must_use]
    pub fn with_observer(
        mut self,
        observer: impl Fn(&SweepReport) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Run one sweep now, logging instead of failing.
    pub async fn tick(&self) {
        match self.presence.sweep(now_millis(), self.config.timeout).await {
            Ok(report) => {
                if let Some(observer) = &self.observer {
                    observer(&report);
                }
            }
            Err(e) => warn!(error = %e, "Sweep failed, retrying next tick"),
        }
    }

    /// Start the sweep loop on the current runtime.
    ///
    /// The first sweep happens one full interval after this call. Each sweep
    /// completes before the next tick is taken, so sweeps never overlap.
    #[must_use]
    pub fn spawn(self) -> SweepHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let period = self.config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                interval_ms = period.as_millis() as u64,
                timeout_ms = self.config.timeout.as_millis() as u64,
                "Sweep scheduler started"
            );

            let mut detached = false;
            loop {
                tokio::select! {
                    signal = &mut shutdown_rx, if !detached => match signal {
                        Ok(()) => break,
                        Err(_) => {
                            debug!("Sweep handle dropped, running detached");
                            detached = true;
                        }
                    },
                    _ = ticker.tick() => self.tick().await,
                }
            }

            debug!("Sweep scheduler stopped");
        });

        SweepHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a running sweep loop.
///
/// Dropping the handle detaches the loop: sweeps continue until the runtime
/// shuts down. Use [`SweepHandle::shutdown`] to stop them.
pub struct SweepHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Stop the loop and wait for an in-flight sweep to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "Sweep task ended abnormally");
        }
    }

    /// Whether the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
