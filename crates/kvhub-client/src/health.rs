//! Health checks: one-shot aggregation and a periodic monitor.
//!
//! Each round runs the store's own probe (a store without one counts as
//! healthy) concurrently with every additional probe, waits for all of
//! them, and reduces the outcomes to a single `AppResult<()>`.
//!
//! The monitor uses a fixed delay: the next round starts `interval` after
//! the previous round's result has been handed to the consumer, so rounds
//! never overlap and a slow consumer slows the monitor down.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kvhub_core::config::health::HealthConfig;
use kvhub_core::error::{AppError, ErrorKind};
use kvhub_core::result::AppResult;

use crate::client::Client;

/// Interval used when none (or zero) is configured.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(60);

/// Name reported for the store's own probe.
const STORE_PROBE: &str = "store";

/// A user-supplied health probe.
#[async_trait]
pub trait HealthProbe: Send + Sync + fmt::Debug {
    /// Name used in failure messages and logs.
    fn name(&self) -> &str;

    /// Returns `Ok(())` when healthy. `cancel` fires when the monitor stops.
    async fn probe(&self, cancel: CancellationToken, client: Client) -> AppResult<()>;
}

/// Shared handle to a probe.
pub type HealthFunc = Arc<dyn HealthProbe>;

/// Adapts an async closure into a [`HealthProbe`].
pub struct FnProbe<F> {
    name: String,
    f: F,
}

impl<F> fmt::Debug for FnProbe<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProbe").field("name", &self.name).finish()
    }
}

/// Wraps `f` as a named, shareable probe.
pub fn probe_fn<F, Fut>(name: impl Into<String>, f: F) -> HealthFunc
where
    F: Fn(CancellationToken, Client) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Arc::new(FnProbe {
        name: name.into(),
        f,
    })
}

#[async_trait]
impl<F, Fut> HealthProbe for FnProbe<F>
where
    F: Fn(CancellationToken, Client) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, cancel: CancellationToken, client: Client) -> AppResult<()> {
        (self.f)(cancel, client).await
    }
}

/// Options for [`Client::health_check`].
#[derive(Debug, Clone, Default)]
pub struct HealthOptions {
    /// Delay between rounds. Zero falls back to [`DEFAULT_HEALTH_INTERVAL`].
    pub interval: Duration,
    /// Probes run alongside the store's own probe, in order.
    pub checks: Vec<HealthFunc>,
}

impl HealthOptions {
    /// Creates options with the given interval and no additional probes.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            checks: Vec::new(),
        }
    }

    /// Creates options from configuration.
    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new(config.interval())
    }

    /// Adds a probe.
    pub fn with_check(mut self, check: HealthFunc) -> Self {
        self.checks.push(check);
        self
    }

    /// The interval actually used.
    pub fn effective_interval(&self) -> Duration {
        if self.interval.is_zero() {
            DEFAULT_HEALTH_INTERVAL
        } else {
            self.interval
        }
    }
}

/// Receives one status per monitor round; `None` once the monitor stops.
pub type HealthStatus = mpsc::Receiver<AppResult<()>>;

impl Client {
    /// Runs the store probe and `checks` once, concurrently, and aggregates.
    ///
    /// Returns `Ok(())` if every probe passed. Otherwise returns a
    /// [`ErrorKind::Health`] error naming how many failed, with the first
    /// failure (store probe first, then `checks` in order) as its source.
    pub async fn health(
        &self,
        cancel: &CancellationToken,
        checks: &[HealthFunc],
    ) -> AppResult<()> {
        let mut names = Vec::with_capacity(checks.len() + 1);
        let mut tasks: Vec<JoinHandle<AppResult<()>>> = Vec::with_capacity(checks.len() + 1);

        names.push(STORE_PROBE.to_string());
        tasks.push(tokio::spawn(store_probe(self.clone(), cancel.clone())));

        for check in checks {
            names.push(check.name().to_string());
            let check = Arc::clone(check);
            let client = self.clone();
            let token = cancel.clone();
            tasks.push(tokio::spawn(async move { check.probe(token, client).await }));
        }

        let outcomes = join_all(tasks).await;
        let total = outcomes.len();

        let mut failures = names
            .into_iter()
            .zip(outcomes)
            .filter_map(|(name, joined)| {
                let result = joined.unwrap_or_else(|e| {
                    Err(AppError::internal(format!("Health probe task failed: {e}")))
                });
                result.err().map(|err| (name, err))
            })
            .collect::<Vec<_>>();

        if failures.is_empty() {
            return Ok(());
        }

        let failed = failures.len();
        let (name, first) = failures.swap_remove(0);
        for (other, err) in &failures {
            debug!(probe = %other, error = %err, "Additional health probe failure");
        }

        Err(AppError::with_source(
            ErrorKind::Health,
            format!("{failed} of {total} health checks failed; first '{name}': {first}"),
            first,
        ))
    }

    /// Starts a monitor that runs [`Client::health`] every interval.
    ///
    /// No status is produced before the first interval elapses. The stream
    /// holds at most one undelivered status; the monitor waits for the
    /// consumer before starting the next round. Cancelling `cancel` (or
    /// dropping the returned receiver) stops the monitor and closes the
    /// stream, even mid-round; probes still running are left detached.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn health_check(
        &self,
        cancel: CancellationToken,
        options: HealthOptions,
    ) -> HealthStatus {
        let (tx, rx) = mpsc::channel(1);
        let client = self.clone();
        let interval = options.effective_interval();

        tokio::spawn(async move {
            client
                .run_health_monitor(cancel, interval, options.checks, tx)
                .await;
        });

        rx
    }

    async fn run_health_monitor(
        self,
        cancel: CancellationToken,
        interval: Duration,
        checks: Vec<HealthFunc>,
        tx: mpsc::Sender<AppResult<()>>,
    ) {
        info!(
            interval_ms = interval.as_millis() as u64,
            checks = checks.len(),
            "Health monitor started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tx.closed() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let round_token = cancel.child_token();
            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                status = self.health(&round_token, &checks) => status,
            };
            match &status {
                Ok(()) => debug!("Health round passed"),
                Err(e) => warn!(error = %e, "Health round failed"),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = tx.send(status) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Health monitor stopped");
    }
}

async fn store_probe(client: Client, cancel: CancellationToken) -> AppResult<()> {
    let store = Arc::clone(client.store());
    let Some(checker) = store.as_health() else {
        return Ok(());
    };

    // A probe that is already ready wins over a cancelled token.
    tokio::select! {
        biased;
        result = checker.health() => result,
        _ = cancel.cancelled() => Err(AppError::service_unavailable("Store health probe cancelled")),
    }
}
