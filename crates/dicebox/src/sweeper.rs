//! Background eviction of stale sessions.
//!
//! One task per server, driven by a [`TickScheduler`]. Each tick runs the
//! sweep in its own task and waits for it, so a panicking sweep is caught
//! as a `JoinError`, logged, and the next tick runs as usual. Late ticks
//! are skipped, never stacked.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dicebox_session::{SessionConfig, SweepReport};
use dicebox_tick::{TickConfig, TickScheduler};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::AuthService;

/// Handle to a running sweeper task.
///
/// [`stop`](Self::stop) cancels it and waits for the task to exit.
/// Dropping the handle signals the task to stop without waiting.
pub struct SessionSweeper {
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl SessionSweeper {
    /// Starts sweeping `service` every `config.sweep_interval`.
    ///
    /// `jitter` delays the first sweep by a random amount below it.
    pub fn start(service: Arc<AuthService>, config: &SessionConfig, jitter: Duration) -> Self {
        let tick = TickConfig {
            initial_jitter: jitter,
            ..TickConfig::with_period(config.sweep_interval)
        };

        tracing::info!(
            interval_secs = config.sweep_interval.as_secs(),
            stale_after_secs = config.stale_after.as_secs(),
            "session sweeper started"
        );

        Self::spawn_with(tick, move || {
            let service = Arc::clone(&service);
            async move { service.sweep_stale().await }
        })
    }

    /// Runs `job` on every tick of a scheduler built from `tick`.
    pub fn spawn_with<F, Fut>(tick: TickConfig, job: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = SweepReport> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run(TickScheduler::new(tick), job, stop_rx));

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the sweeper and waits for its task to finish.
    ///
    /// A sweep already in progress completes first.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "session sweeper task failed");
            }
        }
    }
}

impl Drop for SessionSweeper {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}

async fn run<F, Fut>(mut scheduler: TickScheduler, job: F, mut stop_rx: watch::Receiver<bool>)
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = SweepReport> + Send + 'static,
{
    loop {
        if *stop_rx.borrow_and_update() {
            break;
        }

        let tick = tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            tick = scheduler.wait_for_tick() => tick,
        };

        match tokio::spawn(job()).await {
            Ok(report) => {
                if !report.is_empty() {
                    tracing::info!(
                        tick = tick.tick,
                        removed = report.removed_count(),
                        failures = report.failures,
                        "stale sessions swept"
                    );
                }
            }
            Err(e) => {
                tracing::error!(tick = tick.tick, error = %e, "session sweep aborted");
            }
        }

        scheduler.record_tick_end();
    }

    let metrics = scheduler.metrics();
    tracing::info!(
        ticks = metrics.total_ticks,
        overruns = metrics.total_overruns,
        skipped = metrics.total_skipped,
        max_sweep_ms = metrics.max_tick_time.as_millis() as u64,
        "session sweeper stopped"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use dicebox_protocol::{BasicCredentials, LoginRequest};
    use dicebox_session::Timestamp;

    use super::*;

    const PERIOD: Duration = Duration::from_secs(60);

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_evicts_stale_sessions_on_tick() {
        let config = SessionConfig {
            sweep_interval: PERIOD,
            stale_after: Duration::from_secs(3600),
        };
        let service = Arc::new(AuthService::with_server_version(config.clone(), "1"));
        let request = LoginRequest {
            is_new_user: true,
            server_version: "1".into(),
        };
        let two_hours_ago = Timestamp::now().saturating_sub(Duration::from_secs(7200));
        service
            .login_at(&BasicCredentials::new("u1", "p1"), &request, two_hours_ago)
            .await
            .unwrap();
        service
            .login(&BasicCredentials::new("u2", "p2"), &request)
            .await
            .unwrap();

        let sweeper = SessionSweeper::start(Arc::clone(&service), &config, Duration::ZERO);
        assert_eq!(service.session_count().await, 2);

        tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
        settle().await;

        assert_eq!(service.session_count().await, 1);
        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_with_panicking_tick_keeps_running() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sweeper = SessionSweeper::spawn_with(TickConfig::with_period(PERIOD), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    panic!("sweep blew up");
                }
                SweepReport::default()
            }
        });

        tokio::time::sleep(PERIOD * 2 + Duration::from_millis(1)).await;
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(sweeper.is_running());
        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_tick_runs_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sweeper = SessionSweeper::spawn_with(TickConfig::with_period(PERIOD), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { SweepReport::default() }
        });

        sweeper.stop().await;
        tokio::time::sleep(PERIOD * 3).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_interval_beyond_clock_range_never_sweeps() {
        let config = SessionConfig {
            sweep_interval: Duration::from_secs(u64::MAX),
            stale_after: Duration::from_secs(1),
        };
        let service = Arc::new(AuthService::with_server_version(config.clone(), "1"));
        let request = LoginRequest {
            is_new_user: true,
            server_version: "1".into(),
        };
        let long_ago = Timestamp::now().saturating_sub(Duration::from_secs(7200));
        service
            .login_at(&BasicCredentials::new("u1", "p1"), &request, long_ago)
            .await
            .unwrap();

        let jitter = Duration::from_millis(u64::MAX);
        let sweeper = SessionSweeper::start(Arc::clone(&service), &config, jitter);
        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        settle().await;

        assert!(sweeper.is_running());
        assert_eq!(service.session_count().await, 1);
        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_signals_task_to_exit() {
        let (probe_tx, mut probe_rx) = watch::channel(());
        let sweeper = SessionSweeper::spawn_with(TickConfig::with_period(PERIOD), move || {
            let _keep = probe_tx.clone();
            async { SweepReport::default() }
        });

        drop(sweeper);
        settle().await;

        // The job closure owned the only sender; it is gone once the task exits.
        assert!(probe_rx.changed().await.is_err());
    }
}
