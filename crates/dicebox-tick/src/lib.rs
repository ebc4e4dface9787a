//! Fixed-period tick scheduler for Dicebox.
//!
//! Drives recurring maintenance work (the session sweeper) at a configured
//! period. Late ticks skip ahead instead of stacking missed runs, and the
//! work time of every tick is checked against the period and recorded in
//! [`TickMetrics`].
//!
//! # Disabled mode
//!
//! When the period is `None` (or configured as zero), the scheduler is
//! disabled and [`TickScheduler::wait_for_tick`] pends forever. A schedule
//! that would run past the end of the clock's range disables it too.
//!
//! # Integration
//!
//! The scheduler sits inside a task's `tokio::select!` loop next to a stop
//! signal:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = stop.changed() => break,
//!         tick = scheduler.wait_for_tick() => {
//!             do_work().await;
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! The work runs inside the loop body, so the next tick cannot start until
//! the previous one has finished.

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Full configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. `None` = disabled (tick never fires).
    pub period: Option<Duration>,
    /// Budget warning threshold (0.0–1.0) as a fraction of the period.
    /// Default: 0.80.
    pub budget_warn_threshold: f64,
    /// Budget critical threshold (0.0–1.0). Default: 1.0.
    pub budget_critical_threshold: f64,
    /// Enable per-tick metrics collection.
    pub metrics_enabled: bool,
    /// Random delay (0..jitter) added to the first tick, so instances
    /// started together do not sweep in lockstep.
    pub initial_jitter: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: None,
            budget_warn_threshold: 0.80,
            budget_critical_threshold: 1.0,
            metrics_enabled: true,
            initial_jitter: Duration::ZERO,
        }
    }
}

impl TickConfig {
    /// Create a config with the given period and default settings.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period: Some(period),
            ..Default::default()
        }
    }

    /// Fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`]. Rules:
    /// - A zero period disables the scheduler.
    /// - Thresholds clamped to `0.0..=1.0`.
    /// - `budget_warn_threshold` forced ≤ `budget_critical_threshold`.
    pub fn validated(mut self) -> Self {
        if self.period == Some(Duration::ZERO) {
            warn!("tick period is zero, scheduler disabled");
            self.period = None;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self.budget_critical_threshold = self.budget_critical_threshold.clamp(0.0, 1.0);
        if self.budget_warn_threshold > self.budget_critical_threshold {
            self.budget_warn_threshold = self.budget_critical_threshold;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// The configured period.
    pub period: Duration,
    /// `true` if this tick fired more than 10% of a period late.
    pub overrun: bool,
    /// How many scheduled ticks were jumped over because of the overrun.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for the tick scheduler.
///
/// Timing values refer to the work time reported via
/// [`TickScheduler::record_tick_end`].
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Exponential moving average of work time (α = 0.1).
    pub avg_tick_time: Duration,
    pub max_tick_time: Duration,
    /// Last work time as a fraction of the period. >1.0 means overrun.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-period tick scheduler. One per background task.
pub struct TickScheduler {
    config: TickConfig,
    period: Option<Duration>,
    tick_count: u64,
    /// When the next tick should fire (Tokio instant for `sleep_until`).
    next_tick: Option<TokioInstant>,
    /// Wall-clock instant when the last tick's work started.
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Create a new scheduler from config. The first tick fires one period
    /// (plus optional jitter) from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let mut period = config.period;

        let next_tick = period.and_then(|p| {
            let jitter = random_jitter(config.initial_jitter);
            let first = p
                .checked_add(jitter)
                .and_then(|delay| TokioInstant::now().checked_add(delay));
            if first.is_none() {
                warn!(
                    period_secs = p.as_secs(),
                    jitter_ms = jitter.as_millis() as u64,
                    "first tick is out of the clock's range, scheduler disabled"
                );
            }
            first
        });
        if next_tick.is_none() {
            period = None;
        }

        match period {
            None => debug!("tick scheduler created in disabled mode"),
            Some(p) => debug!(period_ms = p.as_millis() as u64, "tick scheduler created"),
        }

        Self {
            config,
            period,
            tick_count: 0,
            next_tick,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    /// Create a scheduler for a period with default settings.
    pub fn with_period(period: Duration) -> Self {
        Self::new(TickConfig::with_period(period))
    }

    /// Wait until the next tick is due.
    ///
    /// A disabled scheduler pends forever; the other branches of a
    /// surrounding `select!` keep running.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (Some(next), Some(period)) = (self.next_tick, self.period) else {
            return std::future::pending().await;
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > period / 10;
        let ticks_skipped = if overrun {
            (late_by.as_nanos() / period.as_nanos()) as u64
        } else {
            0
        };
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
        }

        self.next_tick = u32::try_from(ticks_skipped.saturating_add(1))
            .ok()
            .and_then(|slots| period.checked_mul(slots))
            .and_then(|ahead| next.checked_add(ahead));
        if self.next_tick.is_none() {
            warn!(
                tick = self.tick_count,
                period_secs = period.as_secs(),
                "next tick is out of the clock's range, scheduler disabled"
            );
            self.period = None;
        }

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            period,
            overrun,
            ticks_skipped,
        }
    }

    /// Record that the work for the current tick has finished.
    ///
    /// Enables budget monitoring and metrics. Without it no budget
    /// warnings fire.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();

        if let Some(budget) = self.period {
            let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
            self.metrics.budget_utilization = utilization;

            if utilization >= self.config.budget_critical_threshold {
                warn!(
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    budget_ms = budget.as_secs_f64() * 1000.0,
                    "CRITICAL: tick work exceeded its period"
                );
            } else if utilization >= self.config.budget_warn_threshold {
                warn!(
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    budget_ms = budget.as_secs_f64() * 1000.0,
                    "tick work approaching its period"
                );
            }
        }

        if self.config.metrics_enabled {
            if elapsed > self.metrics.max_tick_time {
                self.metrics.max_tick_time = elapsed;
            }
            let alpha = 0.1;
            let prev = self.metrics.avg_tick_time.as_secs_f64();
            let curr = elapsed.as_secs_f64();
            self.metrics.avg_tick_time =
                Duration::from_secs_f64(prev * (1.0 - alpha) + curr * alpha);
        }
    }

    /// Whether this scheduler never fires (no period).
    pub fn is_disabled(&self) -> bool {
        self.period.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

fn random_jitter(max: Duration) -> Duration {
    let max_us = u64::try_from(max.as_micros()).unwrap_or(u64::MAX);
    if max_us == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(rand::rng().random_range(0..max_us))
}
