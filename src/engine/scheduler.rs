//! Scheduler loop.
//!
//! Two states: `Active` inside the daily racing window, `Idle` outside it.
//! The state is re-evaluated once per iteration from an injected [`Clock`],
//! so the sleep interval is also the longest it takes to notice a window
//! boundary. Active iterations run one update cycle and sleep the short
//! interval; idle iterations only sleep. A failed cycle sleeps the error
//! delay and retries, without backoff or a retry cap.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

use super::updater::Updater;
use crate::config::ScheduleConfig;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of wall-clock time.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ---------------------------------------------------------------------------
// Racing window
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    Active,
    Idle,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollState::Active => write!(f, "running"),
            PollState::Idle => write!(f, "sleeping"),
        }
    }
}

/// Daily window of UTC hours, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RacingWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl RacingWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self { start_hour, end_hour }
    }

    /// Pure state transition: which state applies at `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> PollState {
        if (self.start_hour..=self.end_hour).contains(&now.hour()) {
            PollState::Active
        } else {
            PollState::Idle
        }
    }

    /// Human-readable window, e.g. `07:00-21:59 UTC`.
    pub fn label(&self) -> String {
        format!("{:02}:00-{:02}:59 UTC", self.start_hour, self.end_hour)
    }
}

impl Default for RacingWindow {
    fn default() -> Self {
        Self::new(7, 21)
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Sleep intervals per outcome.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    pub active: Duration,
    pub idle: Duration,
    pub error_delay: Duration,
}

impl From<&ScheduleConfig> for Cadence {
    fn from(cfg: &ScheduleConfig) -> Self {
        Self {
            active: cfg.active_interval(),
            idle: cfg.idle_interval(),
            error_delay: cfg.error_delay(),
        }
    }
}

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub state: PollState,
    pub ran_cycle: bool,
    pub failed: bool,
    pub sleep: Duration,
}

pub struct Scheduler {
    updater: Updater,
    window: RacingWindow,
    cadence: Cadence,
    clock: Arc<dyn Clock>,
    last_state: Option<PollState>,
}

impl Scheduler {
    pub fn new(
        updater: Updater,
        window: RacingWindow,
        cadence: Cadence,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            updater,
            window,
            cadence,
            clock,
            last_state: None,
        }
    }

    /// Run one iteration and return how long to sleep before the next.
    pub async fn step(&mut self) -> Step {
        let state = self.window.state_at(self.clock.now());
        if self.last_state != Some(state) {
            match state {
                PollState::Active => info!(window = %self.window.label(), "Racing hours, polling feeds"),
                PollState::Idle => info!(window = %self.window.label(), "Outside racing hours, sleeping"),
            }
            self.last_state = Some(state);
        }

        match state {
            PollState::Idle => Step {
                state,
                ran_cycle: false,
                failed: false,
                sleep: self.cadence.idle,
            },
            PollState::Active => match self.updater.run_cycle().await {
                Ok(_) => Step {
                    state,
                    ran_cycle: true,
                    failed: false,
                    sleep: self.cadence.active,
                },
                Err(e) => {
                    error!(error = %e, "Update cycle failed, retrying after delay");
                    Step {
                        state,
                        ran_cycle: true,
                        failed: true,
                        sleep: self.cadence.error_delay,
                    }
                }
            },
        }
    }

    /// Loop until `shutdown` flips to true or its sender is dropped.
    ///
    /// A stop request interrupts the sleep but never an in-flight cycle.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            window = %self.window.label(),
            active_secs = self.cadence.active.as_secs(),
            idle_secs = self.cadence.idle.as_secs(),
            "Starting odds updater"
        );

        while !*shutdown.borrow() {
            let step = self.step().await;
            tokio::select! {
                _ = tokio::time::sleep(step.sleep) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Odds updater stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
