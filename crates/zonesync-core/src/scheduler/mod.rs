//! Cron scheduling
//!
//! The [`CronScheduler`] fires a registered [`Job`] on a cron cadence,
//! evaluated in one configured time zone for the whole process lifetime.
//!
//! ## Grammar
//!
//! Six space-separated fields with the leading seconds field optional:
//!
//! ```text
//! [seconds] minute hour day-of-month month day-of-week
//! ```
//!
//! Named descriptors (`@hourly`, `@daily`, `@weekly`, `@monthly`, `@yearly`)
//! are accepted as-is. A five-field expression is normalised by prepending a
//! `0` seconds field, so it fires at second zero of the matching minute.
//!
//! ## Tick model
//!
//! One background task issues ticks serially: it sleeps until the next fire
//! time, runs the job to completion, then computes the following fire time.
//! Ticks are never queued or retried. [`CronScheduler::stop`] lets an
//! in-flight job finish before the task exits.

use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};

/// A unit of work the scheduler fires on each tick
#[async_trait]
pub trait Job: Send + Sync {
    /// Run one tick of the job
    ///
    /// Errors are the job's own concern; the scheduler neither inspects nor
    /// retries a tick.
    async fn run(&self);
}

/// Handle to a registered job, used for next-fire reporting
#[derive(Debug, Clone)]
pub struct JobHandle {
    schedule: Schedule,
    tz: Tz,
}

impl JobHandle {
    /// Compute the next fire time in the scheduler's time zone
    ///
    /// `None` if the schedule has no future fire time.
    pub fn next_run(&self) -> Option<DateTime<Tz>> {
        self.schedule.upcoming(self.tz).next()
    }
}

/// Cron-style scheduler driving a single recurring job
///
/// Lifecycle: [`schedule`](Self::schedule) registers the job,
/// [`start`](Self::start) spawns the tick task, [`stop`](Self::stop) halts
/// future ticks. `stop` is idempotent and safe to call before `start`.
pub struct CronScheduler {
    tz: Tz,
    pending: Mutex<Option<(Schedule, Arc<dyn Job>)>>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    done: Arc<Notify>,
}

impl CronScheduler {
    /// Create a scheduler evaluating all times in `tz`
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            pending: Mutex::new(None),
            stop_tx: Mutex::new(None),
            task: Mutex::new(None),
            done: Arc::new(Notify::new()),
        }
    }

    /// Register `job` for `expr`
    ///
    /// Fails on a malformed expression; this is the only scheduler error
    /// surfaced to callers, and it is fatal to startup.
    pub fn schedule(&self, expr: &str, job: Arc<dyn Job>) -> Result<JobHandle> {
        let schedule = parse_schedule(expr)?;
        *self.pending.lock().unwrap() = Some((schedule.clone(), job));
        Ok(JobHandle {
            schedule,
            tz: self.tz,
        })
    }

    /// Start the tick task for the registered job
    ///
    /// No-op if nothing was registered.
    pub fn start(&self) {
        let Some((schedule, job)) = self.pending.lock().unwrap().take() else {
            return;
        };

        let (tx, mut rx) = watch::channel(false);
        let tz = self.tz;
        let done = Arc::clone(&self.done);

        let handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(tz).next() else {
                    break;
                };
                let wait = (next - Utc::now().with_timezone(&tz))
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                debug!("next tick at {}", next);

                tokio::select! {
                    _ = tokio::time::sleep(wait) => job.run().await,
                    _ = rx.changed() => break,
                }
            }
            done.notify_one();
        });

        *self.stop_tx.lock().unwrap() = Some(tx);
        *self.task.lock().unwrap() = Some(handle);
    }

    /// Stop the scheduler, halting future ticks
    ///
    /// An in-flight tick runs to completion before the task exits. Safe to
    /// call multiple times or before `start`.
    pub async fn stop(&self) {
        if let Some(tx) = self.stop_tx.lock().unwrap().take() {
            let _ = tx.send(true);
        }
        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Block until the tick task exits (via [`stop`](Self::stop))
    pub async fn stopped(&self) {
        self.done.notified().await;
    }
}

/// Parse a cron expression, seconds field optional, descriptors allowed
fn parse_schedule(expr: &str) -> Result<Schedule> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(Error::schedule("schedule expression is empty"));
    }

    // Descriptors and 6/7-field expressions go through untouched; a 5-field
    // expression gains a literal seconds field.
    let normalized = if expr.starts_with('@') || expr.split_whitespace().count() != 5 {
        expr.to_string()
    } else {
        format!("0 {expr}")
    };

    Schedule::from_str(&normalized)
        .map_err(|e| Error::schedule(format!("invalid schedule '{expr}': {e}")))
}
