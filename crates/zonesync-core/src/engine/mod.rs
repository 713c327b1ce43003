//! Core update engine
//!
//! The UpdateEngine is responsible for:
//! - Resolving the host's current WAN IPv4/IPv6 address via [`AddressResolver`]
//! - Detecting changes against the last pair it applied
//! - Submitting one batched upsert via [`DnsProvider`] on change
//! - Driving the recurring cycle through the [`CronScheduler`]
//!
//! ## Cycle Flow
//!
//! 1. Take the busy guard; a tick arriving mid-cycle is dropped, not queued
//! 2. Resolve each enabled address family (a failure degrades that family
//!    to absent for this cycle)
//! 3. Skip if the resolved pair equals the last applied pair
//! 4. Build the upsert batch in configuration order
//! 5. Submit the batch as one atomic request with an identifying comment
//! 6. Advance the last applied pair and release the guard
//!
//! There is no retry at any layer; the next scheduled tick is the retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::changeset::{AddressPair, build_changes};
use crate::config::Config;
use crate::error::Result;
use crate::scheduler::{CronScheduler, Job, JobHandle};
use crate::traits::{AddressResolver, DnsProvider};

/// Application identity stamped into batch comments
const APP_NAME: &str = "zonesync";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core update engine
///
/// Owns the last-applied address pair and the busy guard. Constructed once at
/// process start, run once immediately by [`start`](Self::start) and then
/// zero or more times by the scheduler, and closed once at shutdown.
///
/// ## Concurrency
///
/// The busy guard is an instance-owned atomic, so independent engines (e.g.,
/// under test) never interfere. `last_applied` is written only inside a
/// guarded cycle; a cycle that loses the guard race touches neither the
/// resolver nor the provider.
pub struct UpdateEngine {
    config: Config,
    resolver: Arc<dyn AddressResolver>,
    provider: Arc<dyn DnsProvider>,
    scheduler: CronScheduler,
    last_applied: Mutex<AddressPair>,
    busy: AtomicBool,
    job_handle: Mutex<Option<JobHandle>>,
}

impl UpdateEngine {
    /// Create a new engine
    ///
    /// Validates the configuration; resolver and provider are taken as trait
    /// objects so the daemon decides the concrete implementations.
    pub fn new(
        config: Config,
        resolver: Arc<dyn AddressResolver>,
        provider: Arc<dyn DnsProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let scheduler = CronScheduler::new(config.timezone);

        Ok(Self {
            config,
            resolver,
            provider,
            scheduler,
            last_applied: Mutex::new(AddressPair::default()),
            busy: AtomicBool::new(false),
            job_handle: Mutex::new(None),
        })
    }

    /// Start the engine
    ///
    /// Always performs one immediate cycle. With an empty schedule string
    /// that is the whole run and `start` returns. Otherwise the engine
    /// registers itself as the scheduler's job and blocks until
    /// [`close`](Self::close) stops the scheduler.
    ///
    /// A malformed schedule expression is the only startup error.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        self.run_cycle().await;

        if self.config.schedule.is_empty() {
            return Ok(());
        }

        let handle = self
            .scheduler
            .schedule(&self.config.schedule, Arc::clone(self) as Arc<dyn Job>)?;
        info!("cron initialized with schedule {}", self.config.schedule);

        *self.job_handle.lock().unwrap() = Some(handle);
        self.scheduler.start();
        self.report_next_run();

        self.scheduler.stopped().await;
        Ok(())
    }

    /// Stop the recurring schedule
    ///
    /// Idempotent; safe to call even if `start` never ran. An in-flight
    /// cycle finishes before the scheduler task exits.
    pub async fn close(&self) {
        self.scheduler.stop().await;
    }

    /// Run one address-check-and-update cycle
    ///
    /// Drops the invocation if a cycle is already running. Never returns an
    /// error: resolution and provider failures are logged and end the cycle,
    /// nothing more.
    pub async fn run_cycle(&self) {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("update cycle already running, skipping this tick");
            return;
        }

        self.cycle().await;

        self.busy.store(false, Ordering::SeqCst);
        self.report_next_run();
    }

    async fn cycle(&self) {
        let mut pair = AddressPair::default();

        if self.config.handle_ipv4 {
            match self.resolver.resolve_v4().await {
                Ok(ip) => {
                    info!("current WAN IPv4: {}", ip);
                    pair.v4 = Some(ip);
                }
                Err(e) => error!("cannot retrieve WAN IPv4 address: {}", e),
            }
        }

        if self.config.handle_ipv6 {
            match self.resolver.resolve_v6().await {
                Ok(ip) => {
                    info!("current WAN IPv6: {}", ip);
                    pair.v6 = Some(ip);
                }
                Err(e) => error!("cannot retrieve WAN IPv6 address: {}", e),
            }
        }

        // Both families disabled or both resolutions failed
        if pair.is_empty() {
            return;
        }

        if *self.last_applied.lock().unwrap() == pair {
            info!("WAN IPv4/IPv6 addresses have not changed since last update, skipping");
            return;
        }

        let changes = build_changes(&self.config.records, &pair);
        if changes.is_empty() {
            warn!("no record set to update, skipping");
            return;
        }

        let comment = format!(
            "Updated by {} {} at {}",
            APP_NAME,
            APP_VERSION,
            Utc::now()
                .with_timezone(&self.config.timezone)
                .format("%Y-%m-%d %H:%M:%S"),
        );

        match self
            .provider
            .apply_changes(&self.config.hosted_zone_id, &comment, &changes)
            .await
        {
            Ok(result) => info!(
                change_id = result.id.as_deref(),
                status = result.status.as_deref(),
                "{} record(s) submitted",
                changes.len(),
            ),
            Err(e) => error!("cannot update record set: {}", e),
        }

        // Advances even when the provider call failed: an unchanged address
        // on the next tick is skipped, and the next change (or a restart) is
        // the recovery path.
        *self.last_applied.lock().unwrap() = pair;
    }

    /// Log the computed next fire time while a recurring schedule is active
    fn report_next_run(&self) {
        let guard = self.job_handle.lock().unwrap();
        if let Some(handle) = guard.as_ref()
            && let Some(next) = handle.next_run()
        {
            let until = (next - Utc::now().with_timezone(&self.config.timezone))
                .to_std()
                .unwrap_or_default();
            // whole seconds read better in logs
            let until = std::time::Duration::from_secs(until.as_secs());
            info!("next run in {} ({})", humantime::format_duration(until), next);
        }
    }

    /// The address pair most recently marked as applied
    ///
    /// Exposed for inspection and tests; written only by `run_cycle`.
    pub fn last_applied(&self) -> AddressPair {
        *self.last_applied.lock().unwrap()
    }
}

#[async_trait]
impl Job for UpdateEngine {
    async fn run(&self) {
        self.run_cycle().await;
    }
}
