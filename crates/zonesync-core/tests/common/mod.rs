//! Test doubles and common utilities for engine contract tests
//!
//! The doubles script resolver answers per call and record every provider
//! batch, so tests can assert on call counts and batch contents.

use std::collections::VecDeque;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use zonesync_core::config::{Config, RecordSpec};
use zonesync_core::error::{Error, Result};
use zonesync_core::traits::{AddressResolver, Change, ChangeInfo, DnsProvider};

/// Resolver that replays a scripted sequence of answers
///
/// Each entry is one call's outcome; `None` means the lookup fails. The last
/// entry is sticky, so an open-ended run keeps receiving it. An empty script
/// always fails.
pub struct ScriptedResolver {
    v4_script: Mutex<VecDeque<Option<Ipv4Addr>>>,
    v6_script: Mutex<VecDeque<Option<Ipv6Addr>>>,
    v4_calls: AtomicUsize,
    v6_calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(
        v4_script: impl IntoIterator<Item = Option<Ipv4Addr>>,
        v6_script: impl IntoIterator<Item = Option<Ipv6Addr>>,
    ) -> Self {
        Self {
            v4_script: Mutex::new(v4_script.into_iter().collect()),
            v6_script: Mutex::new(v6_script.into_iter().collect()),
            v4_calls: AtomicUsize::new(0),
            v6_calls: AtomicUsize::new(0),
        }
    }

    pub fn v4_call_count(&self) -> usize {
        self.v4_calls.load(Ordering::SeqCst)
    }

    pub fn v6_call_count(&self) -> usize {
        self.v6_calls.load(Ordering::SeqCst)
    }
}

fn next_scripted<T: Copy>(script: &Mutex<VecDeque<Option<T>>>) -> Result<T> {
    let mut script = script.lock().unwrap();
    let answer = if script.len() > 1 {
        script.pop_front().unwrap()
    } else {
        script.front().copied().flatten()
    };
    answer.ok_or_else(|| Error::resolver("scripted lookup failure"))
}

#[async_trait::async_trait]
impl AddressResolver for ScriptedResolver {
    async fn resolve_v4(&self) -> Result<Ipv4Addr> {
        self.v4_calls.fetch_add(1, Ordering::SeqCst);
        next_scripted(&self.v4_script)
    }

    async fn resolve_v6(&self) -> Result<Ipv6Addr> {
        self.v6_calls.fetch_add(1, Ordering::SeqCst);
        next_scripted(&self.v6_script)
    }
}

/// A recorded provider submission
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    pub hosted_zone_id: String,
    pub comment: String,
    pub changes: Vec<Change>,
}

/// Provider that records every batch and can be switched to fail
pub struct MockProvider {
    apply_calls: AtomicUsize,
    batches: Mutex<Vec<RecordedBatch>>,
    fail: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            apply_calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let provider = Self::new();
        provider.fail.store(true, Ordering::SeqCst);
        provider
    }

    pub fn apply_call_count(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<RecordedBatch> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockProvider {
    async fn apply_changes(
        &self,
        hosted_zone_id: &str,
        comment: &str,
        changes: &[Change],
    ) -> Result<ChangeInfo> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().unwrap().push(RecordedBatch {
            hosted_zone_id: hosted_zone_id.to_string(),
            comment: comment.to_string(),
            changes: changes.to_vec(),
        });

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::provider("simulated provider outage"));
        }

        Ok(ChangeInfo {
            id: Some("C0TESTCHANGE".to_string()),
            status: Some("PENDING".to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Provider that parks inside `apply_changes` until released
///
/// Used to hold the busy guard open while a second cycle is attempted.
pub struct GatedProvider {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
    apply_calls: Arc<AtomicUsize>,
}

impl GatedProvider {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            apply_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn apply_call_count(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsProvider for GatedProvider {
    async fn apply_changes(
        &self,
        _hosted_zone_id: &str,
        _comment: &str,
        _changes: &[Change],
    ) -> Result<ChangeInfo> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(ChangeInfo::default())
    }

    fn provider_name(&self) -> &'static str {
        "gated"
    }
}

/// Helper to build a Config for tests
pub fn test_config(records: Vec<RecordSpec>, handle_ipv4: bool, handle_ipv6: bool) -> Config {
    Config {
        hosted_zone_id: "ZTESTZONE123".to_string(),
        records,
        handle_ipv4,
        handle_ipv6,
        schedule: String::new(),
        timezone: chrono_tz::UTC,
    }
}
