// # zonesync-core
//
// Core library for the zonesync WAN-address DNS updater.
//
// ## Architecture Overview
//
// This library provides the update-orchestration core:
// - **AddressResolver**: Trait for looking up the host's current WAN address
// - **DnsProvider**: Trait for applying a batched record update to one zone
// - **UpdateEngine**: Orchestrator owning change detection and the busy guard
// - **CronScheduler**: Time-zone-aware cron cadence for the recurring cycle
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The core holds no network code; resolvers
//    and providers live in their own crates behind traits
// 2. **Tick-Driven**: One cycle per scheduler tick (plus one at startup);
//    a tick arriving mid-cycle is dropped, never queued
// 3. **No Hidden Retries**: Failed resolutions degrade to "absent", failed
//    provider calls end the cycle; the next tick is the retry

pub mod changeset;
pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod traits;

// Re-export core types for convenience
pub use changeset::AddressPair;
pub use config::{Config, RecordSpec, RecordType};
pub use engine::UpdateEngine;
pub use error::{Error, Result};
pub use scheduler::{CronScheduler, Job, JobHandle};
pub use traits::{AddressResolver, Change, ChangeAction, ChangeInfo, DnsProvider};
