// # DNS Provider Trait
//
// Defines the interface for applying a batched record update to one hosted
// zone.
//
// ## Implementations
//
// - Route53: `zonesync-provider-route53` crate
// - Future: Cloudflare, DigitalOcean, etc.
//
// The batch is atomic from the caller's perspective: the provider accepts or
// rejects it as one unit, and the engine never splits it.

use async_trait::async_trait;
use std::net::IpAddr;

use crate::config::RecordType;

/// Action applied to a record within a change batch
///
/// Only upserts exist today; the enum keeps the wire shape explicit and
/// leaves room for DELETE if drift reconciliation ever lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    /// Create the record if absent, overwrite if present
    Upsert,
}

/// A single record change within a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Action to apply
    pub action: ChangeAction,
    /// Fully qualified record name
    pub name: String,
    /// Record type (A or AAAA)
    pub kind: RecordType,
    /// Time-to-live in seconds
    pub ttl: i64,
    /// The address value; family matches `kind`
    pub value: IpAddr,
}

/// Provider acknowledgement for a submitted batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeInfo {
    /// Provider-assigned change ID, if any
    pub id: Option<String>,
    /// Provider-reported status (e.g., "PENDING", "INSYNC")
    pub status: Option<String>,
}

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Constraints
///
/// Providers are single-shot API clients. They must not retry, back off,
/// split the batch, or decide whether an update is needed; all of that is
/// owned by the engine (which, by design, retries only on the next tick).
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Apply a batch of record changes to a hosted zone
    ///
    /// The whole batch is submitted as one request with a human-readable
    /// `comment` identifying the submitter. The provider applies it
    /// atomically or fails.
    ///
    /// # Returns
    ///
    /// - `Ok(ChangeInfo)`: the provider's acknowledgement
    /// - `Err(Error)`: if the batch was rejected or the call failed
    async fn apply_changes(
        &self,
        hosted_zone_id: &str,
        comment: &str,
        changes: &[Change],
    ) -> Result<ChangeInfo, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
