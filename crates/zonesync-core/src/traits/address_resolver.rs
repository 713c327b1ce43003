// # Address Resolver Trait
//
// Defines the interface for looking up the host's current public (WAN)
// address, one address family at a time.
//
// ## Implementations
//
// - HTTP echo services: `zonesync-resolver-http` crate
// - Future: router/UPnP queries, STUN
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::AddressResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* AddressResolver implementation */;
//
//     let v4 = resolver.resolve_v4().await?;
//     println!("current WAN IPv4: {v4}");
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Trait for WAN address resolver implementations
///
/// Each call either returns a single concrete address of the requested family
/// or fails. The engine logs a failure and treats the family as unavailable
/// for that cycle; it never retries within a cycle.
///
/// Implementations must be thread-safe and usable across async tasks. They
/// must not implement retry or backoff of their own: the next scheduled tick
/// is the retry.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolve the current WAN IPv4 address
    async fn resolve_v4(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Resolve the current WAN IPv6 address
    async fn resolve_v6(&self) -> Result<Ipv6Addr, crate::Error>;
}
