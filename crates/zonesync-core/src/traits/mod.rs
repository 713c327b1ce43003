//! Core traits for the zonesync system
//!
//! This module defines the abstract interfaces the engine depends on.
//!
//! - [`AddressResolver`]: look up the host's current WAN address
//! - [`DnsProvider`]: apply a batched record update to a hosted zone

pub mod address_resolver;
pub mod dns_provider;

pub use address_resolver::AddressResolver;
pub use dns_provider::{Change, ChangeAction, ChangeInfo, DnsProvider};
