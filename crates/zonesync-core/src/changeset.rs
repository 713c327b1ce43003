//! Change-set construction
//!
//! Turns one resolution attempt ([`AddressPair`]) plus the configured record
//! list into the ordered batch of upserts the provider receives. Records
//! whose address family is unavailable this cycle are logged and dropped,
//! never emitted as empty entries.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::error;

use crate::config::{RecordSpec, RecordType};
use crate::traits::{Change, ChangeAction};

/// The result of one WAN address resolution attempt
///
/// `None` means the family was disabled or its resolution failed; that is
/// distinct from "resolved but empty", which cannot be represented. A pair
/// compares equal to another when both components match, absent included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressPair {
    /// Current WAN IPv4 address, if resolved
    pub v4: Option<Ipv4Addr>,
    /// Current WAN IPv6 address, if resolved
    pub v6: Option<Ipv6Addr>,
}

impl AddressPair {
    /// True when neither family resolved
    pub fn is_empty(&self) -> bool {
        self.v4.is_none() && self.v6.is_none()
    }
}

/// Build the upsert batch for one cycle
///
/// Walks `records` in configuration order. A record whose required family is
/// absent from `pair` is logged as an error and omitted; the remaining
/// records still make it into the batch. The result may be empty.
pub fn build_changes(records: &[RecordSpec], pair: &AddressPair) -> Vec<Change> {
    let mut changes = Vec::with_capacity(records.len());

    for record in records {
        let value: IpAddr = match record.kind {
            RecordType::A => match pair.v4 {
                Some(ip) => IpAddr::V4(ip),
                None => {
                    error!(
                        "no WAN IPv4 address available to update {} record",
                        record.name
                    );
                    continue;
                }
            },
            RecordType::Aaaa => match pair.v6 {
                Some(ip) => IpAddr::V6(ip),
                None => {
                    error!(
                        "no WAN IPv6 address available to update {} record",
                        record.name
                    );
                    continue;
                }
            },
        };

        changes.push(Change {
            action: ChangeAction::Upsert,
            name: record.name.clone(),
            kind: record.kind,
            ttl: record.ttl,
            value,
        });
    }

    changes
}
