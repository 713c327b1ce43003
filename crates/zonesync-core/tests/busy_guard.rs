//! Contract tests: busy guard
//!
//! At most one cycle runs at a time. A cycle attempted while another holds
//! the guard is dropped without touching the resolver or provider, and the
//! guard is released once the in-flight cycle finishes.

mod common;

use std::net::Ipv4Addr;
use std::sync::Arc;

use common::*;
use zonesync_core::UpdateEngine;
use zonesync_core::config::{RecordSpec, RecordType};

#[tokio::test]
async fn overlapping_cycle_is_dropped() {
    let resolver = Arc::new(ScriptedResolver::new(
        [Some(Ipv4Addr::new(203, 0, 113, 9))],
        [],
    ));
    let provider = Arc::new(GatedProvider::new());

    let records = vec![RecordSpec::new("a.example.com", RecordType::A)];
    let engine = Arc::new(
        UpdateEngine::new(
            test_config(records, true, false),
            Arc::clone(&resolver) as Arc<dyn zonesync_core::traits::AddressResolver>,
            Arc::clone(&provider) as Arc<dyn zonesync_core::traits::DnsProvider>,
        )
        .unwrap(),
    );

    // First cycle parks inside the provider, holding the busy guard.
    let first = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.run_cycle().await })
    };
    provider.entered.notified().await;

    // Second invocation must be dropped immediately: no second resolver or
    // provider call.
    engine.run_cycle().await;
    assert_eq!(resolver.v4_call_count(), 1);
    assert_eq!(provider.apply_call_count(), 1);

    // Release the first cycle and let it finish.
    provider.release.notify_one();
    first.await.unwrap();

    // Guard released: the next cycle goes through change detection again
    // (same address, so it skips, but the resolver is consulted).
    engine.run_cycle().await;
    assert_eq!(resolver.v4_call_count(), 2);
    assert_eq!(provider.apply_call_count(), 1);
}
