// # Route53 DNS Provider
//
// This crate applies a zonesync change batch to an Amazon Route53 hosted
// zone with a single `ChangeResourceRecordSets` call.
//
// ## Constraints
//
// - One API call per engine cycle; the batch is accepted or rejected as a
//   unit by Route53 itself.
// - No retry, no backoff, no caching: errors propagate to the engine, which
//   by design waits for the next scheduled tick.
// - Credentials never appear in logs; they are held inside the SDK client.

use async_trait::async_trait;
use aws_sdk_route53::config::Credentials;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change as R53Change, ChangeAction as R53ChangeAction, ChangeBatch, ResourceRecord,
    ResourceRecordSet, RrType,
};

use zonesync_core::config::RecordType;
use zonesync_core::traits::{Change, ChangeAction, ChangeInfo, DnsProvider};
use zonesync_core::{Error, Result};

/// Route53 is a global service; the SDK still wants a region for signing.
const ROUTE53_REGION: &str = "us-east-1";

/// Route53 DNS provider
pub struct Route53Provider {
    client: aws_sdk_route53::Client,
}

impl Route53Provider {
    /// Create a provider from an existing SDK client
    pub fn new(client: aws_sdk_route53::Client) -> Self {
        Self { client }
    }

    /// Create a provider from the default AWS credential chain
    ///
    /// Picks up credentials the usual way: environment variables, shared
    /// config/credentials files, instance metadata.
    pub async fn from_default_chain() -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(ROUTE53_REGION))
            .load()
            .await;
        Self::new(aws_sdk_route53::Client::new(&config))
    }

    /// Create a provider from static credentials
    pub async fn from_static_credentials(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();
        if access_key_id.is_empty() || secret_access_key.is_empty() {
            return Err(Error::config("AWS credentials cannot be empty"));
        }

        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "static");
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(ROUTE53_REGION))
            .credentials_provider(credentials)
            .load()
            .await;
        Ok(Self::new(aws_sdk_route53::Client::new(&config)))
    }
}

fn rr_type(kind: RecordType) -> RrType {
    match kind {
        RecordType::A => RrType::A,
        RecordType::Aaaa => RrType::Aaaa,
    }
}

fn to_record_set(change: &Change) -> Result<ResourceRecordSet> {
    let record = ResourceRecord::builder()
        .value(change.value.to_string())
        .build()
        .map_err(|e| Error::provider(format!("invalid resource record: {e}")))?;

    ResourceRecordSet::builder()
        .name(&change.name)
        .r#type(rr_type(change.kind))
        .ttl(change.ttl)
        .resource_records(record)
        .build()
        .map_err(|e| Error::provider(format!("invalid record set for {}: {e}", change.name)))
}

fn to_r53_change(change: &Change) -> Result<R53Change> {
    let action = match change.action {
        ChangeAction::Upsert => R53ChangeAction::Upsert,
    };

    R53Change::builder()
        .action(action)
        .resource_record_set(to_record_set(change)?)
        .build()
        .map_err(|e| Error::provider(format!("invalid change for {}: {e}", change.name)))
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn apply_changes(
        &self,
        hosted_zone_id: &str,
        comment: &str,
        changes: &[Change],
    ) -> Result<ChangeInfo> {
        let mut batch = ChangeBatch::builder().comment(comment);
        for change in changes {
            batch = batch.changes(to_r53_change(change)?);
        }
        let batch = batch
            .build()
            .map_err(|e| Error::provider(format!("invalid change batch: {e}")))?;

        tracing::debug!(
            "submitting {} change(s) to hosted zone {}",
            changes.len(),
            hosted_zone_id
        );

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(hosted_zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| Error::provider(format!("{}", DisplayErrorContext(&e))))?;

        let info = output.change_info;
        Ok(ChangeInfo {
            id: info.as_ref().map(|i| i.id.clone()),
            status: info.as_ref().map(|i| i.status.as_str().to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "route53"
    }
}
