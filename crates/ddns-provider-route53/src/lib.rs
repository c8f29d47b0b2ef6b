// # Route 53 DNS Provider
//
// This crate provides the AWS Route 53 implementation of `DnsProvider`.
//
// ## Behavior
//
// - Credentials come from the AWS credential chain, optionally pinned to a
//   named shared-config profile
// - Zone and record set listings follow pagination until exhausted
// - One ChangeResourceRecordSets call per submitted batch
// - NO retry logic (a failed call aborts the run)
// - Dry-run mode performs the reads and only logs the change batch
//
// ## API Reference
//
// - ListHostedZones: GET `/2013-04-01/hostedzone`
// - ListResourceRecordSets: GET `/2013-04-01/hostedzone/{Id}/rrset`
// - ChangeResourceRecordSets: POST `/2013-04-01/hostedzone/{Id}/rrset`

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_route53 as route53;
use aws_sdk_route53::config::Region;
use aws_sdk_route53::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_route53::primitives::DateTimeFormat;
use aws_sdk_route53::types as sdk;
use ddns_core::config::ProviderConfig;
use ddns_core::traits::{ChangeAction, ChangeBatch, ChangeInfo, DnsProvider, HostedZone, RecordSet};
use ddns_core::{Error, Result};

/// Region used when neither the configuration nor the environment names one
///
/// Route 53 is a global service; its endpoint lives in us-east-1.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Status reported for batches that were not submitted
pub const DRY_RUN_STATUS: &str = "DRY_RUN";

const PROVIDER_NAME: &str = "route53";

/// AWS Route 53 DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all list requests (zones, record sets)
/// - Log the intended change batch
/// - **NOT** submit the change
pub struct Route53Provider {
    /// SDK client
    client: route53::Client,

    /// Shared-config profile the client was built from (for diagnostics)
    profile: Option<String>,

    /// Dry-run mode: if true, perform reads but skip the change submission
    dry_run: bool,
}

impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("client", &"<aws-sdk-route53>")
            .field("profile", &self.profile)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Route53Provider {
    /// Create a provider around an existing SDK client
    pub fn new(client: route53::Client, profile: Option<String>, dry_run: bool) -> Self {
        Self {
            client,
            profile,
            dry_run,
        }
    }

    /// Create a provider from configuration
    ///
    /// Loads the AWS shared configuration (credentials and region chain),
    /// using the configured profile when one is set.
    pub async fn from_config(config: &ProviderConfig) -> Self {
        let region = RegionProviderChain::first_try(config.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(DEFAULT_REGION);

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(profile) = &config.profile {
            tracing::debug!("Loading AWS configuration for profile {}", profile);
            loader = loader.profile_name(profile);
        }
        let shared = loader.load().await;

        if config.dry_run {
            tracing::warn!("Route 53 provider running in DRY-RUN mode - no changes will be made");
        }

        Self::new(
            route53::Client::new(&shared),
            config.profile.clone(),
            config.dry_run,
        )
    }

    /// Whether change batches are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>> {
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_hosted_zones()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListHostedZones", e))?;

            zones.extend(
                output
                    .hosted_zones()
                    .iter()
                    .map(|z| HostedZone::new(z.id(), z.name())),
            );

            match output.next_marker() {
                Some(next) if output.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        tracing::debug!("Listed {} hosted zone(s)", zones.len());
        Ok(zones)
    }

    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        let mut sets = Vec::new();
        let mut start_name: Option<String> = None;
        let mut start_type: Option<sdk::RrType> = None;
        let mut start_identifier: Option<String> = None;

        loop {
            let output = self
                .client
                .list_resource_record_sets()
                .hosted_zone_id(zone_id)
                .set_start_record_name(start_name.take())
                .set_start_record_type(start_type.take())
                .set_start_record_identifier(start_identifier.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListResourceRecordSets", e))?;

            sets.extend(output.resource_record_sets().iter().map(from_sdk_record_set));

            if !output.is_truncated() {
                break;
            }
            match output.next_record_name() {
                Some(next) => {
                    start_name = Some(next.to_string());
                    start_type = output.next_record_type().cloned();
                    start_identifier = output.next_record_identifier().map(str::to_string);
                }
                None => break,
            }
        }

        tracing::debug!("Listed {} record set(s) in zone {}", sets.len(), zone_id);
        Ok(sets)
    }

    async fn change_record_sets(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would submit change batch to zone {}: {}",
                zone_id,
                serde_json::to_string(batch)?
            );
            return Ok(ChangeInfo {
                id: String::new(),
                status: DRY_RUN_STATUS.to_string(),
                submitted_at: Some(chrono::Utc::now().to_rfc3339()),
                comment: batch.comment.clone(),
            });
        }

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(to_sdk_batch(batch)?)
            .send()
            .await
            .map_err(|e| sdk_error("ChangeResourceRecordSets", e))?;

        let info = output.change_info().ok_or_else(|| {
            Error::provider(PROVIDER_NAME, "ChangeResourceRecordSets returned no ChangeInfo")
        })?;

        Ok(from_sdk_change_info(info))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Convert an SDK record set into the core representation
fn from_sdk_record_set(set: &sdk::ResourceRecordSet) -> RecordSet {
    RecordSet {
        name: set.name().to_string(),
        record_type: set.r#type().as_str().to_string(),
        ttl: set.ttl(),
        values: set
            .resource_records()
            .iter()
            .map(|r| r.value().to_string())
            .collect(),
    }
}

fn from_sdk_change_info(info: &sdk::ChangeInfo) -> ChangeInfo {
    ChangeInfo {
        id: info.id().to_string(),
        status: info.status().as_str().to_string(),
        submitted_at: info.submitted_at().fmt(DateTimeFormat::DateTime).ok(),
        comment: info.comment().map(str::to_string),
    }
}

/// Convert a core change batch into the SDK representation
fn to_sdk_batch(batch: &ChangeBatch) -> Result<sdk::ChangeBatch> {
    let mut builder = sdk::ChangeBatch::builder().set_comment(batch.comment.clone());

    for change in &batch.changes {
        let action = match change.action {
            ChangeAction::Upsert => sdk::ChangeAction::Upsert,
        };

        let mut record_set = sdk::ResourceRecordSet::builder()
            .name(&change.record_set.name)
            .r#type(sdk::RrType::from(change.record_set.record_type.as_str()))
            .set_ttl(change.record_set.ttl);

        for value in &change.record_set.values {
            record_set = record_set.resource_records(
                sdk::ResourceRecord::builder()
                    .value(value)
                    .build()
                    .map_err(invalid_batch)?,
            );
        }

        builder = builder.changes(
            sdk::Change::builder()
                .action(action)
                .resource_record_set(record_set.build().map_err(invalid_batch)?)
                .build()
                .map_err(invalid_batch)?,
        );
    }

    builder.build().map_err(invalid_batch)
}

fn invalid_batch(err: impl std::fmt::Display) -> Error {
    Error::provider(PROVIDER_NAME, format!("Invalid change batch: {}", err))
}

/// Map an SDK error onto the core error taxonomy
fn sdk_error<E>(operation: &str, err: E) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    classify(operation, err.code(), DisplayErrorContext(&err).to_string())
}

/// Classify a failed call by its AWS error code
fn classify(operation: &str, code: Option<&str>, detail: String) -> Error {
    let message = format!("{} failed: {}", operation, detail);
    match code {
        Some(
            "AccessDenied"
            | "AccessDeniedException"
            | "InvalidClientTokenId"
            | "ExpiredToken"
            | "SignatureDoesNotMatch"
            | "UnrecognizedClientException",
        ) => Error::auth(message),
        Some("Throttling" | "ThrottlingException" | "PriorRequestNotComplete") => {
            Error::rate_limited(message)
        }
        Some("NoSuchHostedZone") => Error::not_found(message),
        _ => Error::provider(PROVIDER_NAME, message),
    }
}
