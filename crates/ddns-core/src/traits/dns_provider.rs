// # DNS Provider Trait
//
// Defines the narrow interface the reconciler needs from a DNS provider:
// list hosted zones, list record sets, submit a change batch.
//
// ## Implementations
//
// - Route 53: `ddns-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// let zones = provider.list_hosted_zones().await?;
// let sets = provider.list_record_sets("Z123").await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Prefix the provider puts in front of hosted zone identifiers
pub const HOSTED_ZONE_ID_PREFIX: &str = "/hostedzone/";

/// A hosted zone as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Opaque identifier, possibly prefixed with `/hostedzone/`
    pub id: String,
    /// Fully-qualified zone name with trailing dot
    pub name: String,
}

impl HostedZone {
    /// Create a hosted zone entry
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The identifier with any `/hostedzone/` prefix removed
    pub fn bare_id(&self) -> &str {
        self.id
            .strip_prefix(HOSTED_ZONE_ID_PREFIX)
            .unwrap_or(&self.id)
    }
}

/// A resource record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Fully-qualified name with trailing dot
    pub name: String,
    /// Record type ("A", "AAAA", "CNAME", ...)
    pub record_type: String,
    /// TTL in seconds (absent for alias records)
    pub ttl: Option<i64>,
    /// Record values, in provider order
    pub values: Vec<String>,
}

impl RecordSet {
    /// Create an A record set with a single value
    pub fn a(name: impl Into<String>, ttl: i64, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: "A".to_string(),
            ttl: Some(ttl),
            values: vec![value.into()],
        }
    }
}

/// Change action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    /// Update if exists, else insert
    Upsert,
}

/// A single change inside a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// What to do with the record set
    pub action: ChangeAction,
    /// The record set to apply
    pub record_set: RecordSet,
}

/// A batch of changes submitted in one provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    /// Human-readable comment stored with the change
    pub comment: Option<String>,
    /// Changes, applied atomically by the provider
    pub changes: Vec<Change>,
}

/// Provider response to a submitted change batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInfo {
    /// Provider change identifier
    pub id: String,
    /// Change status as reported by the provider (e.g. "PENDING")
    pub status: String,
    /// Submission time as reported by the provider
    pub submitted_at: Option<String>,
    /// Comment echoed back by the provider
    pub comment: Option<String>,
}

/// Trait for DNS provider implementations
///
/// Providers are single-shot: every method performs its API call(s) once and
/// returns the result. Timeouts and the decision whether to write are owned by
/// the `Reconciler`; providers never retry.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every hosted zone visible to the configured credentials
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, crate::Error>;

    /// List every record set in a zone
    ///
    /// # Parameters
    ///
    /// - `zone_id`: zone identifier without the `/hostedzone/` prefix
    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>, crate::Error>;

    /// Submit a change batch and return the provider's response unmodified
    async fn change_record_sets(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
