//! Reconciler
//!
//! The Reconciler performs one idempotent pass:
//! - Resolve the hosted zone id from its name
//! - Read the value currently published for the monitored hostname
//! - Read the current public IP
//! - Upsert the target hostname when the two differ
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  Reconciler  │
//!                    └──────────────┘
//!                           │
//!         ┌─────────────────┼─────────────────┐
//!         │                 │                 │
//!         ▼                 ▼                 ▼
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ DnsProvider │   │   IpSource   │   │   Events    │
//! │ (read/write)│   │   (read)     │   │  (notify)   │
//! └─────────────┘   └──────────────┘   └─────────────┘
//! ```
//!
//! ## Flow
//!
//! zone lookup → record lookup → IP lookup → comparison → conditional upsert
//!
//! Calls are issued strictly one after another and each one is bounded by the
//! configured per-call timeout. The first failure ends the run.

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::traits::{Change, ChangeAction, ChangeBatch, ChangeInfo, DnsProvider, IpSource, RecordSet};
use chrono::{DateTime, Local, TimeZone};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Value currently published for a hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValue {
    /// First value of the first matching record set
    Found(String),
    /// No record set matched the hostname
    NotFound,
}

impl RecordValue {
    /// Whether the published value equals `ip` (plain string comparison)
    pub fn matches(&self, ip: &str) -> bool {
        matches!(self, RecordValue::Found(value) if value == ip)
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Found(value) => f.write_str(value),
            RecordValue::NotFound => f.write_str("NOT FOUND"),
        }
    }
}

/// Result of a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Published value already equals the public IP
    Unchanged {
        /// The public IP
        ip: String,
    },

    /// An upsert was submitted
    Updated {
        /// Value published before the run
        previous: RecordValue,
        /// Value submitted
        ip: String,
        /// Provider response
        change: ChangeInfo,
    },
}

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Run started
    Started {
        monitored_hostname: String,
        target_hostname: String,
        hosted_zone: String,
    },

    /// Hosted zone resolved
    ZoneResolved { hosted_zone: String, zone_id: String },

    /// Published value read
    RecordRead { hostname: String, value: RecordValue },

    /// Public IP read
    PublicIpRead { ip: String },

    /// Upsert about to be submitted
    UpdateStarted { target_hostname: String, ip: String },

    /// Upsert accepted by the provider
    UpdateSubmitted {
        target_hostname: String,
        ip: String,
        change: ChangeInfo,
    },

    /// No update needed
    UpdateSkipped { hostname: String, ip: String },

    /// Run aborted
    Failed { error: String },
}

/// Build the human-readable comment stored with a change
pub fn change_comment<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!(
        "Updating via ddns-sync at {}",
        at.format("%I:%M%p, %B %d, %Y")
    )
}

/// Build the single-change UPSERT batch for an A record
pub fn upsert_batch<Tz>(target_hostname: &str, ttl: i64, ip: &str, at: &DateTime<Tz>) -> ChangeBatch
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    ChangeBatch {
        comment: Some(change_comment(at)),
        changes: vec![Change {
            action: ChangeAction::Upsert,
            record_set: RecordSet::a(fqdn(target_hostname), ttl, ip),
        }],
    }
}

fn fqdn(name: &str) -> String {
    format!("{}.", name)
}

/// Core reconciler
///
/// Owns the provider and IP source for the duration of one run.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`] (validates the configuration)
/// 2. Call [`Reconciler::run()`] once
/// 3. Drop
pub struct Reconciler {
    /// DNS provider for reading and writing records
    provider: Box<dyn DnsProvider>,

    /// Source of the current public IP
    ip_source: Box<dyn IpSource>,

    /// Hostname whose published value is compared
    monitored_hostname: String,

    /// Hostname the upsert publishes to
    target_hostname: String,

    /// Hosted zone name without trailing dot
    hosted_zone: String,

    /// TTL of the published record
    record_ttl: i64,

    /// Per-call timeout (in seconds)
    call_timeout_secs: u64,

    /// Event sender for external observers
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `ip_source`: public IP source implementation
    /// - `config`: client configuration, validated here
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields reconcile events
    pub fn new(
        provider: Box<dyn DnsProvider>,
        ip_source: Box<dyn IpSource>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        if config.monitored_hostname != config.target_hostname {
            warn!(
                "Monitored hostname {} differs from target hostname {}; updates will not converge on the monitored record",
                config.monitored_hostname, config.target_hostname
            );
        }

        let reconciler = Self {
            provider,
            ip_source,
            monitored_hostname: config.monitored_hostname,
            target_hostname: config.target_hostname,
            hosted_zone: config.hosted_zone,
            record_ttl: config.record.ttl,
            call_timeout_secs: config.engine.call_timeout_secs,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome)`: The record is (now) in sync, or an upsert was accepted
    /// - `Err(Error)`: The first failure encountered; nothing after it was attempted
    pub async fn run(&self) -> Result<Outcome> {
        self.emit_event(ReconcileEvent::Started {
            monitored_hostname: self.monitored_hostname.clone(),
            target_hostname: self.target_hostname.clone(),
            hosted_zone: self.hosted_zone.clone(),
        });

        let result = self.run_internal().await;

        if let Err(e) = &result {
            self.emit_event(ReconcileEvent::Failed {
                error: e.to_string(),
            });
        }

        result
    }

    async fn run_internal(&self) -> Result<Outcome> {
        let zone_id = self.resolve_zone(&self.hosted_zone).await?;
        let current = self
            .read_current_record_value(&zone_id, &self.monitored_hostname)
            .await?;
        let ip = self.read_current_public_ip().await?;

        info!(
            "Public IP is {}. Address for {} in {} is {}.",
            ip,
            self.monitored_hostname,
            self.provider.provider_name(),
            current
        );

        if current.matches(&ip) {
            info!("IPs match, no action needed");
            self.emit_event(ReconcileEvent::UpdateSkipped {
                hostname: self.monitored_hostname.clone(),
                ip: ip.clone(),
            });
            return Ok(Outcome::Unchanged { ip });
        }

        warn!("Update needed, updating {}", self.target_hostname);
        self.emit_event(ReconcileEvent::UpdateStarted {
            target_hostname: self.target_hostname.clone(),
            ip: ip.clone(),
        });

        let change = self.upsert(&zone_id, &self.target_hostname, &ip).await?;

        info!(
            "Update request submitted. Response is: {}",
            serde_json::to_string(&change)?
        );
        self.emit_event(ReconcileEvent::UpdateSubmitted {
            target_hostname: self.target_hostname.clone(),
            ip: ip.clone(),
            change: change.clone(),
        });

        Ok(Outcome::Updated {
            previous: current,
            ip,
            change,
        })
    }

    /// Resolve a hosted zone name (no trailing dot) to its bare zone id
    ///
    /// The first zone named `zone_name + "."` wins.
    pub async fn resolve_zone(&self, zone_name: &str) -> Result<String> {
        let zones = self
            .call("list_hosted_zones", self.provider.list_hosted_zones())
            .await?;

        let wanted = fqdn(zone_name);
        let zone = zones
            .iter()
            .find(|z| z.name == wanted)
            .ok_or_else(|| Error::zone_not_found(zone_name))?;

        let zone_id = zone.bare_id().to_string();
        debug!("Resolved zone {} to {}", zone_name, zone_id);

        self.emit_event(ReconcileEvent::ZoneResolved {
            hosted_zone: zone_name.to_string(),
            zone_id: zone_id.clone(),
        });

        Ok(zone_id)
    }

    /// Read the value currently published for `hostname` (no trailing dot)
    ///
    /// Absence is a normal outcome: [`RecordValue::NotFound`]. Only the record
    /// name is matched, the type is not.
    pub async fn read_current_record_value(
        &self,
        zone_id: &str,
        hostname: &str,
    ) -> Result<RecordValue> {
        let sets = self
            .call("list_record_sets", self.provider.list_record_sets(zone_id))
            .await?;

        let wanted = fqdn(hostname);
        let value = sets
            .iter()
            .find(|s| s.name == wanted)
            .and_then(|s| s.values.first())
            .map_or(RecordValue::NotFound, |v| RecordValue::Found(v.clone()));

        debug!("Record {} in zone {}: {}", hostname, zone_id, value);

        self.emit_event(ReconcileEvent::RecordRead {
            hostname: hostname.to_string(),
            value: value.clone(),
        });

        Ok(value)
    }

    /// Read the current public IP from the IP source
    pub async fn read_current_public_ip(&self) -> Result<String> {
        let ip = self.call("public_ip", self.ip_source.current()).await?;

        debug!("{} reported public IP {}", self.ip_source.source_name(), ip);

        self.emit_event(ReconcileEvent::PublicIpRead { ip: ip.clone() });

        Ok(ip)
    }

    /// Upsert an A record for `target_hostname` (no trailing dot) with `ip`
    ///
    /// Returns the provider's response unmodified.
    pub async fn upsert(&self, zone_id: &str, target_hostname: &str, ip: &str) -> Result<ChangeInfo> {
        let batch = upsert_batch(target_hostname, self.record_ttl, ip, &Local::now());

        debug!(
            "Submitting change batch to zone {}: {}",
            zone_id,
            serde_json::to_string(&batch)?
        );

        self.call(
            "change_record_sets",
            self.provider.change_record_sets(zone_id, &batch),
        )
        .await
    }

    /// Bound a single network call by the per-call timeout
    async fn call<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(Duration::from_secs(self.call_timeout_secs), fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(operation, self.call_timeout_secs)),
        }
    }

    /// Emit a reconcile event
    fn emit_event(&self, event: ReconcileEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
