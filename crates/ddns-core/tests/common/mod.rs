//! Test doubles and common utilities for reconciler contract tests
//!
//! The fakes record every call they receive so tests can assert on exactly
//! which network operations a run performed, in which order.

#![allow(dead_code)]

use ddns_core::config::SyncConfig;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{ChangeBatch, ChangeInfo, DnsProvider, HostedZone, IpSource, RecordSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const MONITORED: &str = "somehost.somezone.com";
pub const ZONE: &str = "somezone.com";
pub const ZONE_ID: &str = "Z1D633PJN98FT9";

/// Shared call log between a fake provider, a fake IP source and the test
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// How a fake operation behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answer normally
    Answer,
    /// Return an error
    Fail,
    /// Never complete
    Stall,
}

/// A mock DnsProvider backed by fixed zones and record sets
pub struct MockDnsProvider {
    zones: Vec<HostedZone>,
    record_sets: Vec<RecordSet>,
    /// Behavior of change_record_sets()
    change_behavior: Behavior,
    /// Behavior of list_hosted_zones()
    zones_behavior: Behavior,
    /// Call counter for change_record_sets()
    change_call_count: Arc<AtomicUsize>,
    /// Submitted batches with their zone ids
    submitted: Arc<Mutex<Vec<(String, ChangeBatch)>>>,
    /// Zone ids passed to list_record_sets()
    listed_zone_ids: Arc<Mutex<Vec<String>>>,
    log: CallLog,
}

impl MockDnsProvider {
    pub fn new(zones: Vec<HostedZone>, record_sets: Vec<RecordSet>, log: CallLog) -> Self {
        Self {
            zones,
            record_sets,
            change_behavior: Behavior::Answer,
            zones_behavior: Behavior::Answer,
            change_call_count: Arc::new(AtomicUsize::new(0)),
            submitted: Arc::new(Mutex::new(Vec::new())),
            listed_zone_ids: Arc::new(Mutex::new(Vec::new())),
            log,
        }
    }

    /// Provider with the standard zone and the given record sets
    pub fn with_records(record_sets: Vec<RecordSet>, log: CallLog) -> Self {
        Self::new(standard_zones(), record_sets, log)
    }

    pub fn with_change_behavior(mut self, behavior: Behavior) -> Self {
        self.change_behavior = behavior;
        self
    }

    pub fn with_zones_behavior(mut self, behavior: Behavior) -> Self {
        self.zones_behavior = behavior;
        self
    }

    /// Create a new MockDnsProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: other.zones.clone(),
            record_sets: other.record_sets.clone(),
            change_behavior: other.change_behavior,
            zones_behavior: other.zones_behavior,
            change_call_count: Arc::clone(&other.change_call_count),
            submitted: Arc::clone(&other.submitted),
            listed_zone_ids: Arc::clone(&other.listed_zone_ids),
            log: Arc::clone(&other.log),
        }
    }

    /// Get the number of times change_record_sets() was called
    pub fn change_call_count(&self) -> usize {
        self.change_call_count.load(Ordering::SeqCst)
    }

    /// Get the submitted batches
    pub fn submitted(&self) -> Vec<(String, ChangeBatch)> {
        self.submitted.lock().unwrap().clone()
    }

    /// Get the zone ids record sets were listed for
    pub fn listed_zone_ids(&self) -> Vec<String> {
        self.listed_zone_ids.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>> {
        self.log.lock().unwrap().push("list_hosted_zones");
        match self.zones_behavior {
            Behavior::Answer => Ok(self.zones.clone()),
            Behavior::Fail => Err(Error::auth("AccessDenied")),
            Behavior::Stall => std::future::pending().await,
        }
    }

    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        self.log.lock().unwrap().push("list_record_sets");
        self.listed_zone_ids
            .lock()
            .unwrap()
            .push(zone_id.to_string());
        Ok(self.record_sets.clone())
    }

    async fn change_record_sets(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        self.log.lock().unwrap().push("change_record_sets");
        self.change_call_count.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap()
            .push((zone_id.to_string(), batch.clone()));

        match self.change_behavior {
            Behavior::Answer => Ok(ChangeInfo {
                id: "/change/C2682N5HXP0BZ4".to_string(),
                status: "PENDING".to_string(),
                submitted_at: Some("2024-03-05T14:07:00Z".to_string()),
                comment: batch.comment.clone(),
            }),
            Behavior::Fail => Err(Error::provider(
                "mock",
                "InvalidChangeBatch: RRSet with DNS name is not permitted in zone",
            )),
            Behavior::Stall => std::future::pending().await,
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IP source that returns a fixed answer
pub struct StaticIpSource {
    ip: String,
    behavior: Behavior,
    log: CallLog,
}

impl StaticIpSource {
    pub fn new(ip: &str, log: CallLog) -> Self {
        Self {
            ip: ip.to_string(),
            behavior: Behavior::Answer,
            log,
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<String> {
        self.log.lock().unwrap().push("public_ip");
        match self.behavior {
            Behavior::Answer => Ok(self.ip.clone()),
            Behavior::Fail => Err(Error::ip_source("Failed to parse response: expected value")),
            Behavior::Stall => std::future::pending().await,
        }
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// The zone list used by most tests: the configured zone plus decoys
pub fn standard_zones() -> Vec<HostedZone> {
    vec![
        HostedZone::new("/hostedzone/ZDECOY00000001", "othersomezone.com."),
        HostedZone::new("/hostedzone/ZDECOY00000002", "sub.somezone.com."),
        HostedZone::new(format!("/hostedzone/{}", ZONE_ID), "somezone.com."),
    ]
}

/// Record sets every zone carries regardless of the test
pub fn apex_records() -> Vec<RecordSet> {
    vec![
        RecordSet {
            name: "somezone.com.".to_string(),
            record_type: "NS".to_string(),
            ttl: Some(172800),
            values: vec!["ns-1.awsdns-00.com.".to_string()],
        },
        RecordSet {
            name: "somezone.com.".to_string(),
            record_type: "SOA".to_string(),
            ttl: Some(900),
            values: vec!["ns-1.awsdns-00.com. awsdns-hostmaster.amazon.com. 1 7200 900 1209600 86400".to_string()],
        },
    ]
}

/// Apex records plus an A record for the monitored hostname
pub fn records_with_monitored(value: &str) -> Vec<RecordSet> {
    let mut sets = apex_records();
    sets.push(RecordSet::a(format!("{}.", MONITORED), 300, value));
    sets
}

/// Minimal valid configuration; target equals monitored hostname
pub fn minimal_config() -> SyncConfig {
    let mut config = SyncConfig::new(MONITORED, MONITORED, ZONE);
    config.engine.call_timeout_secs = 1;
    config
}
