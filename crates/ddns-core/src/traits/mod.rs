//! Core traits for the dynamic DNS client
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: Read zones and record sets, submit change batches
//! - [`IpSource`]: Discover the current public IP

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::{
    Change, ChangeAction, ChangeBatch, ChangeInfo, DnsProvider, HOSTED_ZONE_ID_PREFIX, HostedZone,
    RecordSet,
};
pub use ip_source::IpSource;
