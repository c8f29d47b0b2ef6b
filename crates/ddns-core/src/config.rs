//! Configuration types for the dynamic DNS client
//!
//! All settings are supplied once at startup and validated before the
//! reconciler is constructed. Nothing here reads the environment; that is the
//! binary's job.

use serde::{Deserialize, Serialize};

/// Default public IP echo service
pub const DEFAULT_IP_SOURCE_URL: &str = "https://api.ipify.org?format=json";

/// Default TTL (seconds) of the published record
pub const DEFAULT_RECORD_TTL: i64 = 300;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Fully-qualified name whose published value is compared (no trailing dot)
    pub monitored_hostname: String,

    /// Fully-qualified name the upsert publishes to (no trailing dot)
    ///
    /// Usually the same as `monitored_hostname`. Setting them apart is
    /// allowed so the mismatch is always an explicit choice.
    pub target_hostname: String,

    /// Hosted zone name without trailing dot (e.g. "somezone.com")
    pub hosted_zone: String,

    /// DNS provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Public IP source settings
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Settings of the published record
    #[serde(default)]
    pub record: RecordSettings,

    /// Reconciler settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a configuration with defaults for everything but the names
    pub fn new(
        monitored_hostname: impl Into<String>,
        target_hostname: impl Into<String>,
        hosted_zone: impl Into<String>,
    ) -> Self {
        Self {
            monitored_hostname: monitored_hostname.into(),
            target_hostname: target_hostname.into(),
            hosted_zone: hosted_zone.into(),
            provider: ProviderConfig::default(),
            ip_source: IpSourceConfig::default(),
            record: RecordSettings::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name("monitored hostname", &self.monitored_hostname)?;
        validate_domain_name("target hostname", &self.target_hostname)?;
        validate_domain_name("hosted zone", &self.hosted_zone)?;

        self.provider.validate()?;
        self.ip_source.validate()?;
        self.record.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// DNS provider configuration (AWS Route 53)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Shared-config profile to load credentials from (None = default chain)
    #[serde(default)]
    pub profile: Option<String>,

    /// Region override for the SDK client
    #[serde(default)]
    pub region: Option<String>,

    /// Perform reads but only log the change batch instead of submitting it
    #[serde(default)]
    pub dry_run: bool,
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let Some(profile) = &self.profile
            && profile.trim().is_empty()
        {
            return Err(crate::Error::config("AWS profile cannot be blank"));
        }
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(crate::Error::config("AWS region cannot be blank"));
        }
        Ok(())
    }
}

/// Public IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL of the JSON IP echo service
    #[serde(default = "default_ip_source_url")]
    pub url: String,

    /// HTTP client timeout (in seconds)
    #[serde(default = "default_ip_source_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("IP source URL cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "IP source URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP source timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_source_url(),
            timeout_secs: default_ip_source_timeout_secs(),
        }
    }
}

/// Settings of the published A record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSettings {
    /// TTL in seconds
    #[serde(default = "default_record_ttl")]
    pub ttl: i64,
}

impl RecordSettings {
    /// Validate the record settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        // RFC 2181 §8: TTL is an unsigned 31-bit value
        if !(1..=i64::from(i32::MAX)).contains(&self.ttl) {
            return Err(crate::Error::config(format!(
                "Record TTL must be between 1 and {}. Got: {}",
                i32::MAX,
                self.ttl
            )));
        }
        Ok(())
    }
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            ttl: default_record_ttl(),
        }
    }
}

/// Reconciler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound for each individual network call (in seconds)
    ///
    /// An expired call aborts the run like any other failure.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Capacity of the reconcile event channel
    ///
    /// When full, events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the reconciler configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(1..=300).contains(&self.call_timeout_secs) {
            return Err(crate::Error::config(format!(
                "Call timeout must be between 1 and 300 seconds. Got: {}",
                self.call_timeout_secs
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Validate that a string is a fully-qualified domain name without trailing dot
///
/// Basic RFC 1035 checks: total length, label length, allowed characters.
pub fn validate_domain_name(what: &str, domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }

    if domain.ends_with('.') {
        return Err(crate::Error::config(format!(
            "{} must not end with a dot (it is appended automatically). Got: {}",
            what, domain
        )));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "{} too long: {} chars (max 253). Got: {}",
            what,
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "{} has empty label: '{}'",
                what, domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "{} label too long: {} chars (max 63). Label: '{}'",
                what,
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "{} label contains invalid characters. Label: '{}'",
                what, label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "{} label cannot start or end with hyphen. Label: '{}'",
                what, label
            )));
        }
    }

    Ok(())
}

fn default_ip_source_url() -> String {
    DEFAULT_IP_SOURCE_URL.to_string()
}

fn default_ip_source_timeout_secs() -> u64 {
    10
}

fn default_record_ttl() -> i64 {
    DEFAULT_RECORD_TTL
}

fn default_call_timeout_secs() -> u64 {
    20
}

fn default_event_channel_capacity() -> usize {
    64
}
