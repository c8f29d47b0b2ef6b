// # ddns-sync - one-shot Route 53 dynamic DNS updater
//
// This binary is a THIN integration layer:
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Build the Route 53 provider and the HTTP IP source
// 4. Run the Reconciler once and exit
//
// Reconciliation logic lives in ddns-core. Scheduling is left to cron or a
// systemd timer; this process never loops.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Records
// - `DDNS_MONITORED_HOSTNAME`: Hostname whose published value is compared (required)
// - `DDNS_TARGET_HOSTNAME`: Hostname the upsert publishes to (default: monitored hostname)
// - `DDNS_HOSTED_ZONE`: Hosted zone name without trailing dot (required)
// - `DDNS_RECORD_TTL`: TTL of the published record (default: 300)
//
// ### DNS Provider
// - `DDNS_AWS_PROFILE`: Shared-config profile for credentials (default: credential chain)
// - `DDNS_AWS_REGION`: Region override (default: region chain, then us-east-1)
// - `DDNS_MODE`: `dry-run` to log the change instead of submitting it
//
// ### IP Source
// - `DDNS_IP_SOURCE_URL`: JSON IP echo endpoint (default: https://api.ipify.org?format=json)
// - `DDNS_IP_SOURCE_TIMEOUT_SECS`: HTTP client timeout (default: 10)
//
// ### Reconciler
// - `DDNS_CALL_TIMEOUT_SECS`: Upper bound for each network call (default: 20)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export DDNS_MONITORED_HOSTNAME=somehost.somezone.com
// export DDNS_HOSTED_ZONE=somezone.com
// export DDNS_AWS_PROFILE=home
//
// ddns-sync
// ```

use anyhow::{Context, Result};
use ddns_core::{Outcome, ReconcileEvent, Reconciler, SyncConfig};
use ddns_ip_http::HttpIpSource;
use ddns_provider_route53::{DRY_RUN_STATUS, Route53Provider};
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Record updated or already in sync
/// - 1: Configuration or startup error
/// - 2: Runtime error (lookup, network, provider rejection, timeout)
#[derive(Debug, Clone, Copy)]
enum SyncExitCode {
    /// Record updated or already in sync
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration as read from the environment
#[derive(Debug)]
struct Config {
    monitored_hostname: String,
    target_hostname: Option<String>,
    hosted_zone: String,
    aws_profile: Option<String>,
    aws_region: Option<String>,
    ip_source_url: Option<String>,
    ip_source_timeout_secs: Option<u64>,
    record_ttl: Option<i64>,
    call_timeout_secs: Option<u64>,
    dry_run: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            monitored_hostname: non_empty("DDNS_MONITORED_HOSTNAME").context(
                "DDNS_MONITORED_HOSTNAME is required. \
                Set it via: export DDNS_MONITORED_HOSTNAME=somehost.somezone.com",
            )?,
            target_hostname: non_empty("DDNS_TARGET_HOSTNAME"),
            hosted_zone: non_empty("DDNS_HOSTED_ZONE").context(
                "DDNS_HOSTED_ZONE is required. \
                Set it via: export DDNS_HOSTED_ZONE=somezone.com",
            )?,
            aws_profile: non_empty("DDNS_AWS_PROFILE"),
            aws_region: non_empty("DDNS_AWS_REGION"),
            ip_source_url: non_empty("DDNS_IP_SOURCE_URL"),
            ip_source_timeout_secs: parse_var(&non_empty, "DDNS_IP_SOURCE_TIMEOUT_SECS")?,
            record_ttl: parse_var(&non_empty, "DDNS_RECORD_TTL")?,
            call_timeout_secs: parse_var(&non_empty, "DDNS_CALL_TIMEOUT_SECS")?,
            dry_run: non_empty("DDNS_MODE")
                .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("dry-run")),
            log_level: non_empty("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Resolve the tracing level
    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Build and validate the reconciler configuration
    fn into_sync_config(self) -> Result<SyncConfig> {
        let target = self
            .target_hostname
            .unwrap_or_else(|| self.monitored_hostname.clone());

        let mut config = SyncConfig::new(self.monitored_hostname, target, self.hosted_zone);
        config.provider.profile = self.aws_profile;
        config.provider.region = self.aws_region;
        config.provider.dry_run = self.dry_run;
        if let Some(url) = self.ip_source_url {
            config.ip_source.url = url;
        }
        if let Some(secs) = self.ip_source_timeout_secs {
            config.ip_source.timeout_secs = secs;
        }
        if let Some(ttl) = self.record_ttl {
            config.record.ttl = ttl;
        }
        if let Some(secs) = self.call_timeout_secs {
            config.engine.call_timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse an optional numeric variable; present-but-invalid is an error
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} must be a number. Got '{}': {}", key, raw, e)),
        None => Ok(None),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = match config.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    // Validate configuration
    let sync_config = match config.into_sync_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration validation error: {:#}", e);
            eprintln!("Configuration validation error: {:#}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    info!(
        "Checking {} in zone {}",
        sync_config.monitored_hostname, sync_config.hosted_zone
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run(sync_config));

    match result {
        Ok(outcome) => {
            info!("{}", outcome_summary(&outcome));
            SyncExitCode::Success.into()
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            eprintln!("Sync failed: {}", e);
            if e.is_config() {
                SyncExitCode::ConfigError.into()
            } else {
                SyncExitCode::RuntimeError.into()
            }
        }
    }
}

/// Final log line for a successful pass
fn outcome_summary(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Unchanged { ip } => format!("IPs match ({}). Exiting.", ip),
        Outcome::Updated { ip, change, .. } if change.status == DRY_RUN_STATUS => {
            format!("[DRY-RUN] Update to {} was not submitted", ip)
        }
        Outcome::Updated { ip, change, .. } => {
            format!("Update to {} submitted as {} ({})", ip, change.id, change.status)
        }
    }
}

/// Build the components and run one reconciliation pass
async fn run(config: SyncConfig) -> ddns_core::Result<Outcome> {
    let ip_source = HttpIpSource::from_config(&config.ip_source)?;
    let provider = Route53Provider::from_config(&config.provider).await;

    let (reconciler, mut events) =
        Reconciler::new(Box::new(provider), Box::new(ip_source), config)?;

    let result = reconciler.run().await;
    log_events(&mut events);
    result
}

/// Trace the run's events
fn log_events(events: &mut mpsc::Receiver<ReconcileEvent>) {
    while let Ok(event) = events.try_recv() {
        debug!("Reconcile event: {:?}", event);
    }
}
