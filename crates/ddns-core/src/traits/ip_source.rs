// # IP Source Trait
//
// Defines the interface for discovering the caller's current public IP.
//
// ## Implementations
//
// - HTTP JSON echo service (ipify): `ddns-ip-http` crate

use async_trait::async_trait;

/// Trait for public IP source implementations
///
/// The returned address is a plain string. It is compared against the
/// published record value as-is, without parsing or normalization.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The address reported by the source
    /// - `Err(Error)`: If the source is unreachable or its answer malformed
    async fn current(&self) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
