// # ddns-core
//
// Core library for the Route 53 dynamic DNS client.
//
// ## Architecture Overview
//
// - **DnsProvider**: Trait for listing zones and record sets and submitting changes
// - **IpSource**: Trait for discovering the current public IP
// - **Reconciler**: One idempotent pass: zone → record → IP → compare → upsert
// - **SyncConfig**: Explicit configuration, validated once at construction
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic is separate from provider SDKs
// 2. **Single Pass**: No loops, no persistent state; an external scheduler re-runs us
// 3. **Fail Fast**: The first failed call aborts the run; nothing is retried
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, IpSourceConfig, ProviderConfig, RecordSettings, SyncConfig};
pub use engine::{Outcome, ReconcileEvent, Reconciler, RecordValue};
pub use error::{Error, Result};
pub use traits::{DnsProvider, IpSource};
