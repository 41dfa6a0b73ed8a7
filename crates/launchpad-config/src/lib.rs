// crates/launchpad-config/src/lib.rs
// ============================================================================
// Module: Launchpad Config Library
// Description: Configuration model, loading, and validation.
// Purpose: Turn a TOML file plus environment overrides into adapter settings.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! [`LaunchpadConfig`] is the single source of launcher settings. It is
//! loaded from TOML, overlaid with `LAUNCHPAD_*` environment variables, and
//! validated before any adapter is built from it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::EndpointsConfig;
pub use config::HOME_ENV_VAR;
pub use config::LaunchpadConfig;
pub use config::LockConfig;
pub use config::MANIFEST_URL_ENV_VAR;
pub use config::NetworkConfig;
pub use config::PAYLOAD_URL_ENV_VAR;
pub use config::PathsConfig;
pub use config::RetryConfig;
pub use config::RuntimeConfig;
