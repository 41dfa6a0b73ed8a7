// crates/launchpad-config/src/config.rs
// ============================================================================
// Module: Launchpad Configuration
// Description: Configuration loading and validation for Launchpad.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: launchpad-core, launchpad-fetch, serde, toml, url, dirs
// ============================================================================

//! ## Overview
//! Configuration resolves in three layers: built-in defaults, an optional
//! TOML file, then environment overrides. An explicitly named file
//! (`--config` or `LAUNCHPAD_CONFIG`) must exist; the per-user default file is
//! optional. The merged result is validated before use.
//! Security posture: config inputs are untrusted; every URL, path, and limit
//! is checked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use launchpad_core::OrchestratorConfig;
use launchpad_core::RetryPolicy;
use launchpad_fetch::TransportPolicy;
use launchpad_fetch::policy::DEFAULT_MAX_MANIFEST_BYTES;
use launchpad_fetch::policy::DEFAULT_MAX_PAYLOAD_BYTES;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename inside the per-user config directory.
const DEFAULT_CONFIG_NAME: &str = "launchpad.toml";
/// Application directory name under platform config and data directories.
const APP_DIR_NAME: &str = "launchpad";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "LAUNCHPAD_CONFIG";
/// Environment variable overriding the manifest URL.
pub const MANIFEST_URL_ENV_VAR: &str = "LAUNCHPAD_MANIFEST_URL";
/// Environment variable overriding the fallback payload URL.
pub const PAYLOAD_URL_ENV_VAR: &str = "LAUNCHPAD_PAYLOAD_URL";
/// Environment variable overriding the store root.
pub const HOME_ENV_VAR: &str = "LAUNCHPAD_HOME";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 256 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum URL length.
const MAX_URL_LENGTH: usize = 2048;
/// Default entry point relative to an install directory.
const DEFAULT_ENTRY_POINT: &str = "bin/launchpad-runtime";
/// Minimum allowed timeout in milliseconds.
const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum allowed connect or manifest timeout in milliseconds.
const MAX_SHORT_TIMEOUT_MS: u64 = 120_000;
/// Maximum allowed download timeout in milliseconds.
const MAX_DOWNLOAD_TIMEOUT_MS: u64 = 6 * 60 * 60 * 1_000;
/// Maximum retry attempts per phase.
const MAX_RETRY_ATTEMPTS: u32 = 10;
/// Maximum retry backoff in milliseconds.
const MAX_BACKOFF_MS: u64 = 60_000;
/// Maximum lock wait in milliseconds.
const MAX_LOCK_WAIT_MS: u64 = 120_000;
/// Hard ceiling for the manifest size limit.
const MAX_MANIFEST_LIMIT_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Launchpad configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchpadConfig {
    /// Remote endpoints.
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// Filesystem locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Installed runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Transport settings.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Instance lock settings.
    #[serde(default)]
    pub lock: LockConfig,
}

/// Remote endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointsConfig {
    /// Manifest URL; required after overrides.
    #[serde(default)]
    pub manifest_url: String,
    /// Direct payload URL tried when the manifest payload URL fails.
    #[serde(default)]
    pub fallback_payload_url: Option<String>,
}

/// Filesystem locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Store root; defaults to the per-user data directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Installed runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Entry point relative to an install directory.
    #[serde(default = "default_entry_point")]
    pub entry_point: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            entry_point: default_entry_point(),
        }
    }
}

/// Transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NetworkConfig {
    /// Allow cleartext `http://` endpoints.
    pub allow_http: bool,
    /// Allow local `file://` endpoints.
    pub allow_file: bool,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Manifest request timeout in milliseconds.
    pub manifest_timeout_ms: u64,
    /// Payload download timeout in milliseconds.
    pub download_timeout_ms: u64,
    /// Maximum manifest size in bytes.
    pub max_manifest_bytes: u64,
    /// Maximum payload size in bytes.
    pub max_payload_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            allow_http: false,
            allow_file: false,
            connect_timeout_ms: 10_000,
            manifest_timeout_ms: 10_000,
            download_timeout_ms: 600_000,
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl NetworkConfig {
    /// Validates timeouts and size limits.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_range(
            "network.connect_timeout_ms",
            self.connect_timeout_ms,
            MIN_TIMEOUT_MS,
            MAX_SHORT_TIMEOUT_MS,
        )?;
        validate_range(
            "network.manifest_timeout_ms",
            self.manifest_timeout_ms,
            MIN_TIMEOUT_MS,
            MAX_SHORT_TIMEOUT_MS,
        )?;
        validate_range(
            "network.download_timeout_ms",
            self.download_timeout_ms,
            MIN_TIMEOUT_MS,
            MAX_DOWNLOAD_TIMEOUT_MS,
        )?;
        validate_range(
            "network.max_manifest_bytes",
            self.max_manifest_bytes,
            1,
            MAX_MANIFEST_LIMIT_BYTES,
        )?;
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "network.max_payload_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetryConfig {
    /// Manifest fetch attempts.
    pub manifest_attempts: u32,
    /// Payload download attempts per source.
    pub download_attempts: u32,
    /// Base backoff in milliseconds; attempt `n` waits `n * backoff_ms`.
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            manifest_attempts: 3,
            download_attempts: 3,
            backoff_ms: 500,
        }
    }
}

impl RetryConfig {
    /// Validates attempt counts and backoff.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, attempts) in [
            ("retry.manifest_attempts", self.manifest_attempts),
            ("retry.download_attempts", self.download_attempts),
        ] {
            validate_range(field, u64::from(attempts), 1, u64::from(MAX_RETRY_ATTEMPTS))?;
        }
        validate_range("retry.backoff_ms", self.backoff_ms, 0, MAX_BACKOFF_MS)
    }
}

/// Instance lock settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LockConfig {
    /// Bounded wait for the instance lock in milliseconds.
    pub wait_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_ms: 5_000,
        }
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl LaunchpadConfig {
    /// Loads configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration reading environment variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match resolve_path(path, &lookup)? {
            ConfigSource::Required(path) => Self::read_file(&path)?,
            ConfigSource::Optional(path) => match Self::read_file(&path) {
                Err(ConfigError::Io(_)) if !path.exists() => Self::default(),
                other => other?,
            },
            ConfigSource::Defaults => Self::default(),
        };
        config.apply_env_overrides(&lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a valid config.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads and parses a config file with size and encoding limits.
    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Applies `LAUNCHPAD_*` overrides; empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| {
            lookup(key).map(|raw| raw.trim().to_string()).filter(|raw| !raw.is_empty())
        };
        if let Some(url) = value(MANIFEST_URL_ENV_VAR) {
            self.endpoints.manifest_url = url;
        }
        if let Some(url) = value(PAYLOAD_URL_ENV_VAR) {
            self.endpoints.fallback_payload_url = Some(url);
        }
        if let Some(root) = value(HOME_ENV_VAR) {
            self.paths.root = Some(PathBuf::from(root));
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when any setting is out of bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.manifest_url.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "endpoints.manifest_url must be set (or {MANIFEST_URL_ENV_VAR})"
            )));
        }
        self.validate_url("endpoints.manifest_url", &self.endpoints.manifest_url)?;
        if let Some(url) = &self.endpoints.fallback_payload_url {
            self.validate_url("endpoints.fallback_payload_url", url)?;
        }
        if let Some(root) = &self.paths.root {
            validate_path_string("paths.root", &root.to_string_lossy())?;
        }
        validate_entry_point(&self.runtime.entry_point)?;
        self.network.validate()?;
        self.retry.validate()?;
        validate_range("lock.wait_ms", self.lock.wait_ms, 0, MAX_LOCK_WAIT_MS)
    }

    /// Checks a URL's syntax and scheme against the network policy.
    fn validate_url(&self, field: &str, raw: &str) -> Result<(), ConfigError> {
        if raw.len() > MAX_URL_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
        }
        let url = Url::parse(raw.trim())
            .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
        let allowed = match url.scheme() {
            "https" => true,
            "http" => self.network.allow_http,
            "file" => self.network.allow_file,
            _ => false,
        };
        if !allowed {
            return Err(ConfigError::Invalid(format!(
                "{field} uses scheme '{}' which is not allowed",
                url.scheme()
            )));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ConfigError::Invalid(format!("{field} must not embed credentials")));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Derived settings
    // ------------------------------------------------------------------------

    /// Returns the absolute store root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no root is configured and the platform
    /// has no data directory, or the root cannot be made absolute.
    pub fn store_root(&self) -> Result<PathBuf, ConfigError> {
        let root = match &self.paths.root {
            Some(root) => root.clone(),
            None => dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME)).ok_or_else(|| {
                ConfigError::Invalid("no per-user data directory; set paths.root".to_string())
            })?,
        };
        std::path::absolute(&root).map_err(|err: io::Error| ConfigError::Io(err.to_string()))
    }

    /// Returns the transport policy for fetch adapters.
    #[must_use]
    pub fn transport_policy(&self) -> TransportPolicy {
        TransportPolicy {
            allow_http: self.network.allow_http,
            allow_file: self.network.allow_file,
            connect_timeout: Duration::from_millis(self.network.connect_timeout_ms),
            max_manifest_bytes: self.network.max_manifest_bytes,
            max_payload_bytes: self.network.max_payload_bytes,
            ..TransportPolicy::default()
        }
    }

    /// Returns the orchestrator configuration.
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let backoff = Duration::from_millis(self.retry.backoff_ms);
        OrchestratorConfig {
            manifest_url: self.endpoints.manifest_url.trim().to_string(),
            fallback_payload_url: self
                .endpoints
                .fallback_payload_url
                .as_ref()
                .map(|url| url.trim().to_string()),
            manifest_timeout: Duration::from_millis(self.network.manifest_timeout_ms),
            download_timeout: Duration::from_millis(self.network.download_timeout_ms),
            lock_wait: Duration::from_millis(self.lock.wait_ms),
            manifest_retry: RetryPolicy::new(self.retry.manifest_attempts, backoff),
            download_retry: RetryPolicy::new(self.retry.download_attempts, backoff),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Where configuration is read from.
enum ConfigSource {
    /// Explicitly named file that must exist.
    Required(PathBuf),
    /// Per-user default file that may be absent.
    Optional(PathBuf),
    /// No file; defaults plus environment only.
    Defaults,
}

/// Resolves the config path from CLI, environment, or per-user defaults.
fn resolve_path(
    path: Option<&Path>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<ConfigSource, ConfigError> {
    if let Some(path) = path {
        return Ok(ConfigSource::Required(path.to_path_buf()));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.trim().is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ConfigSource::Required(PathBuf::from(env_path)));
    }
    Ok(dirs::config_dir().map_or(ConfigSource::Defaults, |dir| {
        ConfigSource::Optional(dir.join(APP_DIR_NAME).join(DEFAULT_CONFIG_NAME))
    }))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the entry point is a relative path without traversal.
fn validate_entry_point(path: &Path) -> Result<(), ConfigError> {
    validate_path_string("runtime.entry_point", &path.to_string_lossy())?;
    let mut normal = 0_usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            _ => {
                return Err(ConfigError::Invalid(
                    "runtime.entry_point must be relative without traversal".to_string(),
                ));
            }
        }
    }
    if normal == 0 {
        return Err(ConfigError::Invalid("runtime.entry_point must name a file".to_string()));
    }
    Ok(())
}

/// Validates an integer setting lies within `[min, max]`.
fn validate_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::Invalid(format!("{field} must be between {min} and {max}")));
    }
    Ok(())
}

/// Default entry point.
fn default_entry_point() -> PathBuf {
    PathBuf::from(DEFAULT_ENTRY_POINT)
}
