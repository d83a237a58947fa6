// crates/attribution-config/src/config.rs
// ============================================================================
// Module: Attribution Configuration
// Description: Configuration loading and validation for the attribution server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: attribution-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! An explicit path (argument or environment variable) must exist; only the
//! implicit default file may be absent, in which case built-in defaults apply.
//! Invalid values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use attribution_core::BucketLayout;
use attribution_core::DomainMember;
use attribution_core::IngestPolicy;
use attribution_core::Publisher;
use attribution_core::RegistrationBuilder;
use attribution_core::runtime::DEFAULT_DESTINATION_TEMPLATE;
use attribution_core::runtime::DEFAULT_MAX_CLEARTEXT_BYTES;
use attribution_core::runtime::DEFAULT_MAX_PAYLOADS;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "attribution-ssp.toml";
/// Environment variable naming the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "ATTRIBUTION_SSP_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for `server.max_body_bytes`.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Upper bound for `ingest.max_payloads`.
pub(crate) const MAX_PAYLOADS_LIMIT: usize = 1024;
/// Placeholder substituted with the advertiser name.
const ADVERTISER_PLACEHOLDER: &str = "{advertiser}";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Attribution server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttributionConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Registration header configuration.
    #[serde(default)]
    pub registration: RegistrationConfig,
    /// Report ingestion configuration.
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl AttributionConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if !explicit && err.kind() == ErrorKind::NotFound => {
                let mut config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(err) => return Err(ConfigError::Io(err.to_string())),
        };
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.registration.validate()?;
        self.ingest.validate()?;
        if self.ingest.max_cleartext_bytes > self.server.max_body_bytes {
            return Err(ConfigError::Invalid(
                "ingest.max_cleartext_bytes must not exceed server.max_body_bytes".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid("max_body_bytes exceeds limit".to_string()));
        }
        self.bind_addr()?;
        self.audit.validate()
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

/// Registration header configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// Publisher name recorded on source key pieces.
    #[serde(default = "default_publisher")]
    pub publisher: String,
    /// Advertiser destination template containing `{advertiser}`.
    #[serde(default = "default_destination_template")]
    pub destination_template: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            publisher: default_publisher(),
            destination_template: default_destination_template(),
        }
    }
}

impl RegistrationConfig {
    /// Resolves the configured publisher.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown publisher name.
    pub fn publisher(&self) -> Result<Publisher, ConfigError> {
        Publisher::from_name(&self.publisher)
            .map_err(|err| ConfigError::Invalid(format!("registration.publisher: {err}")))
    }

    /// Builds the registration builder described by this section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown publisher name.
    pub fn builder(&self) -> Result<RegistrationBuilder, ConfigError> {
        Ok(RegistrationBuilder::new(self.publisher()?, self.destination_template.trim()))
    }

    /// Validates registration configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.publisher()?;
        let template = self.destination_template.trim();
        if !template.contains(ADVERTISER_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "registration.destination_template must contain {ADVERTISER_PLACEHOLDER}"
            )));
        }
        if !(template.starts_with("https://") || template.starts_with("http://")) {
            return Err(ConfigError::Invalid(
                "registration.destination_template must be an http(s) origin".to_string(),
            ));
        }
        if template.ends_with('/') {
            return Err(ConfigError::Invalid(
                "registration.destination_template must not end with '/'".to_string(),
            ));
        }
        Ok(())
    }
}

/// Report ingestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Layout for operations other than `histogram`.
    #[serde(default)]
    pub default_bucket_layout: BucketLayout,
    /// Maximum payloads accepted per report.
    #[serde(default = "default_max_payloads")]
    pub max_payloads: usize,
    /// Maximum base64 cleartext length per payload.
    #[serde(default = "default_max_cleartext_bytes")]
    pub max_cleartext_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_bucket_layout: BucketLayout::default(),
            max_payloads: default_max_payloads(),
            max_cleartext_bytes: default_max_cleartext_bytes(),
        }
    }
}

impl IngestConfig {
    /// Returns the ingestion policy for this section.
    #[must_use]
    pub const fn policy(&self) -> IngestPolicy {
        IngestPolicy {
            default_layout: self.default_bucket_layout,
            max_payloads: self.max_payloads,
            max_cleartext_bytes: self.max_cleartext_bytes,
        }
    }

    /// Validates ingestion limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payloads == 0 || self.max_payloads > MAX_PAYLOADS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "ingest.max_payloads must be between 1 and {MAX_PAYLOADS_LIMIT}"
            )));
        }
        if self.max_cleartext_bytes == 0 {
            return Err(ConfigError::Invalid(
                "ingest.max_cleartext_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
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
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// The boolean is true when the path was named explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
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
    validate_path(Path::new(trimmed))
        .map_err(|_| ConfigError::Invalid(format!("{field} exceeds path limits")))
}

/// Default bind address.
fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Default maximum request body size in bytes.
pub(crate) const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Default audit logging toggle.
pub(crate) const fn default_audit_enabled() -> bool {
    true
}

/// Default publisher name.
fn default_publisher() -> String {
    Publisher::News.name().to_string()
}

/// Default destination template.
fn default_destination_template() -> String {
    DEFAULT_DESTINATION_TEMPLATE.to_string()
}

/// Default payload limit.
const fn default_max_payloads() -> usize {
    DEFAULT_MAX_PAYLOADS
}

/// Default cleartext limit.
const fn default_max_cleartext_bytes() -> usize {
    DEFAULT_MAX_CLEARTEXT_BYTES
}
