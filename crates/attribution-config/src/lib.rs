// crates/attribution-config/src/lib.rs
// ============================================================================
// Module: Attribution Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for attribution-ssp.toml semantics.
// Dependencies: attribution-core, serde, toml
// ============================================================================

//! ## Overview
//! `attribution-config` defines the configuration model for the attribution
//! server. Validation is strict and fails closed; every value the server and
//! CLI consume has already been checked here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AttributionConfig;
pub use config::ConfigError;
pub use config::IngestConfig;
pub use config::RegistrationConfig;
pub use config::ServerAuditConfig;
pub use config::ServerConfig;
