// crates/attribution-core/src/core/registration.rs
// ============================================================================
// Module: Registration Objects
// Description: Source and trigger registration payloads.
// Purpose: Model the JSON objects carried in registration response headers.
// Dependencies: serde, crate::core::{identifiers, key_piece}
// ============================================================================

//! ## Overview
//! A source registration declares one key piece per aggregation dimension.
//! A trigger registration pairs each trigger key piece with exactly one
//! declared dimension and supplies the value to aggregate under it.
//! Aggregatable values are opaque integers and are never rescaled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DebugKey;
use crate::core::identifiers::SourceEventId;
use crate::core::key_piece::KeyPiece;

// ============================================================================
// SECTION: Source Registration
// ============================================================================

/// Body of the `Attribution-Reporting-Register-Source` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRegistration {
    /// Advertiser origin the source attributes to.
    pub destination: String,
    /// Source-event identifier.
    pub source_event_id: SourceEventId,
    /// Debug key echoed in debug reports.
    pub debug_key: DebugKey,
    /// Key piece per declared dimension name.
    pub aggregation_keys: BTreeMap<String, KeyPiece>,
}

// ============================================================================
// SECTION: Trigger Registration
// ============================================================================

/// One trigger key piece and the source dimensions it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatableTriggerData {
    /// Trigger key piece OR-ed into matching source keys.
    pub key_piece: KeyPiece,
    /// Source dimension names the piece applies to.
    pub source_keys: Vec<String>,
}

/// Body of the `Attribution-Reporting-Register-Trigger` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRegistration {
    /// Trigger key pieces with their dimension bindings.
    pub aggregatable_trigger_data: Vec<AggregatableTriggerData>,
    /// Value contributed per dimension name.
    pub aggregatable_values: BTreeMap<String, u32>,
    /// Debug key echoed in debug reports.
    pub debug_key: DebugKey,
}
