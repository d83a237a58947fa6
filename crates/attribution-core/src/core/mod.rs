// crates/attribution-core/src/core/mod.rs
// ============================================================================
// Module: Attribution Core Types
// Description: Key schemas, domains, identifiers, registrations and reports.
// Purpose: Provide stable, serializable types shared by every surface.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types define the closed key-piece layouts and the registration and
//! report shapes exchanged with the browser. They hold no I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod domain;
pub mod fields;
pub mod identifiers;
pub mod key_piece;
pub mod registration;
pub mod report;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use domain::Advertiser;
pub use domain::Dimension;
pub use domain::DomainMember;
pub use domain::DomainValue;
pub use domain::Publisher;
pub use domain::SourceType;
pub use domain::TriggerType;
pub use fields::BucketLayout;
pub use fields::DecodedBucket;
pub use fields::DecodedKey;
pub use fields::DecodedSourceKey;
pub use fields::DecodedTriggerKey;
pub use fields::FieldRadix;
pub use fields::KeyFields;
pub use fields::SourceKeyFields;
pub use fields::TriggerKeyFields;
pub use fields::parse_field_text;
pub use identifiers::DebugKey;
pub use identifiers::SourceEventId;
pub use key_piece::KEY_PIECE_BYTES;
pub use key_piece::KeyPiece;
pub use registration::AggregatableTriggerData;
pub use registration::SourceRegistration;
pub use registration::TriggerRegistration;
pub use report::AcknowledgedReport;
pub use report::CleartextPayload;
pub use report::Contribution;
pub use report::DebugReport;
pub use report::IngestedPayload;
pub use report::PayloadEntry;
pub use report::RawAggregatableReport;
pub use report::RawServicePayload;
pub use schema::CodecError;
pub use schema::FieldDomain;
pub use schema::FieldSpec;
pub use schema::KeyKind;
pub use schema::KeySchema;
pub use schema::SOURCE_SCHEMA;
pub use schema::TRIGGER_SCHEMA;
