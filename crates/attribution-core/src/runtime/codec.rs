// crates/attribution-core/src/runtime/codec.rs
// ============================================================================
// Module: Key Piece Codec
// Description: Encoder and bucket decoder over the fixed key schemas.
// Purpose: Pack typed tuples into key pieces and recover them from buckets.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Encoding validates every field against its schema width and never
//! truncates. Decoding is total: any 128-bit value yields a tuple, with
//! unrecognised enumerated codes surfaced as
//! [`crate::core::DomainValue::Unknown`]. For every valid tuple `t` of kind
//! `k`, `decode(k, encode(t)) == t`.
//!
//! The codec is stateless and safe to call concurrently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::BucketLayout;
use crate::core::CodecError;
use crate::core::DecodedBucket;
use crate::core::DecodedKey;
use crate::core::DecodedSourceKey;
use crate::core::DecodedTriggerKey;
use crate::core::KeyFields;
use crate::core::KeyKind;
use crate::core::KeyPiece;
use crate::core::SOURCE_SCHEMA;
use crate::core::SourceKeyFields;
use crate::core::TRIGGER_SCHEMA;
use crate::core::TriggerKeyFields;

// ============================================================================
// SECTION: Encoder
// ============================================================================

/// Encodes a tuple of either kind.
///
/// # Errors
///
/// Returns [`CodecError::FieldOverflow`] when a field exceeds its width.
pub fn encode(fields: &KeyFields) -> Result<KeyPiece, CodecError> {
    match fields {
        KeyFields::Source(source) => encode_source(source),
        KeyFields::Trigger(trigger) => encode_trigger(trigger),
    }
}

/// Encodes a source tuple into the upper half of a key piece.
///
/// # Errors
///
/// Returns [`CodecError::FieldOverflow`] when a field exceeds its width.
pub fn encode_source(fields: &SourceKeyFields) -> Result<KeyPiece, CodecError> {
    SOURCE_SCHEMA.pack(fields.raw()).map(KeyPiece::new)
}

/// Encodes a trigger tuple into the lower half of a key piece.
///
/// # Errors
///
/// Returns [`CodecError::FieldOverflow`] when a field exceeds its width.
pub fn encode_trigger(fields: &TriggerKeyFields) -> Result<KeyPiece, CodecError> {
    TRIGGER_SCHEMA.pack(fields.raw()).map(KeyPiece::new)
}

// ============================================================================
// SECTION: Decoder
// ============================================================================

/// Decodes the fields of `kind` from a key piece or bucket.
#[must_use]
pub fn decode(kind: KeyKind, piece: KeyPiece) -> DecodedKey {
    match kind {
        KeyKind::Source => DecodedKey::Source(decode_source(piece)),
        KeyKind::Trigger => DecodedKey::Trigger(decode_trigger(piece)),
    }
}

/// Decodes the source half of a key piece.
#[must_use]
pub fn decode_source(piece: KeyPiece) -> DecodedSourceKey {
    DecodedSourceKey::from_raw(SOURCE_SCHEMA.unpack(piece.value()))
}

/// Decodes the trigger half of a key piece.
#[must_use]
pub fn decode_trigger(piece: KeyPiece) -> DecodedTriggerKey {
    DecodedTriggerKey::from_raw(TRIGGER_SCHEMA.unpack(piece.value()))
}

/// Decodes a report bucket under `layout`.
#[must_use]
pub fn decode_bucket(layout: BucketLayout, piece: KeyPiece) -> DecodedBucket {
    match layout {
        BucketLayout::Source => DecodedBucket::Source(decode_source(piece)),
        BucketLayout::Trigger => DecodedBucket::Trigger(decode_trigger(piece)),
        BucketLayout::Combined => DecodedBucket::Combined {
            source: decode_source(piece),
            trigger: decode_trigger(piece),
        },
    }
}
