// crates/attribution-core/src/core/schema.rs
// ============================================================================
// Module: Key Piece Schemas
// Description: Fixed field layouts for source and trigger key pieces.
// Purpose: Define bit widths, ordering, and packing primitives in one place.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A key piece is a 128-bit integer formed by concatenating fixed-width
//! fields, most significant field first. Source key pieces occupy the upper
//! 64 bits and trigger key pieces the lower 64 bits, so the aggregation
//! service's bitwise OR of the two yields a bucket that carries both tuples.
//!
//! The layouts are closed: widths and field counts are compile-time tables.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Field Specs
// ============================================================================

/// Value space of a single key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "domain", rename_all = "snake_case")]
pub enum FieldDomain {
    /// Enumerated code table identified by its domain label.
    Enumerated(&'static str),
    /// Plain unsigned integer.
    Numeric,
}

/// One fixed-width field of a key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Field name.
    pub name: &'static str,
    /// Width in bits (1..=64).
    pub width: u32,
    /// Value space of the field.
    pub domain: FieldDomain,
}

impl FieldSpec {
    /// Largest value representable in this field.
    #[must_use]
    pub const fn max_value(&self) -> u64 {
        if self.width >= u64::BITS { u64::MAX } else { (1u64 << self.width) - 1 }
    }

    /// Checks that `value` fits in the field width.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::FieldOverflow`] when `value >= 2^width`.
    pub fn check(&self, value: u128) -> Result<u64, CodecError> {
        u64::try_from(value).ok().filter(|fits| *fits <= self.max_value()).ok_or(
            CodecError::FieldOverflow {
                field: self.name,
                value,
                width: self.width,
            },
        )
    }

    /// Extracts this field's raw bits from `value` with the field's lowest bit at `shift`.
    fn extract(&self, value: u128, shift: u32) -> u64 {
        let mask = u128::from(self.max_value());
        u64::try_from((value >> shift) & mask).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// SECTION: Key Kinds
// ============================================================================

/// Registration event a key piece belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Registration-time (view/click) key piece.
    Source,
    /// Conversion-time key piece.
    Trigger,
}

impl KeyKind {
    /// Returns the fixed schema for this kind.
    #[must_use]
    pub const fn schema(self) -> &'static KeySchema {
        match self {
            Self::Source => &SOURCE_SCHEMA,
            Self::Trigger => &TRIGGER_SCHEMA,
        }
    }

    /// Returns the stable label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Trigger => "trigger",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyKind {
    type Err = CodecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "source" => Ok(Self::Source),
            "trigger" => Ok(Self::Trigger),
            other => Err(CodecError::UnknownDomainCode {
                domain: "key_kind",
                code: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Ordered field layout of one key kind.
///
/// # Invariants
/// - `offset + sum(widths) <= 128`.
/// - Fields are listed most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeySchema {
    /// Key kind described by this schema.
    pub kind: KeyKind,
    /// Bit position of the least significant field.
    pub offset: u32,
    /// Fields, most significant first.
    pub fields: &'static [FieldSpec],
}

/// Source key layout: upper 64 bits of the key piece.
pub const SOURCE_SCHEMA: KeySchema = KeySchema {
    kind: KeyKind::Source,
    offset: 64,
    fields: &[
        FieldSpec {
            name: "source_type",
            width: 8,
            domain: FieldDomain::Enumerated("source_type"),
        },
        FieldSpec {
            name: "advertiser",
            width: 8,
            domain: FieldDomain::Enumerated("advertiser"),
        },
        FieldSpec {
            name: "publisher",
            width: 8,
            domain: FieldDomain::Enumerated("publisher"),
        },
        FieldSpec {
            name: "item_id",
            width: 32,
            domain: FieldDomain::Numeric,
        },
        FieldSpec {
            name: "dimension",
            width: 8,
            domain: FieldDomain::Enumerated("dimension"),
        },
    ],
};

/// Trigger key layout: lower 64 bits of the key piece.
pub const TRIGGER_SCHEMA: KeySchema = KeySchema {
    kind: KeyKind::Trigger,
    offset: 0,
    fields: &[
        FieldSpec {
            name: "trigger_type",
            width: 8,
            domain: FieldDomain::Enumerated("trigger_type"),
        },
        FieldSpec {
            name: "item_id",
            width: 32,
            domain: FieldDomain::Numeric,
        },
        FieldSpec {
            name: "size",
            width: 8,
            domain: FieldDomain::Numeric,
        },
        FieldSpec {
            name: "category",
            width: 8,
            domain: FieldDomain::Numeric,
        },
        FieldSpec {
            name: "option",
            width: 8,
            domain: FieldDomain::Numeric,
        },
    ],
};

impl KeySchema {
    /// Total width of all fields in bits.
    #[must_use]
    pub fn total_width(&self) -> u32 {
        self.fields.iter().map(|field| field.width).sum()
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Packs raw field values, given in schema order, into a 128-bit key.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::FieldOverflow`] when any value exceeds its width
    /// and [`CodecError::ArityMismatch`] when the value count is wrong.
    pub fn pack<const N: usize>(&self, values: [u64; N]) -> Result<u128, CodecError> {
        if N != self.fields.len() {
            return Err(CodecError::ArityMismatch {
                expected: self.fields.len(),
                actual: N,
            });
        }
        let mut packed: u128 = 0;
        for (field, value) in self.fields.iter().zip(values) {
            let checked = field.check(u128::from(value))?;
            packed = (packed << field.width) | u128::from(checked);
        }
        Ok(packed << self.offset)
    }

    /// Unpacks raw field values in schema order, walking from the least
    /// significant field upward.
    ///
    /// `N` must equal the schema's field count; callers are the typed
    /// decoders in this crate.
    #[must_use]
    pub(crate) fn unpack<const N: usize>(&self, value: u128) -> [u64; N] {
        let mut out = [0u64; N];
        let mut shift = self.offset;
        for (slot, field) in out.iter_mut().rev().zip(self.fields.iter().rev()) {
            *slot = field.extract(value, shift);
            shift += field.width;
        }
        out
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Key codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A field value does not fit its schema width.
    #[error("field {field} value {value} exceeds {width}-bit width")]
    FieldOverflow {
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: u128,
        /// Field width in bits.
        width: u32,
    },
    /// A symbolic name has no entry in its domain table.
    #[error("unknown {domain} code: {code}")]
    UnknownDomainCode {
        /// Domain label.
        domain: &'static str,
        /// Rejected name.
        code: String,
    },
    /// Field text could not be parsed.
    #[error("invalid {field}: {value}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Rejected input text.
        value: String,
    },
    /// Key piece text or bytes could not be parsed.
    #[error("invalid key piece: {0}")]
    InvalidKeyPiece(String),
    /// Wrong number of values for a schema.
    #[error("schema expects {expected} fields, got {actual}")]
    ArityMismatch {
        /// Field count of the schema.
        expected: usize,
        /// Field count supplied.
        actual: usize,
    },
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        reason = "Test-only assertions."
    )]

    use super::CodecError;
    use super::KeyKind;
    use super::SOURCE_SCHEMA;
    use super::TRIGGER_SCHEMA;

    #[test]
    fn schemas_fit_their_halves() {
        assert_eq!(SOURCE_SCHEMA.offset + SOURCE_SCHEMA.total_width(), 128);
        assert_eq!(TRIGGER_SCHEMA.offset + TRIGGER_SCHEMA.total_width(), 64);
        for field in SOURCE_SCHEMA.fields.iter().chain(TRIGGER_SCHEMA.fields) {
            assert!(field.width >= 1 && field.width <= 64, "{}", field.name);
        }
    }

    #[test]
    fn pack_places_first_field_most_significant() {
        let packed = TRIGGER_SCHEMA.pack([0x1, 0x0, 0x0, 0x0, 0x0]).unwrap();
        assert_eq!(packed, 0x1u128 << 56);
        let packed = SOURCE_SCHEMA.pack([0x0, 0x0, 0x0, 0x0, 0x2]).unwrap();
        assert_eq!(packed, 0x2u128 << 64);
    }

    #[test]
    fn unpack_inverts_pack() {
        let values = [1, 0xdead_beef, 3, 4, 5];
        let packed = TRIGGER_SCHEMA.pack(values).unwrap();
        assert_eq!(TRIGGER_SCHEMA.unpack::<5>(packed), values);
    }

    #[test]
    fn pack_rejects_wrong_arity() {
        let err = SOURCE_SCHEMA.pack([1, 2]).unwrap_err();
        assert_eq!(
            err,
            CodecError::ArityMismatch {
                expected: 5,
                actual: 2,
            }
        );
    }

    #[test]
    fn pack_rejects_overflow_without_truncating() {
        let err = TRIGGER_SCHEMA.pack([0, 0, 0x100, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            CodecError::FieldOverflow {
                field: "size",
                value: 0x100,
                width: 8,
            }
        );
    }

    #[test]
    fn check_rejects_values_beyond_u64_with_original_value() {
        let field = TRIGGER_SCHEMA.field("item_id").unwrap();
        assert_eq!(
            field.check(u128::MAX).unwrap_err(),
            CodecError::FieldOverflow {
                field: "item_id",
                value: u128::MAX,
                width: 32,
            }
        );
        assert_eq!(field.check(u128::from(u32::MAX)).unwrap(), u64::from(u32::MAX));
    }

    #[test]
    fn unpack_fills_every_field_of_the_schema() {
        let packed = SOURCE_SCHEMA.pack([1, 2, 1, 0xffff_ffff, 2]).unwrap();
        let values: [u64; 5] = SOURCE_SCHEMA.unpack(packed);
        assert_eq!(values.len(), SOURCE_SCHEMA.fields.len());
        assert_eq!(values, [1, 2, 1, 0xffff_ffff, 2]);
    }

    #[test]
    fn key_kind_parses_labels() {
        assert_eq!("source".parse::<KeyKind>().unwrap(), KeyKind::Source);
        assert_eq!(" trigger ".parse::<KeyKind>().unwrap(), KeyKind::Trigger);
        assert!("combined".parse::<KeyKind>().is_err());
    }
}
