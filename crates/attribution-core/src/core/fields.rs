// crates/attribution-core/src/core/fields.rs
// ============================================================================
// Module: Key Field Tuples
// Description: Typed field tuples for encoding and decoded bucket views.
// Purpose: Carry range-checked values into the codec and decoded values out.
// Dependencies: serde, crate::core::{domain, schema}
// ============================================================================

//! ## Overview
//! Encoding consumes [`SourceKeyFields`] and [`TriggerKeyFields`], whose
//! enumerated members are closed enums. Decoding yields
//! [`DecodedSourceKey`] and [`DecodedTriggerKey`], where enumerated members
//! may be [`DomainValue::Unknown`]. Text from query strings enters through
//! [`parse_field_text`], which rejects bad digits and out-of-range values
//! before anything reaches the packer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::domain::Advertiser;
use crate::core::domain::Dimension;
use crate::core::domain::DomainMember;
use crate::core::domain::DomainValue;
use crate::core::domain::Publisher;
use crate::core::domain::SourceType;
use crate::core::domain::TriggerType;
use crate::core::schema::CodecError;
use crate::core::schema::KeyKind;
use crate::core::schema::KeySchema;

// ============================================================================
// SECTION: Encode-Side Tuples
// ============================================================================

/// Fields of a source key piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceKeyFields {
    /// Click or view attribution.
    pub source_type: SourceType,
    /// Advertiser site.
    pub advertiser: Advertiser,
    /// Publisher site.
    pub publisher: Publisher,
    /// Creative or item identifier.
    pub item_id: u64,
    /// Aggregation dimension.
    pub dimension: Dimension,
}

impl SourceKeyFields {
    /// Returns raw field values in schema order.
    #[must_use]
    pub fn raw(&self) -> [u64; 5] {
        [
            self.source_type.code(),
            self.advertiser.code(),
            self.publisher.code(),
            self.item_id,
            self.dimension.code(),
        ]
    }
}

/// Fields of a trigger key piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerKeyFields {
    /// Conversion measurement.
    pub trigger_type: TriggerType,
    /// Purchased item identifier.
    pub item_id: u64,
    /// Size code.
    pub size: u64,
    /// Category code.
    pub category: u64,
    /// Option bits.
    pub option: u64,
}

impl TriggerKeyFields {
    /// Returns raw field values in schema order.
    #[must_use]
    pub fn raw(&self) -> [u64; 5] {
        [self.trigger_type.code(), self.item_id, self.size, self.category, self.option]
    }
}

/// Field tuple of either key kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyFields {
    /// Source key fields.
    Source(SourceKeyFields),
    /// Trigger key fields.
    Trigger(TriggerKeyFields),
}

impl KeyFields {
    /// Returns the key kind of this tuple.
    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        match self {
            Self::Source(_) => KeyKind::Source,
            Self::Trigger(_) => KeyKind::Trigger,
        }
    }
}

// ============================================================================
// SECTION: Decode-Side Tuples
// ============================================================================

/// Source fields recovered from a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedSourceKey {
    /// Click or view attribution.
    pub source_type: DomainValue<SourceType>,
    /// Advertiser site.
    pub advertiser: DomainValue<Advertiser>,
    /// Publisher site.
    pub publisher: DomainValue<Publisher>,
    /// Creative or item identifier.
    pub item_id: u64,
    /// Aggregation dimension.
    pub dimension: DomainValue<Dimension>,
}

impl DecodedSourceKey {
    /// Builds a decoded view from raw values in schema order.
    #[must_use]
    pub fn from_raw(raw: [u64; 5]) -> Self {
        let [source_type, advertiser, publisher, item_id, dimension] = raw;
        Self {
            source_type: DomainValue::from_code(source_type),
            advertiser: DomainValue::from_code(advertiser),
            publisher: DomainValue::from_code(publisher),
            item_id,
            dimension: DomainValue::from_code(dimension),
        }
    }

    /// Returns the encode-side tuple when every enumerated code resolved.
    #[must_use]
    pub fn to_fields(&self) -> Option<SourceKeyFields> {
        let (
            Some(source_type),
            Some(advertiser),
            Some(publisher),
            Some(dimension),
        ) = (
            self.source_type.known(),
            self.advertiser.known(),
            self.publisher.known(),
            self.dimension.known(),
        )
        else {
            return None;
        };
        Some(SourceKeyFields {
            source_type,
            advertiser,
            publisher,
            item_id: self.item_id,
            dimension,
        })
    }
}

impl From<SourceKeyFields> for DecodedSourceKey {
    fn from(fields: SourceKeyFields) -> Self {
        Self {
            source_type: fields.source_type.into(),
            advertiser: fields.advertiser.into(),
            publisher: fields.publisher.into(),
            item_id: fields.item_id,
            dimension: fields.dimension.into(),
        }
    }
}

/// Trigger fields recovered from a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedTriggerKey {
    /// Conversion measurement.
    pub trigger_type: DomainValue<TriggerType>,
    /// Purchased item identifier.
    pub item_id: u64,
    /// Size code.
    pub size: u64,
    /// Category code.
    pub category: u64,
    /// Option bits.
    pub option: u64,
}

impl DecodedTriggerKey {
    /// Builds a decoded view from raw values in schema order.
    #[must_use]
    pub fn from_raw(raw: [u64; 5]) -> Self {
        let [trigger_type, item_id, size, category, option] = raw;
        Self {
            trigger_type: DomainValue::from_code(trigger_type),
            item_id,
            size,
            category,
            option,
        }
    }

    /// Returns the encode-side tuple when the trigger type resolved.
    #[must_use]
    pub fn to_fields(&self) -> Option<TriggerKeyFields> {
        self.trigger_type.known().map(|trigger_type| TriggerKeyFields {
            trigger_type,
            item_id: self.item_id,
            size: self.size,
            category: self.category,
            option: self.option,
        })
    }
}

impl From<TriggerKeyFields> for DecodedTriggerKey {
    fn from(fields: TriggerKeyFields) -> Self {
        Self {
            trigger_type: fields.trigger_type.into(),
            item_id: fields.item_id,
            size: fields.size,
            category: fields.category,
            option: fields.option,
        }
    }
}

/// Decoded tuple of either key kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedKey {
    /// Source key view.
    Source(DecodedSourceKey),
    /// Trigger key view.
    Trigger(DecodedTriggerKey),
}

impl From<KeyFields> for DecodedKey {
    fn from(fields: KeyFields) -> Self {
        match fields {
            KeyFields::Source(source) => Self::Source(source.into()),
            KeyFields::Trigger(trigger) => Self::Trigger(trigger.into()),
        }
    }
}

// ============================================================================
// SECTION: Bucket Layouts
// ============================================================================

/// Which halves of a bucket are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketLayout {
    /// Decode the source half only.
    Source,
    /// Decode the trigger half only.
    Trigger,
    /// Decode both halves of a source-OR-trigger bucket.
    #[default]
    Combined,
}

impl BucketLayout {
    /// Resolves the layout implied by a payload operation.
    ///
    /// Histogram contributions carry the OR of a source and a trigger key
    /// piece; any other operation falls back to `default`.
    #[must_use]
    pub fn for_operation(operation: &str, default: Self) -> Self {
        match operation {
            "histogram" => Self::Combined,
            _ => default,
        }
    }
}

/// Bucket recovered under a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum DecodedBucket {
    /// Source half only.
    Source(DecodedSourceKey),
    /// Trigger half only.
    Trigger(DecodedTriggerKey),
    /// Both halves.
    Combined {
        /// Source half.
        source: DecodedSourceKey,
        /// Trigger half.
        trigger: DecodedTriggerKey,
    },
}

// ============================================================================
// SECTION: Text Boundary
// ============================================================================

/// Digit base accepted for a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRadix {
    /// Base 10.
    Decimal,
    /// Base 16 with an optional `0x` prefix.
    Hex,
}

impl FieldRadix {
    /// Numeric base.
    #[must_use]
    pub const fn base(self) -> u32 {
        match self {
            Self::Decimal => 10,
            Self::Hex => 16,
        }
    }

    /// Strips the prefix this radix accepts.
    fn digits(self, text: &str) -> &str {
        match self {
            Self::Decimal => text,
            Self::Hex => {
                text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text)
            }
        }
    }
}

/// Parses field text from an untrusted request into a range-checked value.
///
/// Item identifiers use [`FieldRadix::Hex`]; other numeric fields use
/// [`FieldRadix::Decimal`].
///
/// # Errors
///
/// Returns [`CodecError::InvalidField`] for empty or non-digit input or a
/// field missing from `schema`, and [`CodecError::FieldOverflow`] when the
/// value exceeds the field width, including digit strings too long for any
/// key piece.
pub fn parse_field_text(
    schema: &KeySchema,
    name: &'static str,
    text: &str,
    radix: FieldRadix,
) -> Result<u64, CodecError> {
    let field = schema.field(name).ok_or_else(|| CodecError::InvalidField {
        field: name,
        value: format!("not a {} field", schema.kind),
    })?;
    let digits = radix.digits(text.trim());
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix.base())) {
        return Err(CodecError::InvalidField {
            field: name,
            value: text.to_string(),
        });
    }
    // Only overflow remains once every character is a digit.
    let value = u128::from_str_radix(digits, radix.base()).unwrap_or(u128::MAX);
    field.check(value)
}
