// crates/attribution-core/src/runtime/registration.rs
// ============================================================================
// Module: Registration Builder
// Description: Builds source and trigger registrations from request text.
// Purpose: Parse untrusted query values once and emit encoded key pieces.
// Dependencies: crate::core, crate::runtime::{codec, ids}
// ============================================================================

//! ## Overview
//! Query values cross into typed fields here and nowhere else. Names resolve
//! through the domain tables, item identifiers parse as hexadecimal and the
//! remaining numbers as decimal. Every value is width-checked before it is
//! packed, so a malformed query never produces a truncated key piece.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::Advertiser;
use crate::core::AggregatableTriggerData;
use crate::core::CodecError;
use crate::core::Dimension;
use crate::core::DomainMember;
use crate::core::FieldRadix;
use crate::core::Publisher;
use crate::core::SOURCE_SCHEMA;
use crate::core::SourceKeyFields;
use crate::core::SourceRegistration;
use crate::core::SourceType;
use crate::core::TRIGGER_SCHEMA;
use crate::core::TriggerKeyFields;
use crate::core::TriggerRegistration;
use crate::core::TriggerType;
use crate::core::parse_field_text;
use crate::runtime::codec::encode_source;
use crate::runtime::codec::encode_trigger;
use crate::runtime::ids::IdGenerator;

/// Default destination template; `{advertiser}` is replaced by the name.
pub const DEFAULT_DESTINATION_TEMPLATE: &str = "https://{advertiser}.web.app";

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Untrusted source registration inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRequest<'a> {
    /// Click for navigation sources, view for event sources.
    pub source_type: SourceType,
    /// Advertiser name.
    pub advertiser: &'a str,
    /// Hexadecimal item identifier.
    pub item_id: &'a str,
}

/// Untrusted trigger registration inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRequest<'a> {
    /// Hexadecimal item identifier.
    pub item_id: &'a str,
    /// Decimal purchased quantity.
    pub quantity: &'a str,
    /// Decimal size code.
    pub size: &'a str,
    /// Decimal category code.
    pub category: &'a str,
    /// Decimal purchase amount.
    pub gross: &'a str,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds registration objects for one publisher.
#[derive(Debug, Clone)]
pub struct RegistrationBuilder {
    /// Publisher recorded on every source key piece.
    publisher: Publisher,
    /// Destination template containing `{advertiser}`.
    destination_template: String,
    /// Identifier source.
    ids: IdGenerator,
}

impl Default for RegistrationBuilder {
    fn default() -> Self {
        Self::new(Publisher::News, DEFAULT_DESTINATION_TEMPLATE)
    }
}

impl RegistrationBuilder {
    /// Creates a builder for `publisher`.
    #[must_use]
    pub fn new(publisher: Publisher, destination_template: impl Into<String>) -> Self {
        Self {
            publisher,
            destination_template: destination_template.into(),
            ids: IdGenerator::new(),
        }
    }

    /// Returns the publisher recorded on source key pieces.
    #[must_use]
    pub const fn publisher(&self) -> Publisher {
        self.publisher
    }

    /// Returns the destination origin for `advertiser`.
    #[must_use]
    pub fn destination(&self, advertiser: Advertiser) -> String {
        self.destination_template.replace("{advertiser}", advertiser.name())
    }

    /// Builds a source registration with one key piece per dimension.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the advertiser is unknown or the item
    /// identifier is malformed or too wide.
    pub fn source_registration(
        &self,
        request: &SourceRequest<'_>,
    ) -> Result<SourceRegistration, CodecError> {
        let advertiser = Advertiser::from_name(request.advertiser)?;
        let item_id =
            parse_field_text(&SOURCE_SCHEMA, "item_id", request.item_id, FieldRadix::Hex)?;
        let mut aggregation_keys = BTreeMap::new();
        for dimension in Dimension::MEMBERS.iter().copied() {
            let piece = encode_source(&SourceKeyFields {
                source_type: request.source_type,
                advertiser,
                publisher: self.publisher,
                item_id,
                dimension,
            })?;
            aggregation_keys.insert(dimension.name().to_string(), piece);
        }
        Ok(SourceRegistration {
            destination: self.destination(advertiser),
            source_event_id: self.ids.source_event_id(),
            debug_key: self.ids.debug_key(),
            aggregation_keys,
        })
    }

    /// Builds a trigger registration with one key piece per trigger type.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when any field is malformed or too wide, or a
    /// value does not fit in 32 bits.
    pub fn trigger_registration(
        &self,
        request: &TriggerRequest<'_>,
    ) -> Result<TriggerRegistration, CodecError> {
        let item_id =
            parse_field_text(&TRIGGER_SCHEMA, "item_id", request.item_id, FieldRadix::Hex)?;
        let size = parse_field_text(&TRIGGER_SCHEMA, "size", request.size, FieldRadix::Decimal)?;
        let category =
            parse_field_text(&TRIGGER_SCHEMA, "category", request.category, FieldRadix::Decimal)?;
        let quantity = parse_value("quantity", request.quantity)?;
        let gross = parse_value("gross", request.gross)?;

        let mut aggregatable_trigger_data = Vec::with_capacity(TriggerType::MEMBERS.len());
        for trigger_type in TriggerType::MEMBERS.iter().copied() {
            let key_piece = encode_trigger(&TriggerKeyFields {
                trigger_type,
                item_id,
                size,
                category,
                option: 0,
            })?;
            aggregatable_trigger_data.push(AggregatableTriggerData {
                key_piece,
                source_keys: vec![trigger_type.dimension().name().to_string()],
            });
        }

        let mut aggregatable_values = BTreeMap::new();
        aggregatable_values.insert(Dimension::Quantity.name().to_string(), quantity);
        aggregatable_values.insert(Dimension::Gross.name().to_string(), gross);

        Ok(TriggerRegistration {
            aggregatable_trigger_data,
            aggregatable_values,
            debug_key: self.ids.debug_key(),
        })
    }
}

/// Parses a decimal aggregatable value.
fn parse_value(field: &'static str, text: &str) -> Result<u32, CodecError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(CodecError::InvalidField {
            field,
            value: text.to_string(),
        });
    }
    // Only overflow remains once every character is a digit.
    let value = trimmed.parse::<u128>().unwrap_or(u128::MAX);
    u32::try_from(value).map_err(|_| CodecError::FieldOverflow {
        field,
        value,
        width: u32::BITS,
    })
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

    use super::parse_value;
    use crate::core::CodecError;

    #[test]
    fn values_accept_full_u32_range() {
        assert_eq!(parse_value("gross", "4294967295").unwrap(), u32::MAX);
        assert_eq!(parse_value("gross", " 0 ").unwrap(), 0);
    }

    #[test]
    fn values_reject_overflow_and_signs() {
        assert!(matches!(
            parse_value("gross", "4294967296"),
            Err(CodecError::FieldOverflow { field: "gross", width: 32, .. })
        ));
        assert!(matches!(
            parse_value("gross", &"9".repeat(50)),
            Err(CodecError::FieldOverflow { field: "gross", value: u128::MAX, width: 32 })
        ));
        assert!(matches!(parse_value("quantity", "-1"), Err(CodecError::InvalidField { .. })));
        assert!(matches!(parse_value("quantity", ""), Err(CodecError::InvalidField { .. })));
    }
}
