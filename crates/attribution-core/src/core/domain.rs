// crates/attribution-core/src/core/domain.rs
// ============================================================================
// Module: Enumerated Key Domains
// Description: Closed code tables for enumerated key-piece fields.
// Purpose: Map symbolic names to fixed numeric codes and back without fallbacks.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every enumerated field of a key piece draws from one of the closed domains
//! defined here. Lookups by name fail with
//! [`CodecError::UnknownDomainCode`]; lookups by code during decoding produce
//! [`DomainValue::Unknown`] so retired codes in old reports stay readable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;

use crate::core::schema::CodecError;

// ============================================================================
// SECTION: Domain Trait
// ============================================================================

/// Member of a closed, enumerated key domain.
pub trait DomainMember: Copy + Eq + Sized + 'static {
    /// Stable domain label used in errors and schema listings.
    const DOMAIN: &'static str;
    /// Every member of the domain.
    const MEMBERS: &'static [Self];

    /// Returns the numeric code packed into key pieces.
    fn code(self) -> u64;

    /// Returns the symbolic name used on the wire and in query strings.
    fn name(self) -> &'static str;

    /// Resolves a numeric code, returning `None` for codes outside the table.
    #[must_use]
    fn from_code(code: u64) -> Option<Self> {
        Self::MEMBERS.iter().copied().find(|member| member.code() == code)
    }

    /// Resolves a symbolic name.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownDomainCode`] when the name has no entry.
    fn from_name(name: &str) -> Result<Self, CodecError> {
        let trimmed = name.trim();
        Self::MEMBERS.iter().copied().find(|member| member.name() == trimmed).ok_or_else(|| {
            CodecError::UnknownDomainCode {
                domain: Self::DOMAIN,
                code: trimmed.to_string(),
            }
        })
    }
}

// ============================================================================
// SECTION: Domains
// ============================================================================

/// Attribution event type recorded on a source registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Navigation (click-through) attribution.
    Click,
    /// Event (view-through) attribution.
    View,
}

impl DomainMember for SourceType {
    const DOMAIN: &'static str = "source_type";
    const MEMBERS: &'static [Self] = &[Self::Click, Self::View];

    fn code(self) -> u64 {
        match self {
            Self::Click => 0x0,
            Self::View => 0x1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::View => "view",
        }
    }
}

/// Conversion measurement recorded on a trigger registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Purchased item count.
    Quantity,
    /// Purchase amount.
    Gross,
}

impl TriggerType {
    /// Returns the source dimension this trigger contributes to.
    #[must_use]
    pub const fn dimension(self) -> Dimension {
        match self {
            Self::Quantity => Dimension::Quantity,
            Self::Gross => Dimension::Gross,
        }
    }
}

impl DomainMember for TriggerType {
    const DOMAIN: &'static str = "trigger_type";
    const MEMBERS: &'static [Self] = &[Self::Quantity, Self::Gross];

    fn code(self) -> u64 {
        match self {
            Self::Quantity => 0x0,
            Self::Gross => 0x1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::Gross => "gross",
        }
    }
}

/// Advertiser site receiving conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advertiser {
    /// Demo shopping site.
    Shop,
    /// Demo travel site.
    Travel,
}

impl DomainMember for Advertiser {
    const DOMAIN: &'static str = "advertiser";
    const MEMBERS: &'static [Self] = &[Self::Shop, Self::Travel];

    fn code(self) -> u64 {
        match self {
            Self::Shop => 0x1,
            Self::Travel => 0x2,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Shop => "shop",
            Self::Travel => "travel",
        }
    }
}

/// Publisher site rendering the ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Publisher {
    /// Demo news site.
    News,
}

impl DomainMember for Publisher {
    const DOMAIN: &'static str = "publisher";
    const MEMBERS: &'static [Self] = &[Self::News];

    fn code(self) -> u64 {
        match self {
            Self::News => 0x1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::News => "news",
        }
    }
}

/// Aggregation dimension a source key piece is declared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Purchased item count.
    Quantity,
    /// Purchase amount.
    Gross,
}

impl DomainMember for Dimension {
    const DOMAIN: &'static str = "dimension";
    const MEMBERS: &'static [Self] = &[Self::Quantity, Self::Gross];

    fn code(self) -> u64 {
        match self {
            Self::Quantity => 0x1,
            Self::Gross => 0x2,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::Gross => "gross",
        }
    }
}

// ============================================================================
// SECTION: Decoded Values
// ============================================================================

/// Enumerated field recovered from a bucket.
///
/// # Invariants
/// - `Unknown` only holds codes with no entry in the domain table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainValue<T> {
    /// Code resolved to a domain member.
    Known(T),
    /// Code with no table entry (retired or placeholder).
    Unknown(u64),
}

impl<T: DomainMember> DomainValue<T> {
    /// Resolves a raw code against the domain table.
    #[must_use]
    pub fn from_code(code: u64) -> Self {
        T::from_code(code).map_or(Self::Unknown(code), Self::Known)
    }

    /// Returns the member when the code resolved.
    #[must_use]
    pub fn known(self) -> Option<T> {
        match self {
            Self::Known(member) => Some(member),
            Self::Unknown(_) => None,
        }
    }

    /// Returns the raw numeric code.
    #[must_use]
    pub fn code(self) -> u64 {
        match self {
            Self::Known(member) => member.code(),
            Self::Unknown(code) => code,
        }
    }
}

impl<T: DomainMember> From<T> for DomainValue<T> {
    fn from(value: T) -> Self {
        Self::Known(value)
    }
}

impl<T: DomainMember> fmt::Display for DomainValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(member) => f.write_str(member.name()),
            Self::Unknown(code) => write!(f, "unknown(0x{code:x})"),
        }
    }
}

impl<T: DomainMember> Serialize for DomainValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(member) => serializer.serialize_str(member.name()),
            Self::Unknown(code) => serializer.serialize_u64(*code),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
