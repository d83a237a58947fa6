// crates/attribution-core/src/core/key_piece.rs
// ============================================================================
// Module: Key Piece Values
// Description: 128-bit aggregation key with a fixed hexadecimal wire form.
// Purpose: Keep transport formatting and parsing of key pieces in one type.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`KeyPiece`] wraps the packed 128-bit value. It always renders as `0x`
//! followed by 32 lowercase hex digits, so identical tuples produce identical
//! text. Buckets arrive in reports as 16-byte big-endian strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::core::schema::CodecError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Encoded bucket length in bytes.
pub const KEY_PIECE_BYTES: usize = 16;
/// Hex digits in the canonical text form.
const KEY_PIECE_HEX_DIGITS: usize = 32;

// ============================================================================
// SECTION: Key Piece
// ============================================================================

/// Packed 128-bit aggregation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct KeyPiece(u128);

impl KeyPiece {
    /// Wraps a raw 128-bit value.
    #[must_use]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Returns the raw 128-bit value.
    #[must_use]
    pub const fn value(self) -> u128 {
        self.0
    }

    /// Returns the canonical big-endian byte form.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; KEY_PIECE_BYTES] {
        self.0.to_be_bytes()
    }

    /// Reads a bucket from its 16-byte big-endian form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidKeyPiece`] when `bytes` is not exactly 16 bytes.
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        let array: [u8; KEY_PIECE_BYTES] = bytes.try_into().map_err(|_| {
            CodecError::InvalidKeyPiece(format!(
                "bucket must be {KEY_PIECE_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(u128::from_be_bytes(array)))
    }
}

impl From<u128> for KeyPiece {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl fmt::Display for KeyPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:032x}", self.0)
    }
}

impl FromStr for KeyPiece {
    type Err = CodecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| CodecError::InvalidKeyPiece("missing 0x prefix".to_string()))?;
        if digits.is_empty() || digits.len() > KEY_PIECE_HEX_DIGITS {
            return Err(CodecError::InvalidKeyPiece(format!(
                "expected 1 to {KEY_PIECE_HEX_DIGITS} hex digits, got {}",
                digits.len()
            )));
        }
        if !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(CodecError::InvalidKeyPiece("non-hex digit".to_string()));
        }
        u128::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|err| CodecError::InvalidKeyPiece(err.to_string()))
    }
}

impl Serialize for KeyPiece {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyPiece {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
