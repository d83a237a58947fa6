// crates/attribution-core/src/runtime/ids.rs
// ============================================================================
// Module: Identifier Generator
// Description: OS-entropy generator for source-event ids and debug keys.
// Purpose: Issue unpredictable 64-bit correlation handles.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Identifiers leave the process in registration headers, so they are drawn
//! from the operating system CSPRNG rather than a counter. There is no
//! collision detection.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::core::DebugKey;
use crate::core::SourceEventId;

/// Random identifier generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns a fresh 64-bit identifier.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Issues a source-event identifier.
    #[must_use]
    pub fn source_event_id(&self) -> SourceEventId {
        SourceEventId::new(self.next_id())
    }

    /// Issues a debug key.
    #[must_use]
    pub fn debug_key(&self) -> DebugKey {
        DebugKey::new(self.next_id())
    }
}
