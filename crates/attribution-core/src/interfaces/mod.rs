// crates/attribution-core/src/interfaces/mod.rs
// ============================================================================
// Module: Attribution Interfaces
// Description: Backend-agnostic storage interface for ingested reports.
// Purpose: Let the ingestion pipeline run against any report store.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The report store is the only shared mutable state in the system. It is
//! modeled as a trait so the in-memory store can be swapped for a bounded or
//! persistent one without touching ingestion. Implementations must make
//! `append` atomic and return consistent snapshots from `list`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::DebugReport;

// ============================================================================
// SECTION: Report Store
// ============================================================================

/// Report store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store reported an error.
    #[error("report store error: {0}")]
    Store(String),
}

/// Append-only store of decoded debug reports.
pub trait ReportStore {
    /// Appends a fully decoded report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the append fails.
    fn append(&self, report: DebugReport) -> Result<(), StoreError>;

    /// Returns a snapshot of all reports in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the snapshot cannot be taken.
    fn list(&self) -> Result<Vec<DebugReport>, StoreError>;

    /// Returns the number of stored reports.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the count cannot be read.
    fn len(&self) -> Result<usize, StoreError>;

    /// Returns true when no report has been stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the count cannot be read.
    fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|len| len == 0)
    }
}
