// crates/attribution-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Report Store
// Description: Process-lifetime, append-only report store.
// Purpose: Retain decoded reports for display without external dependencies.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryReportStore`] keeps reports in a mutex-guarded vector. Appends
//! are a single critical section and `list` clones under the same lock, so
//! readers never observe a partially appended sequence. There is no capacity
//! bound and nothing is persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::DebugReport;
use crate::interfaces::ReportStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory report store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReportStore {
    /// Reports in arrival order, protected by a mutex.
    reports: Arc<Mutex<Vec<DebugReport>>>,
}

impl InMemoryReportStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ReportStore for InMemoryReportStore {
    fn append(&self, report: DebugReport) -> Result<(), StoreError> {
        self.reports
            .lock()
            .map_err(|_| StoreError::Store("report store mutex poisoned".to_string()))?
            .push(report);
        Ok(())
    }

    fn list(&self) -> Result<Vec<DebugReport>, StoreError> {
        let guard = self
            .reports
            .lock()
            .map_err(|_| StoreError::Store("report store mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let guard = self
            .reports
            .lock()
            .map_err(|_| StoreError::Store("report store mutex poisoned".to_string()))?;
        Ok(guard.len())
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared report store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedReportStore {
    /// Inner store implementation.
    inner: Arc<dyn ReportStore + Send + Sync>,
}

impl SharedReportStore {
    /// Wraps a report store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl ReportStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn ReportStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl Default for SharedReportStore {
    fn default() -> Self {
        Self::from_store(InMemoryReportStore::new())
    }
}

impl ReportStore for SharedReportStore {
    fn append(&self, report: DebugReport) -> Result<(), StoreError> {
        self.inner.append(report)
    }

    fn list(&self) -> Result<Vec<DebugReport>, StoreError> {
        self.inner.list()
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.inner.len()
    }
}
