//! Shared, swappable catalog slot.
//!
//! Catalogs are never edited in place. When workflow definitions change, a
//! freshly loaded catalog replaces the current one wholesale; queries already
//! running against a snapshot keep using it until they drop it.

use crate::catalog::WorkflowCatalog;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holds the current catalog for concurrent readers.
#[derive(Debug, Default)]
pub struct CatalogHandle {
    current: RwLock<Arc<WorkflowCatalog>>,
}

impl CatalogHandle {
    pub fn new(catalog: WorkflowCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Returns the current catalog.
    pub fn snapshot(&self) -> Arc<WorkflowCatalog> {
        self.current.read().clone()
    }

    /// Installs a new catalog and returns the one it replaced.
    pub fn replace(&self, catalog: WorkflowCatalog) -> Arc<WorkflowCatalog> {
        let new = Arc::new(catalog);
        let old = std::mem::replace(&mut *self.current.write(), new.clone());

        if old.fingerprint() == new.fingerprint() {
            tracing::debug!("Catalog reloaded, unchanged ({})", new.fingerprint());
        } else {
            tracing::info!(
                "Catalog replaced: {} -> {} ({} workflows)",
                old.fingerprint(),
                new.fingerprint(),
                new.len()
            );
        }
        old
    }

    pub fn fingerprint(&self) -> String {
        self.current.read().fingerprint().to_string()
    }
}
