use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::page::{ResidentPageHandle, VectorPageId};

/// Pages that are materialized in this worker's memory.
///
/// Only the `LoadCoordinator` writes; any local consumer may read.
pub trait ResidentPageCache: Send + Sync {
    /// Record a loaded page.
    ///
    /// Called while the coordinator holds its table lock, so the page is
    /// resident before any waiter wakes and before a new `request_page` can
    /// miss it. Implementations must not call back into the coordinator.
    fn put(&self, page: VectorPageId, handle: ResidentPageHandle);

    fn get(&self, page: &VectorPageId) -> Option<ResidentPageHandle>;
}

/// `BTreeMap`-backed cache with no eviction.
#[derive(Debug, Default)]
pub struct InMemoryPageCache {
    pages: RwLock<BTreeMap<VectorPageId, ResidentPageHandle>>,
}

impl InMemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }

    /// Drop a page, e.g. after the host evicted it.
    pub fn evict(&self, page: &VectorPageId) -> Option<ResidentPageHandle> {
        self.pages.write().remove(page)
    }
}

impl ResidentPageCache for InMemoryPageCache {
    fn put(&self, page: VectorPageId, handle: ResidentPageHandle) {
        self.pages.write().insert(page, handle);
    }

    fn get(&self, page: &VectorPageId) -> Option<ResidentPageHandle> {
        self.pages.read().get(page).copied()
    }
}
