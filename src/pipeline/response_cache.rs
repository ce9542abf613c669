use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-run memo of fetched page bodies, shared by discovery and the fan-out
/// tasks. Concurrent inserts for the same page are last-write-wins.
#[derive(Clone, Debug, Default)]
pub struct ResponseCache {
    pages: Arc<Mutex<HashMap<u32, Arc<str>>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: u32) -> Option<Arc<str>> {
        self.lock().get(&page).cloned()
    }

    pub fn insert(&self, page: u32, body: Arc<str>) {
        self.lock().insert(page, body);
    }

    pub fn contains(&self, page: u32) -> bool {
        self.lock().contains_key(&page)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic elsewhere cannot leave the map half-written, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Arc<str>>> {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
