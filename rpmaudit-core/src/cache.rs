//! Run-scoped availability cache
//!
//! Every package name owns a once-cell. Concurrent lookups of the same name
//! wait on the cell, so the underlying query runs at most once per name and
//! a recorded answer never changes. A failed query leaves the cell empty.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::OnceCell;

use crate::{PackageName, Result};

#[derive(Default)]
pub struct AvailabilityCache {
    entries: Mutex<HashMap<PackageName, Arc<OnceCell<bool>>>>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, name: &str) -> Arc<OnceCell<bool>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Recorded answer for `name`, if any.
    pub fn get(&self, name: &str) -> Option<bool> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(name).and_then(|cell| cell.get().copied())
    }

    /// Return the recorded answer for `name`, or run `query` to produce it.
    ///
    /// Errors from `query` are returned and not recorded.
    pub async fn get_or_query<F, Fut>(&self, name: &str, query: F) -> Result<bool>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let cell = self.cell(name);
        cell.get_or_try_init(query).await.copied()
    }

    /// Number of names with a recorded answer.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
