//! # Identifier Registry
//!
//! Hands out account ids and remembers which source owns each one. A router
//! and every source service it manages share one registry, so an id is
//! unique across all sources that are open at the same time.
//!
//! Ids come from a monotonic counter: a freed id is never handed out again
//! for the lifetime of the registry. Id `0` means "unassigned" and is never
//! returned.
//!
//! The registry is not persisted. Ids are re-derived on every load by
//! replaying additions in file order, so "account 7" is only meaningful
//! within one process run.

use crate::error::{CsmError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tracing::warn;

/// Handle shared between a router and its source services.
pub type SharedRegistry = Rc<RefCell<IdRegistry>>;

#[derive(Debug, Default)]
pub struct IdRegistry {
    last: u64,
    owners: BTreeMap<u64, String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn new_id(&mut self, source_key: &str) -> Result<u64> {
        let id = self
            .last
            .checked_add(1)
            .ok_or_else(|| CsmError::Registry("account id space exhausted".to_string()))?;
        self.last = id;
        self.owners.insert(id, source_key.to_string());
        Ok(id)
    }

    /// Owning source key, or `None` for an unknown id.
    pub fn source(&self, id: u64) -> Option<&str> {
        self.owners.get(&id).map(String::as_str)
    }

    pub fn ids_for(&self, source_key: &str) -> BTreeSet<u64> {
        self.owners
            .iter()
            .filter(|(_, key)| key.as_str() == source_key)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn free(&mut self, id: u64) -> Result<()> {
        match self.owners.remove(&id) {
            Some(_) => Ok(()),
            None => {
                warn!(id, "Freeing an id that was never assigned");
                Err(CsmError::NotFound(format!("account id {}", id)))
            }
        }
    }

    /// Drops every id owned by `source_key`, returning how many were freed.
    pub fn free_all(&mut self, source_key: &str) -> usize {
        let before = self.owners.len();
        self.owners.retain(|_, key| key != source_key);
        before - self.owners.len()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
