use super::StorageBackend;
use crate::error::{CsmError, Result, Status};
use crate::locator::SourceLocator;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use zeroize::Zeroizing;

type Blobs = Rc<RefCell<HashMap<String, Zeroizing<Vec<u8>>>>>;

/// In-memory medium.
///
/// Uses `Rc<RefCell<..>>` since csm is single-threaded; clones share the
/// same blobs, which lets several services built from one tool kit see each
/// other's writes.
#[derive(Clone, Default)]
pub struct MemBackend {
    blobs: Blobs,
    backups: Blobs,
    simulate_write_error: Rc<Cell<bool>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    fn address(locator: &SourceLocator) -> String {
        format!("{}.{}", locator.name(), locator.format())
    }

    /// Seeds a source with raw bytes, bypassing backups.
    pub fn put_raw(&self, locator: &SourceLocator, data: &[u8]) {
        self.blobs
            .borrow_mut()
            .insert(Self::address(locator), Zeroizing::new(data.to_vec()));
    }

    pub fn raw(&self, locator: &SourceLocator) -> Option<Vec<u8>> {
        self.blobs
            .borrow()
            .get(&Self::address(locator))
            .map(|b| b.to_vec())
    }

    pub fn backup(&self, locator: &SourceLocator) -> Option<Vec<u8>> {
        self.backups
            .borrow()
            .get(&Self::address(locator))
            .map(|b| b.to_vec())
    }
}

impl StorageBackend for MemBackend {
    fn medium(&self) -> &str {
        "mem"
    }

    fn load(&self, locator: &SourceLocator) -> Result<Zeroizing<Vec<u8>>> {
        self.blobs
            .borrow()
            .get(&Self::address(locator))
            .cloned()
            .ok_or_else(|| CsmError::NotFound(locator.full()))
    }

    fn store(&self, locator: &SourceLocator, data: &[u8]) -> Result<Status> {
        if self.simulate_write_error.get() {
            return Err(CsmError::Source("Simulated write error".to_string()));
        }
        let address = Self::address(locator);
        let mut blobs = self.blobs.borrow_mut();
        if let Some(previous) = blobs.get(&address) {
            self.backups
                .borrow_mut()
                .insert(address.clone(), previous.clone());
        }
        blobs.insert(address, Zeroizing::new(data.to_vec()));
        Ok(Status::Ok)
    }

    fn exists(&self, locator: &SourceLocator) -> Result<bool> {
        Ok(self.blobs.borrow().contains_key(&Self::address(locator)))
    }
}
