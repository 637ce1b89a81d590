//! # Storage Layer
//!
//! Raw byte I/O for one source, addressed by a [`SourceLocator`]. Backends
//! know nothing about records, codecs or encryption: they move opaque blobs.
//!
//! ## Implementations
//!
//! - [`fs::LocalFileBackend`] (medium `file`): one file per source,
//!   `<name>.<format>`.
//!   - Any existing file is copied to `<file>.bak` before it is replaced
//!   - The new content is written to a temporary file and renamed in place
//!
//! - [`memory::MemBackend`] (medium `mem`): blobs kept in process memory
//!   - Clones share the same blobs, so several services can see one source
//!   - Can simulate write failures for tests
//!
//! ## Contract
//!
//! - `load` of a source that does not exist is [`CsmError::NotFound`]
//! - `store` returns [`Status::Warning`] when the backup copy could not be
//!   made; the write still goes ahead
//! - `exists` never reads the content
//!
//! [`CsmError::NotFound`]: crate::error::CsmError::NotFound

use crate::error::{Result, Status};
use crate::locator::SourceLocator;
use zeroize::Zeroizing;

pub mod fs;
pub mod memory;

/// Abstract interface for raw source I/O.
pub trait StorageBackend {
    /// Medium tag handled by this backend (`file`, `mem`).
    fn medium(&self) -> &str;

    fn load(&self, locator: &SourceLocator) -> Result<Zeroizing<Vec<u8>>>;

    /// Backs up any previous content, then replaces it.
    fn store(&self, locator: &SourceLocator, data: &[u8]) -> Result<Status>;

    fn exists(&self, locator: &SourceLocator) -> Result<bool>;
}
