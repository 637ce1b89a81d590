//! # Services
//!
//! Record management on top of the storage, codec and cipher seams.
//!
//! - [`SingleSourceService`]: the records of one source, loaded and stored as
//!   a whole. Every accepted record gets a process-unique id from the shared
//!   [`IdRegistry`](crate::registry::IdRegistry) and is locked.
//! - [`MultiSourceService`]: routes operations across several sources. Writes
//!   go to the source owning the record id, or to the default source; reads
//!   fan out to every managed source.
//! - [`ToolKit`]: resolves locator medium and format tags to concrete
//!   backends.

pub mod multi;
pub mod single;
pub mod tools;

pub use multi::MultiSourceService;
pub use single::SingleSourceService;
pub use tools::{FormatChoice, ToolKit};
