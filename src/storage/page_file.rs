//! The backing-file seam consumed by the buffer pool.

use std::sync::Arc;

use crate::common::{FileId, PageId, Result};
use crate::storage::page::Page;

/// Durable page storage for one file.
///
/// The buffer pool never touches disk itself; every read, write-back,
/// allocation and deletion goes through this trait. Implementations use
/// interior mutability so a file can be shared between the pool (which
/// keeps it as the owner of cached frames) and the caller.
pub trait PageFile: Send + Sync {
    /// Identity used for page index keys and equality.
    fn id(&self) -> FileId;

    /// Human-readable name, for diagnostics.
    fn name(&self) -> &str;

    /// Read the durable copy of `page_id`.
    fn read_page(&self, page_id: PageId) -> Result<Page>;

    /// Replace the durable copy of `page_id`.
    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()>;

    /// Reserve a fresh page and return its id with its initial contents.
    fn allocate_page(&self) -> Result<(PageId, Page)>;

    /// Delete `page_id` from the file.
    fn delete_page(&self, page_id: PageId) -> Result<()>;
}

/// Shared handle to a backing file, as stored in frame descriptors.
pub type FileRef = Arc<dyn PageFile>;
