//! In-memory [`PageFile`] implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::common::{Error, FileId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PageFile;

/// A page file kept entirely in memory.
///
/// Behaves like a disk file without durability: deleted page ids are
/// reused by later allocations, and reads of unknown pages fail with
/// [`Error::PageNotFound`]. I/O counters let tests observe exactly which
/// calls the buffer pool issued.
///
/// # Example
/// ```
/// use clockpool::storage::{MemoryFile, PageFile};
///
/// let file = MemoryFile::new("scratch");
/// let (page_id, page) = file.allocate_page().unwrap();
/// assert_eq!(page.as_slice()[0], 0);
/// file.write_page(page_id, &page).unwrap();
/// assert_eq!(file.write_count(), 1);
/// ```
pub struct MemoryFile {
    id: FileId,
    name: String,
    inner: Mutex<Inner>,
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

struct Inner {
    pages: HashMap<PageId, Box<Page>>,
    next_page: u32,
    free: Vec<PageId>,
}

impl MemoryFile {
    /// Create an empty in-memory file.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FileId::next(),
            name: name.into(),
            inner: Mutex::new(Inner {
                pages: HashMap::new(),
                next_page: 0,
                free: Vec::new(),
            }),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    /// Whether `page_id` currently exists.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.inner.lock().pages.contains_key(&page_id)
    }

    /// Number of live pages.
    pub fn page_count(&self) -> usize {
        self.inner.lock().pages.len()
    }

    /// Number of `read_page` calls that succeeded.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `write_page` calls that succeeded.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of `delete_page` calls issued, including ones that failed.
    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    fn not_found(&self, page_id: PageId) -> Error {
        Error::PageNotFound {
            file: self.id,
            page_id,
        }
    }
}

impl PageFile for MemoryFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_page(&self, page_id: PageId) -> Result<Page> {
        let inner = self.inner.lock();
        let stored = inner.pages.get(&page_id).ok_or_else(|| self.not_found(page_id))?;

        let mut page = Page::new();
        page.copy_from(stored);
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(page)
    }

    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        let mut inner = self.inner.lock();
        let stored = inner
            .pages
            .get_mut(&page_id)
            .ok_or_else(|| self.not_found(page_id))?;

        stored.copy_from(page);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn allocate_page(&self) -> Result<(PageId, Page)> {
        let mut inner = self.inner.lock();
        let page_id = match inner.free.pop() {
            Some(page_id) => page_id,
            None => {
                let page_id = PageId::new(inner.next_page);
                inner.next_page += 1;
                page_id
            }
        };
        inner.pages.insert(page_id, Box::new(Page::new()));
        Ok((page_id, Page::new()))
    }

    fn delete_page(&self, page_id: PageId) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.lock();
        if inner.pages.remove(&page_id).is_none() {
            return Err(self.not_found(page_id));
        }
        inner.free.push(page_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential_ids() {
        let file = MemoryFile::new("t");
        let (a, _) = file.allocate_page().unwrap();
        let (b, _) = file.allocate_page().unwrap();
        assert_eq!(a, PageId::new(0));
        assert_eq!(b, PageId::new(1));
        assert_eq!(file.page_count(), 2);
    }

    #[test]
    fn test_write_then_read() {
        let file = MemoryFile::new("t");
        let (pid, mut page) = file.allocate_page().unwrap();
        page.as_mut_slice()[10] = 0x5A;
        file.write_page(pid, &page).unwrap();

        let read = file.read_page(pid).unwrap();
        assert_eq!(read.as_slice()[10], 0x5A);
        assert_eq!(file.read_count(), 1);
        assert_eq!(file.write_count(), 1);
    }

    #[test]
    fn test_read_unknown_page() {
        let file = MemoryFile::new("t");
        assert!(matches!(
            file.read_page(PageId::new(3)),
            Err(Error::PageNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_reuses_id() {
        let file = MemoryFile::new("t");
        let (a, _) = file.allocate_page().unwrap();
        file.allocate_page().unwrap();

        file.delete_page(a).unwrap();
        assert!(!file.contains(a));
        assert!(file.read_page(a).is_err());

        let (c, page) = file.allocate_page().unwrap();
        assert_eq!(c, a);
        assert_eq!(page.as_slice()[0], 0);
    }

    #[test]
    fn test_delete_unknown_counts_and_fails() {
        let file = MemoryFile::new("t");
        assert!(file.delete_page(PageId::new(9)).is_err());
        assert_eq!(file.delete_count(), 1);
    }
}
