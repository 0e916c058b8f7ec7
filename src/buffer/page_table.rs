//! Page index - maps `(file, page)` keys to resident frames.

use std::collections::HashMap;

use crate::common::config::page_index_capacity;
use crate::common::{Error, FileId, FrameId, PageId, Result};

/// Lookup structure from a resident page to the frame holding it.
///
/// A miss is `None`, not an error: it is the normal signal that a page
/// must be read in.
pub trait PageIndex {
    /// Find the frame holding `page_id` of `file`.
    fn lookup(&self, file: FileId, page_id: PageId) -> Option<FrameId>;

    /// Record that `frame_id` holds `page_id` of `file`.
    ///
    /// # Errors
    /// `Error::PageAlreadyCached` if the key is already present.
    fn insert(&mut self, file: FileId, page_id: PageId, frame_id: FrameId) -> Result<()>;

    /// Forget the entry for `page_id` of `file`, returning its frame.
    fn remove(&mut self, file: FileId, page_id: PageId) -> Option<FrameId>;

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash-map page index, pre-sized for a pool.
#[derive(Debug, Default)]
pub struct PageTable {
    entries: HashMap<(FileId, PageId), FrameId>,
}

impl PageTable {
    /// Create a table sized for a pool of `pool_size` frames.
    pub fn for_pool(pool_size: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(page_index_capacity(pool_size)),
        }
    }
}

impl PageIndex for PageTable {
    fn lookup(&self, file: FileId, page_id: PageId) -> Option<FrameId> {
        self.entries.get(&(file, page_id)).copied()
    }

    fn insert(&mut self, file: FileId, page_id: PageId, frame_id: FrameId) -> Result<()> {
        use std::collections::hash_map::Entry;

        match self.entries.entry((file, page_id)) {
            Entry::Occupied(_) => Err(Error::PageAlreadyCached { file, page_id }),
            Entry::Vacant(slot) => {
                slot.insert(frame_id);
                Ok(())
            }
        }
    }

    fn remove(&mut self, file: FileId, page_id: PageId) -> Option<FrameId> {
        self.entries.remove(&(file, page_id))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
