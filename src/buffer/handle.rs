//! Capability tokens for pinned pages.

use crate::common::{FileId, FrameId, PageId};

/// Proof that the holder pinned a page.
///
/// Returned by [`BufferPoolManager::fetch`](super::BufferPoolManager::fetch)
/// and [`BufferPoolManager::allocate`](super::BufferPoolManager::allocate).
/// The handle does not borrow the page; contents are reached through
/// [`BufferPoolManager::read`](super::BufferPoolManager::read) and
/// [`BufferPoolManager::write`](super::BufferPoolManager::write), which
/// check the handle against the frame first. Once the frame is unpinned,
/// evicted or reused, the handle fails with `Error::StaleHandle` instead of
/// exposing another page's bytes.
///
/// Not `Clone`: one handle stands for one pin. Give it back with
/// [`BufferPoolManager::release`](super::BufferPoolManager::release).
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a page handle holds a pin; release it to make the frame evictable"]
pub struct PageHandle {
    file: FileId,
    page_id: PageId,
    frame_id: FrameId,
    epoch: u64,
}

impl PageHandle {
    pub(crate) fn new(file: FileId, page_id: PageId, frame_id: FrameId, epoch: u64) -> Self {
        Self {
            file,
            page_id,
            frame_id,
            epoch,
        }
    }

    #[inline]
    pub fn file(&self) -> FileId {
        self.file
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    #[inline]
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }
}
