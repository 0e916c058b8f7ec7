//! Frame descriptors - per-slot bookkeeping for the buffer pool.
//!
//! A [`FrameDescriptor`] records which page a frame holds and the state
//! the pool needs to manage it:
//! - Owner file and page id
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking
//! - Reference bit for the clock replacer
//!
//! Descriptors do no I/O and make no policy decisions. They live inside
//! the pool's single lock, so fields are plain values.

use crate::buffer::diagnostics::FrameInfo;
use crate::common::{FileId, FrameId, PageId};
use crate::storage::{FileRef, PageFile};

/// State of one buffer pool frame.
///
/// # Lifecycle
/// ```text
///   empty ──install()──▶ valid/pinned ──unpin()──▶ valid/unpinned
///     ▲                     ▲    │                      │
///     │                     └pin()┘                     │
///     └──────────────────── clear() ◀───────────────────┘
/// ```
///
/// `clear()` is the only way a frame becomes reusable; it resets every
/// field so no stale owner survives.
pub struct FrameDescriptor {
    frame_id: FrameId,
    owner: Option<FileRef>,
    page_id: Option<PageId>,
    pin_count: u32,
    dirty: bool,
    valid: bool,
    referenced: bool,
    /// Bumped on every install; lets handles detect frame reuse.
    epoch: u64,
}

impl FrameDescriptor {
    /// Create an empty descriptor for `frame_id`.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            owner: None,
            page_id: None,
            pin_count: 0,
            dirty: false,
            valid: false,
            referenced: false,
            epoch: 0,
        }
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    /// Reset to the empty state.
    ///
    /// The epoch is kept so handles from the previous installation stay
    /// stale after the next `install()`.
    pub fn clear(&mut self) {
        self.owner = None;
        self.page_id = None;
        self.pin_count = 0;
        self.dirty = false;
        self.valid = false;
        self.referenced = false;
    }

    /// Take ownership of `page_id` in `owner`, pinned once.
    pub fn install(&mut self, owner: FileRef, page_id: PageId) {
        debug_assert!(!self.valid, "install over a valid frame");
        self.owner = Some(owner);
        self.page_id = Some(page_id);
        self.pin_count = 1;
        self.dirty = false;
        self.valid = true;
        self.referenced = true;
        self.epoch += 1;
    }

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.pin_count
    }

    /// Decrement the pin count. Returns the new count, or `None` if the
    /// frame was not pinned (the count is left at zero).
    #[inline]
    pub fn unpin(&mut self) -> Option<u32> {
        self.pin_count = self.pin_count.checked_sub(1)?;
        Some(self.pin_count)
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn set_referenced(&mut self) {
        self.referenced = true;
    }

    #[inline]
    pub fn clear_referenced(&mut self) {
        self.referenced = false;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// The file this frame holds a page for.
    #[inline]
    pub fn owner(&self) -> Option<&FileRef> {
        self.owner.as_ref()
    }

    #[inline]
    pub fn owner_id(&self) -> Option<FileId> {
        self.owner.as_ref().map(|file| file.id())
    }

    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        self.page_id
    }

    /// Page index key of the resident page, if any.
    pub fn key(&self) -> Option<(FileId, PageId)> {
        Some((self.owner_id()?, self.page_id?))
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn is_referenced(&self) -> bool {
        self.referenced
    }

    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Read-only snapshot for diagnostics.
    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            frame_id: self.frame_id,
            file: self.owner_id(),
            page_id: self.page_id,
            pin_count: self.pin_count,
            dirty: self.dirty,
            valid: self.valid,
            referenced: self.referenced,
        }
    }

    /// Force a claimed owner onto an invalid frame.
    #[cfg(test)]
    pub(crate) fn corrupt_owner(&mut self, owner: FileRef, page_id: PageId) {
        self.owner = Some(owner);
        self.page_id = Some(page_id);
        self.valid = false;
    }
}

impl std::fmt::Debug for FrameDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDescriptor")
            .field("frame_id", &self.frame_id)
            .field("owner", &self.owner_id())
            .field("page_id", &self.page_id)
            .field("pin_count", &self.pin_count)
            .field("dirty", &self.dirty)
            .field("valid", &self.valid)
            .field("referenced", &self.referenced)
            .finish()
    }
}
