//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between backing files and memory
//! - Pin-based reference counting
//! - CLOCK eviction with dirty page write-back
//! - Per-file flush and page disposal

use std::sync::Arc;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::buffer::diagnostics::Diagnostics;
use crate::buffer::replacer::{ClockReplacer, Victim};
use crate::buffer::{BufferPoolStats, FrameDescriptor, PageHandle, PageIndex, PageTable};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::{FileRef, PageFile};

/// Manages a fixed pool of frames caching pages of any number of files.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                     BufferPoolManager                        │
/// │  ┌──────────────────── Mutex<PoolState> ─────────────────┐   │
/// │  │ ┌────────────────┐  ┌──────────────────────────────┐  │   │
/// │  │ │ page_table     │  │ descriptors: Vec<Descriptor> │  │   │
/// │  │ │(File,Page)→Fid │─▶│ pool:        Vec<Page>       │  │   │
/// │  │ └────────────────┘  └──────────────────────────────┘  │   │
/// │  │ ┌────────────────┐                                    │   │
/// │  │ │ clock hand     │  sweeps descriptors for victims    │   │
/// │  │ └────────────────┘                                    │   │
/// │  └───────────────────────────────────────────────────────┘   │
/// │  stats: atomic counters (read without the lock)              │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// All pool state sits behind one `Mutex`, so every operation is atomic
/// with respect to every other. The miss path performs its backing-file
/// I/O while holding the lock.
///
/// # Shutdown
/// Dropping the manager writes back every dirty valid frame, pinned or
/// not. Failures are logged and otherwise ignored.
///
/// # Usage
/// ```
/// use std::sync::Arc;
/// use clockpool::BufferPoolManager;
/// use clockpool::storage::{FileRef, MemoryFile};
///
/// let file: FileRef = Arc::new(MemoryFile::new("demo"));
/// let bpm = BufferPoolManager::new(8);
///
/// let (page_id, handle) = bpm.allocate(&file).unwrap();
/// bpm.write(&handle, |page| page.as_mut_slice()[0] = 0xAB).unwrap();
/// bpm.release(handle, true).unwrap();
///
/// let handle = bpm.fetch(&file, page_id).unwrap();
/// assert_eq!(bpm.read(&handle, |page| page.as_slice()[0]).unwrap(), 0xAB);
/// bpm.release(handle, false).unwrap();
/// ```
pub struct BufferPoolManager {
    state: Mutex<PoolState>,

    /// Performance statistics.
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,
}

/// Everything guarded by the pool lock.
struct PoolState {
    descriptors: Vec<FrameDescriptor>,
    pool: Vec<Page>,
    page_table: PageTable,
    clock: ClockReplacer,
}

impl BufferPoolManager {
    /// Create a buffer pool with `pool_size` frames.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        let state = PoolState {
            descriptors: (0..pool_size)
                .map(|i| FrameDescriptor::new(FrameId::new(i)))
                .collect(),
            pool: (0..pool_size).map(|_| Page::new()).collect(),
            page_table: PageTable::for_pool(pool_size),
            clock: ClockReplacer::new(pool_size),
        };

        debug!("buffer pool created with {} frames", pool_size);
        Self {
            state: Mutex::new(state),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Fetch and allocate
    // ========================================================================

    /// Pin `page_id` of `file`, reading it in on a miss.
    ///
    /// A hit sets the reference bit and bumps the pin count without I/O.
    /// A miss takes a frame from the clock replacer (writing back a dirty
    /// victim), reads the page and installs it pinned once.
    ///
    /// # Errors
    /// - `Error::PoolExhausted` if every frame is pinned
    /// - Backing file errors from the victim write-back or the read
    pub fn fetch(&self, file: &FileRef, page_id: PageId) -> Result<PageHandle> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let file_id = file.id();

        if let Some(frame_id) = state.page_table.lookup(file_id, page_id) {
            let desc = &mut state.descriptors[frame_id.0];
            desc.set_referenced();
            let pins = desc.pin();
            self.stats.record_hit();
            trace!("hit {} of {} in {} (pins={})", page_id, file_id, frame_id, pins);
            return Ok(PageHandle::new(file_id, page_id, frame_id, desc.epoch()));
        }

        self.stats.record_miss();
        let frame_id = state.alloc_frame(&self.stats)?;
        let page = file.read_page(page_id)?;
        self.stats.record_read();

        let epoch = state.install(file, page_id, frame_id, &page)?;
        debug!("miss {} of {} loaded into {}", page_id, file_id, frame_id);
        Ok(PageHandle::new(file_id, page_id, frame_id, epoch))
    }

    /// Allocate a new page in `file` and pin it in the pool.
    ///
    /// The frame is reserved before the file is asked for a page, so a
    /// full pool does not leave an orphan page behind.
    ///
    /// # Errors
    /// - `Error::PoolExhausted` if every frame is pinned
    /// - Backing file errors from the victim write-back or the allocation
    pub fn allocate(&self, file: &FileRef) -> Result<(PageId, PageHandle)> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let file_id = file.id();

        let frame_id = state.alloc_frame(&self.stats)?;
        let (page_id, page) = file.allocate_page()?;

        let epoch = state.install(file, page_id, frame_id, &page)?;
        debug!("allocated {} of {} in {}", page_id, file_id, frame_id);
        Ok((page_id, PageHandle::new(file_id, page_id, frame_id, epoch)))
    }

    // ========================================================================
    // Public API: Unpin
    // ========================================================================

    /// Drop one pin on `page_id` of `file`, optionally marking it dirty.
    ///
    /// A page that is no longer resident is ignored: the caller's pin was
    /// already accounted for when the page left the pool. The dirty flag
    /// is sticky; `dirty = false` never clears it.
    ///
    /// # Errors
    /// - `Error::NotPinned` if the page is resident with a pin count of 0
    pub fn unpin(&self, file: &FileRef, page_id: PageId, dirty: bool) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let file_id = file.id();

        let Some(frame_id) = state.page_table.lookup(file_id, page_id) else {
            trace!("unpin of non-resident {} of {} ignored", page_id, file_id);
            return Ok(());
        };
        state.unpin_frame(frame_id, dirty)
    }

    /// Give back the pin held by `handle`.
    ///
    /// Same as [`unpin`](Self::unpin) for the handle's page, but the
    /// handle is checked first.
    ///
    /// # Errors
    /// - `Error::StaleHandle` if the frame no longer holds the handle's page
    ///   or is not pinned
    pub fn release(&self, handle: PageHandle, dirty: bool) -> Result<()> {
        let mut guard = self.state.lock();
        let frame_id = guard.check_handle(&handle)?;
        guard.unpin_frame(frame_id, dirty)
    }

    // ========================================================================
    // Public API: Page access
    // ========================================================================

    /// Run `f` over the contents of a pinned page.
    ///
    /// The pool lock is held while `f` runs; `f` must not call back into
    /// the pool.
    ///
    /// # Errors
    /// - `Error::StaleHandle` if the handle no longer matches its frame
    pub fn read<R>(&self, handle: &PageHandle, f: impl FnOnce(&Page) -> R) -> Result<R> {
        let guard = self.state.lock();
        let frame_id = guard.check_handle(handle)?;
        Ok(f(&guard.pool[frame_id.0]))
    }

    /// Run `f` over the mutable contents of a pinned page.
    ///
    /// Does not mark the frame dirty; pass `dirty = true` when releasing.
    /// The pool lock is held while `f` runs; `f` must not call back into
    /// the pool.
    ///
    /// # Errors
    /// - `Error::StaleHandle` if the handle no longer matches its frame
    pub fn write<R>(&self, handle: &PageHandle, f: impl FnOnce(&mut Page) -> R) -> Result<R> {
        let mut guard = self.state.lock();
        let frame_id = guard.check_handle(handle)?;
        Ok(f(&mut guard.pool[frame_id.0]))
    }

    // ========================================================================
    // Public API: Flush and dispose
    // ========================================================================

    /// Write back and drop every resident page of `file`.
    ///
    /// All of the file's frames are checked before any is touched, so a
    /// failed precondition leaves the pool unchanged. Typically called when
    /// the file is closed.
    ///
    /// # Errors
    /// - `Error::BadBuffer` if a frame claims the file but is not valid
    /// - `Error::PagePinned` if any of the file's pages is pinned
    /// - Backing file errors from write-back
    pub fn flush(&self, file: &FileRef) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let file_id = file.id();

        for desc in &state.descriptors {
            if desc.owner_id() != Some(file_id) {
                continue;
            }
            if !desc.is_valid() {
                return Err(bad_buffer(desc));
            }
            if desc.is_pinned() {
                return Err(Error::PagePinned {
                    file: file_id,
                    page_id: desc.page_id().ok_or_else(|| bad_buffer(desc))?,
                    frame_id: desc.frame_id(),
                });
            }
        }

        let mut dropped = 0;
        for i in 0..self.pool_size {
            if state.descriptors[i].owner_id() != Some(file_id) {
                continue;
            }
            let frame_id = FrameId::new(i);
            let page_id = state.write_back(frame_id, &self.stats)?;
            state.page_table.remove(file_id, page_id);
            state.descriptors[i].clear();
            dropped += 1;
        }

        debug!("flushed {}: {} frames released", file_id, dropped);
        Ok(())
    }

    /// Delete `page_id` from `file`, dropping its frame if resident.
    ///
    /// The delete is issued to the file whether or not the page was
    /// cached. A resident page's contents are discarded without
    /// write-back.
    ///
    /// # Errors
    /// - `Error::PagePinned` if the page is resident and pinned; nothing
    ///   is deleted in that case
    /// - Backing file errors from the delete
    pub fn dispose(&self, file: &FileRef, page_id: PageId) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let file_id = file.id();

        if let Some(frame_id) = state.page_table.lookup(file_id, page_id) {
            let desc = &mut state.descriptors[frame_id.0];
            if desc.is_pinned() {
                return Err(Error::PagePinned {
                    file: file_id,
                    page_id,
                    frame_id,
                });
            }
            desc.clear();
            state.page_table.remove(file_id, page_id);
            debug!("disposed resident {} of {} from {}", page_id, file_id, frame_id);
        }

        file.delete_page(page_id)?;
        self.stats.record_disposal();
        Ok(())
    }

    /// Write back every dirty valid frame without evicting anything.
    ///
    /// Pinned frames are written too; pins and residency are unchanged.
    ///
    /// # Errors
    /// Stops at the first backing file error.
    pub fn flush_all(&self) -> Result<()> {
        let mut guard = self.state.lock();
        for i in 0..self.pool_size {
            if guard.descriptors[i].is_valid() {
                guard.write_back(FrameId::new(i), &self.stats)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Public API: Introspection
    // ========================================================================

    /// Frame holding `page_id` of `file`, if resident.
    pub fn lookup(&self, file: &FileRef, page_id: PageId) -> Option<FrameId> {
        self.state.lock().page_table.lookup(file.id(), page_id)
    }

    /// Pin count of `page_id` of `file`, if resident.
    pub fn pin_count(&self, file: &FileRef, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        let frame_id = state.page_table.lookup(file.id(), page_id)?;
        Some(state.descriptors[frame_id.0].pin_count())
    }

    /// Snapshot of every frame's descriptor and the valid-frame count.
    pub fn diagnostics(&self) -> Diagnostics {
        let state = self.state.lock();
        Diagnostics::new(state.descriptors.iter().map(FrameDescriptor::info).collect())
    }

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    #[cfg(test)]
    pub(crate) fn with_descriptor<R>(
        &self,
        frame_id: FrameId,
        f: impl FnOnce(&mut FrameDescriptor) -> R,
    ) -> R {
        f(&mut self.state.lock().descriptors[frame_id.0])
    }
}

impl Drop for BufferPoolManager {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for i in 0..self.pool_size {
            if !state.descriptors[i].is_valid() {
                continue;
            }
            if let Err(err) = state.write_back(FrameId::new(i), &self.stats) {
                warn!("write-back of {} failed during shutdown: {}", FrameId::new(i), err);
            }
        }
    }
}

impl PoolState {
    /// Get a frame ready for `install`, evicting a victim if needed.
    fn alloc_frame(&mut self, stats: &BufferPoolStats) -> Result<FrameId> {
        let victim = self
            .clock
            .find_victim(&mut self.descriptors)
            .ok_or(Error::PoolExhausted)?;

        let frame_id = victim.frame_id();
        if let Victim::Evict(_) = victim {
            let owner = self.descriptors[frame_id.0]
                .owner_id()
                .ok_or_else(|| bad_buffer(&self.descriptors[frame_id.0]))?;
            let page_id = self.write_back(frame_id, stats)?;
            self.page_table.remove(owner, page_id);
            self.descriptors[frame_id.0].clear();
            stats.record_eviction();
            debug!("evicted {} of {} from {}", page_id, owner, frame_id);
        }
        Ok(frame_id)
    }

    /// Copy `page` into an empty frame, map it and pin it once.
    ///
    /// Returns the new epoch of the frame.
    fn install(
        &mut self,
        file: &FileRef,
        page_id: PageId,
        frame_id: FrameId,
        page: &Page,
    ) -> Result<u64> {
        self.page_table.insert(file.id(), page_id, frame_id)?;
        self.pool[frame_id.0].copy_from(page);

        let desc = &mut self.descriptors[frame_id.0];
        desc.install(Arc::clone(file), page_id);
        Ok(desc.epoch())
    }

    /// Write a frame's page back to its owner if dirty.
    ///
    /// Returns the frame's page id. `dirty` is cleared only after the
    /// write succeeds.
    fn write_back(&mut self, frame_id: FrameId, stats: &BufferPoolStats) -> Result<PageId> {
        let desc = &mut self.descriptors[frame_id.0];
        let (owner, page_id) = match (desc.owner(), desc.page_id()) {
            (Some(owner), Some(page_id)) if desc.is_valid() => (Arc::clone(owner), page_id),
            _ => return Err(bad_buffer(desc)),
        };

        if desc.is_dirty() {
            owner.write_page(page_id, &self.pool[frame_id.0])?;
            desc.clear_dirty();
            stats.record_write();
            trace!("wrote back {} of {} from {}", page_id, owner.id(), frame_id);
        }
        Ok(page_id)
    }

    fn unpin_frame(&mut self, frame_id: FrameId, dirty: bool) -> Result<()> {
        let desc = &mut self.descriptors[frame_id.0];
        let (file, page_id) = desc.key().ok_or_else(|| bad_buffer(desc))?;

        if !desc.is_pinned() {
            return Err(Error::NotPinned {
                file,
                page_id,
                frame_id,
            });
        }
        if dirty {
            desc.mark_dirty();
        }
        let pins = desc.unpin().unwrap_or(0);
        trace!("unpinned {} of {} (pins={}, dirty={})", page_id, file, pins, desc.is_dirty());
        Ok(())
    }

    /// Frame of `handle` if it still holds the same pinned installation.
    fn check_handle(&self, handle: &PageHandle) -> Result<FrameId> {
        let frame_id = handle.frame_id();
        let live = self.descriptors.get(frame_id.0).is_some_and(|desc| {
            desc.is_valid()
                && desc.is_pinned()
                && desc.epoch() == handle.epoch()
                && desc.key() == Some((handle.file(), handle.page_id()))
        });

        if live {
            Ok(frame_id)
        } else {
            Err(Error::StaleHandle {
                page_id: handle.page_id(),
                frame_id,
            })
        }
    }
}

fn bad_buffer(desc: &FrameDescriptor) -> Error {
    Error::BadBuffer {
        frame_id: desc.frame_id(),
        dirty: desc.is_dirty(),
        valid: desc.is_valid(),
        referenced: desc.is_referenced(),
    }
}
