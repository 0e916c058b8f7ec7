//! Disk-backed [`PageFile`] implementation.
//!
//! [`DiskFile`] stores each page in a fixed-size slot together with a
//! CRC32 of its contents and a flags word, so torn writes are detected on
//! read and deleted slots survive a reopen.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, FileId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PageFile;

/// Bytes of trailer after each page: checksum then flags.
const TRAILER_SIZE: usize = 8;

/// Bytes occupied by one page slot on disk.
pub const SLOT_SIZE: usize = PAGE_SIZE + TRAILER_SIZE;

/// Flag bit marking a deleted slot.
const FLAG_DELETED: u32 = 1;

/// A page file backed by a single OS file.
///
/// # File Layout
/// ```text
/// ┌──────────────────────┬──────────────────────┬─────────┐
/// │ Slot 0               │ Slot 1               │  ...    │
/// │ page | crc32 | flags │ page | crc32 | flags │         │
/// └──────────────────────┴──────────────────────┴─────────┘
/// Offset: 0              SLOT_SIZE               ...
/// ```
///
/// Page N is located at file offset `N × SLOT_SIZE`. Deleted slots are
/// reused (most recently deleted first) by [`PageFile::allocate_page`].
///
/// # Durability
/// Writes are followed by `sync_data()`.
pub struct DiskFile {
    id: FileId,
    name: String,
    inner: Mutex<Inner>,
}

struct Inner {
    file: File,
    /// Number of slots in the file, live or deleted.
    slot_count: u32,
    /// Deleted slots in deletion order; the last one is reused first.
    free: Vec<PageId>,
    deleted: HashSet<PageId>,
}

impl DiskFile {
    /// Create a new page file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        Ok(Self::with_inner(
            &path,
            Inner {
                file,
                slot_count: 0,
                free: Vec::new(),
                deleted: HashSet::new(),
            },
        ))
    }

    /// Open an existing page file, rebuilding its free list.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;

        let slot_count = (file.metadata()?.len() / SLOT_SIZE as u64) as u32;
        let mut free = Vec::new();
        let mut trailer = [0u8; TRAILER_SIZE];
        for slot in 0..slot_count {
            file.seek(SeekFrom::Start(trailer_offset(PageId::new(slot))))?;
            file.read_exact(&mut trailer)?;
            if decode_flags(&trailer) & FLAG_DELETED != 0 {
                free.push(PageId::new(slot));
            }
        }
        let deleted = free.iter().copied().collect();

        Ok(Self::with_inner(
            &path,
            Inner {
                file,
                slot_count,
                free,
                deleted,
            },
        ))
    }

    /// Open an existing page file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    fn with_inner<P: AsRef<Path>>(path: P, inner: Inner) -> Self {
        Self {
            id: FileId::next(),
            name: path.as_ref().display().to_string(),
            inner: Mutex::new(inner),
        }
    }

    /// Number of slots in the file, including deleted ones.
    pub fn slot_count(&self) -> u32 {
        self.inner.lock().slot_count
    }

    /// Total size of the file in bytes.
    pub fn file_size(&self) -> u64 {
        self.slot_count() as u64 * SLOT_SIZE as u64
    }

    fn not_found(&self, page_id: PageId) -> Error {
        Error::PageNotFound {
            file: self.id,
            page_id,
        }
    }

    fn check_live(&self, inner: &Inner, page_id: PageId) -> Result<()> {
        if page_id.0 >= inner.slot_count || inner.deleted.contains(&page_id) {
            return Err(self.not_found(page_id));
        }
        Ok(())
    }
}

impl PageFile for DiskFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_page(&self, page_id: PageId) -> Result<Page> {
        let mut inner = self.inner.lock();
        self.check_live(&inner, page_id)?;

        let mut page = Page::new();
        let mut trailer = [0u8; TRAILER_SIZE];
        inner.file.seek(SeekFrom::Start(slot_offset(page_id)))?;
        inner.file.read_exact(page.as_mut_slice())?;
        inner.file.read_exact(&mut trailer)?;

        if decode_checksum(&trailer) != crc32fast::hash(page.as_slice()) {
            return Err(Error::ChecksumMismatch {
                file: self.id,
                page_id,
            });
        }
        Ok(page)
    }

    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        let mut inner = self.inner.lock();
        self.check_live(&inner, page_id)?;
        write_slot(&mut inner.file, page_id, page, 0)
    }

    fn allocate_page(&self) -> Result<(PageId, Page)> {
        let mut inner = self.inner.lock();
        let page = Page::new();

        let page_id = match inner.free.pop() {
            Some(page_id) => {
                inner.deleted.remove(&page_id);
                page_id
            }
            None => PageId::new(inner.slot_count),
        };
        write_slot(&mut inner.file, page_id, &page, 0)?;
        if page_id.0 == inner.slot_count {
            inner.slot_count += 1;
        }

        Ok((page_id, page))
    }

    fn delete_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();
        self.check_live(&inner, page_id)?;

        write_slot(&mut inner.file, page_id, &Page::new(), FLAG_DELETED)?;
        inner.free.push(page_id);
        inner.deleted.insert(page_id);
        Ok(())
    }
}

fn slot_offset(page_id: PageId) -> u64 {
    page_id.0 as u64 * SLOT_SIZE as u64
}

fn trailer_offset(page_id: PageId) -> u64 {
    slot_offset(page_id) + PAGE_SIZE as u64
}

fn write_slot(file: &mut File, page_id: PageId, page: &Page, flags: u32) -> Result<()> {
    let mut trailer = [0u8; TRAILER_SIZE];
    trailer[..4].copy_from_slice(&crc32fast::hash(page.as_slice()).to_le_bytes());
    trailer[4..].copy_from_slice(&flags.to_le_bytes());

    file.seek(SeekFrom::Start(slot_offset(page_id)))?;
    file.write_all(page.as_slice())?;
    file.write_all(&trailer)?;
    file.sync_data()?;
    Ok(())
}

fn decode_checksum(trailer: &[u8; TRAILER_SIZE]) -> u32 {
    u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]])
}

fn decode_flags(trailer: &[u8; TRAILER_SIZE]) -> u32 {
    u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]])
}
