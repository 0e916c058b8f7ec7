//! clockpool - a disk-backed buffer pool with CLOCK replacement.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           clockpool                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Buffer Pool (buffer/)                   │   │
//! │  │   fetch │ allocate │ unpin │ flush │ dispose │ diag     │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │ FrameDescriptor table  ◀── ClockReplacer hand   │   │   │
//! │  │   │ PageTable (file, page) → frame                  │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                      │   │
//! │  │     PageFile trait: DiskFile | MemoryFile + Page        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (FileId, PageId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool manager, frame descriptors and the clock replacer
//! - [`storage`] - Backing files and the page buffer
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use clockpool::BufferPoolManager;
//! use clockpool::storage::{DiskFile, FileRef};
//!
//! let file: FileRef = Arc::new(DiskFile::open_or_create("my_table.db").unwrap());
//! let bpm = BufferPoolManager::new(64);
//!
//! let (page_id, handle) = bpm.allocate(&file).unwrap();
//! bpm.write(&handle, |page| page.as_mut_slice()[..5].copy_from_slice(b"hello")).unwrap();
//! bpm.release(handle, true).unwrap();
//!
//! // Write back and drop the file's pages before closing it
//! bpm.flush(&file).unwrap();
//! # let _ = page_id;
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

pub use common::config::PAGE_SIZE;
pub use common::{Error, FileId, FrameId, PageId, Result};

pub use buffer::{
    BufferPoolManager, BufferPoolStats, Diagnostics, FrameInfo, PageHandle, StatsSnapshot,
};
pub use storage::page::Page;
pub use storage::{DiskFile, FileRef, MemoryFile, PageFile};
