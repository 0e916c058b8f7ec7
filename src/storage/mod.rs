//! Storage layer - page buffers and backing files.
//!
//! This module handles persistent storage:
//! - [`PageFile`] - The file interface the buffer pool consumes
//! - [`DiskFile`] - Checksummed slot file on disk
//! - [`MemoryFile`] - In-memory file for tests and scratch data
//! - [`page`] - The raw page buffer

mod disk_file;
mod memory_file;
pub mod page;
mod page_file;

pub use disk_file::{DiskFile, SLOT_SIZE};
pub use memory_file::MemoryFile;
pub use page_file::{FileRef, PageFile};
