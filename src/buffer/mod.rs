//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between callers and
//! backing files. It manages a fixed pool of frames, each holding one page.
//!
//! # Components
//! - [`BufferPoolManager`] - The main page cache
//! - [`FrameDescriptor`] - Per-frame owner, pin, dirty and reference state
//! - [`PageTable`] - `(file, page)` to frame index
//! - [`PageHandle`] - Checked token for a pinned page
//! - [`Diagnostics`] - Read-only dump of all frames
//! - [`BufferPoolStats`] - Performance statistics
//! - [`replacer`] - CLOCK eviction policy

mod buffer_pool_manager;
mod descriptor;
mod diagnostics;
mod handle;
mod page_table;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::BufferPoolManager;
pub use descriptor::FrameDescriptor;
pub use diagnostics::{Diagnostics, FrameInfo};
pub use handle::PageHandle;
pub use page_table::{PageIndex, PageTable};
pub use stats::{BufferPoolStats, StatsSnapshot};
