//! Page buffer type.
//!
//! [`Page`] is the raw 4KB data container that moves between backing
//! files and buffer pool frames.

#[allow(clippy::module_inception)]
mod page;

pub use page::Page;
