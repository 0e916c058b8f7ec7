//! Read-only dump of buffer pool frame state.

use std::fmt;

use crate::common::{FileId, FrameId, PageId};

/// Snapshot of one frame descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub frame_id: FrameId,
    pub file: Option<FileId>,
    pub page_id: Option<PageId>,
    pub pin_count: u32,
    pub dirty: bool,
    pub valid: bool,
    pub referenced: bool,
}

impl fmt::Display for FrameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameNo:{} ", self.frame_id.0)?;
        match (self.file, self.page_id) {
            (Some(file), Some(page_id)) => write!(f, "file:{} pageNo:{} ", file, page_id.0)?,
            _ => write!(f, "file:NULL pageNo:- ")?,
        }
        write!(
            f,
            "valid:{} pinCnt:{} dirty:{} refbit:{}",
            self.valid, self.pin_count, self.dirty, self.referenced
        )
    }
}

/// Every frame's state plus the number of valid frames.
///
/// Produced by [`BufferPoolManager::diagnostics`](crate::BufferPoolManager::diagnostics).
/// The `Display` form is meant for humans:
/// ```text
/// FrameNo:0 file:File(3) pageNo:0 valid:true pinCnt:1 dirty:false refbit:true
/// FrameNo:1 file:NULL pageNo:- valid:false pinCnt:0 dirty:false refbit:false
/// Total Number of Valid Frames:1
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub frames: Vec<FrameInfo>,
    pub valid_frames: usize,
}

impl Diagnostics {
    pub(crate) fn new(frames: Vec<FrameInfo>) -> Self {
        let valid_frames = frames.iter().filter(|info| info.valid).count();
        Self {
            frames,
            valid_frames,
        }
    }

    /// Frames currently pinned by at least one holder.
    pub fn pinned_frames(&self) -> usize {
        self.frames.iter().filter(|info| info.pin_count > 0).count()
    }

    /// Frames whose contents differ from the durable copy.
    pub fn dirty_frames(&self) -> usize {
        self.frames.iter().filter(|info| info.dirty).count()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for info in &self.frames {
            writeln!(f, "{}", info)?;
        }
        write!(f, "Total Number of Valid Frames:{}", self.valid_frames)
    }
}
