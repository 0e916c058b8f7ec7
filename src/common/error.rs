//! Error types for the buffer pool.

use thiserror::Error;

use crate::common::{FileId, FrameId, PageId};

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors surfaced by the buffer pool and its backing files.
///
/// A page index miss is never an error; it shows up as `None`.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a disk-backed file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every frame is pinned, so no victim can be chosen.
    #[error("buffer pool exhausted: every frame is pinned")]
    PoolExhausted,

    /// `unpin` was called for a page whose pin count is already zero.
    ///
    /// This indicates a bug in the caller - unpins must match pins.
    #[error("{page_id} of {file} in {frame_id} is not pinned")]
    NotPinned {
        file: FileId,
        page_id: PageId,
        frame_id: FrameId,
    },

    /// The page is still pinned and cannot be flushed or disposed.
    #[error("{page_id} of {file} in {frame_id} is pinned")]
    PagePinned {
        file: FileId,
        page_id: PageId,
        frame_id: FrameId,
    },

    /// A descriptor claims a file but is not valid.
    ///
    /// Internal-consistency violation; fatal for the call that sees it.
    #[error("bad buffer in {frame_id}: dirty={dirty} valid={valid} refbit={referenced}")]
    BadBuffer {
        frame_id: FrameId,
        dirty: bool,
        valid: bool,
        referenced: bool,
    },

    /// A page handle was used after its pin was released or the frame
    /// was reused.
    #[error("stale handle for {page_id} in {frame_id}")]
    StaleHandle { page_id: PageId, frame_id: FrameId },

    /// The page index already holds an entry for this key.
    #[error("{page_id} of {file} is already cached")]
    PageAlreadyCached { file: FileId, page_id: PageId },

    /// The backing file has no such page.
    #[error("{page_id} not found in {file}")]
    PageNotFound { file: FileId, page_id: PageId },

    /// Stored checksum does not match the page contents.
    #[error("checksum mismatch for {page_id} in {file}")]
    ChecksumMismatch { file: FileId, page_id: PageId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PoolExhausted;
        assert_eq!(
            format!("{}", err),
            "buffer pool exhausted: every frame is pinned"
        );

        let err = Error::NotPinned {
            file: FileId::new(1),
            page_id: PageId::new(4),
            frame_id: FrameId::new(2),
        };
        assert_eq!(format!("{}", err), "Page(4) of File(1) in Frame(2) is not pinned");

        let err = Error::PageNotFound {
            file: FileId::new(3),
            page_id: PageId::new(42),
        };
        assert_eq!(format!("{}", err), "Page(42) not found in File(3)");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }
}
