//! File identity type.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_FILE_ID: AtomicU32 = AtomicU32::new(0);

/// Identifies an open backing file.
///
/// Two handles refer to the same file exactly when their `FileId`s are
/// equal. The buffer pool keys its page index on `(FileId, PageId)`.
///
/// # Example
/// ```
/// use clockpool::FileId;
///
/// let a = FileId::next();
/// let b = FileId::next();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a FileId from a raw value.
    #[inline]
    pub fn new(id: u32) -> Self {
        FileId(id)
    }

    /// Hand out a process-unique identity.
    pub fn next() -> Self {
        FileId(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_next_is_unique() {
        let ids: Vec<FileId> = (0..16).map(|_| FileId::next()).collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_file_id_display() {
        assert_eq!(format!("{}", FileId::new(7)), "File(7)");
    }
}
