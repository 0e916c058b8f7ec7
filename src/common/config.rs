//! Configuration constants for the buffer pool.

/// Size of a page in bytes (4KB).
///
/// Matches the OS page size on most systems, so a frame maps onto exactly
/// one OS page.
///
/// # Alignment
/// Pages are aligned to 4096 bytes for efficient Direct I/O (O_DIRECT).
pub const PAGE_SIZE: usize = 4096;

/// Ratio of page index buckets to pool frames.
///
/// Keeps the page table's load factor below one even when every frame
/// holds a page.
pub const PAGE_INDEX_LOAD_FACTOR: f64 = 1.2;

/// Capacity to reserve for the page index of a pool with `pool_size` frames.
///
/// Computed as `floor(pool_size * 1.2) + 1`.
pub fn page_index_capacity(pool_size: usize) -> usize {
    (pool_size as f64 * PAGE_INDEX_LOAD_FACTOR) as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_page_index_capacity() {
        assert_eq!(page_index_capacity(1), 2);
        assert_eq!(page_index_capacity(3), 4);
        assert_eq!(page_index_capacity(10), 13);
        assert_eq!(page_index_capacity(100), 121);
    }
}
