//! Integration tests for the buffer pool over disk-backed files.
//!
//! These tests verify cross-component behavior that unit tests don't cover.

use std::sync::Arc;
use std::thread;

use clockpool::storage::{DiskFile, FileRef, PageFile};
use clockpool::{BufferPoolManager, PageId};
use tempfile::tempdir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Test data persistence across multiple eviction cycles.
#[test]
fn test_data_persistence_across_evictions() {
    init_logging();
    let dir = tempdir().unwrap();
    let file: FileRef = Arc::new(DiskFile::create(dir.path().join("t.db")).unwrap());
    let bpm = BufferPoolManager::new(2);

    let mut page_ids = vec![];
    for i in 0u8..5 {
        let (pid, handle) = bpm.allocate(&file).unwrap();
        bpm.write(&handle, |page| {
            page.as_mut_slice()[0] = i;
            page.as_mut_slice()[1] = i.wrapping_mul(3);
        })
        .unwrap();
        bpm.release(handle, true).unwrap();
        page_ids.push(pid);
    }

    for (i, &pid) in page_ids.iter().enumerate() {
        let handle = bpm.fetch(&file, pid).unwrap();
        let (a, b) = bpm
            .read(&handle, |page| (page.as_slice()[0], page.as_slice()[1]))
            .unwrap();
        assert_eq!(a, i as u8);
        assert_eq!(b, (i as u8).wrapping_mul(3));
        bpm.release(handle, false).unwrap();
    }
}

/// Dropping the pool writes back dirty frames without an explicit flush.
#[test]
fn test_shutdown_writes_back_dirty_frames() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.db");
    let data = b"persistent!";

    let pid;
    {
        let file: FileRef = Arc::new(DiskFile::create(&path).unwrap());
        let bpm = BufferPoolManager::new(10);

        let (page_id, handle) = bpm.allocate(&file).unwrap();
        pid = page_id;
        bpm.write(&handle, |page| page.as_mut_slice()[..data.len()].copy_from_slice(data))
            .unwrap();
        bpm.release(handle, true).unwrap();
    }

    let file = DiskFile::open(&path).unwrap();
    let page = file.read_page(pid).unwrap();
    assert_eq!(&page.as_slice()[..data.len()], data);
}

/// Test flush and reload across pool instances.
#[test]
fn test_flush_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.db");

    let pid;
    {
        let file: FileRef = Arc::new(DiskFile::create(&path).unwrap());
        let bpm = BufferPoolManager::new(4);
        let (page_id, handle) = bpm.allocate(&file).unwrap();
        pid = page_id;
        bpm.write(&handle, |page| page.as_mut_slice()[100] = 0x5A).unwrap();
        bpm.release(handle, true).unwrap();
        bpm.flush(&file).unwrap();
        assert_eq!(bpm.diagnostics().valid_frames, 0);
    }

    let file: FileRef = Arc::new(DiskFile::open(&path).unwrap());
    let bpm = BufferPoolManager::new(4);
    let handle = bpm.fetch(&file, pid).unwrap();
    assert_eq!(bpm.read(&handle, |page| page.as_slice()[100]).unwrap(), 0x5A);
    bpm.release(handle, false).unwrap();
}

/// Disposed pages are deleted on disk and their ids reused.
#[test]
fn test_dispose_reuses_page_id() {
    let dir = tempdir().unwrap();
    let file: FileRef = Arc::new(DiskFile::create(dir.path().join("t.db")).unwrap());
    let bpm = BufferPoolManager::new(4);

    let (p0, h) = bpm.allocate(&file).unwrap();
    bpm.release(h, false).unwrap();
    let (_p1, h) = bpm.allocate(&file).unwrap();
    bpm.release(h, false).unwrap();

    bpm.dispose(&file, p0).unwrap();
    assert!(bpm.fetch(&file, p0).is_err());

    let (reused, h) = bpm.allocate(&file).unwrap();
    assert_eq!(reused, p0);
    bpm.release(h, false).unwrap();
}

/// Test concurrent writers to different pages.
#[test]
fn test_concurrent_writers() {
    init_logging();
    let dir = tempdir().unwrap();
    let file: FileRef = Arc::new(DiskFile::create(dir.path().join("t.db")).unwrap());
    let bpm = Arc::new(BufferPoolManager::new(10));

    let page_ids: Vec<PageId> = (0..5)
        .map(|_| {
            let (pid, handle) = bpm.allocate(&file).unwrap();
            bpm.release(handle, false).unwrap();
            pid
        })
        .collect();

    let mut handles = vec![];
    for (i, &pid) in page_ids.iter().enumerate() {
        let bpm = Arc::clone(&bpm);
        let file = Arc::clone(&file);

        handles.push(thread::spawn(move || {
            for j in 0..50 {
                let handle = bpm.fetch(&file, pid).unwrap();
                bpm.write(&handle, |page| page.as_mut_slice()[0] = ((i * 50 + j) % 256) as u8)
                    .unwrap();
                bpm.release(handle, true).unwrap();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    for (i, &pid) in page_ids.iter().enumerate() {
        let handle = bpm.fetch(&file, pid).unwrap();
        let value = bpm.read(&handle, |page| page.as_slice()[0]).unwrap();
        assert_eq!(value, ((i * 50 + 49) % 256) as u8);
        bpm.release(handle, false).unwrap();
    }
}

/// Threads contending for a pool smaller than their working set.
#[test]
fn test_concurrent_eviction_pressure() {
    let dir = tempdir().unwrap();
    let file: FileRef = Arc::new(DiskFile::create(dir.path().join("t.db")).unwrap());
    let bpm = Arc::new(BufferPoolManager::new(4));

    let page_ids: Vec<PageId> = (0..16)
        .map(|i| {
            let (pid, handle) = bpm.allocate(&file).unwrap();
            bpm.write(&handle, |page| page.as_mut_slice()[0] = i as u8).unwrap();
            bpm.release(handle, true).unwrap();
            pid
        })
        .collect();
    let page_ids = Arc::new(page_ids);

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let bpm = Arc::clone(&bpm);
            let file = Arc::clone(&file);
            let page_ids = Arc::clone(&page_ids);
            thread::spawn(move || {
                for round in 0..40 {
                    let idx = (t * 7 + round) % page_ids.len();
                    let handle = bpm.fetch(&file, page_ids[idx]).unwrap();
                    let value = bpm.read(&handle, |page| page.as_slice()[0]).unwrap();
                    assert_eq!(value, idx as u8);
                    bpm.release(handle, false).unwrap();
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(bpm.diagnostics().pinned_frames(), 0);
}

/// Test stats accuracy.
#[test]
fn test_stats_accuracy() {
    let dir = tempdir().unwrap();
    let file: FileRef = Arc::new(DiskFile::create(dir.path().join("t.db")).unwrap());
    let bpm = BufferPoolManager::new(2);

    let (pid, handle) = bpm.allocate(&file).unwrap();
    bpm.release(handle, false).unwrap();

    for _ in 0..5 {
        let handle = bpm.fetch(&file, pid).unwrap();
        bpm.release(handle, false).unwrap();
    }

    let stats = bpm.stats().snapshot();
    assert_eq!(stats.hits, 5);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.pages_read, 0);
    assert_eq!(stats.hit_rate(), 1.0);
}
