//! Property tests: random fetch/release sequences against a small pool.
//!
//! After every step the page index must agree with the descriptor table,
//! pin counts must match the handles held, and page contents must match
//! what was last released dirty, no matter how often pages were evicted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use clockpool::storage::{FileRef, MemoryFile, PageFile};
use clockpool::{BufferPoolManager, Error, PageHandle, PageId};
use proptest::prelude::*;

const PAGES: u32 = 8;

#[derive(Debug, Clone)]
enum Op {
    Fetch(u32),
    Release { slot: usize, dirty: bool, value: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PAGES).prop_map(Op::Fetch),
        (any::<usize>(), any::<bool>(), any::<u8>())
            .prop_map(|(slot, dirty, value)| Op::Release { slot, dirty, value }),
    ]
}

fn check_invariants(
    bpm: &BufferPoolManager,
    file: &FileRef,
    held: &[PageHandle],
) -> Result<(), TestCaseError> {
    let diag = bpm.diagnostics();
    let mut keys = HashSet::new();
    let mut pins = 0;

    for info in &diag.frames {
        if !info.valid {
            prop_assert_eq!(info.pin_count, 0);
            prop_assert!(!info.dirty);
            continue;
        }
        let page_id = info.page_id.expect("valid frame has a page");
        prop_assert!(keys.insert((info.file, page_id)), "two frames hold one page");
        prop_assert_eq!(bpm.lookup(file, page_id), Some(info.frame_id));
        pins += info.pin_count as usize;
    }

    prop_assert_eq!(pins, held.len());
    prop_assert_eq!(diag.valid_frames, keys.len());
    Ok(())
}

proptest! {
    #[test]
    fn pool_invariants_hold(
        pool_size in 1usize..6,
        ops in prop::collection::vec(op_strategy(), 1..120),
    ) {
        let mem = Arc::new(MemoryFile::new("prop"));
        for _ in 0..PAGES {
            mem.allocate_page().unwrap();
        }
        let file: FileRef = mem.clone();
        let bpm = BufferPoolManager::new(pool_size);

        let mut held: Vec<PageHandle> = Vec::new();
        let mut model: HashMap<PageId, u8> = HashMap::new();

        for op in ops {
            match op {
                Op::Fetch(n) => {
                    let page_id = PageId::new(n);
                    let pinned_before = bpm.diagnostics().pinned_frames();
                    match bpm.fetch(&file, page_id) {
                        Ok(handle) => {
                            let seen = bpm.read(&handle, |page| page.as_slice()[0]).unwrap();
                            prop_assert_eq!(seen, model.get(&page_id).copied().unwrap_or(0));
                            held.push(handle);
                        }
                        Err(Error::PoolExhausted) => {
                            prop_assert_eq!(pinned_before, pool_size);
                            prop_assert_eq!(bpm.lookup(&file, page_id), None);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                Op::Release { slot, dirty, value } => {
                    if held.is_empty() {
                        continue;
                    }
                    let handle = held.swap_remove(slot % held.len());
                    let page_id = handle.page_id();
                    if dirty {
                        bpm.write(&handle, |page| page.as_mut_slice()[0] = value).unwrap();
                        model.insert(page_id, value);
                    }
                    bpm.release(handle, dirty).unwrap();
                }
            }
            check_invariants(&bpm, &file, &held)?;
        }

        // Shutdown makes the file match the model
        drop(held);
        drop(bpm);
        for (page_id, value) in model {
            prop_assert_eq!(mem.read_page(page_id).unwrap().as_slice()[0], value);
        }
    }
}
