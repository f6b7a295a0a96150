//! End-to-end façade scenarios: plain `#[test]` functions driving the public
//! API directly, using `tempfile` for the file-backed cases and the heap
//! path directly for the rest.
use std::fs;

use crate::collective::LoopbackCollective;
use crate::{Allocator, PAGE_SIZE};

#[test]
fn growth_and_teardown_emit_log_output() {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logging.bin");
    let alloc = Allocator::create(Some(&path)).unwrap();

    // Exercises file_store::grow's log::debug! output under a real logger.
    let _ = alloc.allocate(PAGE_SIZE as usize);
    let _ = alloc.allocate(PAGE_SIZE as usize);
    alloc.destroy();
}

#[test]
fn round_trip_heap_backed() {
    let alloc = Allocator::create(None).unwrap();
    let ptr = alloc.allocate(1024);
    assert!(!ptr.is_null());

    let input = vec![0xAAu8; 1024];
    alloc.write(ptr, &input);
    let mut out = vec![0u8; 1024];
    alloc.read(ptr, &mut out);
    assert_eq!(out, input);

    alloc.deallocate(ptr);
    alloc.destroy();
}

#[test]
fn zero_size_allocation_returns_null_and_does_not_consume_pages() {
    let dir = tempfile::tempdir().unwrap();
    let alloc = Allocator::create(Some(&dir.path().join("heap.bin"))).unwrap();

    let zero = alloc.allocate(0);
    assert!(zero.is_null());

    // If the zero-size call had consumed a page, this would land at
    // PAGE_SIZE instead of 0.
    let real = alloc.allocate(PAGE_SIZE as usize);
    assert_eq!(real.as_u64(), 0);

    alloc.destroy();
}

#[test]
fn growth_doubles_file_and_returns_next_page_offset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grow.bin");
    let alloc = Allocator::create(Some(&path)).unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len(), PAGE_SIZE);

    let p1 = alloc.allocate(PAGE_SIZE as usize);
    assert_eq!(p1.as_u64(), 0);

    let p2 = alloc.allocate(PAGE_SIZE as usize);
    assert_eq!(fs::metadata(&path).unwrap().len(), 2 * PAGE_SIZE);
    assert_eq!(p2.as_u64(), PAGE_SIZE);

    alloc.destroy();
}

#[test]
fn first_fit_determinism_reuses_freed_middle_block() {
    let dir = tempfile::tempdir().unwrap();
    let alloc = Allocator::create(Some(&dir.path().join("fit.bin"))).unwrap();

    let p0 = alloc.allocate(PAGE_SIZE as usize);
    let p1 = alloc.allocate(PAGE_SIZE as usize);
    let p2 = alloc.allocate(PAGE_SIZE as usize);
    assert_eq!((p0.as_u64(), p1.as_u64(), p2.as_u64()), (0, PAGE_SIZE, 2 * PAGE_SIZE));

    alloc.deallocate(p1);
    let reused = alloc.allocate(PAGE_SIZE as usize);
    assert_eq!(reused.as_u64(), p1.as_u64());

    alloc.destroy();
}

#[test]
fn contiguity_not_satisfied_by_disjoint_free_pages() {
    let dir = tempfile::tempdir().unwrap();
    let alloc = Allocator::create(Some(&dir.path().join("contig.bin"))).unwrap();

    let blocks: Vec<_> = (0..5).map(|_| alloc.allocate(PAGE_SIZE as usize)).collect();
    alloc.deallocate(blocks[1]);
    alloc.deallocate(blocks[3]);

    let two_page = alloc.allocate(2 * PAGE_SIZE as usize);
    assert_ne!(two_page.as_u64(), blocks[1].as_u64());
    assert_ne!(two_page.as_u64(), blocks[3].as_u64());

    alloc.destroy();
}

#[test]
fn teardown_unlinks_backing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("teardown.bin");
    let alloc = Allocator::create(Some(&path)).unwrap();
    let ptr = alloc.allocate(PAGE_SIZE as usize);
    assert!(!ptr.is_null());
    assert!(path.exists());

    alloc.destroy();
    assert!(!path.exists());
}

#[test]
fn peer_ranks_observe_owner_pointer_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("multirank.bin");
    let group = LoopbackCollective::new_group(3);

    let sequences: Vec<Vec<u64>> = std::thread::scope(|scope| {
        let handles: Vec<_> = group
            .into_iter()
            .map(|member| {
                let path = path.clone();
                scope.spawn(move || {
                    let alloc = Allocator::create_with_collective(Some(&path), member).unwrap();
                    let seq: Vec<u64> = [PAGE_SIZE as usize, 2 * PAGE_SIZE as usize, PAGE_SIZE as usize]
                        .into_iter()
                        .map(|size| alloc.allocate(size).as_u64())
                        .collect();
                    alloc.destroy();
                    seq
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for seq in &sequences[1..] {
        assert_eq!(seq, &sequences[0], "peer pointer sequence diverged from the owner's");
    }
}

#[test]
fn disjoint_pairs_of_live_blocks_never_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let alloc = Allocator::create(Some(&dir.path().join("disjoint.bin"))).unwrap();

    let sizes = [100usize, PAGE_SIZE as usize, 3 * PAGE_SIZE as usize, 1];
    let mut live = Vec::new();
    for &s in &sizes {
        live.push((alloc.allocate(s), s));
    }

    for i in 0..live.len() {
        for j in (i + 1)..live.len() {
            let (pi, si) = live[i];
            let (pj, sj) = live[j];
            let page = |p: crate::VirtualPointer| p.as_u64() / PAGE_SIZE;
            let pages_i = page(pi)..page(pi) + (si as u64).div_ceil(PAGE_SIZE);
            let pages_j = page(pj)..page(pj) + (sj as u64).div_ceil(PAGE_SIZE);
            assert!(
                pages_i.end <= pages_j.start || pages_j.end <= pages_i.start,
                "blocks {i} and {j} overlap"
            );
        }
    }

    alloc.destroy();
}
