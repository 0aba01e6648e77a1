//! Allocation failure during index and alias mutations.
//!
//! The global allocator below can be told to fail after a number of
//! allocations on the current thread. Each test retries one mutation with a
//! growing budget, so every allocation point on its path fails once.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use giztoy_topic::{Error, SubscriptionIndex, TopicAliases};

struct FailingAlloc;

thread_local! {
    /// Allocations left before failing; `None` means unlimited.
    static BUDGET: Cell<Option<usize>> = const { Cell::new(None) };
}

fn take_allocation() -> bool {
    BUDGET
        .try_with(|budget| match budget.get() {
            None => true,
            Some(0) => false,
            Some(n) => {
                budget.set(Some(n - 1));
                true
            }
        })
        .unwrap_or(true)
}

unsafe impl GlobalAlloc for FailingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if !take_allocation() {
            return std::ptr::null_mut();
        }
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if !take_allocation() {
            return std::ptr::null_mut();
        }
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if !take_allocation() {
            return std::ptr::null_mut();
        }
        unsafe { System.realloc(ptr, layout, new_size) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOC: FailingAlloc = FailingAlloc;

/// Run `f` with at most `budget` allocations available on this thread.
fn with_budget<T>(budget: usize, f: impl FnOnce() -> T) -> T {
    BUDGET.with(|b| b.set(Some(budget)));
    let out = f();
    BUDGET.with(|b| b.set(None));
    out
}

#[test]
fn test_index_insert_out_of_memory_leaves_index_unchanged() {
    let index = SubscriptionIndex::new();
    index.insert("a/b", 1u32).unwrap();
    index.insert("a/b", 1u32).unwrap();
    index.insert("a/+/#", 2u32).unwrap();

    let filters = index.filters();
    let len = index.len();
    let generation = index.generation();

    let mut failures = 0;
    for budget in 0.. {
        match with_budget(budget, || index.insert("x/y/z/w", 3u32)) {
            Ok(inserted) => {
                assert!(inserted);
                break;
            }
            Err(err) => {
                assert_eq!(err, Error::OutOfMemory);
                assert_eq!(index.filters(), filters, "budget {}", budget);
                assert_eq!(index.len(), len);
                assert_eq!(index.generation(), generation);
                assert!(index.find_matches("x/y/z/w").unwrap().is_empty());
                failures += 1;
            }
        }
    }
    // Root key, then a map and a key for each new level, then the leaf list.
    assert!(failures >= 8, "only {} allocation points failed", failures);

    assert_eq!(index.len(), len + 1);
    assert_eq!(index.generation(), generation + 1);
    assert_eq!(index.find_matches("x/y/z/w").unwrap().len(), 1);
}

#[test]
fn test_index_insert_wildcard_out_of_memory() {
    let index = SubscriptionIndex::new();
    index.insert("a", 1u32).unwrap();
    let generation = index.generation();

    let mut failures = 0;
    for budget in 0.. {
        match with_budget(budget, || index.insert("+/#", 2u32)) {
            Ok(_) => break,
            Err(err) => {
                assert_eq!(err, Error::OutOfMemory);
                assert_eq!(index.filters(), vec!["a"]);
                assert_eq!(index.generation(), generation);
                failures += 1;
            }
        }
    }
    assert!(failures > 0);
    assert_eq!(index.filters(), vec!["a", "+/#"]);
}

#[test]
fn test_alias_add_out_of_memory_keeps_previous_topic() {
    let mut aliases = TopicAliases::new(10);
    aliases.add(1, "sensors/temp").unwrap();

    let result = with_budget(0, || aliases.add(1, "sensors/humidity"));
    assert_eq!(result, Err(Error::OutOfMemory));
    assert_eq!(aliases.find(1).unwrap(), "sensors/temp");
    assert_eq!(aliases.len(), 1);

    let mut fresh = TopicAliases::new(10);
    let mut failures = 0;
    for budget in 0.. {
        match with_budget(budget, || fresh.add(2, "a/b")) {
            Ok(()) => break,
            Err(err) => {
                assert_eq!(err, Error::OutOfMemory);
                assert!(fresh.is_empty());
                assert_eq!(fresh.find(2), Err(Error::NotFound(2)));
                failures += 1;
            }
        }
    }
    // The topic copy, then the map itself.
    assert_eq!(failures, 2);
    assert_eq!(fresh.find(2).unwrap(), "a/b");
}
