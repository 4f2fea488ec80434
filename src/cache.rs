//! Segmentation result cache.
//!
//! A constructed vocabulary is immutable and safe to share read-only
//! across threads *only if* its cache is either thread-local, externally
//! synchronized, or disabled (§5). These three implementations cover each
//! mode; `BPEVocab` takes one behind the shared [`SegmentCache`] trait, the
//! same shape the teacher uses for its regex cache (a lock-guarded
//! `HashMap` behind a narrow interface).

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;

/// Memoizes `word -> pieces`. Insertion-only; eviction is never required.
pub trait SegmentCache {
    fn get(&self, word: &str) -> Option<Vec<String>>;
    fn put(&self, word: String, pieces: Vec<String>);
}

/// Always misses and never stores. Use when caching is disabled outright.
#[derive(Default)]
pub struct NoCache;

impl SegmentCache for NoCache {
    fn get(&self, _word: &str) -> Option<Vec<String>> {
        None
    }

    fn put(&self, _word: String, _pieces: Vec<String>) {}
}

/// Single-thread cache, no locking. Appropriate for a vocabulary used from
/// one thread, or instantiated once per thread.
#[derive(Default)]
pub struct LocalCache {
    inner: RefCell<HashMap<String, Vec<String>>>,
}

impl SegmentCache for LocalCache {
    fn get(&self, word: &str) -> Option<Vec<String>> {
        self.inner.borrow().get(word).cloned()
    }

    fn put(&self, word: String, pieces: Vec<String>) {
        self.inner.borrow_mut().insert(word, pieces);
    }
}

/// Mutex-guarded cache for a vocabulary shared read-only across threads.
#[derive(Default)]
pub struct SharedCache {
    inner: Mutex<HashMap<String, Vec<String>>>,
}

impl SegmentCache for SharedCache {
    fn get(&self, word: &str) -> Option<Vec<String>> {
        self.inner
            .lock()
            .expect("segment cache mutex poisoned")
            .get(word)
            .cloned()
    }

    fn put(&self, word: String, pieces: Vec<String>) {
        self.inner
            .lock()
            .expect("segment cache mutex poisoned")
            .insert(word, pieces);
    }
}
