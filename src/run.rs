//! Run generations.
//!
//! Every parameter change starts a new run. A [`RunToken`] is threaded through
//! the whole fetch chain so a superseded run stops before its next request,
//! and a [`RunSlot`] only accepts results from the newest run that has been
//! started, never from an older run that happens to finish later.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Clone)]
pub struct RunTracker {
    latest: Arc<AtomicU64>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, making every previously issued token stale.
    pub fn begin(&self) -> RunToken {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RunToken {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl RunToken {
    /// A token for one-shot runs that nothing can supersede.
    pub fn detached() -> Self {
        RunTracker::new().begin()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

/// Holds the published result of the newest run.
#[derive(Debug)]
pub struct RunSlot<T> {
    inner: Mutex<Option<(u64, T)>>,
}

impl<T> Default for RunSlot<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }
}

impl<T: Clone> RunSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` if `token` is still the current run. Returns whether it was stored.
    pub fn publish(&self, token: &RunToken, value: T) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !token.is_current() {
            return false;
        }
        if let Some((stored, _)) = guard.as_ref() {
            if *stored > token.generation() {
                return false;
            }
        }
        *guard = Some((token.generation(), value));
        true
    }

    pub fn get(&self) -> Option<T> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|(_, v)| v.clone())
    }

    pub fn generation(&self) -> Option<u64> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|(g, _)| *g)
    }
}
