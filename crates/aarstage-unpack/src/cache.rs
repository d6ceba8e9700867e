//! Process-wide, single-flight cache of library unpack operations.
//!
//! Each distinct bundle is unpacked at most once until [`LibraryCache::unload`]
//! is called. Callers racing on the same bundle block until the first one is
//! done; callers on different bundles never wait for each other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::UnpackError;
use crate::extract::extract_library;

/// What a call to [`LibraryCache::unpack`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpackOutcome {
    /// This call performed the extraction.
    Unpacked,
    /// Another call already extracted the bundle.
    AlreadyUnpacked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Pending,
    Done,
    Failed,
}

/// Single-use latch for one bundle.
#[derive(Debug)]
struct Slot {
    state: Mutex<SlotState>,
    released: Condvar,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending),
            released: Condvar::new(),
        }
    }

    fn release(&self, state: SlotState) {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *current = state;
        self.released.notify_all();
    }

    /// Block until the owner releases the slot and return the final state.
    fn wait(&self) -> SlotState {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while *current == SlotState::Pending {
            current = self
                .released
                .wait(current)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *current
    }
}

/// Cache of bundles already unpacked during this build.
#[derive(Debug, Default)]
pub struct LibraryCache {
    slots: Mutex<HashMap<PathBuf, Arc<Slot>>>,
}

/// Releases a claimed slot when dropped, including on early return or panic.
struct Claim<'a> {
    cache: &'a LibraryCache,
    key: &'a Path,
    slot: Arc<Slot>,
    succeeded: bool,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.succeeded {
            self.slot.release(SlotState::Done);
            return;
        }
        // Forget the failed attempt before waking waiters so they re-claim.
        {
            let mut slots = self.cache.lock_slots();
            if slots
                .get(self.key)
                .is_some_and(|current| Arc::ptr_eq(current, &self.slot))
            {
                slots.remove(self.key);
            }
        }
        self.slot.release(SlotState::Failed);
    }
}

impl LibraryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpack `bundle` into `folder` unless it was already unpacked.
    ///
    /// # Errors
    /// Returns an error if this call performed the extraction and it failed.
    /// A failure is never handed to other callers; they retry on their own.
    pub fn unpack(&self, bundle: &Path, folder: &Path) -> Result<UnpackOutcome, UnpackError> {
        self.unpack_with(bundle, folder, extract_library)
    }

    /// Like [`LibraryCache::unpack`], with a custom extraction function.
    ///
    /// # Errors
    /// Returns the error of `extract` when this call ran it and it failed.
    pub fn unpack_with<F>(
        &self,
        bundle: &Path,
        folder: &Path,
        extract: F,
    ) -> Result<UnpackOutcome, UnpackError>
    where
        F: FnOnce(&Path, &Path) -> Result<(), UnpackError>,
    {
        let key = canonical_key(bundle);
        loop {
            let (slot, owned) = self.claim(&key);
            if owned {
                let mut claim = Claim {
                    cache: self,
                    key: &key,
                    slot,
                    succeeded: false,
                };
                tracing::debug!(bundle = %bundle.display(), "unpacking library");
                extract(bundle, folder)?;
                claim.succeeded = true;
                return Ok(UnpackOutcome::Unpacked);
            }

            match slot.wait() {
                SlotState::Done => return Ok(UnpackOutcome::AlreadyUnpacked),
                SlotState::Failed | SlotState::Pending => {
                    tracing::debug!(bundle = %bundle.display(), "previous unpack failed, retrying");
                }
            }
        }
    }

    /// Forget every bundle, so the next build unpacks them again.
    pub fn unload(&self) {
        self.lock_slots().clear();
    }

    /// Return the slot for `key` and whether this caller now owns it.
    fn claim(&self, key: &Path) -> (Arc<Slot>, bool) {
        let mut slots = self.lock_slots();
        if let Some(slot) = slots.get(key) {
            return (Arc::clone(slot), false);
        }
        let slot = Arc::new(Slot::new());
        slots.insert(key.to_path_buf(), Arc::clone(&slot));
        (slot, true)
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Slot>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn canonical_key(bundle: &Path) -> PathBuf {
    std::fs::canonicalize(bundle).unwrap_or_else(|_| bundle.to_path_buf())
}
