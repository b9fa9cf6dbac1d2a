//! Local persistence: a single key-value slot holding the whole diagram.
//!
//! DESIGN
//! ======
//! [`KeyValueStore`] abstracts the backing store (browser `localStorage` in
//! production, [`MemoryStore`] in tests). [`DiagramStore`] layers the JSON
//! document on top. Writes are debounced by [`SaveScheduler`], an explicit
//! pending-write value polled from the animation frame loop, so nothing
//! depends on timer cleanup semantics.
//!
//! ERROR HANDLING
//! ==============
//! Loading never fails: absent or malformed data yields `None` (logged), and
//! [`DiagramStore::load_or_default`] substitutes the starter diagram. Saving
//! surfaces [`PersistError`]; the engine turns it into a warning for the host
//! and marks the scheduler dirty again, so a refused write (quota, private
//! mode) is retried rather than lost.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::collections::HashMap;

use crate::consts::{SAVE_DEBOUNCE_MS, STORAGE_KEY};
use crate::doc::Diagram;

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("could not encode diagram: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A string key-value store.
pub trait KeyValueStore {
    /// # Errors
    ///
    /// [`PersistError::Unavailable`] if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// # Errors
    ///
    /// [`PersistError::Write`] if the store rejects the value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
}

/// In-memory store. Counts writes so debounce behavior can be observed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// The diagram slot on top of a [`KeyValueStore`].
#[derive(Debug)]
pub struct DiagramStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> DiagramStore<S> {
    /// Use the standard `relationshipDiagram` slot.
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: &str) -> Self {
        Self { store, key: key.to_string() }
    }

    /// Read the stored diagram. `None` when absent, unreadable, or malformed.
    pub fn load(&self) -> Option<Diagram> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::info!("storage: no saved diagram under {:?}", self.key);
                return None;
            }
            Err(e) => {
                log::warn!("storage: read failed: {e}");
                return None;
            }
        };
        match Diagram::from_json(&raw) {
            Ok(diagram) => Some(diagram),
            Err(e) => {
                log::warn!("storage: ignoring malformed diagram: {e}");
                None
            }
        }
    }

    /// Read the stored diagram, falling back to the starter diagram.
    pub fn load_or_default(&self) -> Diagram {
        self.load().unwrap_or_else(Diagram::starter)
    }

    /// # Errors
    ///
    /// [`PersistError::Encode`] or whatever the backing store reports.
    pub fn save(&mut self, diagram: &Diagram) -> Result<(), PersistError> {
        let json = diagram.to_json()?;
        self.store.set(&self.key, &json)?;
        log::debug!("storage: saved {} bytes", json.len());
        Ok(())
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

// =============================================================================
// SAVE SCHEDULER
// =============================================================================

/// Outstanding write state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingWrite {
    /// Nothing to write.
    Clean,
    /// Changed since the last write; no deadline assigned yet.
    Dirty,
    /// Changed; write once `now >= deadline_ms`.
    Scheduled { deadline_ms: f64 },
    /// Changed and must be written at the next poll.
    FlushRequested,
}

/// Collapses bursts of edits into one write per quiet window.
///
/// The deadline is assigned at the first poll after a change. Later changes
/// inside the window do not push it back, so a continuous drag still saves
/// roughly every window.
#[derive(Debug, Clone, Copy)]
pub struct SaveScheduler {
    window_ms: f64,
    pending: PendingWrite,
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new(SAVE_DEBOUNCE_MS)
    }
}

impl SaveScheduler {
    #[must_use]
    pub fn new(window_ms: f64) -> Self {
        Self { window_ms, pending: PendingWrite::Clean }
    }

    #[must_use]
    pub fn pending(&self) -> PendingWrite {
        self.pending
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.pending == PendingWrite::Clean
    }

    /// Record a model change.
    pub fn mark_dirty(&mut self) {
        if self.pending == PendingWrite::Clean {
            self.pending = PendingWrite::Dirty;
        }
    }

    /// Skip the rest of the window (drag end, touch end, teardown).
    pub fn request_flush(&mut self) {
        if self.pending != PendingWrite::Clean {
            self.pending = PendingWrite::FlushRequested;
        }
    }

    /// Advance the clock. Returns `true` when the caller should write now;
    /// the scheduler is then clean.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.pending {
            PendingWrite::Clean => false,
            PendingWrite::Dirty => {
                if self.window_ms <= 0.0 {
                    self.pending = PendingWrite::Clean;
                    return true;
                }
                self.pending = PendingWrite::Scheduled { deadline_ms: now_ms + self.window_ms };
                false
            }
            PendingWrite::Scheduled { deadline_ms } => {
                if now_ms >= deadline_ms {
                    self.pending = PendingWrite::Clean;
                    true
                } else {
                    false
                }
            }
            PendingWrite::FlushRequested => {
                self.pending = PendingWrite::Clean;
                true
            }
        }
    }

    /// Whether anything is outstanding, and clear it. For teardown.
    pub fn take(&mut self) -> bool {
        let had = self.pending != PendingWrite::Clean;
        self.pending = PendingWrite::Clean;
        had
    }
}
