use super::*;
use crate::camera::Point;
use crate::doc::PersonId;

// =============================================================
// Helpers
// =============================================================

/// Rejects every operation, like a browser with storage disabled.
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PersistError> {
        Err(PersistError::Unavailable("disabled".into()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PersistError> {
        Err(PersistError::Write("quota exceeded".into()))
    }
}

fn store_with(raw: &str) -> DiagramStore<MemoryStore> {
    let mut mem = MemoryStore::new();
    mem.set(STORAGE_KEY, raw).unwrap();
    DiagramStore::new(mem)
}

// =============================================================
// DiagramStore
// =============================================================

#[test]
fn empty_store_loads_nothing_and_defaults_to_starter() {
    let store = DiagramStore::new(MemoryStore::new());
    assert!(store.load().is_none());
    assert_eq!(store.load_or_default(), Diagram::starter());
}

#[test]
fn malformed_blob_falls_back_to_starter() {
    let store = store_with("{not json");
    assert!(store.load().is_none());
    assert_eq!(store.load_or_default(), Diagram::starter());
}

#[test]
fn wrong_shape_falls_back_to_starter() {
    let store = store_with(r#"{"people": 5}"#);
    assert_eq!(store.load_or_default(), Diagram::starter());
}

#[test]
fn unreadable_store_falls_back_to_starter() {
    let store = DiagramStore::new(BrokenStore);
    assert_eq!(store.load_or_default(), Diagram::starter());
}

#[test]
fn save_then_load_round_trips() {
    let mut store = DiagramStore::new(MemoryStore::new());
    let mut d = Diagram::starter();
    d.add_person("四郎", "#f59e0b", Point::new(600.0, 400.0)).unwrap();
    store.save(&d).unwrap();
    assert_eq!(store.load(), Some(d));
    assert_eq!(store.store().writes(), 1);
}

#[test]
fn save_uses_the_configured_key() {
    let mut store = DiagramStore::with_key(MemoryStore::new(), "other");
    store.save(&Diagram::new()).unwrap();
    assert_eq!(store.store().get("other").unwrap().as_deref(), Some(r#"{"people":[],"relationships":[]}"#));
    assert!(store.store().get(STORAGE_KEY).unwrap().is_none());
}

#[test]
fn save_reports_store_failure() {
    let mut store = DiagramStore::new(BrokenStore);
    let err = store.save(&Diagram::starter()).unwrap_err();
    assert!(matches!(err, PersistError::Write(_)));
}

#[test]
fn loaded_dangling_relationships_are_dropped() {
    let raw = r#"{"people":[{"id":1,"name":"A","x":100,"y":100}],
        "relationships":[{"id":1,"from":1,"to":2,"label":"gone"}]}"#;
    let d = store_with(raw).load().unwrap();
    assert_eq!(d.people[0].id, PersonId(1));
    assert!(d.relationships.is_empty());
}

// =============================================================
// SaveScheduler
// =============================================================

#[test]
fn scheduler_starts_clean() {
    let mut s = SaveScheduler::default();
    assert!(s.is_clean());
    assert!(!s.poll(0.0));
}

#[test]
fn first_poll_after_change_assigns_deadline() {
    let mut s = SaveScheduler::new(500.0);
    s.mark_dirty();
    assert_eq!(s.pending(), PendingWrite::Dirty);
    assert!(!s.poll(1000.0));
    assert_eq!(s.pending(), PendingWrite::Scheduled { deadline_ms: 1500.0 });
    assert!(!s.poll(1499.0));
    assert!(s.poll(1500.0));
    assert!(s.is_clean());
}

#[test]
fn burst_of_changes_collapses_into_one_write() {
    let mut s = SaveScheduler::new(500.0);
    let mut writes = 0;
    let mut now = 0.0;
    for _ in 0..30 {
        s.mark_dirty();
        if s.poll(now) {
            writes += 1;
        }
        now += 10.0;
    }
    // 300 ms of edits: still inside the window.
    assert_eq!(writes, 0);
    while now < 1000.0 {
        if s.poll(now) {
            writes += 1;
        }
        now += 16.0;
    }
    assert_eq!(writes, 1);
}

#[test]
fn later_changes_do_not_postpone_the_deadline() {
    let mut s = SaveScheduler::new(500.0);
    s.mark_dirty();
    s.poll(0.0);
    s.mark_dirty();
    assert_eq!(s.pending(), PendingWrite::Scheduled { deadline_ms: 500.0 });
}

#[test]
fn flush_request_writes_at_next_poll() {
    let mut s = SaveScheduler::new(500.0);
    s.mark_dirty();
    s.poll(0.0);
    s.request_flush();
    assert!(s.poll(1.0));
    assert!(s.is_clean());
}

#[test]
fn flush_request_when_clean_is_ignored() {
    let mut s = SaveScheduler::new(500.0);
    s.request_flush();
    assert!(s.is_clean());
    assert!(!s.poll(0.0));
}

#[test]
fn zero_window_writes_immediately() {
    let mut s = SaveScheduler::new(0.0);
    s.mark_dirty();
    assert!(s.poll(0.0));
}

#[test]
fn take_drains_pending_state() {
    let mut s = SaveScheduler::new(500.0);
    assert!(!s.take());
    s.mark_dirty();
    assert!(s.take());
    assert!(s.is_clean());
}

#[test]
fn marking_dirty_after_a_write_schedules_a_fresh_window() {
    let mut s = SaveScheduler::new(500.0);
    s.mark_dirty();
    s.poll(0.0);
    assert!(s.poll(500.0));
    // A refused write re-marks the scheduler; the retry waits a full window.
    s.mark_dirty();
    assert!(!s.poll(600.0));
    assert_eq!(s.pending(), PendingWrite::Scheduled { deadline_ms: 1100.0 });
    assert!(s.poll(1100.0));
}
