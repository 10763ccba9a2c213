//! Cross-invocation lock exclusion.

use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;

use trafmon::core::lock::CycleLock;

#[test]
fn test_racing_acquires_have_one_winner() {
    let dir = TempDir::new().unwrap();
    let path = Arc::new(dir.path().join("counters.json.lock"));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let path = path.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                CycleLock::acquire(&path).ok()
            })
        })
        .collect();

    // Keep winners alive until every thread has attempted, so the single
    // lockfile cannot be released and re-taken mid-race.
    let results: Vec<Option<CycleLock>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
}

#[test]
fn test_lock_is_per_store_path() {
    let dir = TempDir::new().unwrap();
    let first = CycleLock::path_for_store(&dir.path().join("a.json"));
    let second = CycleLock::path_for_store(&dir.path().join("b.json"));

    // Independent store paths never contend: that is how one store per
    // Nagios host avoids a shared lock.
    let _a = CycleLock::acquire(&first).unwrap();
    let b = CycleLock::acquire(&second);
    assert!(b.is_ok());
}
