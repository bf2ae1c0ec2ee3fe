//! End-to-end flow over the facade: configuration to factory to a locked
//! collection cycle with history and last-update bookkeeping.

use gridlock::application::{HISTORY_DEPTH, LastUpdateTracker, ReadingHistory};
use gridlock::infrastructure::{AppConfig, BackendFactory, CoordinationHandles};
use gridlock::{LockManager, StatusManager};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;

fn local_handles(dir: &TempDir) -> CoordinationHandles {
    let mut config = AppConfig::default();
    config.coordination.local.cache_dir = dir.path().to_string_lossy().into_owned();
    BackendFactory::new().build(&config).unwrap()
}

#[test]
fn collection_cycle_updates_history_under_the_lock() {
    let dir = TempDir::new().unwrap();
    let handles = local_handles(&dir);

    let history = ReadingHistory::new(handles.cache.clone(), &handles.instance_id);
    let tracker = LastUpdateTracker::new(handles.cache.clone(), &handles.instance_id);

    assert_eq!(history.load().unwrap(), vec![json!(0); HISTORY_DEPTH]);

    // One collection cycle: flag up, read under the lock, record, flag down.
    handles.status.set_status("FCRunning", None).unwrap();
    let lease = handles
        .lock_manager
        .acquire("inverter_read", Some(Duration::from_secs(5)))
        .unwrap();

    let reading = json!({"power": 2400, "battery": {"soc": 87}});
    let stack = history.push(reading.clone()).unwrap();
    let (_, elapsed) = tracker.record().unwrap();

    lease.release().unwrap();
    handles.status.clear_status("FCRunning").unwrap();

    assert_eq!(stack[HISTORY_DEPTH - 1], reading);
    assert!(elapsed.is_none());
    assert!(!handles.status.is_status_set("FCRunning").unwrap());

    // The next cycle sees the persisted state.
    let second = json!({"power": 2300, "battery": {"soc": 86}});
    let missing = history.check_consistency(&reading, &second);
    assert!(missing.is_empty());

    history.push(second).unwrap();
    let reloaded = history.load().unwrap();
    assert_eq!(reloaded[HISTORY_DEPTH - 2], reading);
}

#[test]
fn partial_second_reading_is_reported_but_not_fatal() {
    let dir = TempDir::new().unwrap();
    let handles = local_handles(&dir);
    let history = ReadingHistory::new(handles.cache.clone(), &handles.instance_id);

    let full = json!({"power": 2400, "battery": {"soc": 87, "temp": 21}});
    let partial = json!({"power": 2350, "battery": {"soc": 86}});

    history.push(full.clone()).unwrap();
    let missing = history.check_consistency(&full, &partial);
    assert_eq!(missing, vec!["battery.temp".to_string()]);

    // The cycle still records the partial reading.
    let stack = history.push(partial.clone()).unwrap();
    assert_eq!(stack[HISTORY_DEPTH - 1], partial);
}

#[test]
fn state_survives_a_process_restart() {
    let dir = TempDir::new().unwrap();

    {
        let handles = local_handles(&dir);
        ReadingHistory::new(handles.cache.clone(), "1")
            .push(json!({"power": 100}))
            .unwrap();
        handles.status.set_status("lockfile", None).unwrap();
    }

    // New handles over the same directory, as after a restart.
    let handles = local_handles(&dir);
    let history = ReadingHistory::new(handles.cache.clone(), "1");
    assert_eq!(
        history.load().unwrap()[HISTORY_DEPTH - 1],
        json!({"power": 100})
    );

    // Startup recovery clears the stale flags the dead process left.
    assert!(handles.status.is_status_set("lockfile").unwrap());
    handles.status.clear_all().unwrap();
    assert!(!handles.status.is_status_set("lockfile").unwrap());
}
