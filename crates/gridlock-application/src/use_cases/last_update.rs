//! Last-update tracker
//!
//! Persists the timestamp of the most recent successful device read under
//! `lastUpdate_<instance>` and reports how long ago the previous one was.
//! Monitoring consumers use the elapsed time to flag stalled collection
//! loops.

use chrono::{DateTime, Utc};
use gridlock_domain::error::Result;
use gridlock_domain::ports::cache::SharedCache;

/// Tracks the last successful update for one device instance.
#[derive(Debug, Clone)]
pub struct LastUpdateTracker {
    cache: SharedCache,
    key: String,
}

impl LastUpdateTracker {
    /// Tracker for device `instance_id`.
    pub fn new(cache: SharedCache, instance_id: &str) -> Self {
        Self {
            cache,
            key: format!("lastUpdate_{instance_id}"),
        }
    }

    /// The cache key this tracker lives under.
    pub fn cache_key(&self) -> &str {
        &self.key
    }

    /// Record an update now.
    ///
    /// Returns the recorded timestamp and the seconds elapsed since the
    /// previous update, `None` on the first ever record. An unparsable
    /// stored timestamp counts as no previous update.
    pub fn record(&self) -> Result<(DateTime<Utc>, Option<f64>)> {
        self.record_at(Utc::now())
    }

    /// [`record`](Self::record) with an explicit timestamp. Intended for
    /// tests.
    pub fn record_at(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, Option<f64>)> {
        let elapsed = self.last_update()?.map(|previous| {
            (now - previous).num_milliseconds() as f64 / 1000.0
        });

        self.cache.set(&self.key, &now.to_rfc3339(), None)?;
        tracing::debug!(key = %self.key, elapsed_secs = ?elapsed, "last update recorded");

        Ok((now, elapsed))
    }

    /// The most recently recorded update, if any.
    pub fn last_update(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(stored) = self.cache.get::<String>(&self.key)? else {
            return Ok(None);
        };

        match DateTime::parse_from_rfc3339(&stored) {
            Ok(ts) => Ok(Some(ts.with_timezone(&Utc))),
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "stored last-update timestamp does not parse, ignoring"
                );
                Ok(None)
            }
        }
    }

    /// Seconds since the last recorded update, `None` when nothing has
    /// been recorded.
    pub fn seconds_since_last(&self) -> Result<Option<f64>> {
        Ok(self.last_update()?.map(|previous| {
            (Utc::now() - previous).num_milliseconds() as f64 / 1000.0
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gridlock_domain::ports::cache::CacheRepository;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct MapRepository {
        entries: Mutex<HashMap<String, String>>,
    }

    impl CacheRepository for MapRepository {
        fn get_raw(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn set_raw(&self, key: &str, value: &str, _ttl: Option<Duration>) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn exists(&self, key: &str) -> Result<bool> {
            Ok(self.entries.lock().unwrap().contains_key(key))
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        fn clear_matching(&self, _pattern: &str) -> Result<()> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "map"
        }
    }

    fn tracker() -> LastUpdateTracker {
        LastUpdateTracker::new(SharedCache::new(Arc::new(MapRepository::default())), "1")
    }

    #[test]
    fn key_carries_the_instance_id() {
        assert_eq!(tracker().cache_key(), "lastUpdate_1");
    }

    #[test]
    fn first_record_has_no_elapsed_time() {
        let (_, elapsed) = tracker().record().unwrap();
        assert!(elapsed.is_none());
    }

    #[test]
    fn second_record_reports_elapsed_seconds() {
        let tracker = tracker();
        let first = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 30).unwrap();

        tracker.record_at(first).unwrap();
        let (_, elapsed) = tracker.record_at(second).unwrap();

        assert_eq!(elapsed, Some(30.0));
    }

    #[test]
    fn last_update_roundtrips_through_the_cache() {
        let tracker = tracker();
        let ts = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        tracker.record_at(ts).unwrap();
        assert_eq!(tracker.last_update().unwrap(), Some(ts));
    }

    #[test]
    fn unparsable_stored_timestamp_counts_as_no_previous_update() {
        let repo = Arc::new(MapRepository::default());
        repo.set_raw("lastUpdate_1", "\"yesterday-ish\"", None)
            .unwrap();
        let tracker = LastUpdateTracker::new(SharedCache::new(repo), "1");
        assert!(tracker.last_update().unwrap().is_none());
    }

    #[test]
    fn seconds_since_last_is_none_before_any_record() {
        assert!(tracker().seconds_since_last().unwrap().is_none());
    }
}
