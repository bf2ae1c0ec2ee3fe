//! Rolling reading history
//!
//! Fixed-depth FIFO of recent device readings kept in the shared cache
//! under `regCache_<instance>`. Smoothing and validation consumers compare
//! a fresh reading against the last few cycles, so the stack always holds
//! exactly [`HISTORY_DEPTH`] entries: before any real reading arrives it
//! is padded with numeric-zero placeholders, and every push drops the
//! oldest entry.
//!
//! The consistency check reports keys that vanished between consecutive
//! readings. A partial register read would otherwise poison downstream
//! deltas silently; the check logs each missing key and hands the set back
//! to the caller, but never fails the cycle over it.

use gridlock_domain::error::Result;
use gridlock_domain::ports::cache::SharedCache;
use serde_json::{Value, json};
use std::collections::BTreeSet;

/// Number of readings retained per instance.
pub const HISTORY_DEPTH: usize = 5;

/// Rolling history of readings for one device instance.
#[derive(Debug, Clone)]
pub struct ReadingHistory {
    cache: SharedCache,
    key: String,
}

impl ReadingHistory {
    /// History for device `instance_id`.
    pub fn new(cache: SharedCache, instance_id: &str) -> Self {
        Self {
            cache,
            key: format!("regCache_{instance_id}"),
        }
    }

    /// The cache key this history lives under.
    pub fn cache_key(&self) -> &str {
        &self.key
    }

    /// Load the stored stack, or the zero-placeholder stack when nothing
    /// has been recorded yet.
    ///
    /// A stored stack of the wrong depth (an older deployment, or a
    /// corrupt payload surfaced as a miss) is discarded and replaced by
    /// placeholders rather than propagated.
    pub fn load(&self) -> Result<Vec<Value>> {
        match self.cache.get::<Vec<Value>>(&self.key)? {
            Some(stack) if stack.len() == HISTORY_DEPTH => Ok(stack),
            Some(stack) => {
                tracing::warn!(
                    key = %self.key,
                    found = stack.len(),
                    expected = HISTORY_DEPTH,
                    "stored history has wrong depth, resetting to placeholders"
                );
                Ok(Self::placeholder_stack())
            }
            None => Ok(Self::placeholder_stack()),
        }
    }

    /// Append `reading`, dropping the oldest entry, and persist the stack.
    ///
    /// Returns the updated stack; the newest reading is last.
    pub fn push(&self, reading: Value) -> Result<Vec<Value>> {
        let mut stack = self.load()?;
        stack.remove(0);
        stack.push(reading);
        self.cache.set(&self.key, &stack, None)?;
        tracing::debug!(key = %self.key, "reading history updated");
        Ok(stack)
    }

    /// Report keys present in `previous` but absent from `current`.
    ///
    /// Both readings are flattened to dotted paths before comparison so a
    /// key lost anywhere in a nested map is caught. Each missing key is
    /// logged at error level; the caller decides whether to act on the
    /// returned set.
    pub fn check_consistency(&self, previous: &Value, current: &Value) -> Vec<String> {
        let before = flatten_keys(previous);
        let after = flatten_keys(current);

        let missing: Vec<String> = before.difference(&after).cloned().collect();
        for key in &missing {
            tracing::error!(
                history = %self.key,
                missing_key = %key,
                "key present in previous reading is missing from current reading"
            );
        }
        missing
    }

    fn placeholder_stack() -> Vec<Value> {
        vec![json!(0); HISTORY_DEPTH]
    }
}

/// Flatten a JSON value into the set of dotted paths to its leaves.
///
/// Placeholder zeros and other non-object readings contribute no paths.
fn flatten_keys(value: &Value) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    if let Value::Object(map) = value {
        for (key, child) in map {
            collect_paths(key, child, &mut keys);
        }
    }
    keys
}

fn collect_paths(path: &str, value: &Value, keys: &mut BTreeSet<String>) {
    keys.insert(path.to_string());
    if let Value::Object(map) = value {
        for (key, child) in map {
            collect_paths(&format!("{path}.{key}"), child, keys);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_domain::error::Result;
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

    fn history() -> ReadingHistory {
        ReadingHistory::new(SharedCache::new(Arc::new(MapRepository::default())), "1")
    }

    #[test]
    fn empty_history_loads_as_placeholders() {
        assert_eq!(history().load().unwrap(), vec![json!(0); HISTORY_DEPTH]);
    }

    #[test]
    fn key_carries_the_instance_id() {
        assert_eq!(history().cache_key(), "regCache_1");
    }

    #[test]
    fn pushes_fill_the_stack_fifo() {
        let history = history();
        for i in 1..=5 {
            history.push(json!(i)).unwrap();
        }
        assert_eq!(
            history.load().unwrap(),
            vec![json!(1), json!(2), json!(3), json!(4), json!(5)]
        );
    }

    #[test]
    fn push_beyond_depth_drops_the_oldest() {
        let history = history();
        for i in 1..=6 {
            history.push(json!(i)).unwrap();
        }
        assert_eq!(
            history.load().unwrap(),
            vec![json!(2), json!(3), json!(4), json!(5), json!(6)]
        );
    }

    #[test]
    fn push_persists_across_instances_sharing_the_cache() {
        let cache = SharedCache::new(Arc::new(MapRepository::default()));
        ReadingHistory::new(cache.clone(), "1")
            .push(json!({"soc": 50}))
            .unwrap();
        let reloaded = ReadingHistory::new(cache, "1").load().unwrap();
        assert_eq!(reloaded[HISTORY_DEPTH - 1], json!({"soc": 50}));
    }

    #[test]
    fn wrong_depth_stack_resets_to_placeholders() {
        let repo = Arc::new(MapRepository::default());
        repo.set_raw("regCache_1", "[1,2]", None).unwrap();
        let history = ReadingHistory::new(SharedCache::new(repo), "1");
        assert_eq!(history.load().unwrap(), vec![json!(0); HISTORY_DEPTH]);
    }

    #[test]
    fn instances_do_not_share_history() {
        let cache = SharedCache::new(Arc::new(MapRepository::default()));
        let one = ReadingHistory::new(cache.clone(), "1");
        let two = ReadingHistory::new(cache, "2");
        one.push(json!(7)).unwrap();
        assert_eq!(two.load().unwrap(), vec![json!(0); HISTORY_DEPTH]);
    }

    #[test]
    fn consistency_check_reports_missing_keys() {
        let previous = json!({"power": 100, "battery": {"soc": 50, "temp": 21}});
        let current = json!({"power": 120, "battery": {"soc": 51}});
        let missing = history().check_consistency(&previous, &current);
        assert_eq!(missing, vec!["battery.temp".to_string()]);
    }

    #[test]
    fn consistency_check_passes_identical_shapes() {
        let previous = json!({"power": 100, "soc": 50});
        let current = json!({"power": 200, "soc": 49});
        assert!(history().check_consistency(&previous, &current).is_empty());
    }

    #[test]
    fn consistency_check_ignores_added_keys() {
        let previous = json!({"power": 100});
        let current = json!({"power": 100, "soc": 50});
        assert!(history().check_consistency(&previous, &current).is_empty());
    }

    #[test]
    fn placeholder_previous_reading_reports_nothing() {
        let missing = history().check_consistency(&json!(0), &json!({"power": 1}));
        assert!(missing.is_empty());
    }
}
