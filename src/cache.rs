use std::collections::{HashMap, VecDeque};

/// Bounded per-feed collection of recently announced episode guids.
///
/// Each key keeps at most `capacity` values, oldest evicted first. The
/// durable posted table holds the full history; this structure only has to
/// answer "was this announced recently" without touching the database.
pub struct GuidCache {
    capacity: usize,
    entries: HashMap<String, VecDeque<String>>,
}

impl GuidCache {
    pub fn new(capacity: usize) -> Self {
        GuidCache {
            capacity,
            entries: HashMap::new(),
        }
    }

    /// Appends `value` for `key`, evicting the oldest entry once the key is
    /// over capacity. A value already present is left where it is, so
    /// replaying a mark never duplicates an entry or disturbs recency.
    pub fn add(&mut self, key: &str, value: &str) {
        let values = self.entries.entry(key.to_string()).or_default();
        if values.iter().any(|v| v == value) {
            return;
        }
        values.push_back(value.to_string());
        while values.len() > self.capacity {
            values.pop_front();
        }
    }

    /// Ensures `key` is tracked without recording any values.
    pub fn track(&mut self, key: &str) {
        self.entries.entry(key.to_string()).or_default();
    }

    /// Values for `key`, oldest first. Unknown keys yield an empty list.
    pub fn get(&self, key: &str) -> Vec<String> {
        self.entries
            .get(key)
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has(&self, key: &str, value: &str) -> bool {
        self.entries
            .get(key)
            .map(|values| values.iter().any(|v| v == value))
            .unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get_keeps_insertion_order() {
        let mut cache = GuidCache::new(5);
        cache.add("feed", "a");
        cache.add("feed", "b");
        cache.add("feed", "c");
        assert_eq!(cache.get("feed"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_evicts_oldest_beyond_capacity() {
        let mut cache = GuidCache::new(5);
        for guid in ["g1", "g2", "g3", "g4", "g5", "g6"] {
            cache.add("feed", guid);
        }
        assert_eq!(cache.get("feed"), vec!["g2", "g3", "g4", "g5", "g6"]);
        assert!(!cache.has("feed", "g1"));
        assert!(cache.has("feed", "g6"));
    }

    #[test]
    fn test_duplicate_add_is_a_noop() {
        let mut cache = GuidCache::new(3);
        cache.add("feed", "a");
        cache.add("feed", "b");
        cache.add("feed", "a");
        assert_eq!(cache.get("feed"), vec!["a", "b"]);
    }

    #[test]
    fn test_capacity_applies_per_key() {
        let mut cache = GuidCache::new(2);
        cache.add("one", "a");
        cache.add("one", "b");
        cache.add("one", "c");
        cache.add("two", "x");
        assert_eq!(cache.get("one"), vec!["b", "c"]);
        assert_eq!(cache.get("two"), vec!["x"]);
    }

    #[test]
    fn test_same_guid_under_different_keys() {
        let mut cache = GuidCache::new(5);
        cache.add("feed-a", "g1");
        assert!(cache.has("feed-a", "g1"));
        assert!(!cache.has("feed-b", "g1"));
    }

    #[test]
    fn test_track_materializes_empty_key() {
        let mut cache = GuidCache::new(5);
        cache.track("feed");
        assert_eq!(cache.count(), 1);
        assert!(cache.get("feed").is_empty());
        assert!(!cache.has("feed", "g1"));
    }

    #[test]
    fn test_unknown_key_is_empty() {
        let cache = GuidCache::new(5);
        assert!(cache.get("nope").is_empty());
        assert_eq!(cache.count(), 0);
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn test_clear_drops_all_keys() {
        let mut cache = GuidCache::new(5);
        cache.add("one", "a");
        cache.add("two", "b");
        cache.clear();
        assert_eq!(cache.count(), 0);
        assert!(!cache.has("one", "a"));
    }
}
