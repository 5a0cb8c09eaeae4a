// Process-wide TTL cache for recomputed reading tables
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed store mapping an argument to (value, expiry). Callers check it
/// before recomputing; an expired entry reads as a miss. Concurrent
/// recomputation races are tolerated: inserts are last-writer-wins, and
/// recomputation is idempotent and side-effect-free.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().unwrap().insert(key, entry);
    }

    /// Explicit invalidation, so tests do not have to wait out the TTL.
    pub fn invalidate(&self, key: &K) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_before_expiry() {
        let cache = TtlCache::new(Duration::from_secs(600));
        cache.insert(7u32, "table".to_string());
        assert_eq!(cache.get(&7), Some("table".to_string()));
        assert_eq!(cache.get(&14), None);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert(7u32, "table".to_string());
        assert_eq!(cache.get(&7), None);
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = TtlCache::new(Duration::from_secs(600));
        cache.insert(7u32, "stale".to_string());
        cache.insert(7u32, "fresh".to_string());
        assert_eq!(cache.get(&7), Some("fresh".to_string()));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = TtlCache::new(Duration::from_secs(600));
        cache.insert(7u32, "a".to_string());
        cache.insert(14u32, "b".to_string());

        cache.invalidate(&7);
        assert_eq!(cache.get(&7), None);
        assert_eq!(cache.get(&14), Some("b".to_string()));

        cache.clear();
        assert_eq!(cache.get(&14), None);
    }
}
