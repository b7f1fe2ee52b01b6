// src/services/cache.rs
use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use tokio::sync::Mutex;

/// Time-to-live cache in front of the fetch layer: results keyed by the
/// call arguments, served until their expiry timestamp passes.
///
/// Consulted before and updated after each fetch; it holds no reference to
/// any presentation concern, so any caller can wrap a fetch with it.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Utc::now()).await
    }

    pub async fn put(&self, key: K, value: V) {
        self.put_at(key, value, Utc::now()).await;
    }

    async fn get_at(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                debug!("Cache entry expired, evicting");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put_at(&self, key: K, value: V, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_entries_hit() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::hours(1));
        let now = Utc::now();
        cache.put_at("UNRATE".to_string(), 7, now).await;
        assert_eq!(cache.get_at(&"UNRATE".to_string(), now).await, Some(7));
        assert_eq!(
            cache
                .get_at(&"UNRATE".to_string(), now + Duration::minutes(59))
                .await,
            Some(7)
        );
    }

    #[tokio::test]
    async fn expired_entries_miss_and_are_evicted() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::hours(1));
        let now = Utc::now();
        cache.put_at("UNRATE".to_string(), 7, now).await;
        assert_eq!(
            cache
                .get_at(&"UNRATE".to_string(), now + Duration::hours(2))
                .await,
            None
        );
        // Gone for good, not just hidden.
        assert_eq!(cache.get_at(&"UNRATE".to_string(), now).await, None);
    }

    #[tokio::test]
    async fn put_replaces_and_restamps() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::hours(1));
        let now = Utc::now();
        cache.put_at("UNRATE".to_string(), 7, now).await;
        cache
            .put_at("UNRATE".to_string(), 8, now + Duration::hours(2))
            .await;
        assert_eq!(
            cache
                .get_at(&"UNRATE".to_string(), now + Duration::hours(2))
                .await,
            Some(8)
        );
    }

    #[tokio::test]
    async fn missing_key_misses() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::hours(1));
        assert_eq!(cache.get(&"CPIAUCSL".to_string()).await, None);
    }
}
