use std::time::Duration;

use actix_web::web::Bytes;
use moka::future::Cache;
use tracing::{debug, info};

/// Rendered pages keyed by route and query string.
///
/// An entry is either a whole rendered body or absent; it expires after the
/// configured TTL or when [`PageCache::clear`] is called.
#[derive(Clone)]
pub struct PageCache {
    pages: Cache<String, Bytes>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        let pages = Cache::builder().max_capacity(1_000).time_to_live(ttl).build();
        Self { pages }
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let hit = self.pages.get(key).await;
        debug!(key = %key, hit = hit.is_some(), "page cache lookup");
        hit
    }

    pub async fn insert(&self, key: String, body: Bytes) {
        self.pages.insert(key, body).await;
    }

    pub fn clear(&self) {
        self.pages.invalidate_all();
        info!("page cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hit_until_cleared() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.insert("/?page=1".into(), Bytes::from_static(b"page")).await;
        assert_eq!(cache.get("/?page=1").await, Some(Bytes::from_static(b"page")));
        assert_eq!(cache.get("/?page=2").await, None);

        cache.clear();
        assert_eq!(cache.get("/?page=1").await, None);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = PageCache::new(Duration::from_millis(50));
        cache.insert("/".into(), Bytes::from_static(b"page")).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cache.get("/").await, None);
    }
}
