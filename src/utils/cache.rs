use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

/// Máximo de views em cache; a mais antiga sai primeiro.
pub const MAX_CACHED_PAGES: usize = 512;

#[derive(Default)]
struct Entries {
    views: HashMap<String, serde_json::Value>,
    order: VecDeque<String>,
}

/// Cache of rendered page views, keyed by path plus normalized query.
///
/// Mutations call `revalidate_path` so the next request for that path
/// renders fresh data. Holds at most `capacity` views.
pub struct PageCache {
    entries: RwLock<Entries>,
    capacity: usize,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::with_capacity(MAX_CACHED_PAGES)
    }
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn get_cached(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.read().ok()?.views.get(key).cloned()
    }

    pub fn set_cache(&self, key: String, value: serde_json::Value) {
        if let Ok(mut entries) = self.entries.write() {
            if entries.views.insert(key.clone(), value).is_some() {
                return;
            }
            entries.order.push_back(key);
            while entries.order.len() > self.capacity {
                if let Some(oldest) = entries.order.pop_front() {
                    entries.views.remove(&oldest);
                }
            }
        }
    }

    /// Drops every cached view whose path component equals `path`.
    pub fn revalidate_path(&self, path: &str) {
        if let Ok(mut entries) = self.entries.write() {
            let before = entries.views.len();
            entries.views.retain(|key, _| path_of(key) != path);
            entries.order.retain(|key| path_of(key) != path);
            log::debug!("♻️  Revalidated {} ({} views dropped)", path, before - entries.views.len());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.views.len()).unwrap_or(0)
    }
}

/// Builds the cache key for a path and its (possibly empty) query string.
pub fn page_key(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

/// Key for a gallery page: only the values that change the view.
pub fn gallery_key(page: u64, query: &str) -> String {
    page_key(
        "/",
        &format!("page={}&query={}", page, urlencoding::encode(query.trim())),
    )
}

/// Key for a transformation detail page.
pub fn detail_path(image_id: &str) -> String {
    format!("/transformations/{}", image_id)
}

fn path_of(key: &str) -> &str {
    key.split('?').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_revalidate_drops_all_queries_of_path() {
        let cache = PageCache::new();
        cache.set_cache(page_key("/", ""), json!({"page": 1}));
        cache.set_cache(page_key("/", "page=2"), json!({"page": 2}));
        cache.set_cache(page_key("/transformations/abc", ""), json!({"id": "abc"}));

        cache.revalidate_path("/");

        assert!(cache.get_cached("/").is_none());
        assert!(cache.get_cached("/?page=2").is_none());
        assert!(cache.get_cached("/transformations/abc").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_oldest_view_evicted_at_capacity() {
        let cache = PageCache::with_capacity(2);
        cache.set_cache("/a".into(), json!(1));
        cache.set_cache("/b".into(), json!(2));
        cache.set_cache("/b".into(), json!(3));
        cache.set_cache("/c".into(), json!(4));

        assert_eq!(cache.len(), 2);
        assert!(cache.get_cached("/a").is_none());
        assert_eq!(cache.get_cached("/b"), Some(json!(3)));
        assert_eq!(cache.get_cached("/c"), Some(json!(4)));

        cache.revalidate_path("/b");
        cache.set_cache("/d".into(), json!(5));
        assert_eq!(cache.len(), 2);
        assert!(cache.get_cached("/c").is_some());
    }

    #[test]
    fn test_gallery_key_normalizes_query() {
        assert_eq!(gallery_key(1, ""), "/?page=1&query=");
        assert_eq!(gallery_key(2, "  red cat "), "/?page=2&query=red%20cat");
        assert_eq!(gallery_key(1, "cat"), gallery_key(1, " cat"));
    }

    #[test]
    fn test_page_key() {
        assert_eq!(page_key("/", ""), "/");
        assert_eq!(page_key("/", "page=3&query=cat"), "/?page=3&query=cat");
    }
}
