//! In-memory HTTP response cache.
//!
//! # Responsibilities
//! - Store complete raw responses keyed by request path
//! - Admit only responses whose status line starts with `HTTP/1.1 200`
//! - Provide a read-only snapshot for the stats reporter
//!
//! # Design Decisions
//! - Entries are verbatim byte buffers, never re-parsed or re-framed
//! - No expiration and no size bound: entries live until `clear()`
//! - A single mutex over the map; the lock is never held across I/O

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

/// Admission prefix. This is a blunt sniff on the raw buffer, not a parsed
/// status code: any response whose first bytes match is considered cacheable.
const CACHEABLE_PREFIX: &[u8] = b"HTTP/1.1 200";

/// Thread-safe path -> response store shared by all connection handlers.
///
/// The key is `Option<String>` because a request with an unparseable request
/// line still gets a best-effort forward; its response is admitted under the
/// `None` sentinel rather than rejected.
pub struct HttpCache {
    entries: Mutex<HashMap<Option<String>, Vec<u8>>>,
}

/// Read-only view of the cache for stats reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    /// Number of cached responses.
    pub count: usize,
    /// Cached request paths (`null` for the malformed-request sentinel).
    pub paths: Vec<Option<String>>,
}

impl HttpCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the cached response for a path. Clones the stored bytes so the
    /// lock is released before the caller touches the network.
    pub fn lookup(&self, path: Option<&str>) -> Option<Vec<u8>> {
        let entries = self.entries.lock().unwrap();
        entries.get(&path.map(str::to_owned)).cloned()
    }

    /// Admit a response if it is cache-worthy.
    ///
    /// Returns true and stores iff the buffer starts with `HTTP/1.1 200` and
    /// the path is not already cached. The first admitted response for a path
    /// wins; it is never overwritten until `clear()`.
    pub fn admit(&self, path: Option<&str>, response: &[u8]) -> bool {
        if !response.starts_with(CACHEABLE_PREFIX) {
            return false;
        }

        let mut entries = self.entries.lock().unwrap();
        let key = path.map(str::to_owned);
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, response.to_vec());
        true
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Entry count and key list for reporting.
    pub fn snapshot(&self) -> CacheSnapshot {
        let entries = self.entries.lock().unwrap();
        CacheSnapshot {
            count: entries.len(),
            paths: entries.keys().cloned().collect(),
        }
    }
}

impl Default for HttpCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello";
    const NOT_FOUND_RESPONSE: &[u8] = b"HTTP/1.1 404 Not Found\r\n\r\n";

    #[test]
    fn test_admit_and_lookup() {
        let cache = HttpCache::new();
        assert!(cache.lookup(Some("/index.html")).is_none());

        assert!(cache.admit(Some("/index.html"), OK_RESPONSE));
        assert_eq!(cache.lookup(Some("/index.html")).unwrap(), OK_RESPONSE);
    }

    #[test]
    fn test_admission_filter_rejects_non_200() {
        let cache = HttpCache::new();
        assert!(!cache.admit(Some("/missing"), NOT_FOUND_RESPONSE));
        assert!(cache.lookup(Some("/missing")).is_none());
        assert_eq!(cache.snapshot().count, 0);
    }

    #[test]
    fn test_admission_is_prefix_sniff_not_parse() {
        let cache = HttpCache::new();
        // Technically malformed, but the first 12 bytes match.
        assert!(cache.admit(Some("/odd"), b"HTTP/1.1 200"));
    }

    #[test]
    fn test_first_admitted_response_wins() {
        let cache = HttpCache::new();
        assert!(cache.admit(Some("/a"), OK_RESPONSE));
        assert!(!cache.admit(Some("/a"), b"HTTP/1.1 200 OK\r\n\r\nother"));
        assert_eq!(cache.lookup(Some("/a")).unwrap(), OK_RESPONSE);
    }

    #[test]
    fn test_none_sentinel_is_a_valid_key() {
        let cache = HttpCache::new();
        assert!(cache.admit(None, OK_RESPONSE));
        assert_eq!(cache.lookup(None).unwrap(), OK_RESPONSE);

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.paths, vec![None]);
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = HttpCache::new();
        cache.admit(Some("/a"), OK_RESPONSE);
        cache.admit(Some("/b"), OK_RESPONSE);
        assert_eq!(cache.snapshot().count, 2);

        cache.clear();
        assert_eq!(cache.snapshot().count, 0);
        assert!(cache.lookup(Some("/a")).is_none());
    }

    #[test]
    fn test_keys_are_exact_match() {
        let cache = HttpCache::new();
        cache.admit(Some("/page?id=1"), OK_RESPONSE);
        assert!(cache.lookup(Some("/page")).is_none());
        assert!(cache.lookup(Some("/PAGE?id=1")).is_none());
        assert!(cache.lookup(Some("/page?id=1")).is_some());
    }
}
