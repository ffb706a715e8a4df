use super::storage::KeyValueStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::warn;

pub const HISTORY_KEY: &str = "mdl_history";
pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
}

/// Most-recent-first list of URLs, unique by URL and capped in length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentList {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl RecentList {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a list from stored entries, keeping the first occurrence of each
    /// URL and dropping anything past capacity.
    pub fn from_entries(entries: Vec<HistoryEntry>, capacity: usize) -> Self {
        let mut list = Self::new(capacity);
        for entry in entries {
            if list.entries.len() == capacity {
                break;
            }
            if !list.contains(&entry.url) {
                list.entries.push_back(entry);
            }
        }
        list
    }

    /// Moves `url` to the front with a fresh timestamp, evicting the oldest
    /// entry when over capacity.
    pub fn touch(&mut self, url: &str, time: i64) {
        self.remove(url);
        self.entries.push_front(HistoryEntry {
            url: url.to_string(),
            time,
        });
        self.entries.truncate(self.capacity);
    }

    pub fn remove(&mut self, url: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.url != url);
        self.entries.len() != before
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|entry| entry.url == url)
    }

    /// Entries whose URL contains `query`, ignoring case. An empty query
    /// matches everything.
    pub fn matching(&self, query: &str) -> Vec<HistoryEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| query.is_empty() || entry.url.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Submission history persisted under [`HISTORY_KEY`].
pub struct HistoryStore<S> {
    store: S,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reads the stored list. Unreadable or malformed data is an empty history.
    pub fn load(&self) -> RecentList {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return RecentList::new(HISTORY_LIMIT),
            Err(e) => {
                warn!("Failed to read history: {}", e);
                return RecentList::new(HISTORY_LIMIT);
            }
        };

        match serde_json::from_str::<Option<Vec<HistoryEntry>>>(&raw) {
            Ok(entries) => RecentList::from_entries(entries.unwrap_or_default(), HISTORY_LIMIT),
            Err(e) => {
                warn!("Ignoring malformed history: {}", e);
                RecentList::new(HISTORY_LIMIT)
            }
        }
    }

    fn save(&mut self, list: &RecentList) -> Result<()> {
        let entries: Vec<&HistoryEntry> = list.iter().collect();
        let raw = serde_json::to_string(&entries)?;
        self.store.set(HISTORY_KEY, &raw)
    }

    pub fn add(&mut self, url: &str) -> Result<()> {
        self.add_at(url, crate::utils::now_millis())
    }

    pub fn add_at(&mut self, url: &str, time: i64) -> Result<()> {
        let mut list = self.load();
        list.touch(url, time);
        self.save(&list)
    }

    pub fn remove(&mut self, url: &str) -> Result<bool> {
        let mut list = self.load();
        let removed = list.remove(url);
        self.save(&list)?;
        Ok(removed)
    }

    pub fn filter(&self, query: &str) -> Vec<HistoryEntry> {
        self.load().matching(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::{FileStore, MemoryStore};

    fn urls(list: &RecentList) -> Vec<&str> {
        list.iter().map(|entry| entry.url.as_str()).collect()
    }

    #[test]
    fn test_touch_bumps_duplicate() {
        let mut list = RecentList::new(HISTORY_LIMIT);
        list.touch("https://a", 1);
        list.touch("https://b", 2);
        list.touch("https://a", 3);

        assert_eq!(urls(&list), vec!["https://a", "https://b"]);
        assert_eq!(list.iter().next().unwrap().time, 3);
    }

    #[test]
    fn test_touch_evicts_oldest() {
        let mut list = RecentList::new(HISTORY_LIMIT);
        for i in 0..=HISTORY_LIMIT {
            list.touch(&format!("https://site/{}", i), i as i64);
        }

        assert_eq!(list.len(), HISTORY_LIMIT);
        assert!(!list.contains("https://site/0"));
        assert_eq!(urls(&list)[0], "https://site/20");
        assert_eq!(urls(&list)[HISTORY_LIMIT - 1], "https://site/1");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let mut list = RecentList::new(HISTORY_LIMIT);
        list.touch("https://www.Instagram.com/p/1", 1);
        list.touch("https://tiktok.com/@x/video/2", 2);

        assert_eq!(list.matching("INSTAGRAM").len(), 1);
        assert_eq!(list.matching("").len(), 2);
        assert!(list.matching("youtube").is_empty());
    }

    #[test]
    fn test_from_entries_dedups_and_caps() {
        let entries = vec![
            HistoryEntry {
                url: "a".into(),
                time: 3,
            },
            HistoryEntry {
                url: "a".into(),
                time: 2,
            },
            HistoryEntry {
                url: "b".into(),
                time: 1,
            },
        ];
        let list = RecentList::from_entries(entries, 1);
        assert_eq!(urls(&list), vec!["a"]);
        assert_eq!(list.iter().next().unwrap().time, 3);
    }

    #[test]
    fn test_store_add_twice_keeps_one_entry() {
        let mut history = HistoryStore::new(MemoryStore::default());
        history.add_at("https://example.com/post/1", 100).unwrap();
        history.add_at("https://example.com/post/2", 200).unwrap();
        history.add_at("https://example.com/post/1", 300).unwrap();

        let list = history.load();
        assert_eq!(list.len(), 2);
        let first = list.iter().next().unwrap();
        assert_eq!(first.url, "https://example.com/post/1");
        assert_eq!(first.time, 300);
    }

    #[test]
    fn test_store_twenty_first_evicts_oldest() {
        let mut history = HistoryStore::new(MemoryStore::default());
        for i in 0..21 {
            history.add_at(&format!("https://example.com/{}", i), i).unwrap();
        }

        let list = history.load();
        assert_eq!(list.len(), 20);
        assert!(!list.contains("https://example.com/0"));
        assert!(list.contains("https://example.com/20"));
    }

    #[test]
    fn test_store_remove() {
        let mut history = HistoryStore::new(MemoryStore::default());
        history.add_at("https://a", 1).unwrap();
        history.add_at("https://b", 2).unwrap();

        assert!(history.remove("https://a").unwrap());
        assert!(!history.remove("https://a").unwrap());
        assert_eq!(urls(&history.load()), vec!["https://b"]);
    }

    #[test]
    fn test_malformed_storage_is_empty_history() {
        for raw in ["not json", "{\"url\": 1}", "[{\"nope\": true}]", "null"] {
            let mut store = MemoryStore::default();
            store.set(HISTORY_KEY, raw).unwrap();
            let mut history = HistoryStore::new(store);

            assert!(history.load().is_empty(), "raw {:?}", raw);

            history.add_at("https://a", 1).unwrap();
            assert_eq!(history.load().len(), 1);
        }
    }

    #[test]
    fn test_store_format_is_json_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut history = HistoryStore::new(FileStore::new(&path));
        history.add_at("https://a", 42).unwrap();

        let raw = FileStore::new(&path).get(HISTORY_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"[{"url":"https://a","time":42}]"#);
        assert_eq!(history.filter("A").len(), 1);
    }
}
