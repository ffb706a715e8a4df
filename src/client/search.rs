use super::history::{HistoryEntry, HistoryStore};
use super::storage::KeyValueStore;
use crate::utils::truncate_chars;
use anyhow::Result;
use std::fmt;

const LABEL_CHARS: usize = 38;

/// State of the history search dropdown.
#[derive(Debug, Default)]
pub struct HistorySearch {
    open: bool,
    query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub url: String,
    pub label: String,
}

impl From<HistoryEntry> for HistoryRow {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            label: truncate_chars(&entry.url, LABEL_CHARS, "…"),
            url: entry.url,
        }
    }
}

/// What the dropdown currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownView {
    pub rows: Vec<HistoryRow>,
}

impl DropdownView {
    pub fn header(&self) -> String {
        if self.rows.is_empty() {
            "Search History".to_string()
        } else {
            format!("Recent · {}", self.rows.len())
        }
    }
}

impl fmt::Display for DropdownView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        if self.rows.is_empty() {
            return writeln!(f, "  No history yet");
        }
        for row in &self.rows {
            writeln!(f, "  🕐 {}", row.label)?;
        }
        Ok(())
    }
}

impl HistorySearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closing also clears the query.
    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
    }

    /// Typing into the search box always shows the dropdown.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.open = true;
    }

    pub fn view<S: KeyValueStore>(&self, history: &HistoryStore<S>) -> DropdownView {
        DropdownView {
            rows: history
                .filter(&self.query)
                .into_iter()
                .map(HistoryRow::from)
                .collect(),
        }
    }

    /// Picking a row closes the dropdown and hands back the URL for the input.
    pub fn select(&mut self, url: &str) -> String {
        self.close();
        url.to_string()
    }

    /// Deletes `url` from history and returns the refreshed view for the
    /// current query.
    pub fn remove<S: KeyValueStore>(
        &mut self,
        history: &mut HistoryStore<S>,
        url: &str,
    ) -> Result<DropdownView> {
        history.remove(url)?;
        Ok(self.view(history))
    }
}
