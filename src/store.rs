// src/store.rs
//! Unified news store: every source adapter writes into the same record shape,
//! duplicates (by link or by exact title) are absorbed silently, and a rolling
//! retention sweep keeps the set bounded to a few days.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which of the four upstreams produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Disclosure,
    KeywordSearch,
    Syndicated,
    AuthenticatedFeed,
}

impl SourceType {
    /// Wire label, matching the upstream the partition came from.
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::Disclosure => "DART",
            SourceType::KeywordSearch => "NAVER",
            SourceType::Syndicated => "RSS",
            SourceType::AuthenticatedFeed => "KIS",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One normalized news item. Append-only: never mutated after insertion,
/// destroyed only by the retention sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: u64,
    pub source_type: SourceType,
    pub symbol_code: String,
    pub symbol_name: String,
    pub title: String,
    pub link: String,
    pub occurred_at: DateTime<Utc>,
    pub feature_tag: String,
    pub status_label: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewNewsRecord {
    pub source_type: SourceType,
    pub symbol_code: String,
    pub symbol_name: String,
    pub title: String,
    pub link: String,
    pub occurred_at: DateTime<Utc>,
    pub feature_tag: String,
    pub status_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(u64),
    /// Link or title already present. Not an error: re-polling the same
    /// upstream every cycle is expected to hit this constantly.
    Duplicate,
}

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    records: Vec<NewsRecord>,
    links: HashSet<String>,
    titles: HashSet<String>,
}

/// In-memory dedup/upsert store.
///
/// All mutation happens under one mutex, so the existence-check-then-insert in
/// [`NewsStore::insert`] is atomic — that lock is the hard uniqueness
/// backstop. The standalone `contains_*` probes exist only so callers can skip
/// work early; passing them does not guarantee a later insert will land.
pub struct NewsStore {
    inner: Mutex<StoreInner>,
}

impl NewsStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// Insert unless the link or the exact title is already present
    /// (globally, across all source types — cross-source title collisions are
    /// genuine duplicates).
    pub fn insert(&self, rec: NewNewsRecord) -> InsertOutcome {
        let mut inner = self.inner.lock().expect("news store mutex poisoned");
        if inner.links.contains(&rec.link) || inner.titles.contains(&rec.title) {
            return InsertOutcome::Duplicate;
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.links.insert(rec.link.clone());
        inner.titles.insert(rec.title.clone());
        inner.records.push(NewsRecord {
            id,
            source_type: rec.source_type,
            symbol_code: rec.symbol_code,
            symbol_name: rec.symbol_name,
            title: rec.title,
            link: rec.link,
            occurred_at: rec.occurred_at,
            feature_tag: rec.feature_tag,
            status_label: rec.status_label,
            created_at: Utc::now(),
        });
        InsertOutcome::Inserted(id)
    }

    pub fn contains_link(&self, link: &str) -> bool {
        self.inner
            .lock()
            .expect("news store mutex poisoned")
            .links
            .contains(link)
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.inner
            .lock()
            .expect("news store mutex poisoned")
            .titles
            .contains(title)
    }

    /// Retention sweep: purge records with `occurred_at` strictly older than
    /// `cutoff`, across every source type in one pass. Returns the number of
    /// records removed.
    pub fn delete_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut inner = self.inner.lock().expect("news store mutex poisoned");
        let before = inner.records.len();
        inner.records.retain(|r| r.occurred_at >= cutoff);
        let removed = before - inner.records.len();
        if removed > 0 {
            inner.links = inner.records.iter().map(|r| r.link.clone()).collect();
            inner.titles = inner.records.iter().map(|r| r.title.clone()).collect();
        }
        removed
    }

    /// Snapshot of one source-type partition, sorted by `occurred_at`
    /// descending; equal timestamps keep insertion order (id ascending).
    pub fn by_source(&self, source_type: SourceType) -> Vec<NewsRecord> {
        let inner = self.inner.lock().expect("news store mutex poisoned");
        let mut out: Vec<NewsRecord> = inner
            .records
            .iter()
            .filter(|r| r.source_type == source_type)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(a.id.cmp(&b.id)));
        out
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("news store mutex poisoned")
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NewsStore {
    fn default() -> Self {
        Self::new()
    }
}
