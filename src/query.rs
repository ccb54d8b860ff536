// src/query.rs
//! Read side: retention sweep, partition filtering, free-text search, sorting
//! and pagination over the unified store. This module is the whole contract
//! exposed to whatever serves the results — an empty page is a valid answer,
//! nothing here fails hard.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Utc};
use metrics::counter;
use serde::Serialize;

use crate::classify::GOOD_NEWS;
use crate::store::{NewsRecord, NewsStore, SourceType};

/// Records older than this are purged before every read.
pub const RETENTION_DAYS: i64 = 3;

/// Search sentinel: match everything.
pub const SEARCH_ALL: &str = "1";
/// Search sentinel: restrict to good-news classified records.
pub const SEARCH_GOOD_NEWS: &str = "3";

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DASHBOARD_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub page: usize,
    pub size: usize,
    pub search: String,
    pub mode: String,
    pub pagination: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            search: String::new(),
            mode: String::new(),
            pagination: true,
        }
    }
}

/// One row as handed to the serving layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsView {
    pub id: u64,
    pub symbol_code: String,
    pub symbol_name: String,
    pub title: String,
    /// `occurred_at` formatted for display (`2026-08-28 09:31:00`).
    pub reg_date: String,
    pub server_status: String,
    pub feature_tag: String,
    pub link: String,
    pub source_type: SourceType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPage {
    pub content: Vec<NewsView>,
    pub total_elements: usize,
    /// Absent when pagination is disabled or handled client-side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
}

/// Days-old in words, computed against the local calendar date.
pub fn recency_words(occurred_at: DateTime<Utc>) -> String {
    let days = (Local::now().date_naive() - occurred_at.with_timezone(&Local).date_naive()).num_days();
    if days <= 0 {
        "오늘".to_string()
    } else {
        format!("{days}일 전")
    }
}

pub struct QueryService {
    store: Arc<NewsStore>,
    retention: Duration,
}

impl QueryService {
    pub fn new(store: Arc<NewsStore>) -> Self {
        Self {
            store,
            retention: Duration::days(RETENTION_DAYS),
        }
    }

    #[cfg(test)]
    pub fn with_retention(store: Arc<NewsStore>, retention: Duration) -> Self {
        Self { store, retention }
    }

    /// Sweep, filter, sort, paginate. See the search sentinels above; any
    /// other value is a case-insensitive substring match across title, symbol
    /// name and symbol code.
    pub fn get_list(&self, source_type: SourceType, q: &ListQuery) -> NewsPage {
        let removed = self.store.delete_older_than(Utc::now() - self.retention);
        if removed > 0 {
            counter!("retention_deleted_total").increment(removed as u64);
            tracing::info!(removed, "retention sweep");
        }

        let records = self.store.by_source(source_type);
        let views: Vec<NewsView> = records
            .iter()
            .filter(|r| matches_search(r, q.search.trim()))
            .map(to_view)
            .collect();

        if q.mode.eq_ignore_ascii_case("dashboard") {
            let total = views.len();
            return NewsPage {
                content: views.into_iter().take(DASHBOARD_LIMIT).collect(),
                total_elements: total,
                total_pages: None,
            };
        }

        paginate(views, q.page, q.size, &q.mode, q.pagination)
    }
}

fn matches_search(r: &NewsRecord, search: &str) -> bool {
    if search.is_empty() || search == SEARCH_ALL {
        return true;
    }
    if search == SEARCH_GOOD_NEWS {
        // Stored tag for search/feed records is the keyword itself; disclosure
        // records carry profit tags instead, so their titles are re-checked.
        return GOOD_NEWS.contains_tag(&r.feature_tag) || GOOD_NEWS.first_match(&r.title).is_some();
    }
    let s = search.to_lowercase();
    r.title.to_lowercase().contains(&s)
        || r.symbol_name.to_lowercase().contains(&s)
        || r.symbol_code.to_lowercase().contains(&s)
}

fn to_view(r: &NewsRecord) -> NewsView {
    let server_status = match r.source_type {
        // Venue / provenance labels are fixed at ingestion; recency labels are
        // recomputed so yesterday's "오늘" does not go stale.
        SourceType::Disclosure | SourceType::AuthenticatedFeed => r.status_label.clone(),
        SourceType::KeywordSearch | SourceType::Syndicated => recency_words(r.occurred_at),
    };
    NewsView {
        id: r.id,
        symbol_code: r.symbol_code.clone(),
        symbol_name: r.symbol_name.clone(),
        title: r.title.clone(),
        reg_date: r
            .occurred_at
            .with_timezone(&Local)
            .format(DISPLAY_FORMAT)
            .to_string(),
        server_status,
        feature_tag: r.feature_tag.clone(),
        link: r.link.clone(),
        source_type: r.source_type,
    }
}

/// Slice `[page*size, page*size+size)` with an out-of-range page yielding an
/// empty content list, never an error. `totalPages = ceil(total / size)`.
fn paginate(views: Vec<NewsView>, page: usize, size: usize, mode: &str, pagination: bool) -> NewsPage {
    let total = views.len();
    if !pagination || mode.eq_ignore_ascii_case("client") {
        return NewsPage {
            content: views,
            total_elements: total,
            total_pages: None,
        };
    }
    let size = size.max(1);
    let start = (page * size).min(total);
    let end = (start + size).min(total);
    NewsPage {
        content: views[start..end].to_vec(),
        total_elements: total,
        total_pages: Some(total.div_ceil(size)),
    }
}
