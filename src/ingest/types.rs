// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::classify::KeywordSet;
use crate::store::SourceType;

/// Per-cycle fetch parameters. `search_term` overrides the keyword-search
/// adapter's built-in rotation with a single ad-hoc query; other adapters
/// ignore it. The value `"1"` is the match-all sentinel passed through from
/// list queries and is treated as "no override".
#[derive(Debug, Clone, Default)]
pub struct FetchCriteria {
    pub search_term: Option<String>,
}

impl FetchCriteria {
    pub fn with_search(term: &str) -> Self {
        let t = term.trim();
        if t.is_empty() || t == "1" {
            Self::default()
        } else {
            Self {
                search_term: Some(t.to_string()),
            }
        }
    }
}

/// What an adapter already knows about a candidate. Sources that resolve
/// symbol and tag themselves (disclosure, broker feed) pass `Resolved`;
/// sources that only have a headline leave the lookup to the pipeline.
#[derive(Debug, Clone)]
pub enum SourceHints {
    Resolved {
        symbol_code: String,
        symbol_name: String,
        feature_tag: String,
        status_label: String,
    },
    NeedsLookup {
        /// Fallback display name when no reference symbol matches the title
        /// (feed name, upstream brand label).
        origin_label: String,
    },
}

/// One pre-normalization item as fetched from an upstream.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub title: String,
    pub link: String,
    /// Upstream publish time when the source provides one; `None` means
    /// "became known at ingestion time".
    pub occurred_at: Option<DateTime<Utc>>,
    pub hints: SourceHints,
}

/// How the pipeline treats an adapter's `NeedsLookup` candidates.
#[derive(Clone, Copy)]
pub struct IngestPolicy {
    /// Keyword family used for classification (and for the relevance check).
    pub keywords: &'static KeywordSet,
    /// Drop candidates that match neither a reference symbol nor a keyword.
    pub require_relevance: bool,
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, criteria: &FetchCriteria) -> Result<Vec<RawCandidate>>;
    fn source_type(&self) -> SourceType;
    fn name(&self) -> &'static str;
    fn policy(&self) -> IngestPolicy;
}
