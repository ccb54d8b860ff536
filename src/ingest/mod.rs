// src/ingest/mod.rs
pub mod adapters;
pub mod scheduler;
pub mod types;

use std::sync::Arc;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::types::{FetchCriteria, RawCandidate, SourceAdapter, SourceHints};
use crate::query::recency_words;
use crate::store::{InsertOutcome, NewNewsRecord, NewsStore, SourceType};
use crate::symbols::SymbolBook;

/// One-time metrics registration (so series show up with descriptions).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_candidates_total",
            "Raw candidates returned by source adapters."
        );
        describe_counter!("ingest_saved_total", "New records written to the store.");
        describe_counter!(
            "ingest_duplicate_total",
            "Candidates absorbed by link/title dedup."
        );
        describe_counter!(
            "ingest_filtered_total",
            "Candidates dropped by the relevance filter."
        );
        describe_counter!(
            "ingest_adapter_errors_total",
            "Adapter fetch/parse errors (cycle continued)."
        );
        describe_counter!(
            "retention_deleted_total",
            "Records purged by the rolling retention sweep."
        );
        describe_histogram!(
            "ingest_parse_ms",
            "Upstream response parse time in milliseconds."
        );
        describe_gauge!(
            "ingest_cycle_last_run_ts",
            "Unix ts when the poll cycle last finished."
        );
    });
}

/// Normalize a headline: decode HTML entities, strip markup, collapse
/// whitespace. Applied before dedup so differently-escaped copies of the same
/// title collide.
pub fn clean_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub fetched: usize,
    pub saved: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub adapter_errors: usize,
}

/// Runs every adapter strictly in sequence and feeds their candidates through
/// symbol matching and classification into the store. Sequential on purpose:
/// the upstreams share rate limits, and parallel adapters would burst them.
pub struct PollOrchestrator {
    adapters: Vec<Box<dyn SourceAdapter>>,
    symbols: Arc<SymbolBook>,
    store: Arc<NewsStore>,
}

impl PollOrchestrator {
    pub fn new(
        adapters: Vec<Box<dyn SourceAdapter>>,
        symbols: Arc<SymbolBook>,
        store: Arc<NewsStore>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            adapters,
            symbols,
            store,
        }
    }

    pub async fn run_cycle(&self, criteria: &FetchCriteria) -> CycleSummary {
        self.run_cycle_where(criteria, |_| true).await
    }

    /// Run the cycle for adapters whose source type passes `keep`. One
    /// adapter failing never stops the rest.
    pub async fn run_cycle_where(
        &self,
        criteria: &FetchCriteria,
        keep: impl Fn(SourceType) -> bool,
    ) -> CycleSummary {
        let mut summary = CycleSummary::default();
        for adapter in &self.adapters {
            if !keep(adapter.source_type()) {
                continue;
            }
            match adapter.fetch(criteria).await {
                Ok(candidates) => {
                    summary.fetched += candidates.len();
                    counter!("ingest_candidates_total").increment(candidates.len() as u64);
                    self.absorb(adapter.as_ref(), candidates, &mut summary);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, adapter = adapter.name(), "adapter fetch failed");
                    counter!("ingest_adapter_errors_total").increment(1);
                    summary.adapter_errors += 1;
                }
            }
        }
        gauge!("ingest_cycle_last_run_ts").set(Utc::now().timestamp().max(0) as f64);
        tracing::info!(
            target: "ingest",
            fetched = summary.fetched,
            saved = summary.saved,
            duplicates = summary.duplicates,
            filtered = summary.filtered,
            errors = summary.adapter_errors,
            "poll cycle finished"
        );
        summary
    }

    fn absorb(
        &self,
        adapter: &dyn SourceAdapter,
        candidates: Vec<RawCandidate>,
        summary: &mut CycleSummary,
    ) {
        let policy = adapter.policy();
        for cand in candidates {
            // Cheap pre-check; the store repeats it atomically on insert.
            if self.store.contains_link(&cand.link) || self.store.contains_title(&cand.title) {
                summary.duplicates += 1;
                counter!("ingest_duplicate_total").increment(1);
                continue;
            }
            match normalize_candidate(adapter.source_type(), &policy, &self.symbols, cand) {
                Some(rec) => match self.store.insert(rec) {
                    InsertOutcome::Inserted(_) => {
                        summary.saved += 1;
                        counter!("ingest_saved_total").increment(1);
                    }
                    InsertOutcome::Duplicate => {
                        summary.duplicates += 1;
                        counter!("ingest_duplicate_total").increment(1);
                    }
                },
                None => {
                    summary.filtered += 1;
                    counter!("ingest_filtered_total").increment(1);
                }
            }
        }
    }
}

/// Turn a raw candidate into a store record. `Resolved` hints pass through;
/// `NeedsLookup` candidates get symbol matching and classification here, and
/// are dropped (`None`) when the adapter's policy demands relevance and the
/// title matches neither a reference symbol nor a keyword.
pub fn normalize_candidate(
    source_type: SourceType,
    policy: &types::IngestPolicy,
    symbols: &SymbolBook,
    cand: RawCandidate,
) -> Option<NewNewsRecord> {
    if cand.title.is_empty() || cand.link.is_empty() {
        return None;
    }
    let occurred_at = cand.occurred_at.unwrap_or_else(Utc::now);

    let (symbol_code, symbol_name, feature_tag, status_label) = match cand.hints {
        SourceHints::Resolved {
            symbol_code,
            symbol_name,
            feature_tag,
            status_label,
        } => (symbol_code, symbol_name, feature_tag, status_label),
        SourceHints::NeedsLookup { origin_label } => {
            let matched = symbols.match_name(&cand.title);
            let keyword = policy.keywords.first_match(&cand.title);
            if policy.require_relevance && matched.is_none() && keyword.is_none() {
                return None;
            }
            let (name, code) = match matched {
                Some(entry) => (entry.name.clone(), entry.code.clone()),
                None => (origin_label, String::new()),
            };
            let tag = keyword.unwrap_or(policy.keywords.default_tag()).to_string();
            (code, name, tag, recency_words(occurred_at))
        }
    };

    Some(NewNewsRecord {
        source_type,
        symbol_code,
        symbol_name,
        title: cand.title,
        link: cand.link,
        occurred_at,
        feature_tag,
        status_label,
    })
}
