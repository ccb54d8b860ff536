// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod classify;
pub mod config;
pub mod ingest;
pub mod query;
pub mod store;
pub mod symbols;
pub mod token;

// ---- Re-exports for stable public API ----
pub use crate::ingest::types::{FetchCriteria, RawCandidate, SourceAdapter, SourceHints};
pub use crate::ingest::{CycleSummary, PollOrchestrator};
pub use crate::query::{ListQuery, NewsPage, NewsView, QueryService};
pub use crate::store::{InsertOutcome, NewNewsRecord, NewsRecord, NewsStore, SourceType};
pub use crate::symbols::SymbolBook;
pub use crate::token::{TokenExchange, TokenManager};
