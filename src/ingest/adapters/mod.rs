// src/ingest/adapters/mod.rs
pub mod authenticated;
pub mod disclosure;
pub mod keyword_search;
pub mod syndicated;

pub use authenticated::AuthenticatedFeedAdapter;
pub use disclosure::DisclosureAdapter;
pub use keyword_search::KeywordSearchAdapter;
pub use syndicated::SyndicatedFeedAdapter;
