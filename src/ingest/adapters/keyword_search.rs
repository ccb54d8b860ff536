// src/ingest/adapters/keyword_search.rs
//! Keyword-search adapter: one news-search call per market-mover keyword (or
//! a single ad-hoc term), paced with a small delay. A 429 from the upstream
//! suspends the whole rotation for a few seconds and then resumes with the
//! remaining keywords — the quota is shared across keywords, so backing off
//! once is worth more than finishing fast.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::histogram;
use reqwest::StatusCode;
use serde::Deserialize;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

use crate::classify::MARKET_MOVERS;
use crate::ingest::clean_title;
use crate::ingest::types::{FetchCriteria, IngestPolicy, RawCandidate, SourceAdapter, SourceHints};
use crate::store::SourceType;

const SEARCH_URL: &str = "https://openapi.naver.com/v1/search/news.json";
const RESULT_COUNT: &str = "50";
const ORIGIN_LABEL: &str = "네이버뉴스";
/// Steady-state pace between keyword calls.
const CALL_DELAY: Duration = Duration::from_millis(300);
/// Reactive cooldown after a rate-limit response.
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default, rename = "pubDate")]
    pub_date: String,
}

/// Upstream publish dates come in RFC-1123 form, which the RFC-2822 parser
/// accepts; converted to UTC for storage.
pub fn parse_rfc1123(ts: &str) -> Option<DateTime<Utc>> {
    let parsed = OffsetDateTime::parse(ts, &Rfc2822).ok()?;
    DateTime::from_timestamp(parsed.unix_timestamp(), 0)
}

/// Parse one search response into candidates. Items with no link or an
/// unparseable publish date are skipped; titles are tag-stripped and
/// entity-decoded before they reach dedup.
pub fn parse_search_response(body: &str) -> Result<Vec<RawCandidate>> {
    let t0 = std::time::Instant::now();
    let resp: SearchResponse = serde_json::from_str(body).context("parsing news search json")?;

    let mut out = Vec::with_capacity(resp.items.len());
    for item in resp.items {
        let title = clean_title(&item.title);
        if title.is_empty() || item.link.is_empty() {
            continue;
        }
        let Some(occurred_at) = parse_rfc1123(&item.pub_date) else {
            continue;
        };
        out.push(RawCandidate {
            title,
            link: item.link,
            occurred_at: Some(occurred_at),
            hints: SourceHints::NeedsLookup {
                origin_label: ORIGIN_LABEL.to_string(),
            },
        });
    }

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(out)
}

pub struct KeywordSearchAdapter {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl KeywordSearchAdapter {
    pub fn new(client: reqwest::Client, client_id: &str, client_secret: &str) -> Self {
        Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    async fn search(&self, word: &str) -> Result<reqwest::Response> {
        self.client
            .get(SEARCH_URL)
            .query(&[("query", word), ("display", RESULT_COUNT), ("sort", "date")])
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .send()
            .await
            .context("news search request")
    }
}

#[async_trait]
impl SourceAdapter for KeywordSearchAdapter {
    async fn fetch(&self, criteria: &FetchCriteria) -> Result<Vec<RawCandidate>> {
        let targets: Vec<String> = match &criteria.search_term {
            Some(term) => vec![term.clone()],
            None => MARKET_MOVERS.words().to_vec(),
        };

        let mut out = Vec::new();
        for (i, word) in targets.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(CALL_DELAY).await;
            }
            let resp = match self.search(word).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = ?e, keyword = %word, "search call failed, next keyword");
                    continue;
                }
            };
            if resp.status() == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!(keyword = %word, "search rate-limited, cooling down");
                tokio::time::sleep(RATE_LIMIT_COOLDOWN).await;
                continue;
            }
            if !resp.status().is_success() {
                tracing::warn!(status = %resp.status(), keyword = %word, "search returned non-success");
                continue;
            }
            match resp.text().await {
                Ok(body) => match parse_search_response(&body) {
                    Ok(candidates) => out.extend(candidates),
                    Err(e) => tracing::warn!(error = ?e, keyword = %word, "search response unparseable"),
                },
                Err(e) => tracing::warn!(error = ?e, keyword = %word, "search body read failed"),
            }
        }
        Ok(out)
    }

    fn source_type(&self) -> SourceType {
        SourceType::KeywordSearch
    }

    fn name(&self) -> &'static str {
        "keyword-search"
    }

    fn policy(&self) -> IngestPolicy {
        IngestPolicy {
            keywords: &MARKET_MOVERS,
            require_relevance: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc1123_dates_parse_and_bad_ones_do_not() {
        let ts = parse_rfc1123("Fri, 28 Aug 2026 09:31:00 +0900").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-08-28T00:31:00+00:00");
        assert!(parse_rfc1123("2026-08-28").is_none());
    }

    #[test]
    fn response_items_are_cleaned_and_dated() {
        let body = r#"{
            "items": [
                {"title": "<b>ABC기업</b> 대규모 &quot;수주&quot;",
                 "link": "https://news.example/1",
                 "pubDate": "Fri, 28 Aug 2026 09:31:00 +0900"},
                {"title": "날짜 없는 기사", "link": "https://news.example/2", "pubDate": "garbage"}
            ]
        }"#;
        let out = parse_search_response(body).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "ABC기업 대규모 \"수주\"");
        assert!(out[0].occurred_at.is_some());
    }
}
