// src/ingest/adapters/authenticated.rs
//! Authenticated-feed adapter: real-time broker news titles behind the bearer
//! credential. No credential (cold start or refresh cooldown) means the cycle
//! is skipped silently — the next cycle will try again, and nothing upstream
//! of this adapter should notice.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use metrics::histogram;
use serde::Deserialize;

use crate::classify::MARKET_MOVERS;
use crate::ingest::clean_title;
use crate::ingest::types::{FetchCriteria, IngestPolicy, RawCandidate, SourceAdapter, SourceHints};
use crate::store::SourceType;
use crate::token::TokenManager;

const NEWS_PATH: &str = "/uapi/domestic-stock/v1/quotations/news-title";
const TRANSACTION_ID: &str = "FHKST01011800";
const GOLDEN_MARKER: &str = "특징주";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    rt_cd: String,
    #[serde(default)]
    output: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    hts_tltl: String,
    #[serde(default)]
    hts_pbnt_titl_cntt: String,
    #[serde(default)]
    rltm_iscd: String,
    #[serde(default)]
    dorg: String,
}

impl NewsItem {
    /// The upstream spreads the headline over two possible fields; take the
    /// first non-empty one, in a fixed order.
    fn title(&self) -> Option<&str> {
        [&self.hts_tltl, &self.hts_pbnt_titl_cntt]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

/// The feed has no stable links, so synthesize a search URL over
/// `{provider} {title}` — provider omitted when it is blank or a generic
/// label rather than a real source name.
pub fn search_link(title: &str, provider: &str) -> String {
    let provider = provider.trim();
    let query = if provider.is_empty() || provider == "KIS" || provider == "정보" {
        title.to_string()
    } else {
        format!("{provider} {title}")
    };
    match reqwest::Url::parse_with_params("https://www.google.com/search", &[("q", query.as_str())])
    {
        Ok(url) => url.to_string(),
        Err(_) => "https://www.google.com/search".to_string(),
    }
}

/// Parse the news-title payload. A non-zero `rt_cd` yields an empty batch,
/// not an error (the upstream uses it for "nothing for you right now" too).
pub fn parse_news_payload(body: &str) -> Result<Vec<RawCandidate>> {
    let t0 = std::time::Instant::now();
    let resp: NewsResponse = serde_json::from_str(body).context("parsing broker news json")?;
    if resp.rt_cd != "0" {
        return Ok(Vec::new());
    }

    let mut out = Vec::with_capacity(resp.output.len());
    for item in &resp.output {
        let Some(raw_title) = item.title() else {
            continue;
        };
        let title = clean_title(raw_title);
        if title.is_empty() {
            continue;
        }
        let feature_tag = if title.contains(GOLDEN_MARKER) {
            "GOLDEN"
        } else {
            "NORMAL"
        };
        out.push(RawCandidate {
            link: search_link(&title, &item.dorg),
            occurred_at: None,
            hints: SourceHints::Resolved {
                symbol_code: item.rltm_iscd.trim().to_string(),
                symbol_name: item.dorg.trim().to_string(),
                feature_tag: feature_tag.to_string(),
                status_label: "ACTIVE".to_string(),
            },
            title,
        });
    }

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(out)
}

pub struct AuthenticatedFeedAdapter {
    client: reqwest::Client,
    base_url: String,
    app_key: String,
    app_secret: String,
    tokens: Arc<TokenManager>,
}

impl AuthenticatedFeedAdapter {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        app_key: &str,
        app_secret: &str,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_key: app_key.to_string(),
            app_secret: app_secret.to_string(),
            tokens,
        }
    }
}

#[async_trait]
impl SourceAdapter for AuthenticatedFeedAdapter {
    async fn fetch(&self, _criteria: &FetchCriteria) -> Result<Vec<RawCandidate>> {
        let Some(token) = self.tokens.obtain().await else {
            tracing::debug!("no credential available, skipping broker feed this cycle");
            return Ok(Vec::new());
        };

        let now = Local::now();
        let body = self
            .client
            .get(format!("{}{NEWS_PATH}", self.base_url))
            .query(&[
                ("FID_NEWS_OFER_ENTP_CODE", ""),
                ("FID_COND_MRKT_CLS_CODE", ""),
                ("FID_INPUT_ISCD", ""),
                ("FID_TITL_CNTT", ""),
                ("FID_INPUT_DATE_1", &now.format("%Y%m%d").to_string()),
                ("FID_INPUT_HOUR_1", &now.format("%H%M%S").to_string()),
                ("FID_RANK_SORT_CLS_CODE", "0"),
                ("FID_INPUT_SRNO", ""),
            ])
            .header("authorization", format!("Bearer {token}"))
            .header("appkey", &self.app_key)
            .header("appsecret", &self.app_secret)
            .header("tr_id", TRANSACTION_ID)
            .header("custtype", "P")
            .send()
            .await
            .context("broker news request")?
            .text()
            .await
            .context("broker news body")?;

        parse_news_payload(&body)
    }

    fn source_type(&self) -> SourceType {
        SourceType::AuthenticatedFeed
    }

    fn name(&self) -> &'static str {
        "authenticated-feed"
    }

    fn policy(&self) -> IngestPolicy {
        IngestPolicy {
            keywords: &MARKET_MOVERS,
            require_relevance: false,
        }
    }
}
