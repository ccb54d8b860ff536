// src/ingest/adapters/disclosure.rs
//! Disclosure adapter: pages the OpenDART daily listing, keeps the main
//! market classes, and for good-news titles probes recent filings for an
//! operating-profit figure (cached per issuer — the figure does not change
//! within a poll cycle's lifetime and the endpoint is not free to hammer).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use metrics::histogram;
use serde::Deserialize;

use crate::classify::GOOD_NEWS;
use crate::ingest::types::{FetchCriteria, IngestPolicy, RawCandidate, SourceAdapter, SourceHints};
use crate::store::SourceType;
use crate::symbols::SymbolBook;

const LIST_URL: &str = "https://opendart.fss.or.kr/api/list.json";
const FINANCE_URL: &str = "https://opendart.fss.or.kr/api/fnlttSinglAcnt.json";
const DOCUMENT_URL: &str = "https://dart.fss.or.kr/dsaf001/main.do?rcpNo=";
const OK_STATUS: &str = "000";
const PAGE_SIZE: usize = 100;
const PAGE_DELAY: Duration = Duration::from_millis(200);

/// KOSPI / KOSDAQ / KONEX; everything else (mostly unlisted issuers) is noise
/// for this pipeline.
const MARKET_CLASSES: [&str; 3] = ["Y", "K", "N"];

/// Fiscal periods probed for an operating-profit figure, most recent first.
const REPORT_CODES: [(&str, &str); 4] = [
    ("11014", "3분기"),
    ("11012", "반기"),
    ("11013", "1분기"),
    ("11011", "결산"),
];

const UNCONFIRMED: &str = "[재무미확인]";

#[derive(Debug, Deserialize)]
pub struct DisclosureListing {
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "list")]
    pub items: Vec<DisclosureItem>,
}

#[derive(Debug, Deserialize)]
pub struct DisclosureItem {
    #[serde(default)]
    pub corp_cls: String,
    #[serde(default)]
    pub corp_code: String,
    #[serde(default)]
    pub corp_name: String,
    #[serde(default)]
    pub stock_code: String,
    #[serde(default)]
    pub report_nm: String,
    #[serde(default)]
    pub rcept_no: String,
}

#[derive(Debug, Deserialize)]
struct FinanceResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    list: Vec<FinanceRow>,
}

#[derive(Debug, Deserialize)]
struct FinanceRow {
    #[serde(default)]
    thstrm_amount: String,
}

pub fn parse_listing(body: &str) -> Result<DisclosureListing> {
    serde_json::from_str(body).context("parsing disclosure listing json")
}

/// Listing venue display names.
pub fn market_name(corp_cls: &str) -> &'static str {
    match corp_cls {
        "Y" => "코스피",
        "K" => "코스닥",
        "N" => "코넥스",
        _ => "기타",
    }
}

/// Target date for the listing query: today, or yesterday before the 07:30
/// cutoff so overnight/pre-market disclosures are still swept.
pub fn begin_date(now: DateTime<Local>) -> NaiveDate {
    let cutoff = NaiveTime::from_hms_opt(7, 30, 0).expect("valid cutoff time");
    if now.time() < cutoff {
        now.date_naive().pred_opt().unwrap_or_else(|| now.date_naive())
    } else {
        now.date_naive()
    }
}

fn profit_tag(amount: i64, year: &str, period: &str) -> String {
    let sign = if amount > 0 { "[흑자]" } else { "[적자]" };
    format!("{sign} ({year} {period})")
}

pub struct DisclosureAdapter {
    client: reqwest::Client,
    api_key: String,
    symbols: Arc<SymbolBook>,
    profit_cache: Mutex<HashMap<String, String>>,
}

impl DisclosureAdapter {
    pub fn new(client: reqwest::Client, api_key: &str, symbols: Arc<SymbolBook>) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            symbols,
            profit_cache: Mutex::new(HashMap::new()),
        }
    }

    async fn fetch_page(&self, date: &str, page_no: usize) -> Result<DisclosureListing> {
        let body = self
            .client
            .get(LIST_URL)
            .query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("bgnde", date),
                ("endde", date),
                ("page_no", &page_no.to_string()),
                ("page_count", &PAGE_SIZE.to_string()),
            ])
            .send()
            .await
            .context("disclosure listing request")?
            .text()
            .await
            .context("disclosure listing body")?;
        let t0 = std::time::Instant::now();
        let listing = parse_listing(&body)?;
        histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(listing)
    }

    /// Operating-profit status for one issuer, cached for the adapter's
    /// lifetime. Tries fiscal year/period combinations newest-first and takes
    /// the first usable figure; every failure falls through to the next
    /// combination.
    async fn profit_status(&self, corp_code: &str) -> String {
        if let Some(hit) = self
            .profit_cache
            .lock()
            .expect("profit cache mutex poisoned")
            .get(corp_code)
        {
            return hit.clone();
        }

        let this_year = chrono::Datelike::year(&Local::now());
        let mut tag = UNCONFIRMED.to_string();
        'probe: for year in [this_year, this_year - 1] {
            let year = year.to_string();
            for (code, period) in REPORT_CODES {
                match self.fetch_profit_figure(corp_code, &year, code).await {
                    Ok(Some(amount)) => {
                        tag = profit_tag(amount, &year, period);
                        break 'probe;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(error = ?e, corp_code, year, code, "profit probe attempt failed");
                    }
                }
            }
        }

        self.profit_cache
            .lock()
            .expect("profit cache mutex poisoned")
            .insert(corp_code.to_string(), tag.clone());
        tag
    }

    async fn fetch_profit_figure(
        &self,
        corp_code: &str,
        year: &str,
        report_code: &str,
    ) -> Result<Option<i64>> {
        let resp: FinanceResponse = self
            .client
            .get(FINANCE_URL)
            .query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("corp_code", corp_code),
                ("bsns_year", year),
                ("reprt_code", report_code),
            ])
            .send()
            .await
            .context("finance request")?
            .json()
            .await
            .context("finance response body")?;
        if resp.status != OK_STATUS {
            return Ok(None);
        }
        Ok(resp
            .list
            .first()
            .and_then(|row| row.thstrm_amount.replace(',', "").trim().parse::<i64>().ok()))
    }

    async fn item_to_candidate(&self, item: DisclosureItem) -> Option<RawCandidate> {
        if !MARKET_CLASSES.contains(&item.corp_cls.as_str()) {
            return None;
        }
        if item.rcept_no.is_empty() || item.report_nm.is_empty() {
            return None;
        }

        let symbol_code = if item.stock_code.trim().is_empty() || item.stock_code == "null" {
            self.symbols
                .code_for(&item.corp_name)
                .unwrap_or_default()
                .to_string()
        } else {
            item.stock_code.trim().to_string()
        };

        let feature_tag = if GOOD_NEWS.first_match(&item.report_nm).is_some() {
            self.profit_status(&item.corp_code).await
        } else {
            UNCONFIRMED.to_string()
        };

        Some(RawCandidate {
            title: item.report_nm,
            link: format!("{DOCUMENT_URL}{}", item.rcept_no),
            occurred_at: None,
            hints: SourceHints::Resolved {
                symbol_code,
                symbol_name: item.corp_name,
                feature_tag,
                status_label: market_name(&item.corp_cls).to_string(),
            },
        })
    }
}

#[async_trait]
impl SourceAdapter for DisclosureAdapter {
    async fn fetch(&self, _criteria: &FetchCriteria) -> Result<Vec<RawCandidate>> {
        let date = begin_date(Local::now()).format("%Y%m%d").to_string();
        let mut out = Vec::new();
        let mut page_no = 1usize;
        loop {
            let listing = self.fetch_page(&date, page_no).await?;
            if listing.status != OK_STATUS || listing.items.is_empty() {
                break;
            }
            let page_len = listing.items.len();
            for item in listing.items {
                if let Some(cand) = self.item_to_candidate(item).await {
                    out.push(cand);
                }
            }
            if page_len < PAGE_SIZE {
                break;
            }
            page_no += 1;
            // Be polite between listing pages.
            tokio::time::sleep(PAGE_DELAY).await;
        }
        Ok(out)
    }

    fn source_type(&self) -> SourceType {
        SourceType::Disclosure
    }

    fn name(&self) -> &'static str {
        "disclosure"
    }

    fn policy(&self) -> IngestPolicy {
        IngestPolicy {
            keywords: &GOOD_NEWS,
            require_relevance: false,
        }
    }
}
