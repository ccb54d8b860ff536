// src/ingest/adapters/syndicated.rs
//! Syndicated-feed adapter: a fixed roster of finance RSS feeds, fetched with
//! a browser-like user agent (several of them reject unknown clients). This is
//! the only adapter with a relevance gate: an item survives only if its title
//! names a reference symbol or hits the positive keyword list.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::classify::POSITIVE;
use crate::ingest::clean_title;
use crate::ingest::types::{FetchCriteria, IngestPolicy, RawCandidate, SourceAdapter, SourceHints};
use crate::store::SourceType;

const USER_AGENT: &str = "Mozilla/5.0";

const FEEDS: [(&str, &str); 10] = [
    ("연합뉴스", "https://www.yonhapnewstv.co.kr/browse/feed/"),
    ("매일경제", "https://www.mk.co.kr/rss/30200030/"),
    ("한국경제", "https://www.hankyung.com/feed/finance"),
    ("머니투데이", "https://rss.mt.co.kr/mt_news.xml"),
    ("파이낸셜뉴스", "https://www.fnnews.com/rss/r20/fn_realnews_stock.xml"),
    ("서울경제", "https://www.sedaily.com/rss/finance"),
    ("아시아경제", "https://www.asiae.co.kr/rss/stock.htm"),
    ("헤럴드경제", "https://biz.heraldcorp.com/rss/google/finance"),
    ("뉴시스속보", "https://www.newsis.com/RSS/sokbo.xml"),
    ("뉴시스금융", "https://www.newsis.com/RSS/bank.xml"),
];

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

/// Parse one feed document into candidates carrying the feed name as the
/// fallback origin label. Items missing a title or link are skipped.
pub fn parse_feed(feed_name: &str, xml: &str) -> Result<Vec<RawCandidate>> {
    let t0 = std::time::Instant::now();
    let rss: Rss = from_str(xml).with_context(|| format!("parsing {feed_name} rss xml"))?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let title = clean_title(it.title.as_deref().unwrap_or_default());
        let link = it.link.unwrap_or_default().trim().to_string();
        if title.is_empty() || link.is_empty() {
            continue;
        }
        out.push(RawCandidate {
            title,
            link,
            occurred_at: None,
            hints: SourceHints::NeedsLookup {
                origin_label: feed_name.to_string(),
            },
        });
    }

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(out)
}

pub struct SyndicatedFeedAdapter {
    client: reqwest::Client,
}

impl SyndicatedFeedAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn feed_names() -> impl Iterator<Item = &'static str> {
        FEEDS.iter().map(|(name, _)| *name)
    }
}

#[async_trait]
impl SourceAdapter for SyndicatedFeedAdapter {
    async fn fetch(&self, _criteria: &FetchCriteria) -> Result<Vec<RawCandidate>> {
        let mut out = Vec::new();
        for (name, url) in FEEDS {
            let body = match self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .send()
                .await
            {
                Ok(resp) => match resp.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::warn!(error = ?e, feed = name, "feed body read failed");
                        continue;
                    }
                },
                Err(e) => {
                    tracing::warn!(error = ?e, feed = name, "feed fetch failed");
                    continue;
                }
            };
            match parse_feed(name, &body) {
                Ok(candidates) => out.extend(candidates),
                Err(e) => tracing::warn!(error = ?e, feed = name, "feed unparseable"),
            }
        }
        Ok(out)
    }

    fn source_type(&self) -> SourceType {
        SourceType::Syndicated
    }

    fn name(&self) -> &'static str {
        "syndicated-feeds"
    }

    fn policy(&self) -> IngestPolicy {
        IngestPolicy {
            keywords: &POSITIVE,
            require_relevance: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>feed</title>
    <item>
      <title>코스피 급등 마감</title>
      <link>https://feed.example/a</link>
    </item>
    <item>
      <title></title>
      <link>https://feed.example/b</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn items_need_title_and_link() {
        let out = parse_feed("연합뉴스", SAMPLE).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "코스피 급등 마감");
        match &out[0].hints {
            SourceHints::NeedsLookup { origin_label } => assert_eq!(origin_label, "연합뉴스"),
            other => panic!("unexpected hints: {other:?}"),
        }
    }
}
