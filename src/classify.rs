// src/classify.rs
//! Feature tagging: each adapter family carries an ordered keyword list and a
//! default tag. The classifier returns the first keyword contained verbatim in
//! a title, else the family default — the defaults are distinct on purpose
//! (an unconfirmed-financials disclosure is not the same as a generic article).

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;

/// Disclosure titles that usually move a stock. A hit triggers the secondary
/// profit probe; the default marks financials as unverified.
pub static GOOD_NEWS: Lazy<KeywordSet> = Lazy::new(|| {
    KeywordSet::new(
        [
            "공급계약", "수주", "판매계약", "체결", "흑자전환", "영업이익증가",
            "무상증자", "자사주소각", "자사주취득", "인수", "합병", "단일판매",
        ],
        "[재무미확인]",
    )
});

/// Search terms the keyword-search adapter cycles through, doubling as its
/// classification list. Ordering matters: the first contained keyword wins.
pub static MARKET_MOVERS: Lazy<KeywordSet> = Lazy::new(|| {
    KeywordSet::new(
        [
            "수주", "공급계약", "흑자전환", "공시", "M&A", "MOU", "투자",
            "상한가", "특징주", "독점", "유상증자", "국책과제", "무상증자",
            "인수", "단일판매", "상승", "돌파", "최고치", "실적개선",
            "사상최대", "급등", "신고가", "강세",
        ],
        "재료",
    )
});

/// Relevance list for syndicated feeds; items matching neither this nor the
/// symbol reference are discarded outright.
pub static POSITIVE: Lazy<KeywordSet> = Lazy::new(|| {
    KeywordSet::new(
        [
            "상승", "돌파", "수주", "공급계약", "최고치", "흑자전환", "실적개선",
            "사상최대", "영업익 증", "매출 증", "서프라이즈", "M&A", "인수",
            "독점", "특허", "임상", "승인", "양해각서", "MOU", "협력",
            "파트너십", "제휴", "급등", "상한가", "신고가", "증설", "강세",
            "반등", "질주", "훈풍", "유입", "순매수", "상향", "추천",
            "신기술", "상용화", "국산화", "최초", "IPO", "상장", "액면분할",
            "무상증자", "배당", "특징주",
        ],
        "정보",
    )
});

#[derive(Debug, Clone)]
pub struct KeywordSet {
    words: Vec<String>,
    default_tag: String,
}

impl KeywordSet {
    pub fn new<I, S>(words: I, default_tag: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: clean_list(words.into_iter().map(Into::into).collect()),
            default_tag: default_tag.to_string(),
        }
    }

    /// First keyword contained in the title, if any.
    pub fn first_match<'a>(&'a self, title: &str) -> Option<&'a str> {
        self.words
            .iter()
            .find(|w| title.contains(w.as_str()))
            .map(String::as_str)
    }

    /// First keyword contained in the title, else the family default tag.
    pub fn classify<'a>(&'a self, title: &str) -> &'a str {
        self.first_match(title).unwrap_or(&self.default_tag)
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.words.iter().any(|w| w == tag)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn default_tag(&self) -> &str {
        &self.default_tag
    }

    /// Replace the keyword list from a TOML (`words = [...]`) or JSON array
    /// file, keeping the family default tag.
    pub fn load_from(path: &Path, default_tag: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading keyword list from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let words = parse_words(&content, &ext)?;
        Ok(Self::new(words, default_tag))
    }
}

fn parse_words(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    let try_toml = hint_ext == "toml" || s.contains("words");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported keyword list format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlWords {
        words: Vec<String>,
    }
    let v: TomlWords = toml::from_str(s)?;
    Ok(v.words)
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(v)
}

/// Trim entries and drop empties; keep first-occurrence order (it is the
/// matching priority).
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|w| w == t) {
            out.push(t.to_string());
        }
    }
    out
}
