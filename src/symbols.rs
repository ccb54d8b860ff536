// src/symbols.rs
//! Symbol reference list: externally maintained (name, code) pairs used to
//! associate a headline with a traded instrument. Loaded once at startup into
//! an immutable book and shared via `Arc`; matching is a normalized substring
//! check with longer names tried first so that specific names win ties.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Code", default)]
    code: String,
}

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub code: String,
    norm: String,
}

/// Immutable, longest-name-first reference list.
pub struct SymbolBook {
    entries: Vec<SymbolEntry>,
}

/// Keep Hangul syllables, Latin letters and digits; uppercase the rest away.
/// Both sides of every comparison go through this.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| matches!(c, '가'..='힣' | 'A'..='Z' | 'a'..='z' | '0'..='9'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl SymbolBook {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut entries: Vec<SymbolEntry> = pairs
            .into_iter()
            .filter_map(|(name, code)| {
                let name = name.into().trim().to_string();
                if name.is_empty() {
                    return None;
                }
                let norm = normalize(&name);
                if norm.is_empty() {
                    return None;
                }
                Some(SymbolEntry {
                    norm,
                    code: code.into().trim().to_string(),
                    name,
                })
            })
            .collect();
        // Longest first: a long specific name beats a short name that happens
        // to be its substring. Stable sort keeps file order among equals.
        entries.sort_by(|a, b| b.name.chars().count().cmp(&a.name.chars().count()));
        Self { entries }
    }

    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Load from the JSON file the market-data script maintains:
    /// `[{"Name": "...", "Code": "..."}]`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading symbol master from {}", path.display()))?;
        let raw: Vec<RawEntry> =
            serde_json::from_str(&content).context("parsing symbol master json")?;
        Ok(Self::from_pairs(raw.into_iter().map(|e| (e.name, e.code))))
    }

    /// Load, degrading to an empty book when the file is missing or broken.
    /// A dead reference list should cost matches, not the whole process.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(book) => book,
            Err(e) => {
                warn!(error = ?e, path = %path.display(), "symbol master unavailable, matching disabled");
                Self::empty()
            }
        }
    }

    /// First reference entry whose normalized name is contained in the
    /// normalized text. The longest-first ordering makes this deterministic:
    /// given {"AB", "ABCD"}, text containing "ABCD" resolves to "ABCD".
    pub fn match_name(&self, text: &str) -> Option<&SymbolEntry> {
        if text.is_empty() || self.entries.is_empty() {
            return None;
        }
        let clean = normalize(text);
        self.entries.iter().find(|e| clean.contains(&e.norm))
    }

    /// Exact lookup by (normalized) name, for upstreams that supply a company
    /// name but a blank instrument code.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        let target = normalize(name);
        if target.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.norm == target)
            .map(|e| e.code.as_str())
            .filter(|c| !c.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_hangul_and_alnum_only() {
        assert_eq!(normalize("XYZ Corp 공급계약 체결!"), "XYZCORP공급계약체결");
        assert_eq!(normalize("  (주)한-화 "), "주한화");
    }

    #[test]
    fn longer_names_win_matching_ties() {
        let book = SymbolBook::from_pairs([("AB", "001"), ("ABCD", "002")]);
        let hit = book.match_name("today ABCD surged").unwrap();
        assert_eq!(hit.name, "ABCD");
        assert_eq!(hit.code, "002");
    }

    #[test]
    fn code_lookup_ignores_spacing_and_case() {
        let book = SymbolBook::from_pairs([("XYZ Corp", "123456")]);
        assert_eq!(book.code_for("xyzcorp"), Some("123456"));
        assert_eq!(book.code_for("unknown"), None);
    }
}
