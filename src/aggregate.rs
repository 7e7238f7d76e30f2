use crate::error::{ChurnError, Result};
use crate::model::{LanguageShare, LanguageTotals};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCategory {
    Programming,
    Markup,
    Prose,
    Data,
}

impl FromStr for LanguageCategory {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "programming" => Ok(Self::Programming),
            "markup" => Ok(Self::Markup),
            "prose" | "documentation" | "docs" => Ok(Self::Prose),
            "data" => Ok(Self::Data),
            other => Err(ChurnError::Config(format!("unknown language category '{other}'"))),
        }
    }
}

const MARKUP: &[&str] = &[
    "HTML", "CSS", "SCSS", "Sass", "Less", "XML", "SVG", "XSLT", "Haml", "Pug", "Handlebars",
    "Mustache", "Twig", "Liquid",
];
const PROSE: &[&str] = &[
    "Markdown", "MDX", "reStructuredText", "AsciiDoc", "Text", "TeX", "Org", "RDoc", "Roff",
];
const DATA: &[&str] = &[
    "JSON", "JSON with Comments", "JSON5", "YAML", "TOML", "CSV", "TSV", "INI", "Protocol Buffer",
];

/// Rough category of a language name; anything not listed counts as programming.
pub fn language_category(language: &str) -> LanguageCategory {
    let hit = |list: &[&str]| list.iter().any(|l| l.eq_ignore_ascii_case(language));
    if hit(MARKUP) {
        LanguageCategory::Markup
    } else if hit(PROSE) {
        LanguageCategory::Prose
    } else if hit(DATA) {
        LanguageCategory::Data
    } else {
        LanguageCategory::Programming
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    pub categories: Vec<LanguageCategory>,
    pub languages: Vec<String>,
}

impl ExclusionRules {
    pub fn none() -> Self {
        Self {
            categories: Vec::new(),
            languages: Vec::new(),
        }
    }

    pub fn excludes(&self, language: &str) -> bool {
        self.categories.contains(&language_category(language))
            || self
                .languages
                .iter()
                .any(|l| l.eq_ignore_ascii_case(language))
    }

    pub fn apply(&self, totals: &LanguageTotals) -> LanguageTotals {
        let mut kept = totals.clone();
        kept.retain(|language, amount| amount > 0 && !self.excludes(language));
        kept
    }
}

impl Default for ExclusionRules {
    /// Markup and documentation languages are left out unless asked for.
    fn default() -> Self {
        Self {
            categories: vec![LanguageCategory::Markup, LanguageCategory::Prose],
            languages: Vec::new(),
        }
    }
}

/// Largest first, ties by name, with each entry's share of the total in percent.
pub fn rank(totals: &LanguageTotals) -> Vec<LanguageShare> {
    let total = totals.total();
    let mut shares: Vec<LanguageShare> = totals
        .iter()
        .map(|(language, value)| LanguageShare {
            language: language.to_string(),
            value,
            percent: if total == 0 {
                0.0
            } else {
                value as f64 * 100.0 / total as f64
            },
        })
        .collect();
    shares.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.language.cmp(&b.language)));
    shares
}
