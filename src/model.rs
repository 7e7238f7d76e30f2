use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    #[serde(alias = "fullName", alias = "nameWithOwner")]
    pub full_name: String,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default, alias = "pushedAt")]
    pub pushed_at: Option<DateTime<Utc>>,
}

impl RepositoryDescriptor {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            fork: false,
            archived: false,
            private: false,
            pushed_at: None,
        }
    }

    /// Exactly `owner/name`, both parts non-empty and neither `.` nor `..`.
    pub fn has_valid_name(&self) -> bool {
        let mut parts = self.full_name.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => [owner, name]
                .iter()
                .all(|p| !p.trim().is_empty() && *p != "." && *p != ".."),
            _ => false,
        }
    }

    /// Repositories with an unknown push time are assumed active.
    pub fn pushed_since(&self, cutoff: &DateTime<Utc>) -> bool {
        self.pushed_at.map_or(true, |pushed| pushed >= *cutoff)
    }
}

/// Language name to an accumulated amount: bytes in snapshot mode, changed lines in churn mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTotals(BTreeMap<String, u64>);

impl LanguageTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, language: &str, amount: u64) {
        *self.0.entry(language.to_string()).or_insert(0) += amount;
    }

    pub fn merge(&mut self, other: &LanguageTotals) {
        for (language, amount) in &other.0 {
            self.add(language, *amount);
        }
    }

    pub fn get(&self, language: &str) -> Option<u64> {
        self.0.get(language).copied()
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn retain<F: FnMut(&str, u64) -> bool>(&mut self, mut keep: F) {
        self.0.retain(|k, v| keep(k, *v));
    }
}

impl FromIterator<(String, u64)> for LanguageTotals {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut totals = LanguageTotals::new();
        for (language, amount) in iter {
            totals.add(&language, amount);
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRepository {
    pub full_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub totals: LanguageTotals,
    pub skipped_repositories: Vec<SkippedRepository>,
}

/// Lower-cased substrings matched against `"<author name> <author email>"` of each commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorPatterns(Vec<String>);

impl AuthorPatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for p in patterns {
            let p = p.as_ref().trim().to_lowercase();
            if !p.is_empty() && !out.contains(&p) {
                out.push(p);
            }
        }
        Self(out)
    }

    /// Login, verified emails and the hosting service's no-reply addresses for that login.
    pub fn from_identity(login: &str, emails: &[String], user_id: Option<u64>) -> Self {
        let login = login.trim();
        let mut patterns: Vec<String> = Vec::new();
        if !login.is_empty() {
            patterns.push(login.to_string());
            patterns.push(format!("{login}@users.noreply.github.com"));
            if let Some(id) = user_id {
                patterns.push(format!("{id}+{login}@users.noreply.github.com"));
            }
        }
        patterns.extend(emails.iter().cloned());
        Self::new(patterns)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// An empty pattern set matches every author.
    pub fn matches(&self, name: &str, email: &str) -> bool {
        if self.0.is_empty() {
            return true;
        }
        let identity = format!("{name} {email}").to_lowercase();
        self.0.iter().any(|p| identity.contains(p.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageShare {
    pub language: String,
    pub value: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub mode: String,
    pub cutoff: Option<String>,
    pub repository_count: usize,
    pub total: u64,
    pub languages: Vec<LanguageShare>,
    pub totals: LanguageTotals,
    pub skipped_repositories: Vec<SkippedRepository>,
}
