//! Keeps credentials out of anything that reaches logs or the caller.

use regex::Regex;
use std::sync::OnceLock;

pub const PLACEHOLDER: &str = "***";

fn userinfo_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?P<scheme>[A-Za-z][A-Za-z0-9+.-]*://)[^/@\s]+@")
            .expect("userinfo pattern is valid")
    })
}

/// Replace the user-info part of every URL in `text` with a placeholder.
pub fn strip_url_credentials(text: &str) -> String {
    userinfo_pattern()
        .replace_all(text, format!("${{scheme}}{PLACEHOLDER}@").as_str())
        .into_owned()
}

#[derive(Debug, Clone, Default)]
pub struct Redactor {
    secrets: Vec<String>,
}

impl Redactor {
    pub fn new(secret: Option<&str>) -> Self {
        let secrets = secret
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| vec![s.to_string()])
            .unwrap_or_default();
        Self { secrets }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut out = strip_url_credentials(text);
        for secret in &self.secrets {
            out = out.replace(secret.as_str(), PLACEHOLDER);
        }
        out
    }
}
