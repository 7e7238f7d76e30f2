use crate::command::CommandRunner;
use crate::error::Result;
use crate::git::Git;
use crate::model::AuthorPatterns;
use std::collections::HashMap;
use std::path::Path;

/// Changed lines (added + deleted) per repository-relative path.
pub type PathChurn = HashMap<String, u64>;

const MARKER: &str = "@@@";

/// Map a numstat path to the path after any rename.
///
/// `src/{old => new}/index.ts` becomes `src/new/index.ts`, `old => new` becomes `new`.
pub fn normalize_rename_path(raw: &str) -> String {
    let raw = raw.trim();

    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) {
        if open < close {
            let inner = &raw[open + 1..close];
            if let Some((_, new)) = inner.split_once(" => ") {
                let joined = format!("{}{}{}", &raw[..open], new.trim(), &raw[close + 1..]);
                return collapse_separators(&joined);
            }
        }
    }

    if let Some((_, new)) = raw.split_once(" => ") {
        return new.trim().to_string();
    }

    raw.to_string()
}

fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out.trim_start_matches('/').to_string()
}

/// Parse `git log --numstat` output with `@@@<hash>\t<name>\t<email>` commit markers.
///
/// Data lines before the first marker belong to no commit and are counted only
/// when no author patterns are given. Malformed lines are skipped.
pub fn parse_numstat(output: &str, authors: &AuthorPatterns) -> PathChurn {
    let mut churn = PathChurn::new();
    let mut included = authors.is_empty();

    for line in output.lines() {
        if let Some(marker) = line.strip_prefix(MARKER) {
            let mut fields = marker.split('\t');
            let _hash = fields.next();
            let name = fields.next().unwrap_or("");
            let email = fields.next().unwrap_or("");
            included = authors.matches(name, email);
            continue;
        }
        if !included || line.trim().is_empty() {
            continue;
        }

        let mut fields = line.splitn(3, '\t');
        let (Some(added), Some(deleted), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        // Binary files report "-" for both counts.
        let (Ok(added), Ok(deleted)) = (added.trim().parse::<u64>(), deleted.trim().parse::<u64>())
        else {
            continue;
        };
        let path = normalize_rename_path(path);
        if path.is_empty() {
            continue;
        }
        *churn.entry(path).or_insert(0) += added + deleted;
    }

    churn
}

/// Churn per path for commits since `since`, restricted to matching authors.
pub async fn extract_churn<R: CommandRunner>(
    git: &Git<'_, R>,
    dir: &Path,
    since: &str,
    authors: &AuthorPatterns,
) -> Result<PathChurn> {
    let log = git.numstat_since(dir, since).await?;
    Ok(parse_numstat(&log, authors))
}
