use crate::command::CommandRunner;
use crate::git::Git;
use chrono::{DateTime, FixedOffset};
use std::path::Path;
use tracing::debug;

/// Additional commits requested on each successive deepen.
pub const DEEPEN_STEPS: [u32; 4] = [100, 300, 700, 1500];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCoverage {
    /// History reaches back to the cutoff.
    Reached,
    /// Gave up before reaching the cutoff; whatever history exists will be used.
    Partial,
    /// The cutoff could not be parsed, so nothing was attempted.
    Skipped,
}

/// Deepen a shallow clone until its oldest commit is at or before `cutoff`.
///
/// Never fails: a failed deepen (already complete, network trouble) just ends the attempt.
pub async fn extend_history<R: CommandRunner>(
    git: &Git<'_, R>,
    dir: &Path,
    cutoff: &str,
) -> HistoryCoverage {
    let Ok(cutoff_at) = DateTime::parse_from_rfc3339(cutoff.trim()) else {
        debug!(cutoff, "unparseable cutoff, not extending history");
        return HistoryCoverage::Skipped;
    };

    for step in DEEPEN_STEPS {
        if oldest_reaches(git, dir, &cutoff_at).await {
            return HistoryCoverage::Reached;
        }
        if let Err(e) = git.deepen(dir, step).await {
            debug!(step, "deepen stopped: {e}");
            return HistoryCoverage::Partial;
        }
    }

    if oldest_reaches(git, dir, &cutoff_at).await {
        HistoryCoverage::Reached
    } else {
        HistoryCoverage::Partial
    }
}

async fn oldest_reaches<R: CommandRunner>(
    git: &Git<'_, R>,
    dir: &Path,
    cutoff: &DateTime<FixedOffset>,
) -> bool {
    match git.oldest_commit_time(dir).await {
        Ok(Some(ts)) => DateTime::parse_from_rfc3339(&ts)
            .map(|oldest| oldest <= *cutoff)
            .unwrap_or(false),
        _ => false,
    }
}
