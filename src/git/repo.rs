use crate::command::{run_checked, CommandRunner, Invocation};
use crate::error::Result;
use std::path::Path;

/// Format of the per-commit marker line in [`Git::numstat_since`] output.
pub const COMMIT_MARKER_FORMAT: &str = "@@@%H\t%an\t%ae";

/// The git command line, one method per invocation the pipeline needs.
pub struct Git<'r, R> {
    runner: &'r R,
    program: &'r str,
}

impl<'r, R: CommandRunner> Git<'r, R> {
    pub fn new(runner: &'r R, program: &'r str) -> Self {
        Self { runner, program }
    }

    pub fn program(&self) -> &str {
        self.program
    }

    fn invocation(&self, dir: Option<&Path>) -> Invocation {
        let inv = Invocation::new(self.program).env("GIT_TERMINAL_PROMPT", "0");
        match dir {
            Some(d) => inv.current_dir(d),
            None => inv,
        }
    }

    async fn exec<const N: usize>(&self, dir: &Path, args: [&str; N]) -> Result<String> {
        run_checked(self.runner, &self.invocation(Some(dir)).args(args)).await
    }

    pub async fn clone_shallow(&self, url: &str, dest: &Path) -> Result<()> {
        let inv = self
            .invocation(None)
            .args(["clone", "--depth=1", url])
            .arg(dest.to_string_lossy());
        run_checked(self.runner, &inv).await?;
        Ok(())
    }

    pub async fn set_origin(&self, dir: &Path, url: &str) -> Result<()> {
        self.exec(dir, ["remote", "set-url", "origin", url]).await?;
        Ok(())
    }

    pub async fn fetch_prune(&self, dir: &Path) -> Result<()> {
        self.exec(dir, ["fetch", "--prune", "origin"]).await?;
        Ok(())
    }

    pub async fn reset_hard(&self, dir: &Path) -> Result<()> {
        self.exec(dir, ["reset", "--hard", "HEAD"]).await?;
        Ok(())
    }

    pub async fn clean(&self, dir: &Path) -> Result<()> {
        self.exec(dir, ["clean", "-fd"]).await?;
        Ok(())
    }

    pub async fn checkout_force(&self, dir: &Path) -> Result<()> {
        self.exec(dir, ["checkout", "-f", "HEAD"]).await?;
        Ok(())
    }

    pub async fn pull_ff_only(&self, dir: &Path) -> Result<()> {
        self.exec(dir, ["pull", "--ff-only"]).await?;
        Ok(())
    }

    pub async fn deepen(&self, dir: &Path, commits: u32) -> Result<()> {
        let n = commits.to_string();
        self.exec(dir, ["fetch", "--deepen", n.as_str(), "origin"]).await?;
        Ok(())
    }

    /// Committer timestamp (ISO 8601) from `log --all --reverse --format=%cI -n 1`, or `None` for
    /// an empty history.
    ///
    /// git limits to one commit before reversing, so this is the newest reachable commit, not the
    /// oldest. Once the tip is after the cutoff the answer does not move with deeper history, and
    /// [`extend_history`](crate::history::extend_history) keeps deepening until a step fails or
    /// the steps run out.
    pub async fn oldest_commit_time(&self, dir: &Path) -> Result<Option<String>> {
        let out = self
            .exec(dir, ["log", "--all", "--reverse", "--format=%cI", "-n", "1"])
            .await?;
        Ok(out
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string))
    }

    /// Raw `--numstat` log since `since`, each commit introduced by a marker line.
    pub async fn numstat_since(&self, dir: &Path, since: &str) -> Result<String> {
        let since_arg = format!("--since={since}");
        let format_arg = format!("--format={COMMIT_MARKER_FORMAT}");
        self.exec(
            dir,
            ["log", "--all", since_arg.as_str(), "--numstat", format_arg.as_str()],
        )
        .await
    }
}
