//! Per-repository analysis: acquire a working copy, then either classify the whole tree
//! or attribute recent churn to languages.

use crate::acquire::{Acquirer, RemoteTemplate, Workspace};
use crate::churn::{extract_churn, PathChurn};
use crate::command::CommandRunner;
use crate::error::Result;
use crate::git::Git;
use crate::history::extend_history;
use crate::language::{Classifier, ClassifierEngine, LanguageCache, UNKNOWN_LANGUAGE};
use crate::model::{AuthorPatterns, LanguageTotals, RepositoryDescriptor};
use crate::redact::Redactor;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One repository in, one set of language totals out. The orchestrator only sees this seam.
pub trait RepositoryAnalyzer {
    fn analyze(&self, repo: &RepositoryDescriptor) -> impl Future<Output = Result<LanguageTotals>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Classifier byte counts for the current tree.
    Snapshot,
    /// Changed lines since `cutoff`, optionally limited to some authors.
    Window {
        cutoff: String,
        authors: AuthorPatterns,
    },
}

impl AnalysisMode {
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisMode::Snapshot => "snapshot",
            AnalysisMode::Window { .. } => "churn",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub git_program: String,
    pub remote: RemoteTemplate,
    pub cache_root: Option<PathBuf>,
    pub classifier: ClassifierEngine,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            git_program: "git".to_string(),
            remote: RemoteTemplate::default(),
            cache_root: None,
            classifier: ClassifierEngine::default(),
        }
    }
}

/// Clone-based analysis driven by external `git` and classifier processes.
pub struct CloneAnalyzer<R> {
    runner: R,
    settings: AnalyzerSettings,
    mode: AnalysisMode,
    redactor: Redactor,
}

impl<R: CommandRunner> CloneAnalyzer<R> {
    pub fn new(runner: R, settings: AnalyzerSettings, mode: AnalysisMode, redactor: Redactor) -> Self {
        Self {
            runner,
            settings,
            mode,
            redactor,
        }
    }

    pub fn mode(&self) -> &AnalysisMode {
        &self.mode
    }

    fn git(&self) -> Git<'_, R> {
        Git::new(&self.runner, &self.settings.git_program)
    }

    fn classifier(&self) -> Classifier<'_, R> {
        Classifier::new(&self.runner, &self.settings.classifier)
    }

    async fn snapshot(&self, workspace: &Workspace) -> Result<LanguageTotals> {
        self.classifier().classify_tree(workspace.path()).await
    }

    async fn window(
        &self,
        repo: &RepositoryDescriptor,
        workspace: &Workspace,
        cutoff: &str,
        authors: &AuthorPatterns,
    ) -> Result<LanguageTotals> {
        let dir = workspace.path();
        let git = self.git();

        let coverage = extend_history(&git, dir, cutoff).await;
        debug!(repo = %repo.full_name, ?coverage, "history prepared");

        let churn = extract_churn(&git, dir, cutoff, authors).await?;
        let mut cache = LanguageCache::load(dir).await;
        let totals = self.attribute(dir, &churn, &mut cache).await;

        if let Err(e) = cache.save(dir).await {
            warn!(repo = %repo.full_name, "could not persist language cache: {e}");
        }
        Ok(totals)
    }

    async fn attribute(&self, dir: &Path, churn: &PathChurn, cache: &mut LanguageCache) -> LanguageTotals {
        let classifier = self.classifier();
        let mut paths: Vec<(&str, u64)> = churn
            .iter()
            .filter(|(_, lines)| **lines > 0)
            .map(|(path, lines)| (path.as_str(), *lines))
            .collect();
        paths.sort_unstable();

        let mut totals = LanguageTotals::new();
        for (path, lines) in paths {
            let language = classifier.resolve(dir, path, cache).await;
            if language != UNKNOWN_LANGUAGE {
                totals.add(&language, lines);
            }
        }
        totals
    }
}

impl<R: CommandRunner> RepositoryAnalyzer for CloneAnalyzer<R> {
    async fn analyze(&self, repo: &RepositoryDescriptor) -> Result<LanguageTotals> {
        let acquirer = Acquirer::new(
            self.git(),
            &self.settings.remote,
            self.settings.cache_root.as_deref(),
            &self.redactor,
        );
        let workspace = acquirer.acquire(repo).await?;

        let outcome = match &self.mode {
            AnalysisMode::Snapshot => self.snapshot(&workspace).await,
            AnalysisMode::Window { cutoff, authors } => {
                self.window(repo, &workspace, cutoff, authors).await
            }
        };

        workspace.dispose().await;
        outcome
    }
}
