use crate::acquire::RemoteTemplate;
use crate::analysis::AnalyzerSettings;
use crate::command::ProcessRunner;
use crate::config::{Config, EngineKind};
use crate::model::{AuthorPatterns, RepositoryDescriptor};
use crate::orchestrator::{self, BatchRequest, ModeRequest};
use crate::report::{build_output, output_json, output_table};
use crate::util::effective_cutoff;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "langchurn")]
#[command(about = "Attribute code volume and recent churn to languages across git repositories")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Path to a langchurn.toml config file")]
    pub config: Option<PathBuf>,

    #[arg(long = "repo", global = true, help = "Repository as owner/name (repeatable)")]
    pub repos: Vec<String>,

    #[arg(long, global = true, help = "JSON array of repository descriptors")]
    pub repos_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "Access token used for cloning"
    )]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Keep working copies in this directory between runs")]
    pub cache_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Keep working copies in the platform cache directory")]
    pub cache: bool,

    #[arg(long, global = true, help = "Repositories analyzed at once")]
    pub concurrency: Option<usize>,

    #[arg(long, global = true, value_enum, help = "How to run the language classifier")]
    pub engine: Option<EngineKind>,

    #[arg(long, global = true, help = "git executable")]
    pub git_program: Option<String>,

    #[arg(long, global = true, help = "Classifier executable")]
    pub classifier: Option<String>,

    #[arg(long, global = true, help = "Base URL repositories are cloned from")]
    pub remote_base: Option<String>,

    #[arg(long, global = true, help = "Leave out forked repositories")]
    pub skip_forks: bool,

    #[arg(long, global = true, help = "Leave out archived repositories")]
    pub skip_archived: bool,

    #[arg(long = "exclude-language", global = true, help = "Drop a language from results (repeatable)")]
    pub exclude_languages: Vec<String>,

    #[arg(long, global = true, help = "Keep markup and documentation languages")]
    pub include_markup: bool,

    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, global = true, help = "Show a progress bar")]
    pub progress: bool,

    #[arg(short, long, global = true, help = "Debug logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bytes per language in each repository's current tree
    Snapshot,
    /// Changed lines per language since a cutoff
    Churn {
        #[arg(long, help = "Start of the window (RFC3339, YYYY-MM-DD, \"2 weeks ago\", 30d); default 7 days")]
        since: Option<String>,

        #[arg(long, help = "Only commits by this login (adds its no-reply addresses)")]
        author_login: Option<String>,

        #[arg(long, help = "Numeric account id, for id-prefixed no-reply addresses")]
        author_id: Option<u64>,

        #[arg(long = "author-email", help = "Only commits by this email (repeatable)")]
        author_emails: Vec<String>,

        #[arg(long = "author-pattern", help = "Raw substring matched against \"name email\" (repeatable)")]
        author_patterns: Vec<String>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub async fn execute(self) -> Result<()> {
        let common = self.common;
        let cwd = std::env::current_dir()?;
        let mut config = Config::resolve(common.config.as_deref(), &cwd)
            .context("Failed to load configuration")?;
        apply_overrides(&mut config, &common)?;

        let now = Utc::now();
        let mut repos = load_repositories(&common.repos, common.repos_file.as_deref())?;
        if repos.is_empty() {
            bail!("No repositories given; use --repo owner/name or --repos-file");
        }
        repos.retain(|r| !(common.skip_forks && r.fork) && !(common.skip_archived && r.archived));

        let mode = match self.command {
            Commands::Snapshot => ModeRequest::Snapshot,
            Commands::Churn {
                since,
                author_login,
                author_id,
                author_emails,
                author_patterns,
            } => {
                let cutoff = effective_cutoff(since.as_deref(), now)
                    .context("Failed to resolve --since")?;
                let cutoff_at = DateTime::parse_from_rfc3339(&cutoff)
                    .context("Failed to parse cutoff")?
                    .with_timezone(&Utc);
                let before = repos.len();
                repos.retain(|r| r.pushed_since(&cutoff_at));
                info!(dropped = before - repos.len(), "inactive repositories filtered");

                let mut patterns = match &author_login {
                    Some(login) => AuthorPatterns::from_identity(login, &author_emails, author_id)
                        .as_slice()
                        .to_vec(),
                    None => author_emails,
                };
                patterns.extend(author_patterns);

                ModeRequest::Churn {
                    since: Some(cutoff),
                    authors: AuthorPatterns::new(patterns),
                }
            }
        };

        let rules = config.exclusion_rules()?;
        let token = common
            .token
            .clone()
            .or_else(|| std::env::var("GH_TOKEN").ok())
            .filter(|t| !t.trim().is_empty());
        let settings = AnalyzerSettings {
            git_program: config.git.program.clone(),
            remote: RemoteTemplate::new(config.git.remote_base.clone(), token.clone()),
            cache_root: config.analysis.cache_dir.clone(),
            classifier: config.classifier.engine(),
        };
        let runner = ProcessRunner::new()
            .with_timeout(config.analysis.command_timeout_secs.map(Duration::from_secs));
        let repository_count = repos.len();
        let request = BatchRequest {
            repositories: repos,
            mode,
            concurrency: config.analysis.concurrency,
            token,
            show_progress: common.progress && console::Term::stderr().is_term(),
        };

        let report = orchestrator::run(runner, settings, request).await?;
        let output = build_output(&report.mode, &report.result, &rules, repository_count);

        if common.json {
            output_json(&output)?;
        } else {
            output_table(&output)?;
        }
        Ok(())
    }
}

fn apply_overrides(config: &mut Config, common: &CommonArgs) -> Result<()> {
    if let Some(n) = common.concurrency {
        config.analysis.concurrency = Some(n);
    }
    if let Some(dir) = &common.cache_dir {
        config.analysis.cache_dir = Some(dir.clone());
    } else if common.cache && config.analysis.cache_dir.is_none() {
        let dir = dirs::cache_dir()
            .context("Could not determine cache directory")?
            .join("langchurn")
            .join("repos");
        config.analysis.cache_dir = Some(dir);
    }
    if let Some(engine) = common.engine {
        config.classifier.engine = engine;
    }
    if let Some(program) = &common.git_program {
        config.git.program = program.clone();
    }
    if let Some(program) = &common.classifier {
        config.classifier.program = program.clone();
    }
    if let Some(base) = &common.remote_base {
        config.git.remote_base = base.clone();
    }
    if common.include_markup {
        config.analysis.exclude_categories.clear();
    }
    config
        .analysis
        .exclude_languages
        .extend(common.exclude_languages.iter().cloned());
    config.validate()?;
    Ok(())
}

fn load_repositories(names: &[String], file: Option<&Path>) -> Result<Vec<RepositoryDescriptor>> {
    let mut repos: Vec<RepositoryDescriptor> = Vec::new();
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let listed: Vec<RepositoryDescriptor> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        repos.extend(listed);
    }
    repos.extend(names.iter().map(|name| RepositoryDescriptor::new(name.trim())));
    if let Some(bad) = repos.iter().find(|r| !r.has_valid_name()) {
        bail!("Repository '{}' is not in owner/name form", bad.full_name);
    }
    let mut seen = std::collections::HashSet::new();
    repos.retain(|r| seen.insert(r.full_name.to_lowercase()));
    Ok(repos)
}
