use crate::acquire::DEFAULT_REMOTE_BASE;
use crate::aggregate::{ExclusionRules, LanguageCategory};
use crate::error::{ChurnError, Result};
use crate::language::{ClassifierEngine, DEFAULT_CLASSIFIER, DEFAULT_IMAGE, DEFAULT_RUNTIME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "langchurn.toml";

/// Top-level configuration from `langchurn.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_exclude_categories")]
    pub exclude_categories: Vec<String>,
    #[serde(default)]
    pub exclude_languages: Vec<String>,
    /// Upper bound for any single external command.
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

fn default_exclude_categories() -> Vec<String> {
    vec!["markup".to_string(), "prose".to_string()]
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            cache_dir: None,
            exclude_categories: default_exclude_categories(),
            exclude_languages: Vec::new(),
            command_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_git_program")]
    pub program: String,
    #[serde(default = "default_remote_base")]
    pub remote_base: String,
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_remote_base() -> String {
    DEFAULT_REMOTE_BASE.to_string()
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: default_git_program(),
            remote_base: default_remote_base(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Native,
    Container,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub engine: EngineKind,
    #[serde(default = "default_classifier_program")]
    pub program: String,
    #[serde(default = "default_runtime")]
    pub runtime: String,
    #[serde(default = "default_image")]
    pub image: String,
}

fn default_classifier_program() -> String {
    DEFAULT_CLASSIFIER.to_string()
}

fn default_runtime() -> String {
    DEFAULT_RUNTIME.to_string()
}

fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            program: default_classifier_program(),
            runtime: default_runtime(),
            image: default_image(),
        }
    }
}

impl ClassifierConfig {
    pub fn engine(&self) -> ClassifierEngine {
        match self.engine {
            EngineKind::Native => ClassifierEngine::Native {
                program: self.program.clone(),
            },
            EngineKind::Container => ClassifierEngine::Container {
                runtime: self.runtime.clone(),
                image: self.image.clone(),
                program: self.program.clone(),
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChurnError::Config(format!("failed to read config file '{}': {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            ChurnError::Config(format!("failed to parse '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path if given, else `langchurn.toml` in `dir` when present, else defaults.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis.concurrency == Some(0) {
            return Err(ChurnError::Config("concurrency must be at least 1".to_string()));
        }
        self.exclusion_rules().map(|_| ())
    }

    pub fn exclusion_rules(&self) -> Result<ExclusionRules> {
        let categories = self
            .analysis
            .exclude_categories
            .iter()
            .map(|c| c.parse::<LanguageCategory>())
            .collect::<Result<Vec<_>>>()?;
        Ok(ExclusionRules {
            categories,
            languages: self.analysis.exclude_languages.clone(),
        })
    }
}
