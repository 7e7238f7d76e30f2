//! # langchurn
//!
//! Attributes source-code volume to programming languages across many git repositories.
//!
//! Two modes are supported:
//!
//! - **snapshot**: clone each repository and let the language classifier size the current tree.
//! - **churn**: deepen a shallow clone back to a cutoff, mine `git log --numstat` for changed
//!   lines (optionally only from certain authors), classify each touched path and sum the lines
//!   per language.
//!
//! Repositories are analyzed concurrently under a fixed bound; a failing repository is recorded
//! as skipped without affecting the rest of the batch.

pub mod acquire;
pub mod aggregate;
pub mod analysis;
pub mod churn;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod git;
pub mod history;
pub mod language;
pub mod model;
pub mod orchestrator;
pub mod redact;
pub mod report;
pub mod util;

pub use analysis::{AnalysisMode, AnalyzerSettings, CloneAnalyzer, RepositoryAnalyzer};
pub use error::{ChurnError, Result};
pub use model::{AnalysisResult, AuthorPatterns, LanguageTotals, RepositoryDescriptor, SkippedRepository};
