use crate::aggregate::{rank, ExclusionRules};
use crate::analysis::AnalysisMode;
use crate::model::{AnalysisOutput, AnalysisResult, SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use console::style;

pub fn build_output(
    mode: &AnalysisMode,
    result: &AnalysisResult,
    rules: &ExclusionRules,
    repository_count: usize,
) -> AnalysisOutput {
    let totals = rules.apply(&result.totals);
    let cutoff = match mode {
        AnalysisMode::Window { cutoff, .. } => Some(cutoff.clone()),
        AnalysisMode::Snapshot => None,
    };
    AnalysisOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        mode: mode.name().to_string(),
        cutoff,
        repository_count,
        total: totals.total(),
        languages: rank(&totals),
        totals,
        skipped_repositories: result.skipped_repositories.clone(),
    }
}

pub fn output_json(output: &AnalysisOutput) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

pub fn output_table(output: &AnalysisOutput) -> Result<()> {
    let unit = if output.mode == "churn" { "Lines" } else { "Bytes" };
    if let Some(cutoff) = &output.cutoff {
        println!("Changes since {}", cutoff);
    }

    if output.languages.is_empty() {
        println!("No data to display");
    } else {
        println!(
            "{:<30} {:>12} {:>8}",
            style("Language").bold(),
            style(unit).bold(),
            style("Share").bold()
        );
        println!("{}", "─".repeat(52));
        for share in &output.languages {
            println!(
                "{:<30} {:>12} {:>7.2}%",
                share.language, share.value, share.percent
            );
        }
        println!("{}", "─".repeat(52));
        println!("{:<30} {:>12}", style("Total").bold(), output.total);
    }

    if !output.skipped_repositories.is_empty() {
        println!(
            "\n{} {} of {} repositories skipped:",
            style("!").yellow(),
            output.skipped_repositories.len(),
            output.repository_count
        );
        for skipped in &output.skipped_repositories {
            println!("  {} {}", style(&skipped.full_name).dim(), skipped.reason);
        }
    }
    Ok(())
}
