use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pagebuilder_editor::PageStore;
use pagebuilder_model::{validate_with_schema, SchemaRegistry, ValidationIssue};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Stored page id to check (defaults to every stored page)
    #[arg(short, long)]
    pub page: Option<String>,

    /// Show warnings as well as errors
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn validate(args: ValidateArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let store = config.page_store(cwd);
    let schema = SchemaRegistry::builtin();

    println!("🔍 {} page validation", "Starting".green().bold());
    println!("   Data: {}", config.data_dir(cwd).display());
    println!();

    let ids = match &args.page {
        Some(id) => vec![id.clone()],
        None => store.list()?,
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for page_id in &ids {
        // unreadable documents count as errors without stopping the run
        let tree = match store.load(page_id) {
            Ok(Some(tree)) => tree,
            Ok(None) => {
                total_errors += 1;
                println!("  {} {} - not found", "✗".red(), page_id);
                continue;
            }
            Err(e) => {
                total_errors += 1;
                println!("  {} {} - {}", "✗".red(), page_id, e.to_string().red());
                continue;
            }
        };

        let issues = validate_with_schema(&tree, &schema);
        let (errors, warnings) = count(&issues);
        total_errors += errors;
        total_warnings += warnings;

        let mark = if errors > 0 { "✗".red() } else { "✓".green() };
        println!("  {} {}", mark, page_id);
        for issue in issues.iter().filter(|i| args.verbose || i.is_error()) {
            let line = issue.to_string();
            if issue.is_error() {
                println!("      {}", line.red());
            } else {
                println!("      {}", line.yellow());
            }
        }
    }

    println!();
    println!("   Pages checked: {}", ids.len());
    if total_warnings > 0 {
        println!("   {} {}", "Warnings:".yellow(), total_warnings);
    }
    if total_errors > 0 {
        println!("   {} {}", "Errors:".red(), total_errors);
        return Err(anyhow!("{} page error(s)", total_errors));
    }
    Ok(())
}

fn count(issues: &[ValidationIssue]) -> (usize, usize) {
    let errors = issues.iter().filter(|i| i.is_error()).count();
    (errors, issues.len() - errors)
}
