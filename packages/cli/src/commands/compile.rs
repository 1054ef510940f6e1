use super::load_pages;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pagebuilder_compiler_html::{compile_fragment, compile_page, CompileOptions};
use pagebuilder_evaluator::Evaluator;
use pagebuilder_model::Node;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Page id or `.json` document (defaults to every stored page)
    #[arg(short, long)]
    pub page: Option<String>,

    /// Output to stdout instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Emit body markup only, for embedding in a theme template
    #[arg(long)]
    pub fragment: bool,

    /// Minify output
    #[arg(long)]
    pub compact: bool,
}

pub fn compile(args: CompileArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let data_dir = config.data_dir(cwd);

    if args.page.is_none() && !data_dir.exists() {
        return Err(anyhow!("Data directory does not exist: {:?}", data_dir));
    }

    if !args.stdout {
        println!("{}", "🔨 Compiling pages...".bright_blue().bold());
    }

    let pages = load_pages(&config, cwd, args.page.as_deref())?;
    if pages.is_empty() {
        println!("{}", "⚠️  No pages found".yellow());
        return Ok(());
    }

    let evaluator = config.evaluator();
    let out_dir = match &args.out_dir {
        Some(out) => cwd.join(out),
        None => config.out_dir(cwd),
    };

    let mut success_count = 0;
    let mut error_count = 0;

    for (page_id, tree) in &pages {
        let mut options = CompileOptions {
            title: page_id.clone(),
            ..config.html.clone()
        };
        options.pretty = options.pretty && !args.compact;

        match compile_one(tree, &evaluator, options, args.fragment) {
            Ok(output) if args.stdout => {
                println!("{}", output);
                success_count += 1;
            }
            Ok(output) => {
                let path = write_output(&out_dir, page_id, &output)?;
                success_count += 1;
                println!("  {} {} → {}", "✓".green(), page_id, path.display());
            }
            Err(e) => {
                error_count += 1;
                eprintln!("  {} {} - {}", "✗".red(), page_id, e.to_string().red());
            }
        }
    }

    if args.stdout {
        return Ok(());
    }

    println!();
    if error_count == 0 {
        println!("{} Compiled {} pages successfully", "✅".green(), success_count);
    } else {
        println!(
            "{} Compiled {} pages, {} errors",
            "⚠️".yellow(),
            success_count,
            error_count
        );
    }

    Ok(())
}

fn compile_one(tree: &Node, evaluator: &Evaluator, options: CompileOptions, fragment: bool) -> Result<String> {
    if fragment {
        Ok(compile_fragment(tree, evaluator, options))
    } else {
        Ok(compile_page(tree, evaluator, options)?)
    }
}

fn write_output(out_dir: &Path, page_id: &str, output: &str) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{}.html", page_id));
    fs::write(&path, output)?;
    Ok(path)
}
