mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    compile, css, init, render, validate, CompileArgs, CssArgs, InitArgs, RenderArgs, ValidateArgs,
};

/// Storefront page builder CLI
#[derive(Parser, Debug)]
#[command(name = "pagebuilder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new page builder project
    Init(InitArgs),

    /// Compile stored pages to static HTML
    Compile(CompileArgs),

    /// Print the render tree of a page as JSON
    Render(RenderArgs),

    /// Print the responsive CSS generated for a page
    Css(CssArgs),

    /// Check stored pages for structural problems
    Validate(ValidateArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Compile(args) => compile(args, &cwd),
            Command::Render(args) => render(args, &cwd),
            Command::Css(args) => css(args, &cwd),
            Command::Validate(args) => validate(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
