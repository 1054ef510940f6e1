use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagebuilder_editor::PageStore;
use pagebuilder_model::{make_column, make_root, make_section, make_widget, FieldMap, IdGenerator, Node};
use serde_json::json;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory for page documents
    #[arg(short, long, default_value = "pages")]
    pub data_dir: String,

    /// Id of the starter page
    #[arg(short, long, default_value = "home")]
    pub page: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!("{} {} already exists", "⚠️".yellow(), DEFAULT_CONFIG_NAME.bright_white());
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing page builder project...".bright_blue().bold());

    let config = Config {
        data_dir: args.data_dir.clone(),
        ..Config::default()
    };

    let data_dir = config.data_dir(cwd);
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
        println!("  {} Created {}/", "✓".green(), args.data_dir);
    }

    let store = config.page_store(cwd);
    if store.load(&args.page)?.is_none() {
        store.save(&args.page, &starter_page(&args.page))?;
        println!("  {} Created {}/{}.json", "✓".green(), args.data_dir, args.page);
    }

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: pagebuilder-server --data-dir {}", args.data_dir);
    println!("  2. Run: pagebuilder compile");
    println!("  3. Check output in {}/", config.out_dir);

    Ok(())
}

/// root > section > column > heading + text + button
fn starter_page(page_id: &str) -> Node {
    let mut ids = IdGenerator::from_seed(page_id);

    let heading: FieldMap = [
        ("content".to_string(), json!("Welcome to our store")),
        ("tag".to_string(), json!("h1")),
    ]
    .into();
    let text: FieldMap = [("content".to_string(), json!("Fresh arrivals every week."))].into();
    let button: FieldMap = [
        ("text".to_string(), json!("Shop now")),
        ("link".to_string(), json!("/collections/all")),
    ]
    .into();

    let column = make_column(&mut ids)
        .with_child(make_widget(&mut ids, "heading", heading).with_style("fontSize", "48px"))
        .with_child(make_widget(&mut ids, "text", text))
        .with_child(make_widget(&mut ids, "button", button));
    let section = make_section(&mut ids).with_child(column);
    make_root(&mut ids).with_child(section)
}
