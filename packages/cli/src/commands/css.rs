use super::load_page;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use pagebuilder_evaluator::{rules_to_css, StyleFragment};
use pagebuilder_model::find_node;
use std::path::Path;

#[derive(Debug, Args)]
pub struct CssArgs {
    /// Page id or `.json` document
    pub page: String,

    /// Only this node's fragment
    #[arg(short, long)]
    pub node: Option<String>,

    /// Print fragments as JSON
    #[arg(long)]
    pub json: bool,
}

/// Print the responsive stylesheet fragments of a page
pub fn css(args: CssArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let (_, tree) = load_page(&config, cwd, &args.page)?;
    let evaluator = config.evaluator();

    let fragments: Vec<StyleFragment> = match &args.node {
        Some(node_id) => {
            let node = find_node(&tree, node_id).ok_or_else(|| anyhow!("Node not found: {}", node_id))?;
            evaluator.fragment_for(node).into_iter().collect()
        }
        None => evaluator.fragments(&tree),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&fragments)?);
        return Ok(());
    }

    for fragment in &fragments {
        println!("/* {} */", fragment.element_id);
        println!("{}", rules_to_css(&fragment.rules));
    }
    Ok(())
}
