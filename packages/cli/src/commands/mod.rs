pub mod compile;
pub mod css;
pub mod init;
pub mod render;
pub mod validate;

pub use compile::{compile, CompileArgs};
pub use css::{css, CssArgs};
pub use init::{init, InitArgs};
pub use render::{render, RenderArgs};
pub use validate::{validate, ValidateArgs};

use crate::config::Config;
use anyhow::{anyhow, Result};
use pagebuilder_editor::PageStore;
use pagebuilder_evaluator::parse_page;
use pagebuilder_model::Node;
use std::fs;
use std::path::Path;

/// A page argument names either a stored page or a `.json` page document
pub(crate) fn load_page(config: &Config, cwd: &Path, page: &str) -> Result<(String, Node)> {
    let path = cwd.join(page);
    if page.ends_with(".json") && path.is_file() {
        let source = fs::read_to_string(&path)?;
        let tree = parse_page(&source).map_err(|e| anyhow!("{}: {}", path.display(), e))?;
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(page)
            .to_string();
        return Ok((id, tree));
    }

    let tree = config
        .page_store(cwd)
        .load(page)?
        .ok_or_else(|| anyhow!("Page not found: {}", page))?;
    Ok((page.to_string(), tree))
}

/// Load one page, or every stored page when `page` is `None`
pub(crate) fn load_pages(config: &Config, cwd: &Path, page: Option<&str>) -> Result<Vec<(String, Node)>> {
    match page {
        Some(page) => Ok(vec![load_page(config, cwd, page)?]),
        None => config
            .page_store(cwd)
            .list()?
            .iter()
            .map(|id| load_page(config, cwd, id))
            .collect(),
    }
}
