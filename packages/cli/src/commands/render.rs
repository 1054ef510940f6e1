use super::load_page;
use crate::config::Config;
use anyhow::Result;
use clap::{Args, ValueEnum};
use pagebuilder_evaluator::EvalContext;
use pagebuilder_model::Breakpoint;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Device {
    Desktop,
    Tablet,
    Mobile,
}

impl From<Device> for Breakpoint {
    fn from(device: Device) -> Self {
        match device {
            Device::Desktop => Breakpoint::Desktop,
            Device::Tablet => Breakpoint::Tablet,
            Device::Mobile => Breakpoint::Mobile,
        }
    }
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Page id or `.json` document
    pub page: String,

    /// Render the editor canvas for a device instead of the live page
    #[arg(short, long, value_enum)]
    pub device: Option<Device>,

    /// Write the render tree here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Print the render tree (VDOM + fragments) of a page as JSON
pub fn render(args: RenderArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let (_, tree) = load_page(&config, cwd, &args.page)?;

    let ctx = match args.device {
        Some(device) => EvalContext::editor(device.into()),
        None => EvalContext::live(),
    };
    let doc = config.evaluator().evaluate(&tree, &ctx);
    let json = serde_json::to_string_pretty(&doc)?;

    match &args.out {
        Some(out) => fs::write(cwd.join(out), json)?,
        None => println!("{}", json),
    }
    Ok(())
}
