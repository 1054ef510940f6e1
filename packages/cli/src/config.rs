use pagebuilder_compiler_html::CompileOptions;
use pagebuilder_editor::FilePageStore;
use pagebuilder_evaluator::{Evaluator, RenderConfig};
use pagebuilder_model::SchemaRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_CONFIG_NAME: &str = "pagebuilder.config.json";

/// Page builder project configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding `{pageId}.json` documents
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Where compiled pages are written
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub html: CompileOptions,
}

fn default_data_dir() -> String {
    "pages".to_string()
}

fn default_out_dir() -> String {
    "dist".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn data_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.data_dir)
    }

    pub fn out_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.out_dir)
    }

    pub fn page_store(&self, cwd: &Path) -> FilePageStore {
        FilePageStore::new(self.data_dir(cwd))
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::with_config(self.render.clone()).with_schema(Arc::new(SchemaRegistry::builtin()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            out_dir: default_out_dir(),
            render: RenderConfig::default(),
            html: CompileOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "dataDir": "content/pages",
            "outDir": "public",
            "render": { "tabletMaxWidth": 1024, "mobileMaxWidth": 600 },
            "html": { "lang": "de" }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_dir, "content/pages");
        assert_eq!(config.out_dir, "public");
        assert_eq!(config.render.tablet_max_width, 1024);
        assert_eq!(config.render.default_unit, "px");
        assert_eq!(config.html.lang, "de");
        assert!(config.html.pretty);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_dir, "pages");
        assert_eq!(config.out_dir, "dist");
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.data_dir(dir.path()), dir.path().join("pages"));
    }
}
