//! Page storage backends.
//!
//! Pages are stored as `{ "tree": Node }` documents keyed by page id.

use pagebuilder_model::{Node, PageDocument};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed page document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid page id: {0:?}")]
    InvalidPageId(String),

    #[error("Page store unavailable: {0}")]
    Unavailable(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Where pages live between editing sessions
pub trait PageStore: Send + Sync {
    /// `Ok(None)` when the page has never been saved
    fn load(&self, page_id: &str) -> PersistenceResult<Option<Node>>;

    fn save(&self, page_id: &str, tree: &Node) -> PersistenceResult<()>;

    fn list(&self) -> PersistenceResult<Vec<String>>;
}

/// Page ids become file names: letters, digits, `-` and `_` only
pub fn validate_page_id(page_id: &str) -> PersistenceResult<()> {
    let valid = !page_id.is_empty()
        && page_id.len() <= 128
        && page_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidPageId(page_id.to_string()))
    }
}

/// In-process store, used by tests and the `--memory` server mode
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: Mutex<HashMap<String, Node>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page_id: impl Into<String>, tree: Node) -> Self {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(page_id.into(), tree);
        }
        self
    }

    /// Make every following save fail until switched off again
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    fn pages(&self) -> PersistenceResult<std::sync::MutexGuard<'_, HashMap<String, Node>>> {
        self.pages
            .lock()
            .map_err(|_| PersistenceError::Unavailable("page map lock poisoned".to_string()))
    }
}

impl PageStore for MemoryPageStore {
    fn load(&self, page_id: &str) -> PersistenceResult<Option<Node>> {
        Ok(self.pages()?.get(page_id).cloned())
    }

    fn save(&self, page_id: &str, tree: &Node) -> PersistenceResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("simulated save failure".to_string()));
        }
        self.pages()?.insert(page_id.to_string(), tree.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn list(&self) -> PersistenceResult<Vec<String>> {
        let mut ids: Vec<String> = self.pages()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// One `{pageId}.json` file per page under a data directory
#[derive(Debug, Clone)]
pub struct FilePageStore {
    dir: PathBuf,
}

impl FilePageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, page_id: &str) -> PersistenceResult<PathBuf> {
        validate_page_id(page_id)?;
        Ok(self.dir.join(format!("{}.json", page_id)))
    }
}

impl PageStore for FilePageStore {
    fn load(&self, page_id: &str) -> PersistenceResult<Option<Node>> {
        let path = self.path_for(page_id)?;
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let doc: PageDocument = serde_json::from_str(&source)?;
        Ok(Some(doc.tree))
    }

    fn save(&self, page_id: &str, tree: &Node) -> PersistenceResult<()> {
        let path = self.path_for(page_id)?;
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(&PageDocument::new(tree.clone()))?;
        // write then rename so readers never see a partial file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), "Wrote page");
        Ok(())
    }

    fn list(&self) -> PersistenceResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_page_id(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
