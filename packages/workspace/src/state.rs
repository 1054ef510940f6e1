use pagebuilder_editor::{
    validate_page_id, BuilderStore, EditorPipeline, PageStore, PersistenceError, SaveJob, SaveStatus,
    StoreConfig,
};
use pagebuilder_evaluator::{Evaluator, FragmentPatch};
use pagebuilder_model::Node;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("No editor session open for page {0:?}")]
    SessionNotFound(String),

    #[error("Page {0:?} does not exist")]
    PageNotFound(String),

    #[error("Workspace state lock poisoned")]
    Poisoned,
}

/// Change notification pushed to preview subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageUpdate {
    pub page_id: String,
    pub version: u64,
    pub save_status: SaveStatus,
    pub fragment_patches: Vec<FragmentPatch>,
    pub timestamp: i64,
}

// Open editor sessions, one pipeline per page
pub struct WorkspaceState {
    pages: Arc<dyn PageStore>,
    evaluator: Evaluator,
    store_config: StoreConfig,
    sessions: HashMap<String, EditorPipeline>,
}

impl WorkspaceState {
    pub fn new(pages: Arc<dyn PageStore>, evaluator: Evaluator, store_config: StoreConfig) -> Self {
        Self {
            pages,
            evaluator,
            store_config,
            sessions: HashMap::new(),
        }
    }

    pub fn pages(&self) -> Arc<dyn PageStore> {
        Arc::clone(&self.pages)
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Session for `page_id`, loading the page on first use
    pub fn open(&mut self, page_id: &str) -> Result<&mut EditorPipeline, StateError> {
        if !self.sessions.contains_key(page_id) {
            validate_page_id(page_id)?;
            let store = BuilderStore::load(page_id, self.pages.as_ref(), self.store_config.clone())?;
            info!(page_id, "Opened editor session");
            self.sessions
                .insert(page_id.to_string(), EditorPipeline::new(store, self.evaluator.clone()));
        }
        self.session_mut(page_id)
    }

    pub fn session(&self, page_id: &str) -> Option<&EditorPipeline> {
        self.sessions.get(page_id)
    }

    pub fn session_mut(&mut self, page_id: &str) -> Result<&mut EditorPipeline, StateError> {
        self.sessions
            .get_mut(page_id)
            .ok_or_else(|| StateError::SessionNotFound(page_id.to_string()))
    }

    /// Close a session, releasing its fragments. Unsaved edits are
    /// discarded; flush the session first to keep them.
    pub fn close(&mut self, page_id: &str) -> Result<Vec<FragmentPatch>, StateError> {
        let mut pipeline = self
            .sessions
            .remove(page_id)
            .ok_or_else(|| StateError::SessionNotFound(page_id.to_string()))?;
        if !pipeline.store().is_clean() {
            warn!(page_id, status = %pipeline.store().save_status(), "Closing session with unsaved edits");
        }
        Ok(pipeline.unmount())
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Current tree: the open session's if any, otherwise the stored copy
    pub fn tree(&self, page_id: &str) -> Result<Node, StateError> {
        if let Some(pipeline) = self.sessions.get(page_id) {
            return Ok(pipeline.store().root().clone());
        }
        validate_page_id(page_id)?;
        self.pages
            .load(page_id)?
            .ok_or_else(|| StateError::PageNotFound(page_id.to_string()))
    }

    /// Save jobs for every session whose edits have gone quiet
    pub fn due_autosaves(&mut self, now: Instant) -> Vec<SaveJob> {
        let jobs: Vec<SaveJob> = self
            .sessions
            .values_mut()
            .filter_map(|pipeline| pipeline.store_mut().poll_autosave(now))
            .collect();
        if !jobs.is_empty() {
            debug!(count = jobs.len(), "Autosave due");
        }
        jobs
    }

    pub fn update_for(&self, page_id: &str, fragment_patches: Vec<FragmentPatch>) -> Option<PageUpdate> {
        let store = self.sessions.get(page_id)?.store();
        Some(PageUpdate {
            page_id: page_id.to_string(),
            version: store.version(),
            save_status: store.save_status(),
            fragment_patches,
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }
}

/// State shared by HTTP handlers and the autosave task
pub struct AppState {
    workspace: Mutex<WorkspaceState>,
    updates: broadcast::Sender<PageUpdate>,
}

impl AppState {
    pub fn new(workspace: WorkspaceState) -> Arc<Self> {
        let (updates, _) = broadcast::channel(256);
        Arc::new(Self {
            workspace: Mutex::new(workspace),
            updates,
        })
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, WorkspaceState>, StateError> {
        self.workspace.lock().map_err(|_| StateError::Poisoned)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageUpdate> {
        self.updates.subscribe()
    }

    pub fn broadcast(&self, update: PageUpdate) {
        // no receivers is fine
        let _ = self.updates.send(update);
    }
}
