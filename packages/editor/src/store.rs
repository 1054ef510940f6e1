//! # Builder State Store
//!
//! Single owner of the page being edited: the current root plus selection,
//! previewed device, save status and history.
//!
//! ## Save lifecycle
//!
//! ```text
//!  idle ──edit──▶ unsaved ──begin_save──▶ saving ──ok──▶ saved
//!                   ▲                       │  └──err──▶ error
//!                   └──────────edit─────────┴──────────────┘
//! ```
//!
//! - Commands that change nothing (stale ids, no-op edits) leave the
//!   status untouched.
//! - At most one save is in flight. A save requested meanwhile is queued
//!   and re-issued with the latest tree when the current one completes,
//!   so an older snapshot can never land after a newer one.
//! - A failed save keeps the in-memory tree; the user can retry.
//! - A save whose write never reports back is released with
//!   [`BuilderStore::abandon_save`], leaving the page unsaved.
//!
//! Saving is split into [`BuilderStore::begin_save`] and
//! [`BuilderStore::complete_save`] so the I/O can run wherever the host
//! likes (a blocking task, a test double); [`BuilderStore::save`] runs
//! both against a [`PageStore`] synchronously.

use crate::errors::EditorError;
use crate::mutations::{Mutation, MutationError};
use crate::persistence::{PageStore, PersistenceError};
use crate::undo_stack::UndoStack;
use pagebuilder_model::{contains_node, make_root, Breakpoint, IdGenerator, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Unsaved,
    Saving,
    Saved,
    Error,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Unsaved => "unsaved",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Quiet period after the last edit before autosave fires
    pub autosave_debounce_ms: u64,

    /// Undo levels kept (0 = unlimited)
    pub history_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: 1000,
            history_limit: 100,
        }
    }
}

impl StoreConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

/// A snapshot handed to persistence
#[derive(Debug, Clone, PartialEq)]
pub struct SaveJob {
    pub page_id: String,
    /// Store version the snapshot was taken at
    pub version: u64,
    pub tree: Node,
}

/// What a command did
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Applied {
        version: u64,
        /// Node created by insert/duplicate
        created: Option<String>,
    },
    /// Nothing changed; save status untouched
    Ignored { reason: String },
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied { .. })
    }
}

/// Change notifications for subscribers (canvas, panels, autosave)
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    TreeChanged { version: u64 },
    SelectionChanged { node_id: Option<String> },
    DeviceChanged { device: Breakpoint },
    SaveStatusChanged { status: SaveStatus },
}

type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

pub struct BuilderStore {
    page_id: String,
    root: Node,
    selected: Option<String>,
    device: Breakpoint,
    save_status: SaveStatus,
    last_error: Option<String>,

    /// Bumped on every applied change
    version: u64,
    saved_version: Option<u64>,
    in_flight: Option<u64>,
    save_queued: bool,
    last_edit: Option<Instant>,

    history: UndoStack,
    ids: IdGenerator,
    config: StoreConfig,
    listeners: Vec<Listener>,
}

impl fmt::Debug for BuilderStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderStore")
            .field("page_id", &self.page_id)
            .field("version", &self.version)
            .field("save_status", &self.save_status)
            .field("selected", &self.selected)
            .field("device", &self.device)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl BuilderStore {
    pub fn new(page_id: impl Into<String>, root: Node, config: StoreConfig) -> Self {
        let page_id = page_id.into();
        Self {
            ids: IdGenerator::new(&page_id),
            history: UndoStack::with_max_levels(config.history_limit),
            page_id,
            root,
            selected: None,
            device: Breakpoint::Desktop,
            save_status: SaveStatus::Idle,
            last_error: None,
            version: 0,
            saved_version: None,
            in_flight: None,
            save_queued: false,
            last_edit: None,
            config,
            listeners: Vec::new(),
        }
    }

    /// Load a page, starting from an empty root if it was never saved
    #[instrument(skip(store, config))]
    pub fn load(page_id: &str, store: &dyn PageStore, config: StoreConfig) -> Result<Self, PersistenceError> {
        match store.load(page_id)? {
            Some(root) => {
                info!("Loaded page");
                Ok(Self::new(page_id, root, config))
            }
            None => {
                info!("Page not found, starting empty");
                let mut ids = IdGenerator::new(page_id);
                let root = make_root(&mut ids);
                let mut loaded = Self::new(page_id, root, config);
                loaded.ids = ids;
                Ok(loaded)
            }
        }
    }

    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn device(&self) -> Breakpoint {
        self.device
    }

    pub fn save_status(&self) -> SaveStatus {
        self.save_status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// Ids for nodes created by the caller before an insert
    pub fn id_generator(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    pub fn subscribe(&mut self, listener: impl Fn(&StoreEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&self, event: StoreEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    fn set_status(&mut self, status: SaveStatus) {
        if self.save_status != status {
            self.save_status = status;
            self.emit(StoreEvent::SaveStatusChanged { status });
        }
    }

    /// Swap in a new root, mark it unsaved and drop a selection that no
    /// longer exists
    fn replace_root(&mut self, root: Node) {
        self.root = root;
        self.version += 1;
        self.last_edit = Some(Instant::now());
        self.emit(StoreEvent::TreeChanged { version: self.version });
        self.set_status(SaveStatus::Unsaved);

        if let Some(selected) = &self.selected {
            if !contains_node(&self.root, selected) {
                self.selected = None;
                self.emit(StoreEvent::SelectionChanged { node_id: None });
            }
        }
    }

    /// Apply an editor command
    #[instrument(skip_all, fields(page_id = %self.page_id, mutation = mutation.name(), target = mutation.target_id()))]
    pub fn apply(&mut self, mutation: &Mutation) -> CommandOutcome {
        match mutation.apply(&self.root, &mut self.ids) {
            Ok(applied) => {
                self.history.record(&self.root, Some(mutation.name()));
                self.replace_root(applied.root);
                CommandOutcome::Applied {
                    version: self.version,
                    created: applied.created,
                }
            }
            Err(MutationError::Unchanged) => {
                debug!("Command changed nothing");
                CommandOutcome::Ignored {
                    reason: MutationError::Unchanged.to_string(),
                }
            }
            Err(e) => {
                debug!(error = %e, "Ignoring command");
                CommandOutcome::Ignored { reason: e.to_string() }
            }
        }
    }

    /// Like [`apply`](Self::apply) but surfaces the rejection reason
    pub fn try_apply(&mut self, mutation: &Mutation) -> Result<CommandOutcome, EditorError> {
        mutation.validate(&self.root)?;
        Ok(self.apply(mutation))
    }

    /// Apply several commands as one undo step
    pub fn apply_batch(&mut self, mutations: &[Mutation], description: Option<&str>) -> Vec<CommandOutcome> {
        self.history.begin_batch();
        let outcomes = mutations.iter().map(|m| self.apply(m)).collect();
        self.history.end_batch(description);
        outcomes
    }

    /// Select a node, or clear the selection with `None`.
    /// Selecting an unknown id is ignored.
    pub fn select_node(&mut self, node_id: Option<&str>) -> bool {
        if let Some(id) = node_id {
            if !contains_node(&self.root, id) {
                debug!(node_id = id, "Ignoring selection of unknown node");
                return false;
            }
        }
        let next = node_id.map(str::to_string);
        if next != self.selected {
            self.selected = next.clone();
            self.emit(StoreEvent::SelectionChanged { node_id: next });
        }
        true
    }

    pub fn set_device(&mut self, device: Breakpoint) {
        if self.device != device {
            self.device = device;
            self.emit(StoreEvent::DeviceChanged { device });
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.root) {
            Some(previous) => {
                self.replace_root(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.root) {
            Some(next) => {
                self.replace_root(next);
                true
            }
            None => false,
        }
    }

    /// Start a save if one is due.
    ///
    /// Without `force` only an unsaved page is persisted. While another
    /// save is in flight the request is queued and `None` is returned.
    pub fn begin_save(&mut self, force: bool) -> Option<SaveJob> {
        let wanted = force || self.save_status == SaveStatus::Unsaved;
        if !wanted {
            return None;
        }

        if self.in_flight.is_some() {
            debug!(page_id = %self.page_id, "Save in flight, queueing");
            self.save_queued = true;
            return None;
        }

        self.in_flight = Some(self.version);
        self.set_status(SaveStatus::Saving);
        Some(SaveJob {
            page_id: self.page_id.clone(),
            version: self.version,
            tree: self.root.clone(),
        })
    }

    /// Record the outcome of `job`. Returns the follow-up job when a save
    /// was queued and the page changed since `job` was taken.
    pub fn complete_save(&mut self, job: &SaveJob, result: Result<(), PersistenceError>) -> Option<SaveJob> {
        if self.in_flight != Some(job.version) {
            warn!(page_id = %self.page_id, version = job.version, "Ignoring completion of unknown save");
            return None;
        }
        self.in_flight = None;
        let queued = std::mem::take(&mut self.save_queued);

        match result {
            Ok(()) => {
                info!(page_id = %self.page_id, version = job.version, "Page saved");
                self.saved_version = Some(job.version);
                self.last_error = None;

                if self.version == job.version {
                    self.set_status(SaveStatus::Saved);
                    None
                } else {
                    self.set_status(SaveStatus::Unsaved);
                    if queued {
                        self.begin_save(false)
                    } else {
                        None
                    }
                }
            }
            Err(e) => {
                error!(page_id = %self.page_id, error = %e, "Page save failed");
                self.last_error = Some(e.to_string());
                self.set_status(SaveStatus::Error);
                None
            }
        }
    }

    /// Give up on `job` without an outcome, e.g. when the write was
    /// cancelled. The page is left unsaved so the next save retries it.
    pub fn abandon_save(&mut self, job: &SaveJob) -> bool {
        if self.in_flight != Some(job.version) {
            return false;
        }
        warn!(page_id = %self.page_id, version = job.version, "Save abandoned");
        self.in_flight = None;
        self.save_queued = false;
        self.last_edit = Some(Instant::now());
        self.set_status(SaveStatus::Unsaved);
        true
    }

    /// Persist synchronously, following queued saves until none remain
    pub fn save(&mut self, force: bool, store: &dyn PageStore) -> SaveStatus {
        let mut next = self.begin_save(force);
        while let Some(job) = next {
            let result = store.save(&job.page_id, &job.tree);
            next = self.complete_save(&job, result);
        }
        self.save_status
    }

    /// Autosave job once edits have been quiet for the debounce period
    pub fn poll_autosave(&mut self, now: Instant) -> Option<SaveJob> {
        if self.save_status != SaveStatus::Unsaved || self.in_flight.is_some() {
            return None;
        }
        let last_edit = self.last_edit?;
        if now.saturating_duration_since(last_edit) < self.config.debounce() {
            return None;
        }
        self.begin_save(false)
    }

    /// Whether the persisted copy matches the current tree
    pub fn is_clean(&self) -> bool {
        self.saved_version == Some(self.version) || (self.version == 0 && self.saved_version.is_none())
    }
}
