//! # Page Builder Editor
//!
//! Editing engine for storefront pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Node tree + tree operations          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: builder store + mutations           │
//! │  - Validate and apply commands              │
//! │  - Undo/redo snapshots                      │
//! │  - Save status, coalesced/debounced saves   │
//! │  - Page storage (memory, files)             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ evaluator: tree → VDOM + style fragments    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the source of truth**: VDOM and fragments are derived
//! 2. **Commands never fail loudly**: stale ids and no-ops are ignored
//! 3. **Persistence is the only surfaced failure**, via `SaveStatus::Error`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagebuilder_editor::{BuilderStore, FilePageStore, Mutation, StoreConfig};
//!
//! let pages = FilePageStore::new("./pages");
//! let mut store = BuilderStore::load("home", &pages, StoreConfig::default())?;
//!
//! store.apply(&Mutation::DeleteNode { node_id: "abc-3".into() });
//! store.save(false, &pages);
//! ```

mod errors;
mod mutations;
mod persistence;
mod pipeline;
mod store;
mod undo_stack;

pub use errors::EditorError;
pub use mutations::{Applied, Mutation, MutationError};
pub use persistence::{
    validate_page_id, FilePageStore, MemoryPageStore, PageStore, PersistenceError, PersistenceResult,
};
pub use pipeline::{EditorPipeline, PipelineResult};
pub use store::{BuilderStore, CommandOutcome, SaveJob, SaveStatus, StoreConfig, StoreEvent};
pub use undo_stack::{Snapshot, UndoStack};
