//! Storefront page builder server
//!
//! Hosts editor sessions over HTTP, persists pages with debounced
//! autosave and serves compiled pages to the live storefront.

pub mod autosave;
pub mod server;
pub mod state;

pub use autosave::{autosave_tick, flush_session, persist, save_page, spawn_autosave};
pub use server::{router, ServerError};
pub use state::{AppState, PageUpdate, StateError, WorkspaceState};
