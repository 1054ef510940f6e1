//! Background persistence
//!
//! Page writes run on the blocking pool so the workspace lock is never
//! held across disk IO. Each job is completed against its session, which
//! hands back the follow-up job when edits landed while it was in flight.

use crate::state::{AppState, StateError};
use pagebuilder_editor::{PersistenceError, SaveJob, SaveStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// Holds a session's in-flight slot for one job. Dropped before the
/// outcome is recorded, it abandons the job so the page can be saved again.
struct InFlight {
    state: Arc<AppState>,
    job: Option<SaveJob>,
}

impl InFlight {
    fn new(state: Arc<AppState>, job: SaveJob) -> Self {
        Self { state, job: Some(job) }
    }

    fn job(&self) -> Option<&SaveJob> {
        self.job.as_ref()
    }

    fn release(mut self) -> Option<SaveJob> {
        self.job.take()
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let Some(job) = self.job.take() else {
            return;
        };
        let Ok(mut ws) = self.state.lock() else {
            return;
        };
        if let Ok(pipeline) = ws.session_mut(&job.page_id) {
            pipeline.store_mut().abandon_save(&job);
        }
    }
}

/// Write `job` and any queued follow-ups. Returns the final save status.
///
/// The writes run on their own task, so the job is completed even when
/// the caller is cancelled.
#[instrument(skip_all, fields(page_id = %job.page_id, version = job.version))]
pub async fn persist(state: &Arc<AppState>, job: SaveJob) -> Result<SaveStatus, StateError> {
    tokio::spawn(write_jobs(state.clone(), job))
        .await
        .map_err(|e| StateError::Persistence(PersistenceError::Unavailable(e.to_string())))?
}

async fn write_jobs(state: Arc<AppState>, job: SaveJob) -> Result<SaveStatus, StateError> {
    let mut next = Some(job);
    let mut status = SaveStatus::Saving;

    while let Some(job) = next.take() {
        let guard = InFlight::new(state.clone(), job);
        let (page_id, tree) = match guard.job() {
            Some(job) => (job.page_id.clone(), job.tree.clone()),
            None => break,
        };
        let pages = state.lock()?.pages();

        let result = tokio::task::spawn_blocking(move || pages.save(&page_id, &tree))
            .await
            .unwrap_or_else(|e| Err(PersistenceError::Unavailable(e.to_string())));

        let Some(job) = guard.release() else {
            break;
        };
        let update = {
            let mut ws = state.lock()?;
            let Ok(pipeline) = ws.session_mut(&job.page_id) else {
                warn!("Session closed before save completed");
                break;
            };
            next = pipeline.store_mut().complete_save(&job, result);
            status = pipeline.store().save_status();
            ws.update_for(&job.page_id, Vec::new())
        };
        if let Some(update) = update {
            state.broadcast(update);
        }
    }

    Ok(status)
}

/// Start the save a page asks for, if any, and run it to completion
pub async fn save_page(state: &Arc<AppState>, page_id: &str, force: bool) -> Result<SaveStatus, StateError> {
    let job = {
        let mut ws = state.lock()?;
        let pipeline = ws.session_mut(page_id)?;
        match pipeline.store_mut().begin_save(force) {
            Some(job) => job,
            None => return Ok(pipeline.store().save_status()),
        }
    };
    persist(state, job).await
}

/// Write a session's edits now, without waiting for the debounce.
/// Returns whether the stored copy matches the session afterwards.
pub async fn flush_session(state: &Arc<AppState>, page_id: &str) -> Result<bool, StateError> {
    let clean = state.lock()?.session_mut(page_id)?.store().is_clean();
    if clean {
        return Ok(true);
    }
    save_page(state, page_id, true).await?;
    Ok(state.lock()?.session_mut(page_id)?.store().is_clean())
}

/// Persist every session whose debounce period has elapsed
pub async fn autosave_tick(state: &Arc<AppState>) -> Result<usize, StateError> {
    let jobs = state.lock()?.due_autosaves(Instant::now());
    let count = jobs.len();
    for job in jobs {
        let page_id = job.page_id.clone();
        match persist(state, job).await? {
            SaveStatus::Error => error!(page_id, "Autosave failed"),
            status => info!(page_id, %status, "Autosaved"),
        }
    }
    Ok(count)
}

/// Run [`autosave_tick`] every `period` until `shutdown` flips to true.
/// A tick in progress is finished before the task returns.
pub fn spawn_autosave(state: Arc<AppState>, period: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = autosave_tick(&state).await {
                        error!(error = %e, "Autosave stopped");
                        return;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Autosave stopped for shutdown");
                        return;
                    }
                }
            }
        }
    })
}
