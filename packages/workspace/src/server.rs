//! HTTP API for the editor canvas and the live storefront
//!
//! Page routes (`/pages/:id/...`) store and render pages. Editor routes
//! (`/editor/:id/...`) drive an open session and answer with the canvas
//! VDOM plus the fragment patches the host document must apply.
//! `/editor/:id/events` streams the same patches over SSE.

use crate::autosave::{flush_session, save_page};
use crate::state::{AppState, PageUpdate, StateError};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use pagebuilder_compiler_html::{compile_page, CompileError, CompileOptions};
use pagebuilder_editor::{
    validate_page_id, CommandOutcome, EditorPipeline, Mutation, PersistenceError, SaveStatus,
};
use pagebuilder_evaluator::{rules_to_css, EvalContext, FragmentPatch, VirtualDomDocument};
use pagebuilder_model::{validate, Breakpoint, PageDocument};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Node {0:?} not found")]
    NodeNotFound(String),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Page {0:?} is open in the editor")]
    SessionOpen(String),

    #[error("Page {0:?} has edits that could not be saved")]
    UnsavedEdits(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::State(StateError::SessionNotFound(_))
            | ServerError::State(StateError::PageNotFound(_))
            | ServerError::NodeNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::State(StateError::Persistence(PersistenceError::InvalidPageId(_))) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Compile(_) | ServerError::InvalidPage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::SessionOpen(_) | ServerError::UnsavedEdits(_) => StatusCode::CONFLICT,
            ServerError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<T, ServerError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/pages", get(list_pages))
        .route("/pages/:page_id", get(get_page).post(put_page))
        .route("/pages/:page_id/render", get(render_page))
        .route("/pages/:page_id/html", get(page_html))
        .route("/pages/:page_id/css", get(page_css))
        .route("/editor/:page_id", get(open_session).delete(close_session))
        .route("/editor/:page_id/mutations", post(apply_mutations))
        .route("/editor/:page_id/select", post(select_node))
        .route("/editor/:page_id/device", post(set_device))
        .route("/editor/:page_id/undo", post(undo))
        .route("/editor/:page_id/redo", post(redo))
        .route("/editor/:page_id/save", post(save))
        .route("/editor/:page_id/events", get(events))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Live pages
// ============================================================================

async fn list_pages(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<String>>> {
    let pages = state.lock()?.pages();
    let ids = tokio::task::spawn_blocking(move || pages.list())
        .await
        .unwrap_or_else(|e| Err(PersistenceError::Unavailable(e.to_string())))
        .map_err(StateError::from)?;
    Ok(Json(ids))
}

async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
) -> ApiResult<Json<PageDocument>> {
    let tree = state.lock()?.tree(&page_id)?;
    Ok(Json(PageDocument::new(tree)))
}

#[derive(Debug, Serialize)]
struct SavedBody {
    saved: bool,
}

/// Store a page document outright. Pages open in the editor are refused
/// so a session never silently overwrites the stored copy.
async fn put_page(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Json(doc): Json<PageDocument>,
) -> ApiResult<Json<SavedBody>> {
    let errors: Vec<String> = validate(&doc.tree)
        .into_iter()
        .filter(|issue| issue.is_error())
        .map(|issue| issue.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(ServerError::InvalidPage(errors.join("; ")));
    }

    let pages = {
        let ws = state.lock()?;
        if ws.session(&page_id).is_some() {
            return Err(ServerError::SessionOpen(page_id));
        }
        ws.pages()
    };
    validate_page_id(&page_id).map_err(StateError::from)?;

    let id = page_id.clone();
    tokio::task::spawn_blocking(move || pages.save(&id, &doc.tree))
        .await
        .unwrap_or_else(|e| Err(PersistenceError::Unavailable(e.to_string())))
        .map_err(StateError::from)?;
    info!(page_id, "Stored page");
    Ok(Json(SavedBody { saved: true }))
}

#[derive(Debug, Deserialize)]
struct HtmlQuery {
    title: Option<String>,
}

async fn page_html(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Query(query): Query<HtmlQuery>,
) -> ApiResult<Response> {
    let html = {
        let ws = state.lock()?;
        let tree = ws.tree(&page_id)?;
        let options = CompileOptions {
            title: query.title.unwrap_or_else(|| page_id.clone()),
            ..Default::default()
        };
        compile_page(&tree, ws.evaluator(), options)?
    };
    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response())
}

async fn page_css(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
) -> ApiResult<Response> {
    let css = {
        let ws = state.lock()?;
        let tree = ws.tree(&page_id)?;
        let rules: Vec<_> = ws
            .evaluator()
            .fragments(&tree)
            .into_iter()
            .flat_map(|f| f.rules)
            .collect();
        rules_to_css(&rules)
    };
    Ok(([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css).into_response())
}

#[derive(Debug, Deserialize)]
struct RenderQuery {
    /// Absent renders the live page
    device: Option<Breakpoint>,
}

/// Render tree for a device, leaving any session's fragments alone
async fn render_page(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Query(query): Query<RenderQuery>,
) -> ApiResult<Json<VirtualDomDocument>> {
    let ws = state.lock()?;
    let tree = ws.tree(&page_id)?;
    let ctx = match query.device {
        Some(device) => EvalContext::editor(device),
        None => EvalContext::live(),
    };
    Ok(Json(ws.evaluator().evaluate(&tree, &ctx)))
}

// ============================================================================
// Editor sessions
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeView {
    applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl From<&CommandOutcome> for OutcomeView {
    fn from(outcome: &CommandOutcome) -> Self {
        match outcome {
            CommandOutcome::Applied { created, .. } => Self {
                applied: true,
                created: created.clone(),
                reason: None,
            },
            CommandOutcome::Ignored { reason } => Self {
                applied: false,
                created: None,
                reason: Some(reason.clone()),
            },
        }
    }
}

/// Everything the canvas needs after a change
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    page_id: String,
    version: u64,
    save_status: SaveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    device: Breakpoint,
    selected: Option<String>,
    can_undo: bool,
    can_redo: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    outcomes: Vec<OutcomeView>,
    vdom: VirtualDomDocument,
    fragment_patches: Vec<FragmentPatch>,
}

fn session_view(
    pipeline: &EditorPipeline,
    outcomes: &[CommandOutcome],
    vdom: VirtualDomDocument,
    fragment_patches: Vec<FragmentPatch>,
) -> SessionView {
    let store = pipeline.store();
    SessionView {
        page_id: store.page_id().to_string(),
        version: store.version(),
        save_status: store.save_status(),
        last_error: store.last_error().map(str::to_string),
        device: store.device(),
        selected: store.selected().map(str::to_string),
        can_undo: store.history().can_undo(),
        can_redo: store.history().can_redo(),
        outcomes: outcomes.iter().map(OutcomeView::from).collect(),
        vdom,
        fragment_patches,
    }
}

/// Run `f` against the page's session and render the result. Fragment
/// patches are broadcast to event subscribers as well.
fn with_session<F>(state: &AppState, page_id: &str, open: bool, f: F) -> ApiResult<Json<SessionView>>
where
    F: FnOnce(&mut EditorPipeline) -> Vec<CommandOutcome>,
{
    let (view, update) = {
        let mut ws = state.lock()?;
        let pipeline = if open { ws.open(page_id)? } else { ws.session_mut(page_id)? };
        let outcomes = f(pipeline);
        let (vdom, patches) = pipeline.render();
        let view = session_view(pipeline, &outcomes, vdom, patches.clone());
        (view, ws.update_for(page_id, patches))
    };
    if let Some(update) = update {
        state.broadcast(update);
    }
    Ok(Json(view))
}

async fn open_session(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    with_session(&state, &page_id, true, |_| Vec::new())
}

async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
) -> ApiResult<Json<Vec<FragmentPatch>>> {
    if !flush_session(&state, &page_id).await? {
        return Err(ServerError::UnsavedEdits(page_id));
    }
    let patches = state.lock()?.close(&page_id)?;
    info!(page_id, "Closed editor session");
    Ok(Json(patches))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationRequest {
    mutations: Vec<Mutation>,
    description: Option<String>,
}

async fn apply_mutations(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Json(request): Json<MutationRequest>,
) -> ApiResult<Json<SessionView>> {
    with_session(&state, &page_id, true, |pipeline| match request.mutations.as_slice() {
        [single] => vec![pipeline.store_mut().apply(single)],
        batch => pipeline
            .store_mut()
            .apply_batch(batch, request.description.as_deref()),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectRequest {
    node_id: Option<String>,
}

async fn select_node(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<Json<SessionView>> {
    let mut missing = None;
    let view = with_session(&state, &page_id, false, |pipeline| {
        if !pipeline.store_mut().select_node(request.node_id.as_deref()) {
            missing = request.node_id.clone();
        }
        Vec::new()
    })?;
    match missing {
        Some(node_id) => Err(ServerError::NodeNotFound(node_id)),
        None => Ok(view),
    }
}

#[derive(Debug, Deserialize)]
struct DeviceRequest {
    device: Breakpoint,
}

async fn set_device(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Json(request): Json<DeviceRequest>,
) -> ApiResult<Json<SessionView>> {
    with_session(&state, &page_id, false, |pipeline| {
        pipeline.store_mut().set_device(request.device);
        Vec::new()
    })
}

async fn undo(State(state): State<Arc<AppState>>, Path(page_id): Path<String>) -> ApiResult<Json<SessionView>> {
    with_session(&state, &page_id, false, |pipeline| {
        pipeline.store_mut().undo();
        Vec::new()
    })
}

async fn redo(State(state): State<Arc<AppState>>, Path(page_id): Path<String>) -> ApiResult<Json<SessionView>> {
    with_session(&state, &page_id, false, |pipeline| {
        pipeline.store_mut().redo();
        Vec::new()
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SaveRequest {
    force: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    save_status: SaveStatus,
    version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

async fn save(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    request: Option<Json<SaveRequest>>,
) -> ApiResult<Json<SaveResponse>> {
    let force = request.map(|Json(r)| r.force).unwrap_or_default();
    let save_status = save_page(&state, &page_id, force).await?;

    let ws = state.lock()?;
    let store = ws
        .session(&page_id)
        .ok_or_else(|| StateError::SessionNotFound(page_id.clone()))?
        .store();
    Ok(Json(SaveResponse {
        save_status,
        version: store.version(),
        last_error: store.last_error().map(str::to_string),
    }))
}

/// SSE stream of updates for one page
async fn events(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let initial = {
        let mut ws = state.lock()?;
        let pipeline = ws.open(&page_id)?;
        let fragments = pipeline.evaluator().fragments(pipeline.store().root());
        let patches = fragments
            .into_iter()
            .map(|fragment| FragmentPatch::Insert { fragment })
            .collect();
        ws.update_for(&page_id, patches)
    };
    info!(page_id, "Starting event stream");

    let initial_stream = stream::iter(initial.map(|u| Ok::<_, Infallible>(to_event(&u))));
    let rx = state.subscribe();
    let updates = stream::unfold((page_id, rx), |(page_id, mut rx)| async move {
        loop {
            match rx.recv().await {
                Ok(update) if update.page_id == page_id => {
                    let event = to_event(&update);
                    return Some((Ok(event), (page_id, rx)));
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(page_id, skipped = n, "Event subscriber lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(initial_stream.chain(updates))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping")))
}

fn to_event(update: &PageUpdate) -> Event {
    let json = serde_json::to_string(update).unwrap_or_default();
    Event::default().event("update").data(json)
}
