use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::draft::ConfirmChoice;
use crate::gateway::{JsonFileGateway, ReportGateway, ReportGroup};
use crate::grid::{CellRef, Direction};
use crate::prefs::Theme;
use crate::row::{Field, ReportRow, Totals};
use crate::session::{ExportKind, Notice, Outcome, ReportSession, execute_save};
use crate::storage::FileStore;

const SETUP_MESSAGE: &str = "Report backend is not configured. Set ACHOT_DATABASE_DIR and ACHOT_USER and restart.";

pub struct Backend {
    gateway: JsonFileGateway,
    session: Mutex<ReportSession<FileStore>>,
}

/// Shared server state. `backend` is `None` until configuration is valid;
/// every API call then answers 503.
pub struct AppState {
    backend: Option<Backend>,
    setup_error: Option<String>,
}

impl AppState {
    /// Open the gateway and the draft store described by `config`.
    ///
    /// An invalid configuration is not an error here; it puts the server in
    /// setup mode instead.
    pub fn from_config(config: &AppConfig) -> Result<Self, crate::Error> {
        if let Err(e) = config.validate() {
            log::warn!("starting in setup mode: {}", e);
            return Ok(AppState {
                backend: None,
                setup_error: Some(e.to_string()),
            });
        }
        let Some(dir) = &config.database_dir else {
            return Ok(AppState {
                backend: None,
                setup_error: Some(SETUP_MESSAGE.to_string()),
            });
        };
        let gateway = JsonFileGateway::open(dir)?;
        let store = FileStore::open(&config.draft_file)?;
        let session = ReportSession::open(store, &config.user)?;
        Ok(AppState {
            backend: Some(Backend {
                gateway,
                session: Mutex::new(session),
            }),
            setup_error: None,
        })
    }

    fn backend(&self) -> Result<&Backend, Response> {
        self.backend.as_ref().ok_or_else(|| {
            let message = self
                .setup_error
                .clone()
                .unwrap_or_else(|| SETUP_MESSAGE.to_string());
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(StatusResponse {
                    configured: false,
                    message: Some(message),
                }),
            )
                .into_response()
        })
    }
}

#[derive(Serialize)]
struct StatusResponse {
    configured: bool,
    message: Option<String>,
}

/// Everything the page needs to redraw after an action.
#[derive(Serialize)]
struct SessionView {
    report_name: String,
    report_date: NaiveDate,
    active_group_id: Option<String>,
    rows: Vec<ReportRow>,
    itog: Vec<i64>,
    totals: Totals,
    selection: Vec<usize>,
    focus: Option<CellRef>,
    unsaved: bool,
    saving: bool,
    theme: Theme,
    notices: Vec<Notice>,
}

#[derive(Serialize)]
struct ActionResponse {
    outcome: Outcome,
    session: SessionView,
}

#[derive(Deserialize)]
struct CellUpdate {
    row: usize,
    field: Field,
    value: String,
}

#[derive(Deserialize)]
struct NavigateRequest {
    row: usize,
    field: Field,
    direction: Direction,
}

#[derive(Deserialize)]
struct AppendRequest {
    count: usize,
}

#[derive(Deserialize)]
struct IndexRequest {
    index: usize,
}

#[derive(Deserialize)]
struct MetaUpdate {
    name: Option<String>,
    date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct ReportQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
struct LoadRequest {
    id: String,
}

#[derive(Deserialize)]
struct ConfirmRequest {
    choice: ConfirmChoice,
}

#[derive(Deserialize)]
struct ThemeRequest {
    theme: Theme,
}

fn view(session: &mut ReportSession<FileStore>) -> SessionView {
    let rows = session.rows().to_vec();
    SessionView {
        report_name: session.report_name().to_string(),
        report_date: session.report_date(),
        active_group_id: session.active_group_id().map(str::to_string),
        itog: rows.iter().map(crate::row::calculate_itog).collect(),
        rows,
        totals: session.totals(),
        selection: session.grid().selection().iter().copied().collect(),
        focus: session.grid().focus(),
        unsaved: session.has_unsaved_changes(),
        saving: session.is_saving(),
        theme: session.ui().theme,
        notices: session.take_notices(),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/session", get(get_session))
        .route("/api/cell", post(update_cell))
        .route("/api/navigate", post(navigate))
        .route("/api/rows/append", post(append_rows))
        .route("/api/rows/delete", post(delete_row))
        .route("/api/rows/delete_selected", post(delete_selected))
        .route("/api/selection/toggle", post(toggle_row))
        .route("/api/selection/toggle_all", post(toggle_all))
        .route("/api/meta", post(update_meta))
        .route("/api/theme", post(set_theme))
        .route("/api/save", post(save_report))
        .route("/api/reports", get(list_reports))
        .route("/api/reports/load", post(load_report))
        .route("/api/reports/new", post(new_report))
        .route("/api/reports/:id", delete(delete_report))
        .route("/api/confirm", post(confirm))
        .route("/api/export/:kind", get(export_report))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind = config.bind_addr()?;
    let state = Arc::new(AppState::from_config(&config)?);
    let app = router(state);

    let listener = TcpListener::bind(bind).await?;
    log::info!("server running at http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatusResponse {
        configured: state.backend.is_some(),
        message: state.setup_error.clone(),
    })
}

async fn get_session(State(state): State<Arc<AppState>>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    Json(view(&mut session)).into_response()
}

async fn update_cell(State(state): State<Arc<AppState>>, Json(payload): Json<CellUpdate>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    session.edit_cell(payload.row, payload.field, &payload.value);
    Json(view(&mut session)).into_response()
}

async fn navigate(State(state): State<Arc<AppState>>, Json(payload): Json<NavigateRequest>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    session.navigate(payload.row, payload.field, payload.direction);
    Json(view(&mut session)).into_response()
}

async fn append_rows(State(state): State<Arc<AppState>>, Json(payload): Json<AppendRequest>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    session.append_rows(payload.count);
    Json(view(&mut session)).into_response()
}

async fn delete_row(State(state): State<Arc<AppState>>, Json(payload): Json<IndexRequest>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    session.delete_row(payload.index);
    Json(view(&mut session)).into_response()
}

async fn delete_selected(State(state): State<Arc<AppState>>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    session.delete_selected();
    Json(view(&mut session)).into_response()
}

async fn toggle_row(State(state): State<Arc<AppState>>, Json(payload): Json<IndexRequest>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    session.toggle_row(payload.index);
    Json(view(&mut session)).into_response()
}

async fn toggle_all(State(state): State<Arc<AppState>>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    session.toggle_all();
    Json(view(&mut session)).into_response()
}

async fn update_meta(State(state): State<Arc<AppState>>, Json(payload): Json<MetaUpdate>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    if let Some(name) = payload.name {
        session.set_report_name(&name);
    }
    if let Some(date) = payload.date {
        session.set_report_date(date);
    }
    Json(view(&mut session)).into_response()
}

async fn set_theme(State(state): State<Arc<AppState>>, Json(payload): Json<ThemeRequest>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    session.set_theme(payload.theme);
    Json(view(&mut session)).into_response()
}

async fn save_report(State(state): State<Arc<AppState>>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    // The lock is released while the gateway works so edits keep flowing.
    let plan = backend.session.lock().await.begin_save();
    let Some(plan) = plan else {
        let mut session = backend.session.lock().await;
        return Json(view(&mut session)).into_response();
    };
    let result = execute_save(&backend.gateway, &plan).await;

    let mut session = backend.session.lock().await;
    session.finish_save(&plan, result);
    Json(view(&mut session)).into_response()
}

async fn list_reports(State(state): State<Arc<AppState>>, Query(params): Query<ReportQuery>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let query = params.q.unwrap_or_default();
    let mut session = backend.session.lock().await;
    let groups: Vec<ReportGroup> = session.list_reports(&backend.gateway, &query).await;
    Json(groups).into_response()
}

async fn load_report(State(state): State<Arc<AppState>>, Json(payload): Json<LoadRequest>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    let group = session
        .list_reports(&backend.gateway, "")
        .await
        .into_iter()
        .find(|g| g.id == payload.id);
    let Some(group) = group else {
        return (
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                configured: true,
                message: Some(format!("report {} not found", payload.id)),
            }),
        )
            .into_response();
    };
    let outcome = session.load_report(&backend.gateway, group).await;
    Json(ActionResponse {
        outcome,
        session: view(&mut session),
    })
    .into_response()
}

async fn new_report(State(state): State<Arc<AppState>>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    let outcome = session.new_report(&backend.gateway).await;
    Json(ActionResponse {
        outcome,
        session: view(&mut session),
    })
    .into_response()
}

async fn confirm(State(state): State<Arc<AppState>>, Json(payload): Json<ConfirmRequest>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    let outcome = session.confirm(&backend.gateway, payload.choice).await;
    Json(ActionResponse {
        outcome,
        session: view(&mut session),
    })
    .into_response()
}

async fn delete_report(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mut session = backend.session.lock().await;
    session.delete_report(&backend.gateway, &id).await;
    Json(view(&mut session)).into_response()
}

async fn export_report(State(state): State<Arc<AppState>>, Path(kind): Path<String>) -> Response {
    let backend = match state.backend() {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let kind = match kind.as_str() {
        "pdf" => ExportKind::Pdf,
        "xlsx" => ExportKind::Xlsx,
        "csv" => ExportKind::Csv,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    let mut session = backend.session.lock().await;
    match session.export(kind) {
        Some((file_name, bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, kind.content_type().to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            Body::from(Bytes::from(bytes)),
        )
            .into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, Json(view(&mut session))).into_response(),
    }
}
