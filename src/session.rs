use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::draft::{ConfirmChoice, DraftSnapshot, DraftTracker, Guard, PendingAction, Resolution};
use crate::export::{self, ExportDocument};
use crate::gateway::{GatewayError, ReportGateway, ReportGroup};
use crate::grid::{CellRef, Direction, Grid};
use crate::marquee::{Point, Press, RowLayout, Viewport};
use crate::prefs::{Theme, UiState};
use crate::row::{Field, ReportRow, Totals, filter_active_rows};
use crate::storage::{KeyValueStore, StorageError};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient user-visible message (toast).
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Result of a guarded action.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Done,
    /// Unsaved changes: ask the user, then call `confirm`.
    NeedsConfirmation,
    Cancelled,
    /// Gateway or validation failure; state unchanged, a notice explains why.
    Failed,
    /// The host should end the authenticated session.
    SignedOut,
}

/// Everything a save needs, captured when the save starts.
#[derive(Clone, Debug, PartialEq)]
pub struct SavePlan {
    pub group_id: Option<String>,
    pub name: String,
    pub date: NaiveDate,
    pub owner: String,
    pub rows: Vec<ReportRow>,
    revision: u64,
    generation: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SavedReport {
    pub group_id: String,
    pub rows: Vec<ReportRow>,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Pdf,
    Xlsx,
    Csv,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Pdf => "pdf",
            ExportKind::Xlsx => "xlsx",
            ExportKind::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportKind::Pdf => "application/pdf",
            ExportKind::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportKind::Csv => "text/csv",
        }
    }
}

/// Groups whose name (case-insensitive) or ISO date contains `query`.
pub fn filter_groups(groups: &[ReportGroup], query: &str) -> Vec<ReportGroup> {
    let query = query.trim().to_lowercase();
    groups
        .iter()
        .filter(|g| {
            g.name.to_lowercase().contains(&query)
                || g.report_date.format("%Y-%m-%d").to_string().contains(&query)
        })
        .cloned()
        .collect()
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// One user's editing session over a single report.
#[derive(Debug)]
pub struct ReportSession<S: KeyValueStore> {
    grid: Grid,
    tracker: DraftTracker<S>,
    ui: UiState,
    owner: String,
    report_name: String,
    report_date: NaiveDate,
    active_group_id: Option<String>,
    notices: Vec<Notice>,
    save_in_flight: bool,
    revision: u64,
    /// Bumped whenever a different report replaces the one being edited.
    generation: u64,
}

impl<S: KeyValueStore> ReportSession<S> {
    /// Fresh session with one empty row, ignoring any stored draft.
    pub fn new(store: S, owner: &str) -> Self {
        ReportSession {
            grid: Grid::new(),
            tracker: DraftTracker::new(store),
            ui: UiState::default(),
            owner: owner.to_string(),
            report_name: String::new(),
            report_date: today(),
            active_group_id: None,
            notices: Vec::new(),
            save_in_flight: false,
            revision: 0,
            generation: 0,
        }
    }

    /// Session start-up: load preferences and resume a stored draft if any.
    pub fn open(store: S, owner: &str) -> Result<Self, StorageError> {
        let mut session = ReportSession::new(store, owner);
        session.ui = UiState::load(session.tracker.store())?;
        if let Some(draft) = session.tracker.restore()? {
            session.grid.replace_rows(draft.rows);
            session.report_name = draft.report_name;
            session.report_date = draft.report_date;
            session.active_group_id = draft.active_group_id;
        }
        Ok(session)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rows(&self) -> &[ReportRow] {
        self.grid.rows()
    }

    pub fn totals(&self) -> Totals {
        self.grid.totals()
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn report_name(&self) -> &str {
        &self.report_name
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date
    }

    pub fn active_group_id(&self) -> Option<&str> {
        self.active_group_id.as_deref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.tracker.has_unsaved_changes()
    }

    pub fn confirm_before_unload(&self) -> bool {
        self.tracker.confirm_before_unload()
    }

    pub fn is_saving(&self) -> bool {
        self.save_in_flight
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn store(&self) -> &S {
        self.tracker.store()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            rows: self.grid.rows().to_vec(),
            report_name: self.report_name.clone(),
            report_date: self.report_date,
            active_group_id: self.active_group_id.clone(),
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if let Err(e) = self.ui.set_theme(theme, self.tracker.store()) {
            log::warn!("could not persist theme: {}", e);
        }
    }

    pub fn set_online(&mut self, online: bool) {
        self.ui.set_online(online);
    }

    // --- content edits: every one marks the session dirty ---

    pub fn edit_cell(&mut self, row: usize, field: Field, raw: &str) -> bool {
        let applied = self.grid.edit_cell(row, field, raw);
        if applied {
            self.touched();
        }
        applied
    }

    pub fn navigate(&mut self, row: usize, field: Field, direction: Direction) -> CellRef {
        let before = self.grid.len();
        let target = self.grid.navigate(row, field, direction);
        if self.grid.len() != before {
            self.touched();
        }
        target
    }

    pub fn append_rows(&mut self, count: usize) -> usize {
        let added = self.grid.append_rows(count);
        if added > 0 {
            self.touched();
        }
        added
    }

    pub fn delete_row(&mut self, index: usize) -> bool {
        let deleted = self.grid.delete_row(index);
        if deleted {
            self.touched();
        }
        deleted
    }

    pub fn delete_selected(&mut self) -> usize {
        let removed = self.grid.delete_selected();
        if removed > 0 {
            self.touched();
        }
        removed
    }

    pub fn set_report_name(&mut self, name: &str) {
        if self.report_name != name {
            self.report_name = name.to_string();
            self.touched();
        }
    }

    pub fn set_report_date(&mut self, date: NaiveDate) {
        if self.report_date != date {
            self.report_date = date;
            self.touched();
        }
    }

    // --- selection: never dirties ---

    pub fn toggle_row(&mut self, index: usize) {
        self.grid.toggle_row(index);
    }

    pub fn toggle_all(&mut self) {
        self.grid.toggle_all();
    }

    pub fn pointer_down(&mut self, press: &Press, viewport: &Viewport, layout: &impl RowLayout) -> bool {
        self.grid.pointer_down(press, viewport, layout)
    }

    pub fn pointer_move(&mut self, at: Point, viewport: &Viewport, layout: &impl RowLayout) {
        self.grid.pointer_move(at, viewport, layout);
    }

    pub fn pointer_up(&mut self) -> bool {
        self.grid.pointer_up()
    }

    pub fn auto_scroll_tick(&mut self, viewport: &mut Viewport, layout: &impl RowLayout) -> f64 {
        self.grid.auto_scroll_tick(viewport, layout)
    }

    fn touched(&mut self) {
        self.revision += 1;
        self.tracker.mark_dirty();
        self.sync_draft();
    }

    fn sync_draft(&self) {
        if let Err(e) = self.tracker.sync(&self.snapshot()) {
            log::warn!("draft not persisted: {}", e);
        }
    }

    fn mark_clean(&mut self) {
        if let Err(e) = self.tracker.mark_clean() {
            log::warn!("stale draft not removed: {}", e);
        }
    }

    // --- save ---

    /// Start a save. `None` with a notice when a save is already running,
    /// the report has no name, or the host is offline.
    pub fn begin_save(&mut self) -> Option<SavePlan> {
        if self.save_in_flight {
            log::debug!("save ignored, another save is pending");
            self.notices
                .push(Notice::error("Saqlash davom etmoqda, biroz kuting"));
            return None;
        }
        if self.report_name.trim().is_empty() {
            self.notices
                .push(Notice::error("Iltimos, hisobot nomini kiriting"));
            return None;
        }
        if !self.ui.online {
            self.notices
                .push(Notice::error("Saqlashda xatolik: internet aloqasi yo'q"));
            return None;
        }
        self.save_in_flight = true;
        Some(SavePlan {
            group_id: self.active_group_id.clone(),
            name: self.report_name.trim().to_string(),
            date: self.report_date,
            owner: self.owner.clone(),
            rows: filter_active_rows(self.grid.rows()),
            revision: self.revision,
            generation: self.generation,
        })
    }

    /// Apply the gateway's answer to a save started with `begin_save`.
    ///
    /// On failure nothing changes except a notice. On success the rows are
    /// replaced with their persisted form (fresh ids) unless they were edited
    /// while the save was in flight, in which case they stay unsaved. A
    /// report loaded, created or signed out of meanwhile is left untouched.
    pub fn finish_save(&mut self, plan: &SavePlan, result: Result<SavedReport, GatewayError>) -> bool {
        self.save_in_flight = false;
        match result {
            Ok(saved) if plan.generation != self.generation => {
                log::info!(
                    "saved report {} after it was replaced in the editor",
                    saved.group_id
                );
                self.notices.push(Notice::success("Muvaffaqiyatli saqlandi!"));
                true
            }
            Ok(saved) => {
                log::info!("saved report {} ({} rows)", saved.group_id, saved.rows.len());
                self.active_group_id = Some(saved.group_id);
                if self.revision == plan.revision {
                    let focus = self.grid.focus();
                    self.grid.replace_rows(saved.rows);
                    if let Some(cell) = focus {
                        self.grid.set_focus(cell);
                    }
                    self.mark_clean();
                } else {
                    self.sync_draft();
                }
                self.notices.push(Notice::success("Muvaffaqiyatli saqlandi!"));
                true
            }
            Err(e) => {
                log::error!("save failed: {}", e);
                self.notices
                    .push(Notice::error(format!("Saqlashda xatolik: {}", e)));
                false
            }
        }
    }

    pub async fn save<G: ReportGateway>(&mut self, gateway: &G) -> bool {
        let Some(plan) = self.begin_save() else {
            return false;
        };
        let result = execute_save(gateway, &plan).await;
        self.finish_save(&plan, result)
    }

    // --- guarded transitions ---

    pub async fn load_report<G: ReportGateway>(&mut self, gateway: &G, group: ReportGroup) -> Outcome {
        self.request(gateway, PendingAction::LoadReport(group)).await
    }

    pub async fn new_report<G: ReportGateway>(&mut self, gateway: &G) -> Outcome {
        self.request(gateway, PendingAction::NewReport).await
    }

    pub async fn sign_out<G: ReportGateway>(&mut self, gateway: &G) -> Outcome {
        self.request(gateway, PendingAction::SignOut).await
    }

    /// Run `action` now, or park it behind a confirmation prompt when there
    /// are unsaved changes.
    pub async fn request<G: ReportGateway>(&mut self, gateway: &G, action: PendingAction) -> Outcome {
        match self.tracker.guard(action) {
            Guard::Proceed(action) => self.perform(gateway, action).await,
            Guard::NeedsConfirmation => Outcome::NeedsConfirmation,
        }
    }

    /// The user's answer to the prompt raised by `request`.
    pub async fn confirm<G: ReportGateway>(&mut self, gateway: &G, choice: ConfirmChoice) -> Outcome {
        let resolution = match self.tracker.resolve(choice) {
            Ok(resolution) => resolution,
            Err(e) => {
                log::warn!("could not resolve pending action: {}", e);
                return Outcome::Failed;
            }
        };
        match resolution {
            Resolution::SaveThen(action) if self.save_in_flight => {
                self.notices
                    .push(Notice::error("Saqlash davom etmoqda, biroz kuting"));
                self.request(gateway, action).await
            }
            Resolution::SaveThen(action) => {
                if self.save(gateway).await {
                    self.perform(gateway, action).await
                } else {
                    Outcome::Failed
                }
            }
            Resolution::Proceed(action) => self.perform(gateway, action).await,
            Resolution::Cancelled | Resolution::Nothing => Outcome::Cancelled,
        }
    }

    async fn perform<G: ReportGateway>(&mut self, gateway: &G, action: PendingAction) -> Outcome {
        match action {
            PendingAction::LoadReport(group) => match gateway.list_rows(&group.id).await {
                Ok(rows) => {
                    log::info!("loaded report {} ({} rows)", group.id, rows.len());
                    self.grid.replace_rows(rows);
                    self.report_name = group.name;
                    self.report_date = group.report_date;
                    self.active_group_id = Some(group.id);
                    self.generation += 1;
                    self.mark_clean();
                    Outcome::Done
                }
                Err(e) => {
                    log::error!("load failed: {}", e);
                    self.notices
                        .push(Notice::error(format!("Yuklashda xatolik: {}", e)));
                    Outcome::Failed
                }
            },
            PendingAction::NewReport => {
                self.reset();
                self.grid.set_focus(CellRef::new(0, Field::first()));
                Outcome::Done
            }
            PendingAction::SignOut => {
                self.reset();
                Outcome::SignedOut
            }
        }
    }

    fn reset(&mut self) {
        self.grid.replace_rows(Vec::new());
        self.report_name.clear();
        self.report_date = today();
        self.active_group_id = None;
        self.generation += 1;
        self.mark_clean();
    }

    // --- report list ---

    pub async fn list_reports<G: ReportGateway>(&mut self, gateway: &G, query: &str) -> Vec<ReportGroup> {
        match gateway.list_groups().await {
            Ok(groups) => {
                let owned: Vec<ReportGroup> = groups
                    .into_iter()
                    .filter(|g| g.user_id == self.owner)
                    .collect();
                filter_groups(&owned, query)
            }
            Err(e) => {
                log::error!("listing reports failed: {}", e);
                self.notices
                    .push(Notice::error(format!("Yuklashda xatolik: {}", e)));
                Vec::new()
            }
        }
    }

    /// Delete a stored report. If it is the one being edited, the session
    /// keeps its rows as a new unsaved report.
    pub async fn delete_report<G: ReportGateway>(&mut self, gateway: &G, group_id: &str) -> bool {
        match gateway.delete_group(group_id).await {
            Ok(()) => {
                log::info!("deleted report {}", group_id);
                if self.active_group_id.as_deref() == Some(group_id) {
                    self.active_group_id = None;
                    let rows = self
                        .grid
                        .rows()
                        .iter()
                        .cloned()
                        .map(|row| ReportRow { id: None, ..row })
                        .collect();
                    self.grid.replace_rows(rows);
                    self.touched();
                }
                true
            }
            Err(e) => {
                log::error!("delete failed: {}", e);
                self.notices
                    .push(Notice::error(format!("O'chirishda xatolik: {}", e)));
                false
            }
        }
    }

    // --- export ---

    pub fn export_document(&self) -> ExportDocument {
        ExportDocument::new(&self.report_name, self.report_date, self.grid.rows()).with_owner(&self.owner)
    }

    /// Render the current report. Returns the download name and the bytes;
    /// on failure a notice is queued and `None` returned.
    pub fn export(&mut self, kind: ExportKind) -> Option<(String, Vec<u8>)> {
        let doc = self.export_document();
        let rendered = match kind {
            ExportKind::Pdf => export::render_pdf(&doc),
            ExportKind::Xlsx => export::render_spreadsheet(&doc),
            ExportKind::Csv => export::render_csv(&doc).map(String::into_bytes),
        };
        match rendered {
            Ok(bytes) => Some((doc.file_name(kind.extension()), bytes)),
            Err(e) => {
                log::error!("{} export failed: {}", kind.extension(), e);
                self.notices
                    .push(Notice::error(format!("Eksportda xatolik: {}", e)));
                None
            }
        }
    }
}

/// Push a save plan through the gateway
///
/// Creates the group on first save (otherwise updates its name and date),
/// replaces the group's rows with the plan's rows and reads them back so the
/// caller gets the stored identifiers. Holds no reference to the session, so
/// the session can keep taking edits while this runs.
///
/// # Arguments
/// * `gateway` - Backend to write to
/// * `plan` - Snapshot taken by [`ReportSession::begin_save`]
pub async fn execute_save<G: ReportGateway>(gateway: &G, plan: &SavePlan) -> Result<SavedReport, GatewayError> {
    let group_id = match &plan.group_id {
        Some(id) => {
            gateway.update_group(id, &plan.name, plan.date).await?;
            id.clone()
        }
        None => gateway.create_group(&plan.name, plan.date, &plan.owner).await?.id,
    };

    gateway.delete_rows(&group_id).await?;
    if !plan.rows.is_empty() {
        gateway.upsert_rows(&group_id, &plan.owner, &plan.rows).await?;
    }
    let rows = gateway.list_rows(&group_id).await?;

    Ok(SavedReport { group_id, rows })
}
