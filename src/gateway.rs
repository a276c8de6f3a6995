use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::future::Future;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::row::{Amount, Field, ReportRow};

/// A named, dated container for a set of rows.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ReportGroup {
    pub id: String,
    pub name: String,
    pub report_date: NaiveDate,
    pub user_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("report backend is not configured")]
    NotConfigured,
    #[error("report backend unavailable: {0}")]
    Unavailable(String),
    #[error("report group {0} not found")]
    NotFound(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("backend io: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend data: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Gateway operations, used to inject failures in tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayOp {
    ListGroups,
    CreateGroup,
    UpdateGroup,
    DeleteGroup,
    ListRows,
    UpsertRows,
    DeleteRows,
}

/// Hosted CRUD backend for report groups and their rows.
///
/// Every call is asynchronous and may fail; callers convert failures into
/// notices and keep their in-memory state.
pub trait ReportGateway {
    /// All groups, newest report date first.
    fn list_groups(&self) -> impl Future<Output = Result<Vec<ReportGroup>, GatewayError>> + Send;

    fn create_group(
        &self,
        name: &str,
        date: NaiveDate,
        owner: &str,
    ) -> impl Future<Output = Result<ReportGroup, GatewayError>> + Send;

    fn update_group(
        &self,
        id: &str,
        name: &str,
        date: NaiveDate,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Removes the group and every row in it.
    fn delete_group(&self, id: &str) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Rows of a group in insertion order, with identifiers.
    fn list_rows(&self, group_id: &str) -> impl Future<Output = Result<Vec<ReportRow>, GatewayError>> + Send;

    /// Insert rows without an id, overwrite rows whose id already exists.
    fn upsert_rows(
        &self,
        group_id: &str,
        owner: &str,
        rows: &[ReportRow],
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn delete_rows(&self, group_id: &str) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Row as the backend keeps it: plain integers, owned by a group.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
struct StoredRow {
    id: String,
    group_id: String,
    user_id: String,
    sabablar: String,
    tovar: i64,
    ok: i64,
    rasxod: i64,
    vazvirat: i64,
    pul: i64,
    kilik_ozi: i64,
}

impl StoredRow {
    fn from_row(id: String, group_id: &str, owner: &str, row: &ReportRow) -> Self {
        StoredRow {
            id,
            group_id: group_id.to_string(),
            user_id: owner.to_string(),
            sabablar: row.sabablar.clone(),
            tovar: row.value(Field::Tovar),
            ok: row.value(Field::Ok),
            rasxod: row.value(Field::Rasxod),
            vazvirat: row.value(Field::Vazvirat),
            pul: row.value(Field::Pul),
            kilik_ozi: row.value(Field::KilikOzi),
        }
    }

    fn to_row(&self) -> ReportRow {
        ReportRow {
            id: Some(self.id.clone()),
            sabablar: self.sabablar.clone(),
            tovar: Amount::from_stored(self.tovar),
            ok: Amount::from_stored(self.ok),
            rasxod: Amount::from_stored(self.rasxod),
            vazvirat: Amount::from_stored(self.vazvirat),
            pul: Amount::from_stored(self.pul),
            kilik_ozi: Amount::from_stored(self.kilik_ozi),
        }
    }
}

/// Tables shared by the in-memory and file-backed gateways.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
struct ReportDb {
    groups: Vec<ReportGroup>,
    rows: Vec<StoredRow>,
}

impl ReportDb {
    fn list_groups(&self) -> Vec<ReportGroup> {
        let mut groups = self.groups.clone();
        groups.sort_by(|a, b| b.report_date.cmp(&a.report_date));
        groups
    }

    fn create_group(&mut self, name: &str, date: NaiveDate, owner: &str) -> Result<ReportGroup, GatewayError> {
        if name.trim().is_empty() {
            return Err(GatewayError::Rejected("group name is required".to_string()));
        }
        let group = ReportGroup {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            report_date: date,
            user_id: owner.to_string(),
        };
        self.groups.push(group.clone());
        Ok(group)
    }

    fn group_mut(&mut self, id: &str) -> Result<&mut ReportGroup, GatewayError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    fn update_group(&mut self, id: &str, name: &str, date: NaiveDate) -> Result<(), GatewayError> {
        let group = self.group_mut(id)?;
        group.name = name.to_string();
        group.report_date = date;
        Ok(())
    }

    fn delete_group(&mut self, id: &str) -> Result<(), GatewayError> {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != id);
        if self.groups.len() == before {
            return Err(GatewayError::NotFound(id.to_string()));
        }
        self.rows.retain(|r| r.group_id != id);
        Ok(())
    }

    fn list_rows(&self, group_id: &str) -> Result<Vec<ReportRow>, GatewayError> {
        if !self.groups.iter().any(|g| g.id == group_id) {
            return Err(GatewayError::NotFound(group_id.to_string()));
        }
        Ok(self
            .rows
            .iter()
            .filter(|r| r.group_id == group_id)
            .map(StoredRow::to_row)
            .collect())
    }

    fn upsert_rows(&mut self, group_id: &str, owner: &str, rows: &[ReportRow]) -> Result<(), GatewayError> {
        self.group_mut(group_id)?;
        for row in rows {
            let existing = row
                .id
                .as_deref()
                .and_then(|id| {
                    self.rows
                        .iter()
                        .position(|r| r.id == id && r.group_id == group_id)
                });
            match existing {
                Some(index) => {
                    let id = self.rows[index].id.clone();
                    self.rows[index] = StoredRow::from_row(id, group_id, owner, row);
                }
                None => {
                    // Ids owned by another group are never reused.
                    let id = match row.id.as_deref() {
                        Some(id) if !self.rows.iter().any(|r| r.id == id) => id.to_string(),
                        _ => Uuid::new_v4().to_string(),
                    };
                    self.rows.push(StoredRow::from_row(id, group_id, owner, row));
                }
            }
        }
        Ok(())
    }

    fn delete_rows(&mut self, group_id: &str) -> Result<(), GatewayError> {
        self.rows.retain(|r| r.group_id != group_id);
        Ok(())
    }
}

/// In-process backend. Useful offline and in tests; can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    db: Mutex<ReportDb>,
    fail_on: Mutex<Option<GatewayOp>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        MemoryGateway::default()
    }

    /// Make the next call of `op` fail with `Unavailable`.
    pub fn fail_on(&self, op: GatewayOp) {
        if let Ok(mut slot) = self.fail_on.lock() {
            *slot = Some(op);
        }
    }

    fn with_db<T>(
        &self,
        op: GatewayOp,
        f: impl FnOnce(&mut ReportDb) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        {
            let mut slot = self
                .fail_on
                .lock()
                .map_err(|_| GatewayError::Unavailable("poisoned".to_string()))?;
            if *slot == Some(op) {
                *slot = None;
                return Err(GatewayError::Unavailable(format!("{:?} failed", op)));
            }
        }
        let mut db = self
            .db
            .lock()
            .map_err(|_| GatewayError::Unavailable("poisoned".to_string()))?;
        f(&mut db)
    }
}

impl ReportGateway for MemoryGateway {
    async fn list_groups(&self) -> Result<Vec<ReportGroup>, GatewayError> {
        self.with_db(GatewayOp::ListGroups, |db| Ok(db.list_groups()))
    }

    async fn create_group(&self, name: &str, date: NaiveDate, owner: &str) -> Result<ReportGroup, GatewayError> {
        self.with_db(GatewayOp::CreateGroup, |db| db.create_group(name, date, owner))
    }

    async fn update_group(&self, id: &str, name: &str, date: NaiveDate) -> Result<(), GatewayError> {
        self.with_db(GatewayOp::UpdateGroup, |db| db.update_group(id, name, date))
    }

    async fn delete_group(&self, id: &str) -> Result<(), GatewayError> {
        self.with_db(GatewayOp::DeleteGroup, |db| db.delete_group(id))
    }

    async fn list_rows(&self, group_id: &str) -> Result<Vec<ReportRow>, GatewayError> {
        self.with_db(GatewayOp::ListRows, |db| db.list_rows(group_id))
    }

    async fn upsert_rows(&self, group_id: &str, owner: &str, rows: &[ReportRow]) -> Result<(), GatewayError> {
        self.with_db(GatewayOp::UpsertRows, |db| db.upsert_rows(group_id, owner, rows))
    }

    async fn delete_rows(&self, group_id: &str) -> Result<(), GatewayError> {
        self.with_db(GatewayOp::DeleteRows, |db| db.delete_rows(group_id))
    }
}

const REPORTS_FILE: &str = "reports.json";

/// Backend kept as one JSON document inside a database directory.
///
/// Each call reads the document, applies the change and writes it back.
#[derive(Debug)]
pub struct JsonFileGateway {
    file: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileGateway {
    /// Open (creating if needed) the database directory.
    ///
    /// # Arguments
    /// * `database_dir` - Directory that holds `reports.json`
    ///
    /// # Returns
    /// * `Result<Self, GatewayError>` - `NotConfigured` for an empty path
    pub fn open(database_dir: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let dir = database_dir.as_ref();
        if dir.as_os_str().is_empty() {
            return Err(GatewayError::NotConfigured);
        }
        fs::create_dir_all(dir)?;

        let file = dir.join(REPORTS_FILE);
        if !file.exists() {
            let mut f = File::create(&file)?;
            f.write_all(serde_json::to_string(&ReportDb::default())?.as_bytes())?;
        }
        log::debug!("report database at {}", file.display());

        Ok(JsonFileGateway {
            file,
            lock: Mutex::new(()),
        })
    }

    fn load(&self) -> Result<ReportDb, GatewayError> {
        let mut contents = String::new();
        File::open(&self.file)?.read_to_string(&mut contents)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, db: &ReportDb) -> Result<(), GatewayError> {
        let json = serde_json::to_string_pretty(db)?;
        let mut file = File::create(&self.file)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&ReportDb) -> Result<T, GatewayError>) -> Result<T, GatewayError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| GatewayError::Unavailable("poisoned".to_string()))?;
        f(&self.load()?)
    }

    fn write<T>(&self, f: impl FnOnce(&mut ReportDb) -> Result<T, GatewayError>) -> Result<T, GatewayError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| GatewayError::Unavailable("poisoned".to_string()))?;
        let mut db = self.load()?;
        let out = f(&mut db)?;
        self.save(&db)?;
        Ok(out)
    }
}

impl ReportGateway for JsonFileGateway {
    async fn list_groups(&self) -> Result<Vec<ReportGroup>, GatewayError> {
        self.read(|db| Ok(db.list_groups()))
    }

    async fn create_group(&self, name: &str, date: NaiveDate, owner: &str) -> Result<ReportGroup, GatewayError> {
        self.write(|db| db.create_group(name, date, owner))
    }

    async fn update_group(&self, id: &str, name: &str, date: NaiveDate) -> Result<(), GatewayError> {
        self.write(|db| db.update_group(id, name, date))
    }

    async fn delete_group(&self, id: &str) -> Result<(), GatewayError> {
        self.write(|db| db.delete_group(id))
    }

    async fn list_rows(&self, group_id: &str) -> Result<Vec<ReportRow>, GatewayError> {
        self.read(|db| db.list_rows(group_id))
    }

    async fn upsert_rows(&self, group_id: &str, owner: &str, rows: &[ReportRow]) -> Result<(), GatewayError> {
        self.write(|db| db.upsert_rows(group_id, owner, rows))
    }

    async fn delete_rows(&self, group_id: &str) -> Result<(), GatewayError> {
        self.write(|db| db.delete_rows(group_id))
    }
}
