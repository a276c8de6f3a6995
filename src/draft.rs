use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gateway::ReportGroup;
use crate::row::ReportRow;
use crate::storage::{KeyValueStore, StorageError};

/// Fixed storage key of the draft snapshot.
pub const DRAFT_KEY: &str = "achot.draft";

/// Serialized copy of the unsaved editing state.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DraftSnapshot {
    pub rows: Vec<ReportRow>,
    pub report_name: String,
    pub report_date: NaiveDate,
    pub active_group_id: Option<String>,
}

/// Actions that would throw away the current editing state.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingAction {
    LoadReport(ReportGroup),
    NewReport,
    SignOut,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmChoice {
    SaveThenProceed,
    DiscardAndProceed,
    Cancel,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Guard {
    /// Nothing to lose; run the action now.
    Proceed(PendingAction),
    /// The action was parked; ask the user.
    NeedsConfirmation,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// Save first; run the action only if the save succeeds.
    SaveThen(PendingAction),
    /// Changes dropped; run the action.
    Proceed(PendingAction),
    Cancelled,
    /// No action was waiting.
    Nothing,
}

/// Tracks unsaved changes and mirrors them into durable storage.
#[derive(Debug)]
pub struct DraftTracker<S: KeyValueStore> {
    store: S,
    dirty: bool,
    pending: Option<PendingAction>,
}

impl<S: KeyValueStore> DraftTracker<S> {
    pub fn new(store: S) -> Self {
        DraftTracker {
            store,
            dirty: false,
            pending: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// After a successful save or an explicit discard.
    pub fn mark_clean(&mut self) -> Result<(), StorageError> {
        self.dirty = false;
        self.store.delete(DRAFT_KEY)
    }

    /// Persist `snapshot` while dirty; drop any stored draft while clean.
    pub fn sync(&self, snapshot: &DraftSnapshot) -> Result<(), StorageError> {
        if !self.dirty {
            return self.store.delete(DRAFT_KEY);
        }
        let json = serde_json::to_string(snapshot)?;
        self.store.put(DRAFT_KEY, &json)
    }

    /// Load a stored draft at start-up. A draft found means the user left
    /// mid-edit, so the tracker comes back dirty. A corrupt draft is dropped.
    pub fn restore(&mut self) -> Result<Option<DraftSnapshot>, StorageError> {
        let Some(raw) = self.store.get(DRAFT_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<DraftSnapshot>(&raw) {
            Ok(snapshot) => {
                log::info!("restored draft with {} rows", snapshot.rows.len());
                self.dirty = true;
                Ok(Some(snapshot))
            }
            Err(e) => {
                log::warn!("discarding unreadable draft: {}", e);
                self.store.delete(DRAFT_KEY)?;
                Ok(None)
            }
        }
    }

    /// Gate an action that would discard the current state.
    pub fn guard(&mut self, action: PendingAction) -> Guard {
        if self.dirty {
            self.pending = Some(action);
            Guard::NeedsConfirmation
        } else {
            self.pending = None;
            Guard::Proceed(action)
        }
    }

    /// Apply the user's answer to the confirmation prompt.
    pub fn resolve(&mut self, choice: ConfirmChoice) -> Result<Resolution, StorageError> {
        let Some(action) = self.pending.take() else {
            return Ok(Resolution::Nothing);
        };
        match choice {
            ConfirmChoice::SaveThenProceed => Ok(Resolution::SaveThen(action)),
            ConfirmChoice::DiscardAndProceed => {
                self.mark_clean()?;
                Ok(Resolution::Proceed(action))
            }
            ConfirmChoice::Cancel => Ok(Resolution::Cancelled),
        }
    }

    /// Whether the host should show its native "leave page?" prompt.
    pub fn confirm_before_unload(&self) -> bool {
        self.dirty
    }
}
