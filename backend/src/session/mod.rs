//! Session context - the caller-owned state between interactions.
//!
//! A session remembers, per file slot, the most recent upload (its parsed
//! table or its load failure) and the last selected [`ReportOptions`].
//! Toggling options re-runs the pipeline on the cached table without
//! re-parsing; a new upload to a slot discards the previous one.
//!
//! [`SessionStore`] keeps many sessions for the HTTP server.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::api::logs::{log_error, log_info, log_success};
use crate::config::{
    MAX_SESSIONS, OPNAME_EXPORT_FILENAME, OVERDUE_EXPORT_FILENAME, SESSION_IDLE_TIMEOUT,
    SUMMARY_EXPORT_FILENAME,
};
use crate::error::{LoadResult, ReportError, ReportResult};
use crate::models::Table;
use crate::parser::{load, LoadedTable, SourceInfo};
use crate::render::export::table_to_xlsx;
use crate::transform::aggregate::summarize;
use crate::transform::pipeline::{
    build_opname_report, build_overdue_report, export_summary, export_tidy, OpnameReport,
    OverdueReport, ReportOptions,
};

/// Logical upload slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSlot {
    /// Piutang Overdue listing.
    Overdue,
    /// Opname Faktur (EDI reconciliation) file.
    Opname,
}

impl fmt::Display for FileSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSlot::Overdue => f.write_str("overdue"),
            FileSlot::Opname => f.write_str("opname"),
        }
    }
}

/// Downloadable spreadsheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportArtifact {
    /// Tidied overdue table.
    DataRapi,
    /// Overdue bucket summary.
    Summary,
    /// Parsed opname table.
    Opname,
}

impl ExportArtifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportArtifact::DataRapi => OVERDUE_EXPORT_FILENAME,
            ExportArtifact::Summary => SUMMARY_EXPORT_FILENAME,
            ExportArtifact::Opname => OPNAME_EXPORT_FILENAME,
        }
    }

    pub fn slot(&self) -> FileSlot {
        match self {
            ExportArtifact::DataRapi | ExportArtifact::Summary => FileSlot::Overdue,
            ExportArtifact::Opname => FileSlot::Opname,
        }
    }

    /// Path segment used by the HTTP API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportArtifact::DataRapi => "data-rapi",
            ExportArtifact::Summary => "summary",
            ExportArtifact::Opname => "opname",
        }
    }
}

/// A produced spreadsheet.
#[derive(Debug, Clone)]
pub struct Export {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

/// What a slot currently holds.
#[derive(Debug, Clone)]
pub enum SlotState {
    Loaded(LoadedTable),
    Failed { file_name: String, message: String },
}

/// Per-slot outcome of [`SessionContext::report_all`].
#[derive(Debug, Clone)]
pub enum SlotOutcome<T> {
    /// Nothing uploaded yet.
    Empty,
    Ready { source: SourceInfo, report: T },
    /// The message shown to the user for this slot.
    Failed(String),
}

/// Both slots' reports; one slot's failure never hides the other's output.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub overdue: SlotOutcome<OverdueReport>,
    pub opname: SlotOutcome<OpnameReport>,
}

/// Caller-owned state for one user.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    overdue: Option<SlotState>,
    opname: Option<SlotState>,
    options: ReportOptions,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an upload into `slot`, replacing whatever the slot held.
    ///
    /// A failed load is remembered so that later reports can explain it.
    pub fn upload(&mut self, slot: FileSlot, file_name: &str, bytes: &[u8]) -> ReportResult<SourceInfo> {
        self.store(slot, file_name, load(file_name, bytes))
    }

    /// Put the outcome of an already-run [`load`] into `slot`.
    ///
    /// Lets callers parse outside whatever lock guards the session.
    pub fn store(
        &mut self,
        slot: FileSlot,
        file_name: &str,
        result: LoadResult<LoadedTable>,
    ) -> ReportResult<SourceInfo> {
        let loaded = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                log_error(format!("Cannot load {}: {}", file_name, e));
                *self.slot_mut(slot) = Some(SlotState::Failed {
                    file_name: file_name.to_string(),
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        log_success(format!(
            "Loaded {} ({} rows, {} columns, {} skipped lines)",
            file_name,
            loaded.info.row_count,
            loaded.info.columns.len(),
            loaded.info.skipped_lines
        ));
        let info = loaded.info.clone();
        *self.slot_mut(slot) = Some(SlotState::Loaded(loaded));
        Ok(info)
    }

    pub fn options(&self) -> ReportOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ReportOptions) {
        self.options = options;
    }

    pub fn state(&self, slot: FileSlot) -> Option<&SlotState> {
        match slot {
            FileSlot::Overdue => self.overdue.as_ref(),
            FileSlot::Opname => self.opname.as_ref(),
        }
    }

    /// The loaded table of a slot.
    pub fn loaded(&self, slot: FileSlot) -> ReportResult<&LoadedTable> {
        match self.state(slot) {
            None => Err(ReportError::NoUpload(slot)),
            Some(SlotState::Failed { message, .. }) => Err(ReportError::UploadFailed {
                slot,
                message: message.clone(),
            }),
            Some(SlotState::Loaded(loaded)) => Ok(loaded),
        }
    }

    /// Discard a slot's upload.
    pub fn clear(&mut self, slot: FileSlot) {
        *self.slot_mut(slot) = None;
    }

    /// Overdue report for the cached table and current options.
    pub fn overdue_report(&self) -> ReportResult<OverdueReport> {
        let loaded = self.loaded(FileSlot::Overdue)?;
        Ok(build_overdue_report(&loaded.table, &self.options))
    }

    pub fn opname_report(&self) -> ReportResult<OpnameReport> {
        let loaded = self.loaded(FileSlot::Opname)?;
        Ok(build_opname_report(&loaded.table))
    }

    /// Reports for both slots, each isolated from the other's failure.
    pub fn report_all(&self) -> SessionReport {
        SessionReport {
            overdue: self.outcome(FileSlot::Overdue, |table| {
                build_overdue_report(table, &self.options)
            }),
            opname: self.outcome(FileSlot::Opname, build_opname_report),
        }
    }

    /// Build a downloadable spreadsheet.
    pub fn export(&self, artifact: ExportArtifact) -> ReportResult<Export> {
        let loaded = self.loaded(artifact.slot())?;
        let bytes = match artifact {
            ExportArtifact::DataRapi => export_tidy(&loaded.table)?,
            ExportArtifact::Summary => export_summary(&summarize(&loaded.table)?)?,
            ExportArtifact::Opname => table_to_xlsx(&loaded.table)?,
        };
        Ok(Export {
            file_name: artifact.file_name(),
            bytes,
        })
    }

    fn outcome<T>(&self, slot: FileSlot, build: impl FnOnce(&Table) -> T) -> SlotOutcome<T> {
        match self.loaded(slot) {
            Ok(loaded) => SlotOutcome::Ready {
                source: loaded.info.clone(),
                report: build(&loaded.table),
            },
            Err(ReportError::NoUpload(_)) => SlotOutcome::Empty,
            Err(e) => SlotOutcome::Failed(e.to_string()),
        }
    }

    fn slot_mut(&mut self, slot: FileSlot) -> &mut Option<SlotState> {
        match slot {
            FileSlot::Overdue => &mut self.overdue,
            FileSlot::Opname => &mut self.opname,
        }
    }
}

// =============================================================================
// Session Store
// =============================================================================

#[derive(Debug)]
struct Entry {
    context: SessionContext,
    last_access: Instant,
}

/// Sessions of the HTTP server, keyed by id.
///
/// Sessions idle longer than the timeout are dropped whenever a new one is
/// created; past `max_sessions` the least recently used goes too.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(SESSION_IDLE_TIMEOUT, MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Create an empty session and return its id.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.lock();

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_access) < self.idle_timeout);
        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => sessions.remove(&oldest),
                None => break,
            };
        }
        let evicted = before - sessions.len();
        if evicted > 0 {
            log_info(format!("🧹 Dropped {} idle session(s)", evicted));
        }

        sessions.insert(
            id,
            Entry {
                context: SessionContext::new(),
                last_access: now,
            },
        );
        id
    }

    /// Run `f` on a session; `None` when the id is unknown.
    ///
    /// Holds the store lock for the duration of `f`; parse uploads before.
    pub fn with_session<T>(&self, id: &Uuid, f: impl FnOnce(&mut SessionContext) -> T) -> Option<T> {
        self.lock().get_mut(id).map(|entry| {
            entry.last_access = Instant::now();
            f(&mut entry.context)
        })
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.lock().contains_key(id)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        // A panic inside one pipeline run must not lock every session out
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
