//! Report Store
//!
//! Persistence of classified notifications as an upsert-by-key store.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::StoreError;
use crate::notification::{LocationReport, SmfEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Location,
    SmfEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportKey {
    Location {
        ue_identity: String,
        cell_id: String,
    },
    SmfEvent {
        ue_identity: String,
        pdu_session_id: u32,
        event_type: String,
        time_stamp: String,
    },
}

impl ReportKey {
    pub fn kind(&self) -> ReportKind {
        match self {
            Self::Location { .. } => ReportKind::Location,
            Self::SmfEvent { .. } => ReportKind::SmfEvent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StoredReport {
    Location(LocationReport),
    SmfEvent(SmfEvent),
}

impl StoredReport {
    pub fn key(&self) -> ReportKey {
        match self {
            Self::Location(r) => ReportKey::Location {
                ue_identity: r.ue_identity.clone(),
                cell_id: r.cell_id.clone(),
            },
            Self::SmfEvent(e) => ReportKey::SmfEvent {
                ue_identity: e.ue_identity.clone(),
                pdu_session_id: e.pdu_session_id,
                event_type: e.event_type.clone(),
                time_stamp: e.time_stamp.clone(),
            },
        }
    }
}

impl From<LocationReport> for StoredReport {
    fn from(report: LocationReport) -> Self {
        Self::Location(report)
    }
}

impl From<SmfEvent> for StoredReport {
    fn from(event: SmfEvent) -> Self {
        Self::SmfEvent(event)
    }
}

/// Storage backend for notification reports
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert `record`, replacing any record stored under the same key
    async fn put(&self, key: ReportKey, record: StoredReport) -> Result<(), StoreError>;

    /// Records of one kind in insertion order
    async fn list(&self, kind: ReportKind) -> Result<Vec<StoredReport>, StoreError>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    records: Mutex<Vec<(ReportKey, StoredReport)>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn put(&self, key: ReportKey, record: StoredReport) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError("report store lock poisoned".to_string()))?;

        match records.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = record,
            None => records.push((key, record)),
        }
        Ok(())
    }

    async fn list(&self, kind: ReportKind) -> Result<Vec<StoredReport>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StoreError("report store lock poisoned".to_string()))?;

        Ok(records
            .iter()
            .filter(|(k, _)| k.kind() == kind)
            .map(|(_, r)| r.clone())
            .collect())
    }
}
