//! Append-only record of user actions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ShiftCreated,
    ShiftUpdated,
    ShiftCancelled,
    ApplicationSubmitted,
    ApplicationWithdrawn,
    ApplicationApproved,
    ApplicationRejected,
    ReportExported,
}

impl AuditAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShiftCreated => "shift_created",
            Self::ShiftUpdated => "shift_updated",
            Self::ShiftCancelled => "shift_cancelled",
            Self::ApplicationSubmitted => "application_submitted",
            Self::ApplicationWithdrawn => "application_withdrawn",
            Self::ApplicationApproved => "application_approved",
            Self::ApplicationRejected => "application_rejected",
            Self::ReportExported => "report_exported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: UserId,
    pub action: AuditAction,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: UserId,
        action: AuditAction,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            actor,
            action,
            description: description.into(),
            metadata: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;

    /// Newest first, at most `limit` entries.
    fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log unavailable: {0}")]
    Unavailable(String),
}
