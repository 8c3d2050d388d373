//! Dashboards, report statistics, CSV exports, and the audit trail view.
//!
//! Admins see the whole system. Managers see the shifts they own and the applications made to
//! them.

pub mod export;
pub mod router;
pub mod service;
pub mod summary;
pub mod views;

pub use router::report_router;
pub use service::{ReportService, AUDIT_LOG_LIMIT};
pub use summary::ReportDataset;
pub use views::{
    CsvExport, Dashboard, DateWindow, OversightDashboard, ReportStats, ReportView,
    StaffDashboard, VolunteerRanking,
};

use crate::audit::AuditError;
use crate::directory::DirectoryError;
use crate::notifications::NotificationError;
use crate::workflows::shifts::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error("export failed: {0}")]
    Export(String),
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}
