use std::sync::Arc;

use tracing::info;

use super::export;
use super::summary::{self, ReportDataset, TOP_VOLUNTEER_LIMIT};
use super::views::{CsvExport, Dashboard, DateWindow, ReportView};
use super::ReportError;
use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::clock::{Clock, SystemClock};
use crate::directory::{Directory, Permission, User};
use crate::notifications::NotificationInbox;
use crate::workflows::shifts::{ApplicationFilter, ShiftRepository, ShiftScope};

pub const AUDIT_LOG_LIMIT: usize = 100;

/// Read-only dashboards, statistics, and exports over the shift store.
pub struct ReportService<R, D, N, A> {
    repository: Arc<R>,
    directory: Arc<D>,
    inbox: Arc<N>,
    audit: Arc<A>,
    clock: Arc<dyn Clock>,
}

impl<R, D, N, A> ReportService<R, D, N, A>
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationInbox + 'static,
    A: AuditSink + 'static,
{
    pub fn new(repository: Arc<R>, directory: Arc<D>, inbox: Arc<N>, audit: Arc<A>) -> Self {
        Self::with_clock(repository, directory, inbox, audit, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        directory: Arc<D>,
        inbox: Arc<N>,
        audit: Arc<A>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            directory,
            inbox,
            audit,
            clock,
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn dashboard(&self, actor: &User) -> Result<Dashboard, ReportError> {
        let unread = self.unread_notifications(actor)?;
        if actor.can(Permission::Volunteer) {
            let shifts = self.repository.shifts(ShiftScope::All)?;
            let applications = self
                .repository
                .applications(ApplicationFilter::ForApplicant(actor.id))?;
            return Ok(Dashboard::Staff(summary::staff_dashboard(
                actor,
                &shifts,
                &applications,
                self.clock.today(),
                unread,
            )));
        }

        let dataset = self.dataset(actor)?;
        let board = summary::oversight_dashboard(&dataset, unread);
        Ok(if actor.can(Permission::ViewAllRecords) {
            Dashboard::Admin(board)
        } else {
            Dashboard::Manager(board)
        })
    }

    pub fn report(&self, actor: &User, window: DateWindow) -> Result<ReportView, ReportError> {
        let dataset = self.reporting_dataset(actor)?;
        Ok(ReportView {
            stats: summary::report_stats(&dataset, window),
            top_volunteers: summary::top_volunteers(&dataset, TOP_VOLUNTEER_LIMIT),
            date_from: window.date_from,
            date_to: window.date_to,
            is_manager: actor.is_manager(),
        })
    }

    pub fn export_shifts(&self, actor: &User) -> Result<CsvExport, ReportError> {
        let dataset = self.reporting_dataset(actor)?;
        let export = export::shifts_csv(&dataset)?;
        self.record_export(actor, "shifts", &export)?;
        Ok(export)
    }

    pub fn export_volunteers(&self, actor: &User) -> Result<CsvExport, ReportError> {
        let dataset = self.reporting_dataset(actor)?;
        let export = export::volunteers_csv(&dataset)?;
        self.record_export(actor, "volunteers", &export)?;
        Ok(export)
    }

    /// Newest first, capped at [`AUDIT_LOG_LIMIT`].
    pub fn audit_log(&self, actor: &User) -> Result<Vec<AuditEntry>, ReportError> {
        if !actor.can(Permission::ViewAuditLog) {
            return Err(ReportError::Forbidden("only admins can view the audit log"));
        }
        Ok(self.audit.recent(AUDIT_LOG_LIMIT)?)
    }

    fn unread_notifications(&self, actor: &User) -> Result<usize, ReportError> {
        Ok(self
            .inbox
            .for_recipient(actor.id)?
            .iter()
            .filter(|notification| !notification.is_read)
            .count())
    }

    fn reporting_dataset(&self, actor: &User) -> Result<ReportDataset, ReportError> {
        if !actor.can(Permission::ViewReports) {
            return Err(ReportError::Forbidden(
                "only managers and admins can view reports",
            ));
        }
        self.dataset(actor)
    }

    fn dataset(&self, actor: &User) -> Result<ReportDataset, ReportError> {
        let (scope, filter) = if actor.can(Permission::ViewAllRecords) {
            (ShiftScope::All, ApplicationFilter::All)
        } else {
            (
                ShiftScope::ManagedBy(actor.id),
                ApplicationFilter::ForManager(actor.id),
            )
        };

        Ok(ReportDataset {
            scope,
            shifts: self.repository.shifts(scope)?,
            applications: self.repository.applications(filter)?,
            users: self
                .directory
                .users()?
                .into_iter()
                .map(|user| (user.id, user))
                .collect(),
            stores: self
                .directory
                .stores()?
                .into_iter()
                .map(|store| (store.id, store))
                .collect(),
        })
    }

    fn record_export(
        &self,
        actor: &User,
        report: &str,
        export: &CsvExport,
    ) -> Result<(), ReportError> {
        self.audit.record(
            AuditEntry::new(
                actor.id,
                AuditAction::ReportExported,
                format!("Exported {report} report"),
                self.clock.now(),
            )
            .with("report", report)
            .with("rows", export.rows),
        )?;
        info!(actor = %actor.id, report, rows = export.rows, "report exported");
        Ok(())
    }
}
