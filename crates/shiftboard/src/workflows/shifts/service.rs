use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::capacity::{self, IneligibleReason};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationTransition, InvalidTransition,
    OpenShiftFilter, ReviewDecision, Shift, ShiftDraft, ShiftHistoryAction, ShiftHistoryEntry,
    ShiftId, ShiftStatus, ShiftUpdate, ShiftValidationError,
};
use super::repository::{ApplicationFilter, RepositoryError, ShiftRepository, ShiftScope};
use super::views::{sort_shifts, ApplicationView, ShiftDetail, ShiftSummary};
use crate::audit::{AuditAction, AuditEntry, AuditError, AuditSink};
use crate::clock::{Clock, SystemClock};
use crate::directory::{Directory, DirectoryError, Permission, Store, StoreId, User};
use crate::notifications::{NotificationKind, NotificationSink, OutboundNotification};

/// Shift posting and the volunteer application lifecycle.
pub struct ShiftService<R, D, N, A> {
    repository: Arc<R>,
    directory: Arc<D>,
    notifications: Arc<N>,
    audit: Arc<A>,
    clock: Arc<dyn Clock>,
}

static SHIFT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_shift_id() -> ShiftId {
    ShiftId(SHIFT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_application_id() -> ApplicationId {
    ApplicationId(APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn shift_link(shift: &Shift) -> String {
    format!("/shifts/{}/", shift.id)
}

fn require(
    actor: &User,
    permission: Permission,
    denial: &'static str,
) -> Result<(), ShiftServiceError> {
    if actor.can(permission) {
        Ok(())
    } else {
        Err(ShiftServiceError::Forbidden(denial))
    }
}

impl<R, D, N, A> ShiftService<R, D, N, A>
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        notifications: Arc<N>,
        audit: Arc<A>,
    ) -> Self {
        Self::with_clock(
            repository,
            directory,
            notifications,
            audit,
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(
        repository: Arc<R>,
        directory: Arc<D>,
        notifications: Arc<N>,
        audit: Arc<A>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            directory,
            notifications,
            audit,
            clock,
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Active stores a shift can be posted at, by name.
    pub fn stores(&self) -> Result<Vec<Store>, ShiftServiceError> {
        let mut stores: Vec<Store> = self
            .directory
            .stores()?
            .into_iter()
            .filter(|store| store.is_active)
            .collect();
        stores.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stores)
    }

    pub fn create_shift(
        &self,
        actor: &User,
        draft: ShiftDraft,
    ) -> Result<Shift, ShiftServiceError> {
        require(
            actor,
            Permission::PostShifts,
            "only managers and admins can post shifts",
        )?;
        draft.validate()?;
        self.ensure_active_store(draft.store_id)?;

        let now = self.clock.now();
        let shift = Shift {
            id: next_shift_id(),
            store_id: draft.store_id,
            manager_id: actor.id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            role_required: draft.role_required,
            shift_date: draft.shift_date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            slots_available: draft.slots_available,
            status: ShiftStatus::Open,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert_shift(shift)?;
        self.repository.record_history(ShiftHistoryEntry {
            shift_id: stored.id,
            action: ShiftHistoryAction::Created,
            performed_by: actor.id,
            description: format!("Posted '{}' for {}", stored.title, stored.shift_date),
            timestamp: now,
        })?;
        self.audit.record(
            AuditEntry::new(
                actor.id,
                AuditAction::ShiftCreated,
                format!("Created shift '{}'", stored.title),
                now,
            )
            .with("shift_id", stored.id)
            .with("store_id", stored.store_id),
        )?;

        info!(
            shift_id = %stored.id,
            manager = %actor.id,
            slots = stored.slots_available,
            "shift posted"
        );
        Ok(stored)
    }

    pub fn update_shift(
        &self,
        actor: &User,
        shift_id: ShiftId,
        update: ShiftUpdate,
    ) -> Result<Shift, ShiftServiceError> {
        let mut shift = self.load_shift(shift_id)?;
        self.ensure_manages(actor, &shift)?;
        if !shift.status.accepts_changes() {
            return Err(ShiftServiceError::ShiftClosed {
                status: shift.status,
            });
        }

        let ShiftUpdate { draft, status } = update;
        draft.validate()?;
        if draft.store_id != shift.store_id {
            self.ensure_active_store(draft.store_id)?;
        }
        let next_status = match status {
            Some(ShiftStatus::Cancelled) => {
                return Err(ShiftServiceError::ShiftTransition {
                    from: shift.status,
                    to: ShiftStatus::Cancelled,
                })
            }
            Some(next) => next,
            None => shift.status,
        };

        let action = if shift.schedule_differs(&draft) {
            ShiftHistoryAction::Rescheduled
        } else {
            ShiftHistoryAction::Updated
        };

        let now = self.clock.now();
        shift.apply_draft(draft);
        shift.status = next_status;
        shift.updated_at = now;
        self.repository.update_shift(shift.clone())?;

        self.repository.record_history(ShiftHistoryEntry {
            shift_id: shift.id,
            action,
            performed_by: actor.id,
            description: format!(
                "{} '{}': {} {}-{}, {} slots",
                action.label(),
                shift.title,
                shift.shift_date,
                shift.start_time,
                shift.end_time,
                shift.slots_available
            ),
            timestamp: now,
        })?;
        self.notify_active_applicants(
            &shift,
            NotificationKind::ShiftUpdated,
            format!("Shift updated: {}", shift.title),
            format!(
                "{} is now scheduled for {} from {} to {}.",
                shift.title, shift.shift_date, shift.start_time, shift.end_time
            ),
        )?;
        self.audit.record(
            AuditEntry::new(
                actor.id,
                AuditAction::ShiftUpdated,
                format!("Updated shift '{}'", shift.title),
                now,
            )
            .with("shift_id", shift.id)
            .with("history_action", action.label()),
        )?;

        info!(shift_id = %shift.id, actor = %actor.id, action = action.label(), "shift updated");
        Ok(shift)
    }

    pub fn cancel_shift(
        &self,
        actor: &User,
        shift_id: ShiftId,
        reason: Option<String>,
    ) -> Result<Shift, ShiftServiceError> {
        let mut shift = self.load_shift(shift_id)?;
        self.ensure_manages(actor, &shift)?;
        if !shift.status.accepts_changes() {
            return Err(ShiftServiceError::ShiftTransition {
                from: shift.status,
                to: ShiftStatus::Cancelled,
            });
        }

        let now = self.clock.now();
        shift.status = ShiftStatus::Cancelled;
        shift.updated_at = now;
        self.repository.update_shift(shift.clone())?;

        let reason = reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        let description = match &reason {
            Some(reason) => format!("Cancelled '{}': {reason}", shift.title),
            None => format!("Cancelled '{}'", shift.title),
        };

        self.repository.record_history(ShiftHistoryEntry {
            shift_id: shift.id,
            action: ShiftHistoryAction::Cancelled,
            performed_by: actor.id,
            description: description.clone(),
            timestamp: now,
        })?;
        self.notify_active_applicants(
            &shift,
            NotificationKind::ShiftCancelled,
            format!("Shift cancelled: {}", shift.title),
            format!(
                "{} on {} has been cancelled.",
                shift.title, shift.shift_date
            ),
        )?;
        self.audit.record(
            AuditEntry::new(actor.id, AuditAction::ShiftCancelled, description, now)
                .with("shift_id", shift.id),
        )?;

        info!(shift_id = %shift.id, actor = %actor.id, "shift cancelled");
        Ok(shift)
    }

    /// Managers see the shifts they own; everyone else sees every shift.
    pub fn list_shifts(&self, actor: &User) -> Result<Vec<ShiftSummary>, ShiftServiceError> {
        require(actor, Permission::BrowseShifts, "shift browsing not permitted")?;
        let (scope, filter) = if actor.is_manager() {
            (
                ShiftScope::ManagedBy(actor.id),
                ApplicationFilter::ForManager(actor.id),
            )
        } else {
            (ShiftScope::All, ApplicationFilter::All)
        };

        let mut shifts = self.repository.shifts(scope)?;
        sort_shifts(&mut shifts);
        let applications = self.repository.applications(filter)?;
        Ok(shifts
            .into_iter()
            .map(|shift| ShiftSummary::from_applications(shift, &applications))
            .collect())
    }

    /// Open, not-yet-past shifts, optionally narrowed by role and store.
    pub fn list_open_shifts(
        &self,
        filter: OpenShiftFilter,
    ) -> Result<Vec<ShiftSummary>, ShiftServiceError> {
        let today = self.today();
        let mut shifts: Vec<Shift> = self
            .repository
            .shifts(ShiftScope::All)?
            .into_iter()
            .filter(|shift| shift.status == ShiftStatus::Open && !shift.is_past(today))
            .filter(|shift| filter.matches(shift))
            .collect();
        sort_shifts(&mut shifts);

        let applications = self.repository.applications(ApplicationFilter::All)?;
        Ok(shifts
            .into_iter()
            .map(|shift| ShiftSummary::from_applications(shift, &applications))
            .collect())
    }

    pub fn shift_detail(
        &self,
        actor: &User,
        shift_id: ShiftId,
    ) -> Result<ShiftDetail, ShiftServiceError> {
        require(actor, Permission::BrowseShifts, "shift browsing not permitted")?;
        let shift = self.load_shift(shift_id)?;
        let applications = self
            .repository
            .applications(ApplicationFilter::ForShift(shift.id))?;

        let eligibility = if actor.can(Permission::Volunteer) {
            capacity::check_eligibility(&shift, actor.id, &applications, self.today()).err()
        } else {
            None
        };
        let can_volunteer = actor.can(Permission::Volunteer) && eligibility.is_none();
        let my_application = applications
            .iter()
            .find(|application| application.applicant_id == actor.id)
            .cloned();

        let (visible_applications, history) = if self.manages(actor, &shift) {
            let mut visible = applications.clone();
            visible.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
            let mut history = self.repository.history(shift.id)?;
            history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            (Some(visible), Some(history))
        } else {
            (None, None)
        };

        Ok(ShiftDetail {
            summary: ShiftSummary::from_applications(shift, &applications),
            can_volunteer,
            ineligible_reason: eligibility,
            my_application,
            applications: visible_applications,
            history,
        })
    }

    /// Recomputed from the current approved applications on every call.
    pub fn available_slots(&self, shift_id: ShiftId) -> Result<i64, ShiftServiceError> {
        let shift = self.load_shift(shift_id)?;
        let applications = self
            .repository
            .applications(ApplicationFilter::ForShift(shift.id))?;
        Ok(capacity::available_slots(&shift, &applications))
    }

    pub fn can_volunteer(
        &self,
        actor: &User,
        shift_id: ShiftId,
    ) -> Result<bool, ShiftServiceError> {
        let shift = self.load_shift(shift_id)?;
        let applications = self
            .repository
            .applications(ApplicationFilter::ForShift(shift.id))?;
        Ok(capacity::can_volunteer(
            &shift,
            actor.id,
            &applications,
            self.today(),
        ))
    }

    /// Create a pending application and tell the shift's manager about it.
    ///
    /// The capacity check and the insert are separate repository calls; two concurrent
    /// applicants for the last slot can both be accepted as pending.
    pub fn apply(
        &self,
        actor: &User,
        shift_id: ShiftId,
        notes: Option<String>,
    ) -> Result<Application, ShiftServiceError> {
        require(actor, Permission::Volunteer, "only staff can volunteer for shifts")?;
        let shift = self.load_shift(shift_id)?;
        let applications = self
            .repository
            .applications(ApplicationFilter::ForShift(shift.id))?;

        if let Err(reason) =
            capacity::check_eligibility(&shift, actor.id, &applications, self.today())
        {
            warn!(
                shift_id = %shift.id,
                applicant = %actor.id,
                %reason,
                "volunteer request rejected"
            );
            return Err(reason.into());
        }

        let now = self.clock.now();
        let application = Application {
            id: next_application_id(),
            shift_id: shift.id,
            applicant_id: actor.id,
            status: ApplicationStatus::Pending,
            applied_at: now,
            reviewed_by: None,
            reviewed_at: None,
            notes: notes.unwrap_or_default(),
        };

        let stored = match self.repository.insert_application(application) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(IneligibleReason::AlreadyApplied.into());
            }
            Err(other) => return Err(other.into()),
        };

        let applicant_name = display_name(actor);
        self.deliver(OutboundNotification {
            recipient: shift.manager_id,
            kind: NotificationKind::NewApplication,
            title: format!("New application for {}", shift.title),
            message: format!(
                "{applicant_name} applied for {} on {}.",
                shift.title, shift.shift_date
            ),
            link: shift_link(&shift),
        });
        self.audit.record(
            AuditEntry::new(
                actor.id,
                AuditAction::ApplicationSubmitted,
                format!("Applied for shift '{}'", shift.title),
                now,
            )
            .with("shift_id", shift.id)
            .with("application_id", stored.id),
        )?;

        info!(
            shift_id = %shift.id,
            application_id = %stored.id,
            applicant = %actor.id,
            "application submitted"
        );
        Ok(stored)
    }

    /// Applicant-only; pending is the only state that can be withdrawn from.
    pub fn withdraw(
        &self,
        actor: &User,
        application_id: ApplicationId,
    ) -> Result<Application, ShiftServiceError> {
        let mut application = self.load_application(application_id)?;
        if application.applicant_id != actor.id {
            return Err(ShiftServiceError::Forbidden(
                "only the applicant can withdraw an application",
            ));
        }

        application.status = application
            .status
            .transition(ApplicationTransition::Withdraw)?;
        self.repository.update_application(application.clone())?;

        let now = self.clock.now();
        self.audit.record(
            AuditEntry::new(
                actor.id,
                AuditAction::ApplicationWithdrawn,
                format!("Withdrew application {}", application.id),
                now,
            )
            .with("shift_id", application.shift_id)
            .with("application_id", application.id),
        )?;

        info!(application_id = %application.id, applicant = %actor.id, "application withdrawn");
        Ok(application)
    }

    /// Approve or reject a pending application.
    ///
    /// Approvals are not capped by remaining slots; available slots go negative when a
    /// reviewer approves past capacity.
    pub fn review(
        &self,
        actor: &User,
        application_id: ApplicationId,
        decision: ReviewDecision,
        notes: Option<String>,
    ) -> Result<Application, ShiftServiceError> {
        require(
            actor,
            Permission::ReviewApplications,
            "only managers and admins can review applications",
        )?;
        let mut application = self.load_application(application_id)?;
        let shift = self.load_shift(application.shift_id)?;
        if !self.manages(actor, &shift) {
            return Err(ShiftServiceError::Forbidden(
                "only the shift's manager or an admin can review its applications",
            ));
        }

        application.status = application.status.transition(decision.transition())?;
        let now = self.clock.now();
        application.reviewed_by = Some(actor.id);
        application.reviewed_at = Some(now);
        if let Some(notes) = notes {
            application.notes = notes;
        }
        self.repository.update_application(application.clone())?;

        let (kind, verdict, action) = match decision {
            ReviewDecision::Approve => (
                NotificationKind::ApplicationApproved,
                "approved",
                AuditAction::ApplicationApproved,
            ),
            ReviewDecision::Reject => (
                NotificationKind::ApplicationRejected,
                "rejected",
                AuditAction::ApplicationRejected,
            ),
        };
        self.deliver(OutboundNotification {
            recipient: application.applicant_id,
            kind,
            title: format!("Application {verdict}"),
            message: format!(
                "Your application for {} on {} was {verdict}.",
                shift.title, shift.shift_date
            ),
            link: shift_link(&shift),
        });
        self.audit.record(
            AuditEntry::new(
                actor.id,
                action,
                format!("Application {} {verdict}", application.id),
                now,
            )
            .with("shift_id", shift.id)
            .with("application_id", application.id)
            .with("applicant_id", application.applicant_id),
        )?;

        if decision == ReviewDecision::Approve {
            let applications = self
                .repository
                .applications(ApplicationFilter::ForShift(shift.id))?;
            let remaining = capacity::available_slots(&shift, &applications);
            if remaining < 0 {
                warn!(shift_id = %shift.id, remaining, "approvals exceed shift capacity");
            }
        }

        info!(
            application_id = %application.id,
            reviewer = %actor.id,
            verdict,
            "application reviewed"
        );
        Ok(application)
    }

    /// The actor's applications, newest first.
    pub fn my_applications(&self, actor: &User) -> Result<Vec<ApplicationView>, ShiftServiceError> {
        let mut applications = self
            .repository
            .applications(ApplicationFilter::ForApplicant(actor.id))?;
        applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));

        let mut views = Vec::with_capacity(applications.len());
        for application in applications {
            let shift = self.load_shift(application.shift_id)?;
            views.push(ApplicationView::new(application, &shift));
        }
        Ok(views)
    }

    fn load_shift(&self, id: ShiftId) -> Result<Shift, ShiftServiceError> {
        self.repository
            .fetch_shift(id)?
            .ok_or(ShiftServiceError::NotFound(Record::Shift(id)))
    }

    fn load_application(&self, id: ApplicationId) -> Result<Application, ShiftServiceError> {
        self.repository
            .fetch_application(id)?
            .ok_or(ShiftServiceError::NotFound(Record::Application(id)))
    }

    fn ensure_active_store(&self, id: StoreId) -> Result<(), ShiftServiceError> {
        let store = self
            .directory
            .store(id)?
            .ok_or(ShiftServiceError::NotFound(Record::Store(id)))?;
        if !store.is_active {
            return Err(ShiftValidationError::InactiveStore(id).into());
        }
        Ok(())
    }

    fn manages(&self, actor: &User, shift: &Shift) -> bool {
        actor.can(Permission::ManageAnyShift)
            || (actor.can(Permission::PostShifts) && shift.is_managed_by(actor.id))
    }

    fn ensure_manages(&self, actor: &User, shift: &Shift) -> Result<(), ShiftServiceError> {
        if self.manages(actor, shift) {
            Ok(())
        } else {
            Err(ShiftServiceError::Forbidden(
                "only the shift's manager or an admin can change it",
            ))
        }
    }

    fn notify_active_applicants(
        &self,
        shift: &Shift,
        kind: NotificationKind,
        title: String,
        message: String,
    ) -> Result<(), ShiftServiceError> {
        let applications = self
            .repository
            .applications(ApplicationFilter::ForShift(shift.id))?;
        for application in applications
            .iter()
            .filter(|application| application.status.is_active())
        {
            self.deliver(OutboundNotification {
                recipient: application.applicant_id,
                kind,
                title: title.clone(),
                message: message.clone(),
                link: shift_link(shift),
            });
        }
        Ok(())
    }

    /// Delivery is best-effort: the state change it reports is already stored.
    fn deliver(&self, notification: OutboundNotification) {
        let recipient = notification.recipient;
        let kind = notification.kind;
        if let Err(err) = self.notifications.notify(notification) {
            warn!(%recipient, ?kind, error = %err, "notification not delivered");
        }
    }
}

fn display_name(user: &User) -> String {
    let full_name = user.full_name();
    if full_name.is_empty() {
        user.username.clone()
    } else {
        full_name
    }
}

/// Record kinds that lookups can miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Shift(ShiftId),
    Application(ApplicationId),
    Store(StoreId),
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Shift(id) => write!(f, "shift {id}"),
            Record::Application(id) => write!(f, "application {id}"),
            Record::Store(id) => write!(f, "store {id}"),
        }
    }
}

/// Error raised by the shift service.
#[derive(Debug, thiserror::Error)]
pub enum ShiftServiceError {
    #[error("{0} not found")]
    NotFound(Record),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("not eligible to volunteer: {0}")]
    Ineligible(#[from] IneligibleReason),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("shift cannot move from {from} to {to}")]
    ShiftTransition { from: ShiftStatus, to: ShiftStatus },
    #[error("shift is {status} and can no longer be edited")]
    ShiftClosed { status: ShiftStatus },
    #[error(transparent)]
    Validation(#[from] ShiftValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Audit(#[from] AuditError),
}
