use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::clock::FixedClock;
use crate::directory::{Directory, StoreId, User, UserId, ACTOR_HEADER};
use crate::memory::{
    InMemoryAuditLog, InMemoryDirectory, InMemoryNotifications, InMemoryShiftRepository,
};
use crate::notifications::{
    Notification, NotificationError, NotificationSink, OutboundNotification,
};
use crate::workflows::shifts::repository::{
    ApplicationFilter, RepositoryError, ShiftRepository, ShiftScope,
};
use crate::workflows::shifts::{
    Application, ApplicationId, Shift, ShiftDraft, ShiftHistoryEntry, ShiftId, ShiftRole,
    ShiftService,
};

pub(super) const ADMIN: UserId = UserId(1);
pub(super) const MANAGER: UserId = UserId(2);
pub(super) const OTHER_MANAGER: UserId = UserId(3);
pub(super) const STAFF: UserId = UserId(4);
pub(super) const STAFF_B: UserId = UserId(5);
pub(super) const STAFF_C: UserId = UserId(6);

pub(super) const ACTIVE_STORE: StoreId = StoreId(1);
pub(super) const SECOND_STORE: StoreId = StoreId(2);
pub(super) const INACTIVE_STORE: StoreId = StoreId(3);

pub(super) type MemoryService = ShiftService<
    InMemoryShiftRepository,
    InMemoryDirectory,
    InMemoryNotifications,
    InMemoryAuditLog,
>;

pub(super) struct Harness {
    pub(super) service: Arc<MemoryService>,
    pub(super) repository: Arc<InMemoryShiftRepository>,
    pub(super) notifications: Arc<InMemoryNotifications>,
    pub(super) audit: Arc<InMemoryAuditLog>,
}

impl Harness {
    pub(super) fn user(&self, id: UserId) -> User {
        self.service
            .directory()
            .user(id)
            .expect("directory lookup")
            .expect("seeded user")
    }

    pub(super) fn delivered_to(&self, recipient: UserId) -> Vec<Notification> {
        self.notifications
            .delivered()
            .expect("notifications readable")
            .into_iter()
            .filter(|notification| notification.recipient == recipient)
            .collect()
    }

    /// Shift owned by `MANAGER` at the active store, dated `days_ahead` from today.
    pub(super) fn post_shift(&self, days_ahead: i64, slots: u32) -> Shift {
        let manager = self.user(MANAGER);
        self.service
            .create_shift(&manager, draft(days_ahead, slots))
            .expect("shift posts")
    }

    pub(super) fn apply(&self, applicant: UserId, shift: ShiftId) -> Application {
        let applicant = self.user(applicant);
        self.service
            .apply(&applicant, shift, None)
            .expect("application accepted")
    }
}

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
}

pub(super) fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 3, 1, 15, 0, 0)
            .single()
            .expect("valid timestamp"),
    ))
}

pub(super) fn harness() -> Harness {
    let repository = Arc::new(InMemoryShiftRepository::default());
    let notifications = Arc::new(InMemoryNotifications::default());
    let audit = Arc::new(InMemoryAuditLog::default());
    let service = Arc::new(ShiftService::with_clock(
        repository.clone(),
        Arc::new(InMemoryDirectory::demo()),
        notifications.clone(),
        audit.clone(),
        clock(),
    ));
    Harness {
        service,
        repository,
        notifications,
        audit,
    }
}

pub(super) fn draft(days_ahead: i64, slots: u32) -> ShiftDraft {
    ShiftDraft {
        store_id: ACTIVE_STORE,
        title: "Morning register".to_string(),
        description: "Open the front registers".to_string(),
        role_required: ShiftRole::Cashier,
        shift_date: today() + Duration::days(days_ahead),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        end_time: NaiveTime::from_hms_opt(13, 0, 0).expect("valid time"),
        slots_available: slots,
    }
}

pub(super) fn actor_request(
    method: &str,
    uri: &str,
    actor: UserId,
    body: Option<Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(ACTOR_HEADER, actor.0.to_string());
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Sees every shift but never any applications, so the eligibility check always passes and
/// the insert is what rejects the duplicate.
pub(super) struct RacingRepository {
    pub(super) inner: InMemoryShiftRepository,
}

impl ShiftRepository for RacingRepository {
    fn insert_shift(&self, shift: Shift) -> Result<Shift, RepositoryError> {
        self.inner.insert_shift(shift)
    }

    fn update_shift(&self, shift: Shift) -> Result<(), RepositoryError> {
        self.inner.update_shift(shift)
    }

    fn fetch_shift(&self, id: ShiftId) -> Result<Option<Shift>, RepositoryError> {
        self.inner.fetch_shift(id)
    }

    fn shifts(&self, scope: ShiftScope) -> Result<Vec<Shift>, RepositoryError> {
        self.inner.shifts(scope)
    }

    fn insert_application(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        self.inner.update_application(application)
    }

    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn applications(
        &self,
        _filter: ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(Vec::new())
    }

    fn record_history(&self, entry: ShiftHistoryEntry) -> Result<(), RepositoryError> {
        self.inner.record_history(entry)
    }

    fn history(&self, shift: ShiftId) -> Result<Vec<ShiftHistoryEntry>, RepositoryError> {
        self.inner.history(shift)
    }
}

pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl ShiftRepository for UnavailableRepository {
    fn insert_shift(&self, _shift: Shift) -> Result<Shift, RepositoryError> {
        offline()
    }

    fn update_shift(&self, _shift: Shift) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_shift(&self, _id: ShiftId) -> Result<Option<Shift>, RepositoryError> {
        offline()
    }

    fn shifts(&self, _scope: ShiftScope) -> Result<Vec<Shift>, RepositoryError> {
        offline()
    }

    fn insert_application(
        &self,
        _application: Application,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn update_application(&self, _application: Application) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_application(
        &self,
        _id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn applications(
        &self,
        _filter: ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn record_history(&self, _entry: ShiftHistoryEntry) -> Result<(), RepositoryError> {
        offline()
    }

    fn history(&self, _shift: ShiftId) -> Result<Vec<ShiftHistoryEntry>, RepositoryError> {
        offline()
    }
}

pub(super) fn unavailable_service() -> Arc<
    ShiftService<UnavailableRepository, InMemoryDirectory, InMemoryNotifications, InMemoryAuditLog>,
> {
    Arc::new(ShiftService::with_clock(
        Arc::new(UnavailableRepository),
        Arc::new(InMemoryDirectory::demo()),
        Arc::new(InMemoryNotifications::default()),
        Arc::new(InMemoryAuditLog::default()),
        clock(),
    ))
}

/// Sink whose transport is always down.
pub(super) struct DownNotifications;

impl NotificationSink for DownNotifications {
    fn notify(&self, _notification: OutboundNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("down".to_string()))
    }
}

pub(super) struct DownSinkHarness {
    pub(super) service: ShiftService<
        InMemoryShiftRepository,
        InMemoryDirectory,
        DownNotifications,
        InMemoryAuditLog,
    >,
    pub(super) repository: Arc<InMemoryShiftRepository>,
    pub(super) audit: Arc<InMemoryAuditLog>,
}

pub(super) fn down_sink_harness() -> DownSinkHarness {
    let repository = Arc::new(InMemoryShiftRepository::default());
    let audit = Arc::new(InMemoryAuditLog::default());
    let service = ShiftService::with_clock(
        repository.clone(),
        Arc::new(InMemoryDirectory::demo()),
        Arc::new(DownNotifications),
        audit.clone(),
        clock(),
    );
    DownSinkHarness {
        service,
        repository,
        audit,
    }
}
