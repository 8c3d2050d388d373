//! End-to-end scenarios for posting a shift, collecting volunteers, and reviewing them, driven
//! through the public service facade with the in-memory adapters.

mod common {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    use shiftboard::clock::{Clock, FixedClock};
    use shiftboard::directory::{Directory, StoreId, User, UserId};
    use shiftboard::memory::{
        InMemoryAuditLog, InMemoryDirectory, InMemoryNotifications, InMemoryShiftRepository,
    };
    use shiftboard::workflows::reporting::ReportService;
    use shiftboard::workflows::shifts::{ShiftDraft, ShiftRole, ShiftService};

    pub(super) type Shifts = ShiftService<
        InMemoryShiftRepository,
        InMemoryDirectory,
        InMemoryNotifications,
        InMemoryAuditLog,
    >;
    pub(super) type Reports = ReportService<
        InMemoryShiftRepository,
        InMemoryDirectory,
        InMemoryNotifications,
        InMemoryAuditLog,
    >;

    pub(super) const ADMIN: UserId = UserId(1);
    pub(super) const MANAGER: UserId = UserId(2);
    pub(super) const CASEY: UserId = UserId(4);
    pub(super) const RILEY: UserId = UserId(5);
    pub(super) const SAM: UserId = UserId(6);

    pub(super) struct Board {
        pub(super) shifts: Shifts,
        pub(super) reports: Reports,
        pub(super) directory: Arc<InMemoryDirectory>,
        pub(super) notifications: Arc<InMemoryNotifications>,
    }

    impl Board {
        pub(super) fn user(&self, id: UserId) -> User {
            self.directory
                .user(id)
                .expect("directory available")
                .expect("demo user exists")
        }
    }

    pub(super) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date")
    }

    pub(super) fn board() -> Board {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 5, 1, 14, 0, 0).single().expect("valid instant"),
        ));
        let repository = Arc::new(InMemoryShiftRepository::default());
        let directory = Arc::new(InMemoryDirectory::demo());
        let notifications = Arc::new(InMemoryNotifications::default());
        let audit = Arc::new(InMemoryAuditLog::default());

        Board {
            shifts: ShiftService::with_clock(
                repository.clone(),
                directory.clone(),
                notifications.clone(),
                audit.clone(),
                clock.clone(),
            ),
            reports: ReportService::with_clock(
                repository,
                directory.clone(),
                notifications.clone(),
                audit,
                clock,
            ),
            directory,
            notifications,
        }
    }

    pub(super) fn weekend_draft(slots: u32) -> ShiftDraft {
        ShiftDraft {
            store_id: StoreId(1),
            title: "Saturday floor".to_string(),
            description: String::new(),
            role_required: ShiftRole::SalesAssociate,
            shift_date: today() + chrono::Duration::days(1),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
            end_time: NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"),
            slots_available: slots,
        }
    }
}

use common::*;
use shiftboard::audit::AuditAction;
use shiftboard::notifications::NotificationKind;
use shiftboard::workflows::reporting::{Dashboard, DateWindow};
use shiftboard::workflows::shifts::{
    ApplicationStatus, IneligibleReason, ReviewDecision, ShiftServiceError,
};

#[test]
fn volunteers_fill_a_shift_and_managers_can_overbook_it() {
    let board = board();
    let manager = board.user(MANAGER);
    let shift = board
        .shifts
        .create_shift(&manager, weekend_draft(1))
        .expect("manager posts shift");

    let casey = board
        .shifts
        .apply(&board.user(CASEY), shift.id, Some("Can stay late".to_string()))
        .expect("casey applies");
    let riley = board
        .shifts
        .apply(&board.user(RILEY), shift.id, None)
        .expect("pending applications do not consume slots");

    board
        .shifts
        .review(&manager, casey.id, ReviewDecision::Approve, None)
        .expect("first approval");
    assert_eq!(board.shifts.available_slots(shift.id).expect("slots"), 0);
    assert!(!board
        .shifts
        .can_volunteer(&board.user(SAM), shift.id)
        .expect("eligibility check"));

    let late = board.shifts.apply(&board.user(SAM), shift.id, None);
    assert!(matches!(
        late,
        Err(ShiftServiceError::Ineligible(IneligibleReason::NoSlotsRemaining))
    ));

    let overbooked = board
        .shifts
        .review(
            &manager,
            riley.id,
            ReviewDecision::Approve,
            Some("Need the extra hands".to_string()),
        )
        .expect("review does not guard on remaining slots");
    assert_eq!(overbooked.status, ApplicationStatus::Approved);
    assert_eq!(overbooked.notes, "Need the extra hands");
    assert_eq!(board.shifts.available_slots(shift.id).expect("slots"), -1);
}

#[test]
fn withdrawn_applicants_cannot_reapply() {
    let board = board();
    let manager = board.user(MANAGER);
    let casey = board.user(CASEY);
    let shift = board
        .shifts
        .create_shift(&manager, weekend_draft(2))
        .expect("manager posts shift");

    let application = board
        .shifts
        .apply(&casey, shift.id, None)
        .expect("casey applies");
    let withdrawn = board
        .shifts
        .withdraw(&casey, application.id)
        .expect("casey withdraws");
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);

    let again = board.shifts.apply(&casey, shift.id, None);
    assert!(matches!(
        again,
        Err(ShiftServiceError::Ineligible(IneligibleReason::AlreadyApplied))
    ));

    let review = board
        .shifts
        .review(&manager, application.id, ReviewDecision::Approve, None);
    assert!(matches!(review, Err(ShiftServiceError::InvalidTransition(_))));
}

#[test]
fn applicants_and_managers_hear_about_each_step() {
    let board = board();
    let manager = board.user(MANAGER);
    let shift = board
        .shifts
        .create_shift(&manager, weekend_draft(2))
        .expect("manager posts shift");

    let application = board
        .shifts
        .apply(&board.user(CASEY), shift.id, None)
        .expect("casey applies");
    board
        .shifts
        .review(&manager, application.id, ReviewDecision::Reject, None)
        .expect("manager rejects");

    let delivered = board.notifications.delivered().expect("inbox readable");
    let kinds: Vec<_> = delivered
        .iter()
        .map(|note| (note.recipient, note.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (MANAGER, NotificationKind::NewApplication),
            (CASEY, NotificationKind::ApplicationRejected),
        ]
    );
    assert_eq!(
        delivered[1].message,
        "Your application for Saturday floor on 2026-05-02 was rejected."
    );

    match board.reports.dashboard(&board.user(CASEY)).expect("staff dashboard") {
        Dashboard::Staff(view) => assert_eq!(view.unread_notifications, 1),
        other => panic!("expected staff dashboard, got {other:?}"),
    }
}

#[test]
fn reports_reflect_the_workflow() {
    let board = board();
    let manager = board.user(MANAGER);
    let admin = board.user(ADMIN);
    let shift = board
        .shifts
        .create_shift(&manager, weekend_draft(3))
        .expect("manager posts shift");

    for volunteer in [CASEY, RILEY] {
        let application = board
            .shifts
            .apply(&board.user(volunteer), shift.id, None)
            .expect("volunteer applies");
        board
            .shifts
            .review(&manager, application.id, ReviewDecision::Approve, None)
            .expect("manager approves");
    }
    board
        .shifts
        .apply(&board.user(SAM), shift.id, None)
        .expect("sam applies");

    let report = board
        .reports
        .report(&manager, DateWindow::default())
        .expect("manager report");
    assert_eq!(report.stats.total_shifts, 1);
    assert_eq!(report.stats.total_applications, 3);
    assert_eq!(report.stats.approved_applications, 2);
    assert_eq!(report.stats.pending_applications, 1);
    assert_eq!(report.top_volunteers.len(), 2);

    match board.reports.dashboard(&board.user(SAM)).expect("staff dashboard") {
        Dashboard::Staff(view) => {
            assert_eq!(view.my_applications, 1);
            assert_eq!(view.approved_shifts, 0);
            assert_eq!(view.available_shifts, 1);
            assert_eq!(view.unread_notifications, 0);
        }
        other => panic!("expected staff dashboard, got {other:?}"),
    }

    let export = board
        .reports
        .export_volunteers(&admin)
        .expect("admin exports volunteers");
    assert_eq!(export.rows, 3);

    let trail = board.reports.audit_log(&admin).expect("admin reads audit log");
    assert_eq!(trail[0].action, AuditAction::ReportExported);
    assert_eq!(
        trail.last().map(|entry| entry.action),
        Some(AuditAction::ShiftCreated)
    );
}
