use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use shiftboard::clock::{Clock, FixedClock};
use shiftboard::directory::{Directory, DirectoryError, StoreId, User, UserId};
use shiftboard::error::AppError;
use shiftboard::memory::{
    InMemoryAuditLog, InMemoryDirectory, InMemoryNotifications, InMemoryShiftRepository,
};
use shiftboard::workflows::reporting::{DateWindow, ReportService};
use shiftboard::workflows::shifts::{ReviewDecision, ShiftDraft, ShiftRole, ShiftService};
use std::sync::Arc;

const MANAGER: UserId = UserId(2);
const VOLUNTEERS: [UserId; 3] = [UserId(4), UserId(5), UserId(6)];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Date the walkthrough treats as today (YYYY-MM-DD). Defaults to the current date.
    #[arg(long, value_parser = shiftboard::formats::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Slots on the demo shift. Two volunteers are approved regardless.
    #[arg(long, default_value_t = 1)]
    pub(crate) slots: u32,
    /// Print the CSV exports after the dashboard.
    #[arg(long)]
    pub(crate) with_exports: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(today.and_time(NaiveTime::MIN).and_utc()));

    let repository = Arc::new(InMemoryShiftRepository::default());
    let directory = Arc::new(InMemoryDirectory::demo());
    let notifications = Arc::new(InMemoryNotifications::default());
    let audit = Arc::new(InMemoryAuditLog::default());

    let shifts = ShiftService::with_clock(
        repository.clone(),
        directory.clone(),
        notifications.clone(),
        audit.clone(),
        clock.clone(),
    );
    let reports = ReportService::with_clock(
        repository,
        directory.clone(),
        notifications.clone(),
        audit,
        clock,
    );

    let manager = demo_user(&directory, MANAGER)?;
    let shift = shifts.create_shift(
        &manager,
        ShiftDraft {
            store_id: StoreId(1),
            title: "Weekend restock".to_string(),
            description: "Unload the Saturday truck and face the aisles.".to_string(),
            role_required: ShiftRole::Stocker,
            shift_date: today + Duration::days(3),
            start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap_or(NaiveTime::MIN),
            slots_available: args.slots,
        },
    )?;

    println!("Shift board demo");
    println!(
        "  Posted \"{}\" on {} ({} slot(s)) at store {}",
        shift.title, shift.shift_date, shift.slots_available, shift.store_id
    );

    println!("\nVolunteers");
    let mut applications = Vec::new();
    for id in VOLUNTEERS {
        let volunteer = demo_user(&directory, id)?;
        match shifts.apply(&volunteer, shift.id, None) {
            Ok(application) => {
                println!("  {} applied (application {})", volunteer.username, application.id);
                applications.push(application);
            }
            Err(err) => println!("  {} was turned away: {}", volunteer.username, err),
        }
    }

    // The last volunteer stays pending so the withdrawal path has something to act on.
    let withdrawing = applications.pop();

    println!("\nReview");
    for application in &applications {
        let reviewed = shifts.review(&manager, application.id, ReviewDecision::Approve, None)?;
        println!(
            "  Approved application {}; {} slot(s) remain",
            reviewed.id,
            shifts.available_slots(shift.id)?
        );
    }

    if let Some(pending) = withdrawing {
        let applicant = demo_user(&directory, pending.applicant_id)?;
        shifts.withdraw(&applicant, pending.id)?;
        println!("  {} withdrew", applicant.username);
        match shifts.apply(&applicant, shift.id, None) {
            Ok(_) => println!("  {} reapplied", applicant.username),
            Err(err) => println!("  {} could not reapply: {}", applicant.username, err),
        }
    }

    match notifications.delivered() {
        Ok(inbox) => {
            println!("\nNotifications delivered: {}", inbox.len());
            for notification in &inbox {
                println!(
                    "  to user {}: [{}] {}",
                    notification.recipient,
                    notification.kind.label(),
                    notification.message
                );
            }
        }
        Err(err) => println!("\nNotifications unavailable: {}", err),
    }

    let dashboard = reports.dashboard(&manager)?;
    match serde_json::to_string_pretty(&dashboard) {
        Ok(json) => println!("\nManager dashboard:\n{}", json),
        Err(err) => println!("\nManager dashboard unavailable: {}", err),
    }

    let report = reports.report(&manager, DateWindow::default())?;
    println!(
        "\nReport: {} shift(s), {} application(s), {} approved",
        report.stats.total_shifts,
        report.stats.total_applications,
        report.stats.approved_applications
    );

    if args.with_exports {
        let exports = [
            reports.export_shifts(&manager)?,
            reports.export_volunteers(&manager)?,
        ];
        for export in exports {
            println!("\n{} ({} row(s))\n{}", export.filename, export.rows, export.body);
        }
    }

    Ok(())
}

fn demo_user(directory: &InMemoryDirectory, id: UserId) -> Result<User, AppError> {
    directory.user(id)?.ok_or_else(|| {
        AppError::Directory(DirectoryError::InvalidSeed(format!(
            "demo user {id} missing"
        )))
    })
}
