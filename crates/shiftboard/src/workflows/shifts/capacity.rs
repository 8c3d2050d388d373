//! Slot accounting and volunteer eligibility.
//!
//! Every figure here is computed from the application list handed in by the caller. There is
//! no stored counter to drift: callers fetch the shift's applications fresh for each decision.

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{Application, ApplicationStatus, Shift, ShiftStatus};
use crate::directory::UserId;

/// First precondition a volunteer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibleReason {
    #[error("shift is {status}, not open")]
    ShiftNotOpen { status: ShiftStatus },
    #[error("shift date has already passed")]
    ShiftInPast,
    #[error("no slots remaining")]
    NoSlotsRemaining,
    #[error("already applied to this shift")]
    AlreadyApplied,
}

pub fn approved_count(shift: &Shift, applications: &[Application]) -> usize {
    count_with_status(shift, applications, ApplicationStatus::Approved)
}

pub fn count_with_status(
    shift: &Shift,
    applications: &[Application],
    status: ApplicationStatus,
) -> usize {
    applications
        .iter()
        .filter(|application| application.shift_id == shift.id && application.status == status)
        .count()
}

/// Total slots minus approved applications. Negative once approvals exceed capacity.
pub fn available_slots(shift: &Shift, applications: &[Application]) -> i64 {
    i64::from(shift.slots_available) - approved_count(shift, applications) as i64
}

pub fn check_eligibility(
    shift: &Shift,
    applicant: UserId,
    applications: &[Application],
    today: NaiveDate,
) -> Result<(), IneligibleReason> {
    if shift.status != ShiftStatus::Open {
        return Err(IneligibleReason::ShiftNotOpen {
            status: shift.status,
        });
    }
    if shift.is_past(today) {
        return Err(IneligibleReason::ShiftInPast);
    }
    if available_slots(shift, applications) <= 0 {
        return Err(IneligibleReason::NoSlotsRemaining);
    }
    // Any prior record blocks, including withdrawn and rejected ones.
    if applications.iter().any(|application| {
        application.shift_id == shift.id && application.applicant_id == applicant
    }) {
        return Err(IneligibleReason::AlreadyApplied);
    }
    Ok(())
}

pub fn can_volunteer(
    shift: &Shift,
    applicant: UserId,
    applications: &[Application],
    today: NaiveDate,
) -> bool {
    check_eligibility(shift, applicant, applications, today).is_ok()
}
