use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::capacity::{self, IneligibleReason};
use super::domain::{Application, ApplicationStatus, Shift, ShiftHistoryEntry};
use crate::directory::StoreId;

/// Shift plus its live capacity figures.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftSummary {
    #[serde(flatten)]
    pub shift: Shift,
    pub role_label: &'static str,
    pub status_label: &'static str,
    pub available_slots: i64,
    pub approved_count: usize,
    pub pending_count: usize,
}

impl ShiftSummary {
    pub fn from_applications(shift: Shift, applications: &[Application]) -> Self {
        let available_slots = capacity::available_slots(&shift, applications);
        let approved_count = capacity::approved_count(&shift, applications);
        let pending_count =
            capacity::count_with_status(&shift, applications, ApplicationStatus::Pending);
        Self {
            role_label: shift.role_required.label(),
            status_label: shift.status.label(),
            available_slots,
            approved_count,
            pending_count,
            shift,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShiftDetail {
    #[serde(flatten)]
    pub summary: ShiftSummary,
    pub can_volunteer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ineligible_reason: Option<IneligibleReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_application: Option<Application>,
    /// Only populated for the owning manager and admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<Application>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ShiftHistoryEntry>>,
}

/// An applicant's own application joined with the shift it targets.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub status_label: &'static str,
    pub shift_title: String,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub store_id: StoreId,
}

impl ApplicationView {
    pub fn new(application: Application, shift: &Shift) -> Self {
        Self {
            status_label: application.status.label(),
            shift_title: shift.title.clone(),
            shift_date: shift.shift_date,
            start_time: shift.start_time,
            end_time: shift.end_time,
            store_id: shift.store_id,
            application,
        }
    }
}

/// Newest date first, later start first within a day.
pub(crate) fn sort_shifts(shifts: &mut [Shift]) {
    shifts.sort_by(|a, b| {
        b.shift_date
            .cmp(&a.shift_date)
            .then_with(|| b.start_time.cmp(&a.start_time))
            .then_with(|| b.id.cmp(&a.id))
    });
}
