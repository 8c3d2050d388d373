use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::directory::UserId;
use crate::formats::deserialize_optional_date;
use crate::workflows::shifts::{Application, Shift};

/// Inclusive shift-date bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DateWindow {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date_to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_from.map_or(true, |from| date >= from)
            && self.date_to.map_or(true, |to| date <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffDashboard {
    pub available_shifts: usize,
    pub my_applications: usize,
    pub approved_shifts: usize,
    pub unread_notifications: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OversightDashboard {
    pub total_shifts: usize,
    pub open_shifts: usize,
    pub pending_applications: usize,
    pub total_staff: usize,
    pub total_stores: usize,
    pub recent_shifts: Vec<Shift>,
    pub recent_applications: Vec<Application>,
    pub unread_notifications: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_managers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_users: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Dashboard {
    Staff(StaffDashboard),
    Manager(OversightDashboard),
    Admin(OversightDashboard),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub total_shifts: usize,
    pub open_shifts: usize,
    pub filled_shifts: usize,
    pub cancelled_shifts: usize,
    pub total_applications: usize,
    pub approved_applications: usize,
    pub rejected_applications: usize,
    pub pending_applications: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolunteerRanking {
    pub user_id: UserId,
    pub username: String,
    pub full_name: String,
    pub approved_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub stats: ReportStats,
    pub top_volunteers: Vec<VolunteerRanking>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub is_manager: bool,
}

/// Rendered CSV document with its download name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: &'static str,
    pub body: String,
    pub rows: usize,
}
