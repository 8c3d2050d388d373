use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::{StoreId, UserId};
use crate::formats::{deserialize_date, deserialize_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShiftId(pub u64);

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position a shift is staffed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftRole {
    Cashier,
    Stocker,
    SalesAssociate,
    Supervisor,
    Cleaner,
}

impl ShiftRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cashier => "Cashier",
            Self::Stocker => "Stocker",
            Self::SalesAssociate => "Sales Associate",
            Self::Supervisor => "Supervisor",
            Self::Cleaner => "Cleaner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Filled,
    Cancelled,
    Completed,
}

impl ShiftStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Filled => "Filled",
            Self::Cancelled => "Cancelled",
            Self::Completed => "Completed",
        }
    }

    /// Cancelled and completed shifts are frozen.
    pub const fn accepts_changes(self) -> bool {
        matches!(self, Self::Open | Self::Filled)
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub store_id: StoreId,
    pub manager_id: UserId,
    pub title: String,
    pub description: String,
    pub role_required: ShiftRole,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Total capacity; remaining capacity is always derived from approved applications.
    pub slots_available: u32,
    pub status: ShiftStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.shift_date < today
    }

    pub fn is_managed_by(&self, user: UserId) -> bool {
        self.manager_id == user
    }

    pub(crate) fn apply_draft(&mut self, draft: ShiftDraft) {
        self.store_id = draft.store_id;
        self.title = draft.title.trim().to_string();
        self.description = draft.description;
        self.role_required = draft.role_required;
        self.shift_date = draft.shift_date;
        self.start_time = draft.start_time;
        self.end_time = draft.end_time;
        self.slots_available = draft.slots_available;
    }

    pub(crate) fn schedule_differs(&self, draft: &ShiftDraft) -> bool {
        self.shift_date != draft.shift_date
            || self.start_time != draft.start_time
            || self.end_time != draft.end_time
    }
}

/// Manager-supplied fields for posting or editing a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDraft {
    pub store_id: StoreId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub role_required: ShiftRole,
    #[serde(deserialize_with = "deserialize_date")]
    pub shift_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "deserialize_time")]
    pub end_time: NaiveTime,
    #[serde(default = "single_slot")]
    pub slots_available: u32,
}

fn single_slot() -> u32 {
    1
}

impl ShiftDraft {
    pub fn validate(&self) -> Result<(), ShiftValidationError> {
        if self.title.trim().is_empty() {
            return Err(ShiftValidationError::MissingTitle);
        }
        if self.start_time >= self.end_time {
            return Err(ShiftValidationError::EndNotAfterStart {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if self.slots_available == 0 {
            return Err(ShiftValidationError::NoSlots);
        }
        Ok(())
    }
}

/// Edit payload: the full draft plus an optional status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftUpdate {
    #[serde(flatten)]
    pub draft: ShiftDraft,
    #[serde(default)]
    pub status: Option<ShiftStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShiftValidationError {
    #[error("Shift title is required.")]
    MissingTitle,
    #[error("End time must be after start time. (start {start}, end {end})")]
    EndNotAfterStart { start: NaiveTime, end: NaiveTime },
    #[error("A shift needs at least one slot.")]
    NoSlots,
    #[error("store {0} is not accepting new shifts")]
    InactiveStore(StoreId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Withdrawn => "Withdrawn",
        }
    }

    /// Applicants who still hold a stake in the shift and hear about changes to it.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// `pending` is the only state with outgoing edges and nothing leads back to it.
    pub fn transition(
        self,
        transition: ApplicationTransition,
    ) -> Result<ApplicationStatus, InvalidTransition> {
        match (self, transition) {
            (Self::Pending, ApplicationTransition::Approve) => Ok(Self::Approved),
            (Self::Pending, ApplicationTransition::Reject) => Ok(Self::Rejected),
            (Self::Pending, ApplicationTransition::Withdraw) => Ok(Self::Withdrawn),
            (from, attempted) => Err(InvalidTransition { from, attempted }),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationTransition {
    Approve,
    Reject,
    Withdraw,
}

impl fmt::Display for ApplicationTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Withdraw => "withdraw",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {attempted} an application that is {from}")]
pub struct InvalidTransition {
    pub from: ApplicationStatus,
    pub attempted: ApplicationTransition,
}

/// Reviewer verdict on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub const fn transition(self) -> ApplicationTransition {
        match self {
            Self::Approve => ApplicationTransition::Approve,
            Self::Reject => ApplicationTransition::Reject,
        }
    }
}

/// A staff member's request to fill a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub shift_id: ShiftId,
    pub applicant_id: UserId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftHistoryAction {
    Created,
    Updated,
    Cancelled,
    Rescheduled,
}

impl ShiftHistoryAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Cancelled => "Cancelled",
            Self::Rescheduled => "Rescheduled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftHistoryEntry {
    pub shift_id: ShiftId,
    pub action: ShiftHistoryAction,
    pub performed_by: UserId,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Optional narrowing for the open-shift browse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenShiftFilter {
    #[serde(default)]
    pub role: Option<ShiftRole>,
    #[serde(default)]
    pub store: Option<StoreId>,
}

impl OpenShiftFilter {
    pub fn matches(&self, shift: &Shift) -> bool {
        self.role.map_or(true, |role| shift.role_required == role)
            && self.store.map_or(true, |store| shift.store_id == store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ShiftDraft {
        ShiftDraft {
            store_id: StoreId(1),
            title: "Morning register".to_string(),
            description: String::new(),
            role_required: ShiftRole::Cashier,
            shift_date: NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            end_time: NaiveTime::from_hms_opt(13, 0, 0).expect("valid time"),
            slots_available: 2,
        }
    }

    #[test]
    fn draft_requires_end_after_start() {
        let mut equal = draft();
        equal.end_time = equal.start_time;
        assert!(matches!(
            equal.validate(),
            Err(ShiftValidationError::EndNotAfterStart { .. })
        ));

        let mut inverted = draft();
        inverted.start_time = NaiveTime::from_hms_opt(14, 0, 0).expect("valid time");
        let err = inverted.validate().expect_err("inverted times rejected");
        assert!(err.to_string().starts_with("End time must be after start time."));
    }

    #[test]
    fn draft_requires_slots_and_title() {
        let mut no_slots = draft();
        no_slots.slots_available = 0;
        assert_eq!(no_slots.validate(), Err(ShiftValidationError::NoSlots));

        let mut blank = draft();
        blank.title = "   ".to_string();
        assert_eq!(blank.validate(), Err(ShiftValidationError::MissingTitle));

        assert!(draft().validate().is_ok());
    }

    #[test]
    fn draft_deserializes_html_time_inputs() {
        let draft: ShiftDraft = serde_json::from_value(serde_json::json!({
            "store_id": 3,
            "title": "Restock aisle 4",
            "role_required": "stocker",
            "shift_date": "2026-03-02",
            "start_time": "06:30",
            "end_time": "10:00:00"
        }))
        .expect("draft parses");
        assert_eq!(draft.slots_available, 1);
        assert_eq!(
            draft.start_time,
            NaiveTime::from_hms_opt(6, 30, 0).expect("valid time")
        );
    }

    #[test]
    fn only_pending_applications_transition() {
        use ApplicationStatus::*;
        use ApplicationTransition::*;

        assert_eq!(Pending.transition(Approve), Ok(Approved));
        assert_eq!(Pending.transition(Reject), Ok(Rejected));
        assert_eq!(Pending.transition(Withdraw), Ok(Withdrawn));

        for from in [Approved, Rejected, Withdrawn] {
            for attempted in [Approve, Reject, Withdraw] {
                assert_eq!(
                    from.transition(attempted),
                    Err(InvalidTransition { from, attempted })
                );
            }
        }
    }

    #[test]
    fn invalid_transition_reads_naturally() {
        let err = ApplicationStatus::Approved
            .transition(ApplicationTransition::Withdraw)
            .expect_err("approved is terminal");
        assert_eq!(err.to_string(), "cannot withdraw an application that is Approved");
    }
}
