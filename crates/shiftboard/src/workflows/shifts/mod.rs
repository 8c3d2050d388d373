//! Shift posting, volunteering, and review.
//!
//! Managers post shifts with a fixed number of slots; staff volunteer and wait for a
//! manager to approve or reject. Remaining capacity is never stored, it is recomputed
//! from approved applications whenever it is needed.

pub mod capacity;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use capacity::IneligibleReason;
pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationTransition, InvalidTransition,
    OpenShiftFilter, ReviewDecision, Shift, ShiftDraft, ShiftHistoryAction, ShiftHistoryEntry,
    ShiftId, ShiftRole, ShiftStatus, ShiftUpdate, ShiftValidationError,
};
pub use repository::{ApplicationFilter, RepositoryError, ShiftRepository, ShiftScope};
pub use router::shift_router;
pub use service::{Record, ShiftService, ShiftServiceError};
pub use views::{ApplicationView, ShiftDetail, ShiftSummary};
