use super::domain::{Application, ApplicationId, Shift, ShiftHistoryEntry, ShiftId};
use crate::directory::UserId;

/// Which shifts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftScope {
    All,
    ManagedBy(UserId),
}

impl ShiftScope {
    pub fn includes(&self, shift: &Shift) -> bool {
        match self {
            ShiftScope::All => true,
            ShiftScope::ManagedBy(manager) => shift.manager_id == *manager,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationFilter {
    All,
    ForShift(ShiftId),
    ForApplicant(UserId),
    /// Applications to any shift owned by the given manager.
    ForManager(UserId),
}

/// Storage abstraction for shifts, applications, and shift history.
pub trait ShiftRepository: Send + Sync {
    fn insert_shift(&self, shift: Shift) -> Result<Shift, RepositoryError>;
    fn update_shift(&self, shift: Shift) -> Result<(), RepositoryError>;
    fn fetch_shift(&self, id: ShiftId) -> Result<Option<Shift>, RepositoryError>;
    fn shifts(&self, scope: ShiftScope) -> Result<Vec<Shift>, RepositoryError>;

    /// Must reject a second application for the same (shift, applicant) pair with `Conflict`.
    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch_application(&self, id: ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn applications(&self, filter: ApplicationFilter) -> Result<Vec<Application>, RepositoryError>;

    fn record_history(&self, entry: ShiftHistoryEntry) -> Result<(), RepositoryError>;
    fn history(&self, shift: ShiftId) -> Result<Vec<ShiftHistoryEntry>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
