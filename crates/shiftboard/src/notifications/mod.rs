//! One-way messages to users: the sink the shift workflow emits into, and the recipient-facing
//! inbox built on top of it.

mod desk;
pub mod router;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::UserId;

pub use desk::{DeskError, NotificationDesk, NotificationListView};
pub use router::notification_router;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ShiftCreated,
    ShiftUpdated,
    ShiftCancelled,
    ApplicationApproved,
    ApplicationRejected,
    NewApplication,
    System,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShiftCreated => "Shift Created",
            Self::ShiftUpdated => "Shift Updated",
            Self::ShiftCancelled => "Shift Cancelled",
            Self::ApplicationApproved => "Application Approved",
            Self::ApplicationRejected => "Application Rejected",
            Self::NewApplication => "New Application",
            Self::System => "System Notification",
        }
    }
}

/// Message handed to a sink; the sink assigns identity and read state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundNotification {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: OutboundNotification) -> Result<(), NotificationError>;
}

/// Recipient-scoped reads and read-state updates over delivered notifications.
pub trait NotificationInbox: NotificationSink {
    fn for_recipient(&self, recipient: UserId) -> Result<Vec<Notification>, NotificationError>;

    /// Returns `None` when the id is unknown or belongs to another recipient.
    fn mark_read(
        &self,
        recipient: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, NotificationError>;

    fn mark_all_read(&self, recipient: UserId) -> Result<usize, NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
