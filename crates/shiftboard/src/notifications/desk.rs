use std::sync::Arc;

use serde::Serialize;

use super::{Notification, NotificationError, NotificationId, NotificationInbox};
use crate::directory::{Directory, User};

/// Inbox operations performed on behalf of the acting user.
pub struct NotificationDesk<D, N> {
    directory: Arc<D>,
    inbox: Arc<N>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationListView {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

impl<D, N> NotificationDesk<D, N>
where
    D: Directory + 'static,
    N: NotificationInbox + 'static,
{
    pub fn new(directory: Arc<D>, inbox: Arc<N>) -> Self {
        Self { directory, inbox }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Newest first.
    pub fn list(&self, actor: &User) -> Result<NotificationListView, DeskError> {
        let mut notifications = self.inbox.for_recipient(actor.id)?;
        notifications.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        let unread_count = notifications.iter().filter(|n| !n.is_read).count();
        Ok(NotificationListView {
            notifications,
            unread_count,
        })
    }

    pub fn mark_read(&self, actor: &User, id: NotificationId) -> Result<Notification, DeskError> {
        self.inbox
            .mark_read(actor.id, id)?
            .ok_or(DeskError::NotFound(id))
    }

    pub fn mark_all_read(&self, actor: &User) -> Result<usize, DeskError> {
        let updated = self.inbox.mark_all_read(actor.id)?;
        tracing::debug!(recipient = %actor.id, updated, "notifications marked read");
        Ok(updated)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("notification {0} not found")]
    NotFound(NotificationId),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::UserId;
    use crate::memory::{InMemoryDirectory, InMemoryNotifications};
    use crate::notifications::{NotificationKind, NotificationSink, OutboundNotification};

    fn note(recipient: UserId, title: &str) -> OutboundNotification {
        OutboundNotification {
            recipient,
            kind: NotificationKind::System,
            title: title.to_string(),
            message: String::new(),
            link: String::new(),
        }
    }

    fn desk() -> (
        NotificationDesk<InMemoryDirectory, InMemoryNotifications>,
        Arc<InMemoryDirectory>,
    ) {
        let directory = Arc::new(InMemoryDirectory::demo());
        let inbox = Arc::new(InMemoryNotifications::default());
        let deliveries = [
            (UserId(4), "first"),
            (UserId(5), "other"),
            (UserId(4), "second"),
        ];
        for (recipient, title) in deliveries {
            inbox.notify(note(recipient, title)).expect("delivered");
        }
        (NotificationDesk::new(directory.clone(), inbox), directory)
    }

    fn user(directory: &InMemoryDirectory, id: u64) -> User {
        directory
            .user(UserId(id))
            .expect("directory available")
            .expect("demo user")
    }

    #[test]
    fn listing_is_newest_first_with_unread_count() {
        let (desk, directory) = desk();
        let view = desk.list(&user(&directory, 4)).expect("inbox lists");
        let titles: Vec<_> = view.notifications.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(view.unread_count, 2);
    }

    #[test]
    fn mark_read_only_touches_the_recipients_own_notifications() {
        let (desk, directory) = desk();
        let casey = user(&directory, 4);
        let riley = user(&directory, 5);
        let target = desk.list(&casey).expect("inbox lists").notifications[0].id;

        assert!(matches!(
            desk.mark_read(&riley, target),
            Err(DeskError::NotFound(id)) if id == target
        ));

        let read = desk.mark_read(&casey, target).expect("own notification");
        assert!(read.is_read);
        assert_eq!(desk.list(&casey).expect("inbox lists").unread_count, 1);
    }

    #[test]
    fn mark_all_read_reports_how_many_changed() {
        let (desk, directory) = desk();
        let casey = user(&directory, 4);
        assert_eq!(desk.mark_all_read(&casey).expect("marks"), 2);
        assert_eq!(desk.mark_all_read(&casey).expect("marks"), 0);
        assert_eq!(
            desk.list(&user(&directory, 5)).expect("inbox lists").unread_count,
            1
        );
    }
}
