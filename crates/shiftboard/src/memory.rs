//! Process-local adapters for every storage seam. The API binary runs on these; state is lost
//! on restart.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::Deserialize;

use crate::audit::{AuditEntry, AuditError, AuditSink};
use crate::directory::{Directory, DirectoryError, Role, Store, StoreId, User, UserId};
use crate::notifications::{
    Notification, NotificationError, NotificationId, NotificationInbox, NotificationSink,
    OutboundNotification,
};
use crate::workflows::shifts::{
    Application, ApplicationFilter, ApplicationId, RepositoryError, Shift, ShiftHistoryEntry,
    ShiftId, ShiftRepository, ShiftScope,
};

fn poisoned<T>(what: &str) -> impl FnOnce(std::sync::PoisonError<T>) -> String + '_ {
    move |_| format!("{what} lock poisoned")
}

#[derive(Default)]
struct ShiftTables {
    shifts: BTreeMap<ShiftId, Shift>,
    applications: BTreeMap<ApplicationId, Application>,
    pairs: HashSet<(ShiftId, UserId)>,
    history: Vec<ShiftHistoryEntry>,
}

/// Shift, application, and history tables behind one lock.
#[derive(Default)]
pub struct InMemoryShiftRepository {
    tables: Mutex<ShiftTables>,
}

impl InMemoryShiftRepository {
    fn lock(&self) -> Result<MutexGuard<'_, ShiftTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(poisoned("shift repository"))
            .map_err(RepositoryError::Unavailable)
    }
}

impl ShiftRepository for InMemoryShiftRepository {
    fn insert_shift(&self, shift: Shift) -> Result<Shift, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.shifts.contains_key(&shift.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.shifts.insert(shift.id, shift.clone());
        Ok(shift)
    }

    fn update_shift(&self, shift: Shift) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        match tables.shifts.get_mut(&shift.id) {
            Some(existing) => {
                *existing = shift;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_shift(&self, id: ShiftId) -> Result<Option<Shift>, RepositoryError> {
        Ok(self.lock()?.shifts.get(&id).cloned())
    }

    fn shifts(&self, scope: ShiftScope) -> Result<Vec<Shift>, RepositoryError> {
        Ok(self
            .lock()?
            .shifts
            .values()
            .filter(|shift| scope.includes(shift))
            .cloned()
            .collect())
    }

    fn insert_application(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut tables = self.lock()?;
        let pair = (application.shift_id, application.applicant_id);
        if tables.applications.contains_key(&application.id) || tables.pairs.contains(&pair) {
            return Err(RepositoryError::Conflict);
        }
        tables.pairs.insert(pair);
        tables.applications.insert(application.id, application.clone());
        Ok(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        match tables.applications.get_mut(&application.id) {
            Some(existing) => {
                *existing = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn applications(&self, filter: ApplicationFilter) -> Result<Vec<Application>, RepositoryError> {
        let tables = self.lock()?;
        let matches = |application: &Application| match filter {
            ApplicationFilter::All => true,
            ApplicationFilter::ForShift(shift) => application.shift_id == shift,
            ApplicationFilter::ForApplicant(applicant) => application.applicant_id == applicant,
            ApplicationFilter::ForManager(manager) => tables
                .shifts
                .get(&application.shift_id)
                .is_some_and(|shift| shift.manager_id == manager),
        };
        Ok(tables
            .applications
            .values()
            .filter(|application| matches(application))
            .cloned()
            .collect())
    }

    fn record_history(&self, entry: ShiftHistoryEntry) -> Result<(), RepositoryError> {
        self.lock()?.history.push(entry);
        Ok(())
    }

    fn history(&self, shift: ShiftId) -> Result<Vec<ShiftHistoryEntry>, RepositoryError> {
        Ok(self
            .lock()?
            .history
            .iter()
            .filter(|entry| entry.shift_id == shift)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default, Deserialize)]
struct DirectorySeed {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    stores: Vec<Store>,
}

/// Fixed user and store registry, loaded once at startup.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: BTreeMap<UserId, User>,
    stores: BTreeMap<StoreId, Store>,
}

impl InMemoryDirectory {
    pub fn new(users: Vec<User>, stores: Vec<Store>) -> Self {
        Self {
            users: users.into_iter().map(|user| (user.id, user)).collect(),
            stores: stores.into_iter().map(|store| (store.id, store)).collect(),
        }
    }

    /// Parse a `{ "users": [...], "stores": [...] }` document.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, DirectoryError> {
        let seed: DirectorySeed = serde_json::from_reader(reader)
            .map_err(|err| DirectoryError::InvalidSeed(err.to_string()))?;
        let mut seen = HashSet::new();
        if let Some(duplicate) = seed.users.iter().find(|user| !seen.insert(user.id)) {
            return Err(DirectoryError::InvalidSeed(format!(
                "duplicate user id {}",
                duplicate.id
            )));
        }
        Ok(Self::new(seed.users, seed.stores))
    }

    /// Three stores, one of them inactive, plus an admin, two managers and three staff.
    pub fn demo() -> Self {
        let user = |id: u64, username: &str, first: &str, last: &str, role: Role| User {
            id: UserId(id),
            username: username.to_string(),
            email: format!("{username}@shiftboard.test"),
            first_name: first.to_string(),
            last_name: last.to_string(),
            role,
            phone: None,
            is_active: true,
        };
        let store = |id: u64, name: &str, city: &str, manager: u64, is_active: bool| Store {
            id: StoreId(id),
            name: name.to_string(),
            address: format!("{id}00 Main Street"),
            city: city.to_string(),
            state: "IA".to_string(),
            zip_code: "50309".to_string(),
            phone: "515-555-0100".to_string(),
            manager: Some(UserId(manager)),
            is_active,
        };

        Self::new(
            vec![
                user(1, "admin", "Avery", "Admin", Role::Admin),
                user(2, "mgr.downtown", "Morgan", "Reyes", Role::Manager),
                user(3, "mgr.westside", "Jordan", "Lee", Role::Manager),
                user(4, "casey", "Casey", "Nguyen", Role::Staff),
                user(5, "riley", "Riley", "Patel", Role::Staff),
                user(6, "sam", "Sam", "Okafor", Role::Staff),
            ],
            vec![
                store(1, "Downtown Market", "Des Moines", 2, true),
                store(2, "Westside Grocery", "West Des Moines", 3, true),
                store(3, "Riverfront Outlet", "Ankeny", 2, false),
            ],
        )
    }
}

impl Directory for InMemoryDirectory {
    fn user(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        Ok(self.users.get(&id).cloned())
    }

    fn users(&self) -> Result<Vec<User>, DirectoryError> {
        Ok(self.users.values().cloned().collect())
    }

    fn store(&self, id: StoreId) -> Result<Option<Store>, DirectoryError> {
        Ok(self.stores.get(&id).cloned())
    }

    fn stores(&self) -> Result<Vec<Store>, DirectoryError> {
        Ok(self.stores.values().cloned().collect())
    }
}

/// Delivered notifications, kept per process.
pub struct InMemoryNotifications {
    delivered: Mutex<Vec<Notification>>,
    sequence: AtomicU64,
}

impl Default for InMemoryNotifications {
    fn default() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(1),
        }
    }
}

impl InMemoryNotifications {
    fn lock(&self) -> Result<MutexGuard<'_, Vec<Notification>>, NotificationError> {
        self.delivered
            .lock()
            .map_err(poisoned("notification"))
            .map_err(NotificationError::Transport)
    }

    /// Everything delivered so far, in delivery order.
    pub fn delivered(&self) -> Result<Vec<Notification>, NotificationError> {
        Ok(self.lock()?.clone())
    }
}

impl NotificationSink for InMemoryNotifications {
    fn notify(&self, outbound: OutboundNotification) -> Result<(), NotificationError> {
        let notification = Notification {
            id: NotificationId(self.sequence.fetch_add(1, Ordering::Relaxed)),
            recipient: outbound.recipient,
            kind: outbound.kind,
            title: outbound.title,
            message: outbound.message,
            link: outbound.link,
            is_read: false,
            created_at: Utc::now(),
        };
        self.lock()?.push(notification);
        Ok(())
    }
}

impl NotificationInbox for InMemoryNotifications {
    fn for_recipient(&self, recipient: UserId) -> Result<Vec<Notification>, NotificationError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|notification| notification.recipient == recipient)
            .cloned()
            .collect())
    }

    fn mark_read(
        &self,
        recipient: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, NotificationError> {
        let mut delivered = self.lock()?;
        Ok(delivered
            .iter_mut()
            .find(|notification| notification.id == id && notification.recipient == recipient)
            .map(|notification| {
                notification.is_read = true;
                notification.clone()
            }))
    }

    fn mark_all_read(&self, recipient: UserId) -> Result<usize, NotificationError> {
        let mut delivered = self.lock()?;
        let mut updated = 0;
        for notification in delivered
            .iter_mut()
            .filter(|notification| notification.recipient == recipient && !notification.is_read)
        {
            notification.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditSink for InMemoryAuditLog {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .map_err(poisoned("audit"))
            .map_err(AuditError::Unavailable)?
            .push(entry);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let entries = self
            .entries
            .lock()
            .map_err(poisoned("audit"))
            .map_err(AuditError::Unavailable)?;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationKind;

    fn outbound(recipient: u64) -> OutboundNotification {
        OutboundNotification {
            recipient: UserId(recipient),
            kind: NotificationKind::System,
            title: "Heads up".to_string(),
            message: "Schedule posted".to_string(),
            link: "/shifts/".to_string(),
        }
    }

    #[test]
    fn seed_document_loads_users_and_stores() {
        let seed = r#"{
            "users": [
                {"id": 1, "username": "admin", "email": "a@x.test", "role": "admin"},
                {"id": 2, "username": "m", "email": "m@x.test", "role": "shift_manager"}
            ],
            "stores": [{"id": 9, "name": "Depot"}]
        }"#;
        let directory = InMemoryDirectory::from_json_reader(seed.as_bytes()).expect("seed parses");

        let manager = directory.user(UserId(2)).expect("lookup").expect("present");
        assert_eq!(manager.role, Role::Manager);
        assert!(manager.is_active);
        assert!(directory.store(StoreId(9)).expect("lookup").is_some());
    }

    #[test]
    fn duplicate_user_ids_reject_the_seed() {
        let seed = r#"{"users": [
            {"id": 1, "username": "a", "email": "a@x.test", "role": "staff"},
            {"id": 1, "username": "b", "email": "b@x.test", "role": "staff"}
        ]}"#;
        let err = InMemoryDirectory::from_json_reader(seed.as_bytes()).expect_err("duplicate");
        assert!(matches!(err, DirectoryError::InvalidSeed(_)));
    }

    #[test]
    fn inbox_reads_are_scoped_to_the_recipient() {
        let inbox = InMemoryNotifications::default();
        inbox.notify(outbound(4)).expect("notify");
        inbox.notify(outbound(4)).expect("notify");
        inbox.notify(outbound(5)).expect("notify");

        let others = inbox.for_recipient(UserId(5)).expect("list");
        let foreign = others[0].id;
        assert!(inbox.mark_read(UserId(4), foreign).expect("mark").is_none());
        assert_eq!(inbox.mark_all_read(UserId(4)).expect("mark all"), 2);
        assert_eq!(inbox.mark_all_read(UserId(4)).expect("mark all"), 0);
    }

    #[test]
    fn audit_log_returns_newest_first() {
        let log = InMemoryAuditLog::default();
        for (index, action) in [
            crate::audit::AuditAction::ShiftCreated,
            crate::audit::AuditAction::ShiftUpdated,
            crate::audit::AuditAction::ShiftCancelled,
        ]
        .into_iter()
        .enumerate()
        {
            log.record(AuditEntry::new(
                UserId(1),
                action,
                format!("entry {index}"),
                Utc::now(),
            ))
            .expect("record");
        }

        let recent = log.recent(2).expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].description, "entry 2");
    }
}
