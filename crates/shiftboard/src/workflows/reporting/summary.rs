use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::views::{
    DateWindow, OversightDashboard, ReportStats, StaffDashboard, VolunteerRanking,
};
use crate::directory::{Role, Store, StoreId, User, UserId};
use crate::workflows::shifts::{
    Application, ApplicationStatus, Shift, ShiftId, ShiftScope, ShiftStatus,
};

const RECENT_LIMIT: usize = 5;
pub const TOP_VOLUNTEER_LIMIT: usize = 10;

/// Everything a report reads, already narrowed to the actor's scope.
#[derive(Debug, Clone)]
pub struct ReportDataset {
    pub scope: ShiftScope,
    pub shifts: Vec<Shift>,
    pub applications: Vec<Application>,
    pub users: BTreeMap<UserId, User>,
    pub stores: BTreeMap<StoreId, Store>,
}

impl ReportDataset {
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn store(&self, id: StoreId) -> Option<&Store> {
        self.stores.get(&id)
    }

    pub fn shift(&self, id: ShiftId) -> Option<&Shift> {
        self.shifts.iter().find(|shift| shift.id == id)
    }

    fn is_system_wide(&self) -> bool {
        matches!(self.scope, ShiftScope::All)
    }
}

fn count_status(applications: &[Application], status: ApplicationStatus) -> usize {
    applications
        .iter()
        .filter(|application| application.status == status)
        .count()
}

/// `all_shifts` and `all_applications` are unscoped.
pub fn staff_dashboard(
    actor: &User,
    all_shifts: &[Shift],
    all_applications: &[Application],
    today: NaiveDate,
    unread_notifications: usize,
) -> StaffDashboard {
    let mine: Vec<Application> = all_applications
        .iter()
        .filter(|application| application.applicant_id == actor.id)
        .cloned()
        .collect();
    StaffDashboard {
        available_shifts: all_shifts
            .iter()
            .filter(|shift| shift.status == ShiftStatus::Open && !shift.is_past(today))
            .count(),
        my_applications: mine.len(),
        approved_shifts: count_status(&mine, ApplicationStatus::Approved),
        unread_notifications,
    }
}

pub fn oversight_dashboard(
    dataset: &ReportDataset,
    unread_notifications: usize,
) -> OversightDashboard {
    let mut recent_shifts = dataset.shifts.clone();
    recent_shifts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    recent_shifts.truncate(RECENT_LIMIT);

    let mut recent_applications = dataset.applications.clone();
    recent_applications.sort_by(|a, b| {
        b.applied_at
            .cmp(&a.applied_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    recent_applications.truncate(RECENT_LIMIT);

    let (total_staff, total_stores, total_managers, total_users) = if dataset.is_system_wide() {
        let staff = dataset
            .users
            .values()
            .filter(|user| user.role == Role::Staff)
            .count();
        let stores = dataset.stores.values().filter(|store| store.is_active).count();
        let managers = dataset
            .users
            .values()
            .filter(|user| user.role == Role::Manager)
            .count();
        (staff, stores, Some(managers), Some(dataset.users.len()))
    } else {
        let applicants: BTreeSet<UserId> = dataset
            .applications
            .iter()
            .map(|application| application.applicant_id)
            .filter(|id| dataset.user(*id).is_some_and(|user| user.role == Role::Staff))
            .collect();
        let stores: BTreeSet<StoreId> = dataset
            .shifts
            .iter()
            .map(|shift| shift.store_id)
            .filter(|id| dataset.store(*id).is_some_and(|store| store.is_active))
            .collect();
        (applicants.len(), stores.len(), None, None)
    };

    OversightDashboard {
        total_shifts: dataset.shifts.len(),
        open_shifts: dataset
            .shifts
            .iter()
            .filter(|shift| shift.status == ShiftStatus::Open)
            .count(),
        pending_applications: count_status(&dataset.applications, ApplicationStatus::Pending),
        total_staff,
        total_stores,
        recent_shifts,
        recent_applications,
        unread_notifications,
        total_managers,
        total_users,
    }
}

/// Shift counts honour the date window; application counts deliberately do not.
pub fn report_stats(dataset: &ReportDataset, window: DateWindow) -> ReportStats {
    let windowed: Vec<&Shift> = dataset
        .shifts
        .iter()
        .filter(|shift| window.contains(shift.shift_date))
        .collect();
    let shifts_with = |status: ShiftStatus| {
        windowed
            .iter()
            .filter(|shift| shift.status == status)
            .count()
    };

    ReportStats {
        total_shifts: windowed.len(),
        open_shifts: shifts_with(ShiftStatus::Open),
        filled_shifts: shifts_with(ShiftStatus::Filled),
        cancelled_shifts: shifts_with(ShiftStatus::Cancelled),
        total_applications: dataset.applications.len(),
        approved_applications: count_status(&dataset.applications, ApplicationStatus::Approved),
        rejected_applications: count_status(&dataset.applications, ApplicationStatus::Rejected),
        pending_applications: count_status(&dataset.applications, ApplicationStatus::Pending),
    }
}

/// Staff ranked by approved applications in scope, username breaking ties.
///
/// System-wide reports rank every staff member, including those with no approvals. Scoped
/// reports rank only staff who applied to one of the scoped shifts.
pub fn top_volunteers(dataset: &ReportDataset, limit: usize) -> Vec<VolunteerRanking> {
    let mut approved: BTreeMap<UserId, usize> = BTreeMap::new();
    let mut applicants: BTreeSet<UserId> = BTreeSet::new();
    for application in &dataset.applications {
        applicants.insert(application.applicant_id);
        if application.status == ApplicationStatus::Approved {
            *approved.entry(application.applicant_id).or_default() += 1;
        }
    }

    let mut rankings: Vec<VolunteerRanking> = dataset
        .users
        .values()
        .filter(|user| user.role == Role::Staff)
        .filter(|user| dataset.is_system_wide() || applicants.contains(&user.id))
        .map(|user| VolunteerRanking {
            user_id: user.id,
            username: user.username.clone(),
            full_name: user.full_name(),
            approved_count: approved.get(&user.id).copied().unwrap_or(0),
        })
        .collect();
    rankings.sort_by(|a, b| {
        b.approved_count
            .cmp(&a.approved_count)
            .then_with(|| a.username.cmp(&b.username))
    });
    rankings.truncate(limit);
    rankings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};

    use crate::workflows::shifts::{ApplicationId, ShiftRole};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, day).expect("valid date")
    }

    fn user(id: u64, username: &str, role: Role) -> User {
        User {
            id: UserId(id),
            username: username.to_string(),
            email: format!("{username}@example.test"),
            first_name: String::new(),
            last_name: String::new(),
            role,
            phone: None,
            is_active: true,
        }
    }

    fn shift(id: u64, manager: u64, day: u32, status: ShiftStatus) -> Shift {
        let created = Utc
            .with_ymd_and_hms(2026, 4, 1, 8, id as u32 % 60, 0)
            .single()
            .expect("valid timestamp");
        Shift {
            id: ShiftId(id),
            store_id: StoreId(1),
            manager_id: UserId(manager),
            title: format!("Shift {id}"),
            description: String::new(),
            role_required: ShiftRole::Stocker,
            shift_date: date(day),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            end_time: NaiveTime::from_hms_opt(13, 0, 0).expect("valid time"),
            slots_available: 2,
            status,
            created_at: created,
            updated_at: created,
        }
    }

    fn application(id: u64, shift: u64, applicant: u64, status: ApplicationStatus) -> Application {
        Application {
            id: ApplicationId(id),
            shift_id: ShiftId(shift),
            applicant_id: UserId(applicant),
            status,
            applied_at: Utc
                .with_ymd_and_hms(2026, 4, 2, 10, id as u32 % 60, 0)
                .single()
                .expect("valid timestamp"),
            reviewed_by: None,
            reviewed_at: None,
            notes: String::new(),
        }
    }

    fn dataset(scope: ShiftScope) -> ReportDataset {
        let users = [
            user(1, "admin", Role::Admin),
            user(2, "manager", Role::Manager),
            user(4, "casey", Role::Staff),
            user(5, "blair", Role::Staff),
            user(6, "drew", Role::Staff),
        ]
        .into_iter()
        .map(|user| (user.id, user))
        .collect();
        let store = Store {
            id: StoreId(1),
            name: "Downtown".to_string(),
            address: String::new(),
            city: "Des Moines".to_string(),
            state: String::new(),
            zip_code: String::new(),
            phone: String::new(),
            manager: Some(UserId(2)),
            is_active: true,
        };

        ReportDataset {
            scope,
            shifts: vec![
                shift(1, 2, 3, ShiftStatus::Open),
                shift(2, 2, 10, ShiftStatus::Filled),
                shift(3, 2, 20, ShiftStatus::Cancelled),
            ],
            applications: vec![
                application(1, 1, 4, ApplicationStatus::Approved),
                application(2, 2, 4, ApplicationStatus::Approved),
                application(3, 1, 5, ApplicationStatus::Approved),
                application(4, 3, 5, ApplicationStatus::Rejected),
                application(5, 2, 6, ApplicationStatus::Pending),
            ],
            users,
            stores: [(store.id, store)].into_iter().collect(),
        }
    }

    #[test]
    fn date_window_filters_shift_counts_only() {
        let stats = report_stats(
            &dataset(ShiftScope::All),
            DateWindow {
                date_from: Some(date(5)),
                date_to: Some(date(10)),
            },
        );

        assert_eq!(stats.total_shifts, 1);
        assert_eq!(stats.filled_shifts, 1);
        assert_eq!(stats.open_shifts, 0);
        assert_eq!(stats.total_applications, 5);
        assert_eq!(stats.approved_applications, 3);
        assert_eq!(stats.rejected_applications, 1);
        assert_eq!(stats.pending_applications, 1);
    }

    #[test]
    fn top_volunteers_break_ties_by_username() {
        let rankings = top_volunteers(&dataset(ShiftScope::All), TOP_VOLUNTEER_LIMIT);
        let order: Vec<(&str, usize)> = rankings
            .iter()
            .map(|ranking| (ranking.username.as_str(), ranking.approved_count))
            .collect();
        assert_eq!(order, vec![("casey", 2), ("blair", 1), ("drew", 0)]);
    }

    #[test]
    fn scoped_rankings_skip_staff_who_never_applied() {
        let mut scoped = dataset(ShiftScope::ManagedBy(UserId(2)));
        scoped.applications.retain(|application| application.applicant_id != UserId(6));

        let rankings = top_volunteers(&scoped, TOP_VOLUNTEER_LIMIT);
        assert_eq!(rankings.len(), 2);
        assert!(rankings.iter().all(|ranking| ranking.user_id != UserId(6)));
    }

    #[test]
    fn manager_dashboard_counts_distinct_applicants() {
        let board = oversight_dashboard(&dataset(ShiftScope::ManagedBy(UserId(2))), 0);
        assert_eq!(board.total_shifts, 3);
        assert_eq!(board.open_shifts, 1);
        assert_eq!(board.pending_applications, 1);
        assert_eq!(board.total_staff, 3);
        assert_eq!(board.total_stores, 1);
        assert_eq!(board.recent_shifts[0].id, ShiftId(3));
        assert_eq!(board.total_managers, None);
    }

    #[test]
    fn admin_dashboard_adds_user_totals() {
        let board = oversight_dashboard(&dataset(ShiftScope::All), 2);
        assert_eq!(board.total_managers, Some(1));
        assert_eq!(board.total_users, Some(5));
        assert_eq!(board.recent_applications.len(), 5);
        assert_eq!(board.unread_notifications, 2);
    }

    #[test]
    fn staff_dashboard_ignores_past_shifts() {
        let data = dataset(ShiftScope::All);
        let casey = data.user(UserId(4)).cloned().expect("casey exists");

        let board = staff_dashboard(&casey, &data.shifts, &data.applications, date(4), 0);
        assert_eq!(board.available_shifts, 0);
        assert_eq!(board.my_applications, 2);
        assert_eq!(board.approved_shifts, 2);
    }
}
