use super::summary::ReportDataset;
use super::views::CsvExport;
use super::ReportError;
use crate::formats::{TIMESTAMP_FORMAT, TIME_FORMAT};
use crate::workflows::shifts::views::sort_shifts;

const MISSING: &str = "N/A";

pub const SHIFT_HEADERS: [&str; 10] = [
    "Title",
    "Store",
    "Manager",
    "Date",
    "Start Time",
    "End Time",
    "Role",
    "Slots",
    "Status",
    "Created At",
];

pub const VOLUNTEER_HEADERS: [&str; 9] = [
    "Volunteer",
    "Email",
    "Shift",
    "Store",
    "Date",
    "Status",
    "Applied At",
    "Reviewed By",
    "Reviewed At",
];

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ReportError> {
    let bytes = writer
        .into_inner()
        .map_err(|err| ReportError::Export(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ReportError::Export(err.to_string()))
}

pub fn shifts_csv(dataset: &ReportDataset) -> Result<CsvExport, ReportError> {
    let mut shifts = dataset.shifts.clone();
    sort_shifts(&mut shifts);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SHIFT_HEADERS)?;
    for shift in &shifts {
        let store = dataset
            .store(shift.store_id)
            .map_or(MISSING, |store| store.name.as_str());
        let manager = dataset
            .user(shift.manager_id)
            .map_or(MISSING, |user| user.username.as_str());
        writer.write_record([
            shift.title.clone(),
            store.to_string(),
            manager.to_string(),
            shift.shift_date.to_string(),
            shift.start_time.format(TIME_FORMAT).to_string(),
            shift.end_time.format(TIME_FORMAT).to_string(),
            shift.role_required.label().to_string(),
            shift.slots_available.to_string(),
            shift.status.label().to_string(),
            shift.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ])?;
    }

    Ok(CsvExport {
        filename: "shifts_report.csv",
        body: finish(writer)?,
        rows: shifts.len(),
    })
}

pub fn volunteers_csv(dataset: &ReportDataset) -> Result<CsvExport, ReportError> {
    let mut applications = dataset.applications.clone();
    applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then_with(|| b.id.cmp(&a.id)));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(VOLUNTEER_HEADERS)?;
    for application in &applications {
        let volunteer = dataset.user(application.applicant_id);
        let shift = dataset.shift(application.shift_id);
        let store = shift
            .and_then(|shift| dataset.store(shift.store_id))
            .map_or(MISSING, |store| store.name.as_str());
        let reviewer = application
            .reviewed_by
            .and_then(|id| dataset.user(id))
            .map_or(MISSING, |user| user.username.as_str());

        writer.write_record([
            volunteer.map_or_else(|| MISSING.to_string(), |user| user.full_name()),
            volunteer.map_or(MISSING, |user| user.email.as_str()).to_string(),
            shift.map_or(MISSING, |shift| shift.title.as_str()).to_string(),
            store.to_string(),
            shift.map_or_else(|| MISSING.to_string(), |shift| shift.shift_date.to_string()),
            application.status.label().to_string(),
            application.applied_at.format(TIMESTAMP_FORMAT).to_string(),
            reviewer.to_string(),
            application
                .reviewed_at
                .map_or_else(|| MISSING.to_string(), |at| at.format(TIMESTAMP_FORMAT).to_string()),
        ])?;
    }

    Ok(CsvExport {
        filename: "volunteers_report.csv",
        body: finish(writer)?,
        rows: applications.len(),
    })
}
