use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;

use super::service::ReportService;
use super::views::{CsvExport, DateWindow};
use super::ReportError;
use crate::audit::AuditSink;
use crate::directory::{resolve_actor, Directory, User};
use crate::notifications::NotificationInbox;
use crate::workflows::shifts::ShiftRepository;

pub fn report_router<R, D, N, A>(service: Arc<ReportService<R, D, N, A>>) -> Router
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationInbox + 'static,
    A: AuditSink + 'static,
{
    Router::new()
        .route("/api/v1/dashboard", get(dashboard_handler::<R, D, N, A>))
        .route("/api/v1/reports", get(report_handler::<R, D, N, A>))
        .route(
            "/api/v1/reports/export-shifts",
            get(export_shifts_handler::<R, D, N, A>),
        )
        .route(
            "/api/v1/reports/export-volunteers",
            get(export_volunteers_handler::<R, D, N, A>),
        )
        .route("/api/v1/audit-log", get(audit_log_handler::<R, D, N, A>))
        .with_state(service)
}

fn actor<R, D, N, A>(
    service: &ReportService<R, D, N, A>,
    headers: &HeaderMap,
) -> Result<User, Response>
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationInbox + 'static,
    A: AuditSink + 'static,
{
    resolve_actor(service.directory(), headers).map_err(IntoResponse::into_response)
}

pub(crate) async fn dashboard_handler<R, D, N, A>(
    State(service): State<Arc<ReportService<R, D, N, A>>>,
    headers: HeaderMap,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationInbox + 'static,
    A: AuditSink + 'static,
{
    let actor = match actor(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.dashboard(&actor) {
        Ok(dashboard) => (StatusCode::OK, axum::Json(dashboard)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn report_handler<R, D, N, A>(
    State(service): State<Arc<ReportService<R, D, N, A>>>,
    headers: HeaderMap,
    Query(window): Query<DateWindow>,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationInbox + 'static,
    A: AuditSink + 'static,
{
    let actor = match actor(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.report(&actor, window) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn export_shifts_handler<R, D, N, A>(
    State(service): State<Arc<ReportService<R, D, N, A>>>,
    headers: HeaderMap,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationInbox + 'static,
    A: AuditSink + 'static,
{
    let actor = match actor(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.export_shifts(&actor) {
        Ok(export) => csv_response(export),
        Err(err) => failure(err),
    }
}

pub(crate) async fn export_volunteers_handler<R, D, N, A>(
    State(service): State<Arc<ReportService<R, D, N, A>>>,
    headers: HeaderMap,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationInbox + 'static,
    A: AuditSink + 'static,
{
    let actor = match actor(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.export_volunteers(&actor) {
        Ok(export) => csv_response(export),
        Err(err) => failure(err),
    }
}

pub(crate) async fn audit_log_handler<R, D, N, A>(
    State(service): State<Arc<ReportService<R, D, N, A>>>,
    headers: HeaderMap,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationInbox + 'static,
    A: AuditSink + 'static,
{
    let actor = match actor(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.audit_log(&actor) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(err) => failure(err),
    }
}

fn csv_response(export: CsvExport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response()
}

fn failure(err: ReportError) -> Response {
    let status = match err {
        ReportError::Forbidden(_) => StatusCode::FORBIDDEN,
        ReportError::Repository(_)
        | ReportError::Directory(_)
        | ReportError::Audit(_)
        | ReportError::Notification(_)
        | ReportError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}
