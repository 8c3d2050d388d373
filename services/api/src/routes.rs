use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use shiftboard::audit::AuditSink;
use shiftboard::directory::Directory;
use shiftboard::notifications::{notification_router, NotificationDesk, NotificationInbox};
use shiftboard::workflows::reporting::{report_router, ReportService};
use shiftboard::workflows::shifts::{shift_router, ShiftRepository, ShiftService};
use std::sync::Arc;

/// Every service mounted together with the operational endpoints.
pub(crate) fn with_shift_board_routes<R, D, N, A>(
    shifts: Arc<ShiftService<R, D, N, A>>,
    desk: Arc<NotificationDesk<D, N>>,
    reports: Arc<ReportService<R, D, N, A>>,
) -> axum::Router
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationInbox + 'static,
    A: AuditSink + 'static,
{
    shift_router(shifts)
        .merge(notification_router(desk))
        .merge(report_router(reports))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
