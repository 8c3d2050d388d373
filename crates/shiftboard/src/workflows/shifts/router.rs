use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApplicationId, OpenShiftFilter, ReviewDecision, ShiftDraft, ShiftId, ShiftRole, ShiftUpdate,
};
use super::repository::ShiftRepository;
use super::service::{ShiftService, ShiftServiceError};
use crate::audit::AuditSink;
use crate::directory::{resolve_actor, Directory, StoreId, User};
use crate::notifications::NotificationSink;

#[derive(Debug, Default, Deserialize)]
pub struct OpenShiftQuery {
    #[serde(default)]
    pub role: Option<ShiftRole>,
    #[serde(default)]
    pub store: Option<u64>,
}

impl From<OpenShiftQuery> for OpenShiftFilter {
    fn from(query: OpenShiftQuery) -> Self {
        Self {
            role: query.role,
            store: query.store.map(StoreId),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Shift board and application endpoints; the caller is identified by the actor header.
pub fn shift_router<R, D, N, A>(service: Arc<ShiftService<R, D, N, A>>) -> Router
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    Router::new()
        .route("/api/v1/stores", get(stores_handler::<R, D, N, A>))
        .route(
            "/api/v1/shifts",
            get(list_handler::<R, D, N, A>).post(create_handler::<R, D, N, A>),
        )
        .route("/api/v1/open-shifts", get(open_shifts_handler::<R, D, N, A>))
        .route(
            "/api/v1/shifts/:shift_id",
            get(detail_handler::<R, D, N, A>).put(update_handler::<R, D, N, A>),
        )
        .route(
            "/api/v1/shifts/:shift_id/cancel",
            post(cancel_handler::<R, D, N, A>),
        )
        .route(
            "/api/v1/shifts/:shift_id/volunteer",
            post(volunteer_handler::<R, D, N, A>),
        )
        .route(
            "/api/v1/applications/mine",
            get(my_applications_handler::<R, D, N, A>),
        )
        .route(
            "/api/v1/applications/:application_id/withdraw",
            post(withdraw_handler::<R, D, N, A>),
        )
        .route(
            "/api/v1/applications/:application_id/review",
            post(review_handler::<R, D, N, A>),
        )
        .route(
            "/api/v1/applications/:application_id/approve",
            post(approve_handler::<R, D, N, A>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<R, D, N, A>),
        )
        .with_state(service)
}

/// An empty body means every field takes its default; anything else must be valid JSON.
fn optional_body<T>(body: &Bytes) -> Result<T, Response>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": format!("invalid request body: {err}") })),
        )
            .into_response()
    })
}

macro_rules! actor_or_reject {
    ($service:expr, $headers:expr) => {
        match resolve_actor($service.directory(), &$headers) {
            Ok(actor) => actor,
            Err(err) => return err.into_response(),
        }
    };
}

pub(crate) async fn stores_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let _actor = actor_or_reject!(service, headers);
    match service.stores() {
        Ok(stores) => (StatusCode::OK, axum::Json(stores)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn list_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    match service.list_shifts(&actor) {
        Ok(shifts) => (StatusCode::OK, axum::Json(shifts)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn create_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<ShiftDraft>,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    match service.create_shift(&actor, draft) {
        Ok(shift) => (StatusCode::CREATED, axum::Json(shift)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn open_shifts_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    Query(query): Query<OpenShiftQuery>,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let _actor = actor_or_reject!(service, headers);
    match service.list_open_shifts(query.into()) {
        Ok(shifts) => (StatusCode::OK, axum::Json(shifts)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn detail_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    Path(shift_id): Path<u64>,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    match service.shift_detail(&actor, ShiftId(shift_id)) {
        Ok(detail) => (StatusCode::OK, axum::Json(detail)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn update_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    Path(shift_id): Path<u64>,
    axum::Json(update): axum::Json<ShiftUpdate>,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    match service.update_shift(&actor, ShiftId(shift_id), update) {
        Ok(shift) => (StatusCode::OK, axum::Json(shift)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn cancel_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    Path(shift_id): Path<u64>,
    body: Bytes,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    let request: CancelRequest = match optional_body(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    match service.cancel_shift(&actor, ShiftId(shift_id), request.reason) {
        Ok(shift) => (StatusCode::OK, axum::Json(shift)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn volunteer_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    Path(shift_id): Path<u64>,
    body: Bytes,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    let request: NotesRequest = match optional_body(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    match service.apply(&actor, ShiftId(shift_id), request.notes) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn my_applications_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    match service.my_applications(&actor) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn withdraw_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    match service.withdraw(&actor, ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn review_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    review(&service, &actor, application_id, request.decision, request.notes)
}

pub(crate) async fn approve_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    body: Bytes,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    let request: NotesRequest = match optional_body(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    review(&service, &actor, application_id, ReviewDecision::Approve, request.notes)
}

pub(crate) async fn reject_handler<R, D, N, A>(
    State(service): State<Arc<ShiftService<R, D, N, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    body: Bytes,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_or_reject!(service, headers);
    let request: NotesRequest = match optional_body(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    review(&service, &actor, application_id, ReviewDecision::Reject, request.notes)
}

fn review<R, D, N, A>(
    service: &ShiftService<R, D, N, A>,
    actor: &User,
    application_id: u64,
    decision: ReviewDecision,
    notes: Option<String>,
) -> Response
where
    R: ShiftRepository + 'static,
    D: Directory + 'static,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    match service.review(actor, ApplicationId(application_id), decision, notes) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) fn status_for(err: &ShiftServiceError) -> StatusCode {
    match err {
        ShiftServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ShiftServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ShiftServiceError::Ineligible(_)
        | ShiftServiceError::InvalidTransition(_)
        | ShiftServiceError::ShiftTransition { .. }
        | ShiftServiceError::ShiftClosed { .. } => StatusCode::CONFLICT,
        ShiftServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ShiftServiceError::Repository(_)
        | ShiftServiceError::Directory(_)
        | ShiftServiceError::Audit(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: ShiftServiceError) -> Response {
    let status = status_for(&err);
    let payload = match &err {
        ShiftServiceError::Ineligible(reason) => json!({
            "error": err.to_string(),
            "detail": reason,
        }),
        _ => json!({ "error": err.to_string() }),
    };
    (status, axum::Json(payload)).into_response()
}
