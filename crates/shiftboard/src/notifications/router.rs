use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::desk::{DeskError, NotificationDesk};
use super::{NotificationId, NotificationInbox};
use crate::directory::{resolve_actor, Directory};

pub fn notification_router<D, N>(desk: Arc<NotificationDesk<D, N>>) -> Router
where
    D: Directory + 'static,
    N: NotificationInbox + 'static,
{
    Router::new()
        .route("/api/v1/notifications", get(list_handler::<D, N>))
        .route(
            "/api/v1/notifications/read-all",
            post(mark_all_read_handler::<D, N>),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(mark_read_handler::<D, N>),
        )
        .with_state(desk)
}

pub(crate) async fn list_handler<D, N>(
    State(desk): State<Arc<NotificationDesk<D, N>>>,
    headers: HeaderMap,
) -> Response
where
    D: Directory + 'static,
    N: NotificationInbox + 'static,
{
    let actor = match resolve_actor(desk.directory(), &headers) {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };
    match desk.list(&actor) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn mark_read_handler<D, N>(
    State(desk): State<Arc<NotificationDesk<D, N>>>,
    headers: HeaderMap,
    Path(notification_id): Path<u64>,
) -> Response
where
    D: Directory + 'static,
    N: NotificationInbox + 'static,
{
    let actor = match resolve_actor(desk.directory(), &headers) {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };
    match desk.mark_read(&actor, NotificationId(notification_id)) {
        Ok(notification) => (StatusCode::OK, axum::Json(notification)).into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn mark_all_read_handler<D, N>(
    State(desk): State<Arc<NotificationDesk<D, N>>>,
    headers: HeaderMap,
) -> Response
where
    D: Directory + 'static,
    N: NotificationInbox + 'static,
{
    let actor = match resolve_actor(desk.directory(), &headers) {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };
    match desk.mark_all_read(&actor) {
        Ok(updated) => (StatusCode::OK, axum::Json(json!({ "updated": updated }))).into_response(),
        Err(err) => failure(err),
    }
}

fn failure(err: DeskError) -> Response {
    let status = match err {
        DeskError::NotFound(_) => StatusCode::NOT_FOUND,
        DeskError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}
