use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::users::{User, UserId};
use super::{Directory, DirectoryError};

/// Header the upstream authentication layer uses to name the acting user.
pub const ACTOR_HEADER: &str = "x-actor-id";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("missing x-actor-id header")]
    Missing,
    #[error("x-actor-id must be a numeric user id, found '{0}'")]
    Malformed(String),
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("user {0} is inactive")]
    Inactive(UserId),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

pub fn resolve_actor<D>(directory: &D, headers: &HeaderMap) -> Result<User, IdentityError>
where
    D: Directory + ?Sized,
{
    let raw = headers
        .get(ACTOR_HEADER)
        .ok_or(IdentityError::Missing)?
        .to_str()
        .map_err(|_| IdentityError::Malformed("<non-ascii>".to_string()))?;

    let id = raw
        .trim()
        .parse::<u64>()
        .map(UserId)
        .map_err(|_| IdentityError::Malformed(raw.to_string()))?;

    let user = directory
        .user(id)?
        .ok_or(IdentityError::UnknownUser(id))?;

    if !user.is_active {
        return Err(IdentityError::Inactive(id));
    }

    Ok(user)
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = match self {
            IdentityError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
