//! Session extraction. The upstream session gateway authenticates the caller
//! and forwards the user id in [`USER_ID_HEADER`]; this layer only reads it.

use api_problem::ProblemResponse;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::api::rest::error::catalog;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The session's user id, if any. Never rejects a missing header.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Uuid>);

/// The session's user id; rejects with 401 when absent.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

fn read_user_id(parts: &Parts) -> Result<Option<Uuid>, ProblemResponse> {
    let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .map(Some)
        .ok_or_else(|| {
            catalog::AUTH_REQUIRED.respond(
                format!("malformed {USER_ID_HEADER} header"),
                parts.uri.path(),
            )
        })
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        read_user_id(parts).map(MaybeUser)
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        read_user_id(parts)?.map(CurrentUser).ok_or_else(|| {
            catalog::AUTH_REQUIRED.respond("sign in to continue", parts.uri.path())
        })
    }
}
