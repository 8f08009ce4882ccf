//! Caller identity forwarded by the gateway.
//!
//! The gateway verifies the token and forwards the claims as headers. They
//! are trusted as-is; nothing here re-derives identity.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use precinct_identity_models::Actor;

use crate::error::ApiFailure;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Header carrying the caller's role claim.
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// The authenticated caller of a request.
///
/// Extraction fails with `401` when the user id is missing or not an
/// integer. A missing or unrecognized role is not an error here: the
/// caller simply holds no role and every check fails closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Actor);

impl FromRequest for Caller {
    type Error = ApiFailure;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(from_headers(req.headers()))
    }
}

fn from_headers(headers: &HeaderMap) -> Result<Caller, ApiFailure> {
    let id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or(ApiFailure::Unauthenticated)?;
    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let actor = Actor::from_claim(id, role);
    if actor.role.is_none() {
        log::debug!("Caller {id} has unrecognized role claim {role:?}");
    }
    Ok(Caller(actor))
}
