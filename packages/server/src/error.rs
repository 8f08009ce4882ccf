//! Mapping of failures to HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use precinct_access::AccessError;
use precinct_server_models::ApiError;
use thiserror::Error;

/// A failed request.
#[derive(Debug, Error)]
pub enum ApiFailure {
    /// The gateway did not forward a usable caller identity.
    #[error("Missing or invalid X-User-Id header")]
    Unauthenticated,

    /// A stored record referenced by the path does not exist.
    #[error("{what} not found")]
    NotFound {
        /// Machine-readable code.
        code: &'static str,
        /// What was missing.
        what: String,
    },

    /// The core rejected or failed the operation.
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl ApiFailure {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotFound { code, .. } => *code,
            Self::Access(e) => e.code(),
        }
    }
}

/// HTTP status for each access error kind.
#[must_use]
pub const fn status_for(error: &AccessError) -> StatusCode {
    match error {
        AccessError::UserNotFound { .. } | AccessError::IncidentNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        AccessError::RoleCreationDenied { .. } | AccessError::InsufficientPermissions { .. } => {
            StatusCode::FORBIDDEN
        }
        AccessError::CreatorBoundaryMissing { .. } | AccessError::OutOfBoundary => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AccessError::InvalidGeometry(_) | AccessError::InvalidRequest { .. } => {
            StatusCode::BAD_REQUEST
        }
        AccessError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AccessError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for ApiFailure {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Access(e) => status_for(e),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}: {self}", self.code());
        } else {
            log::debug!("{}: {self}", self.code());
        }
        HttpResponse::build(status).json(ApiError {
            error: self.code().to_string(),
            message: self.to_string(),
        })
    }
}
