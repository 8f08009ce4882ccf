#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Role hierarchy, geofencing, and incident authorization.
//!
//! Every decision made here is a pure function of the caller, the target
//! record, and a handful of point lookups against the stores and the
//! identity collaborator. Nothing is cached between requests:
//!
//! - [`hierarchy`]: who may create, update, or delete which accounts.
//! - [`boundary`]: per-user jurisdiction polygons and their inheritance
//!   when an officer is created.
//! - [`validator`]: the point-in-boundary check that gates incident
//!   creation.
//! - [`permission`]: who may update or delete an incident.
//! - [`scope`]: which reporters' incidents a caller may list.
//!
//! [`incidents::IncidentService`] and [`users::UserService`] wire these
//! together behind the storage traits in [`store`] and the collaborator
//! traits in [`collaborators`].

pub mod boundary;
pub mod collaborators;
pub mod hierarchy;
pub mod incidents;
pub mod memory;
pub mod permission;
pub mod scope;
pub mod store;
pub mod users;
pub mod validator;

use precinct_geography_models::GeometryError;
use precinct_identity_models::{Role, UserId};
use precinct_incident_models::IncidentId;
use thiserror::Error;

pub use store::StoreError;

/// Outcome kinds surfaced to callers.
///
/// Every variant is an expected, terminal condition for the current
/// request. None of them is retried here.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The referenced user does not exist.
    #[error("User not found with id: {id}")]
    UserNotFound {
        /// The missing user.
        id: UserId,
    },

    /// The creator's role may not create the requested role.
    #[error(
        "{} may not create {requested}",
        .creator.map_or_else(|| "UNRECOGNIZED_ROLE".to_string(), |r| r.to_string())
    )]
    RoleCreationDenied {
        /// The creator's role, `None` if unrecognized.
        creator: Option<Role>,
        /// The requested role.
        requested: Role,
    },

    /// An officer was requested by a station with no boundary on record.
    #[error("Creator {creator} has no boundary on record to assign")]
    CreatorBoundaryMissing {
        /// The creating station.
        creator: UserId,
    },

    /// A boundary was not well-formed.
    #[error("Invalid boundary: {0}")]
    InvalidGeometry(#[from] GeometryError),

    /// The incident location is outside the reporter's jurisdiction.
    #[error("Incident location is outside the user's assigned boundary")]
    OutOfBoundary,

    /// The caller may not perform this action on the target.
    #[error("User {actor} does not have permission to {action}")]
    InsufficientPermissions {
        /// The acting user.
        actor: UserId,
        /// Description of the attempted action.
        action: String,
    },

    /// The referenced incident does not exist or is not visible.
    #[error("Incident not found with id: {id}")]
    IncidentNotFound {
        /// The missing incident.
        id: IncidentId,
    },

    /// A remote collaborator failed or timed out.
    #[error("Upstream {service} unavailable: {message}")]
    UpstreamUnavailable {
        /// Which collaborator failed.
        service: String,
        /// What went wrong.
        message: String,
    },

    /// The request itself is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What is wrong with it.
        message: String,
    },

    /// The local store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AccessError {
    /// Stable machine-readable code for this error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound { .. } => "USER_NOT_FOUND",
            Self::RoleCreationDenied { .. } => "ROLE_CREATION_DENIED",
            Self::CreatorBoundaryMissing { .. } => "CREATOR_BOUNDARY_MISSING",
            Self::InvalidGeometry(_) => "INVALID_GEOMETRY",
            Self::OutOfBoundary => "LOCATION_OUT_OF_BOUNDS",
            Self::InsufficientPermissions { .. } => "INSUFFICIENT_PERMISSIONS",
            Self::IncidentNotFound { .. } => "INCIDENT_NOT_FOUND",
            Self::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub(crate) fn denied(actor: UserId, action: impl Into<String>) -> Self {
        Self::InsufficientPermissions {
            actor,
            action: action.into(),
        }
    }
}
