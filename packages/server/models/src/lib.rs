#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the precinct server.
//!
//! These types are serialized to JSON for the REST API and are also what
//! the HTTP collaborator clients decode. They are separate from the core
//! models to allow independent evolution of the API contract.

use chrono::{DateTime, Utc};
use precinct_geography_models::{Boundary, GeoPoint};
use precinct_identity_models::{Role, User, UserId, UserProfile};
use precinct_incident_models::{Incident, IncidentFields, IncidentId};
use serde::{Deserialize, Serialize};

/// An incident as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncident {
    /// Unique incident ID.
    pub id: IncidentId,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Incident type label.
    pub incident_type: String,
    /// Priority label.
    pub priority: String,
    /// Longitude.
    pub longitude: f64,
    /// Latitude.
    pub latitude: f64,
    /// The reporting user.
    pub reported_by: UserId,
    /// When the incident was reported (ISO 8601).
    pub occurred_at: DateTime<Utc>,
}

impl From<Incident> for ApiIncident {
    fn from(incident: Incident) -> Self {
        let IncidentFields {
            title,
            description,
            incident_type,
            priority,
            location,
        } = incident.fields;
        Self {
            id: incident.id,
            title,
            description,
            incident_type,
            priority,
            longitude: location.longitude,
            latitude: location.latitude,
            reported_by: incident.reported_by,
            occurred_at: incident.occurred_at,
        }
    }
}

/// Body of `POST /api/incidents` and `PUT /api/incidents/{id}`.
///
/// An update replaces every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRequest {
    /// Short title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Incident type label.
    pub incident_type: String,
    /// Priority label.
    pub priority: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

impl From<IncidentRequest> for IncidentFields {
    fn from(request: IncidentRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            incident_type: request.incident_type,
            priority: request.priority,
            location: GeoPoint::from_lat_lon(request.latitude, request.longitude),
        }
    }
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Role of the new account.
    pub role: Role,
    /// Descriptive fields.
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Jurisdiction polygon in WKT. Used for stations, ignored for
    /// officers.
    #[serde(default)]
    pub boundary_wkt: Option<String>,
}

/// Response of `POST /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    /// The stored account.
    #[serde(flatten)]
    pub user: User,
    /// The boundary the account started with, in WKT.
    pub boundary_wkt: Option<String>,
}

/// Body of `PUT /api/geo/boundary/{userId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryRequest {
    /// Jurisdiction polygon in WKT.
    pub wkt: String,
}

/// A stored boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryResponse {
    /// Owner of the boundary.
    pub user_id: UserId,
    /// The polygon in WKT.
    pub wkt: String,
    /// Spatial reference id; always WGS-84.
    pub srid: u32,
    /// The polygon as a `GeoJSON` geometry, for map clients.
    pub geojson: geojson::Geometry,
}

impl BoundaryResponse {
    /// Renders `boundary` as owned by `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, boundary: &Boundary) -> Self {
        Self {
            user_id,
            wkt: boundary.to_wkt(),
            srid: boundary.srid(),
            geojson: boundary.to_geojson(),
        }
    }
}

/// Body of `POST /api/geo/validate-point`. The response is a bare JSON
/// boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointValidationRequest {
    /// User whose boundary is tested.
    pub user_id: UserId,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Role claim of the user, as forwarded by the gateway.
    #[serde(default)]
    pub user_role: Option<String>,
}

/// Error body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable machine-readable code (e.g. `LOCATION_OUT_OF_BOUNDS`).
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}
