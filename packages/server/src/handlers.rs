//! HTTP handler functions for the precinct API.

use actix_web::{HttpResponse, web};
use precinct_geography_models::GeoPoint;
use precinct_identity_models::{Role, UserId, UserProfile};
use precinct_incident_models::IncidentId;
use precinct_server_models::{
    ApiHealth, ApiIncident, BoundaryRequest, BoundaryResponse, CreateUserRequest, CreatedUser,
    IncidentRequest, PointValidationRequest,
};

use crate::AppState;
use crate::caller::Caller;
use crate::error::ApiFailure;

type ApiResult = Result<HttpResponse, ApiFailure>;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ---------------------------------------------------------------------------
// Incidents
// ---------------------------------------------------------------------------

/// `GET /api/incidents`
///
/// Lists the incidents visible to the caller, newest first.
pub async fn list_incidents(state: web::Data<AppState>, caller: Caller) -> ApiResult {
    let incidents: Vec<ApiIncident> = state
        .incidents
        .list_incidents(&caller.0)
        .await?
        .into_iter()
        .map(ApiIncident::from)
        .collect();
    Ok(HttpResponse::Ok().json(incidents))
}

/// `POST /api/incidents`
pub async fn create_incident(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<IncidentRequest>,
) -> ApiResult {
    let incident = state
        .incidents
        .create_incident(&caller.0, body.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(ApiIncident::from(incident)))
}

/// `GET /api/incidents/{id}`
pub async fn get_incident(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<IncidentId>,
) -> ApiResult {
    let incident = state
        .incidents
        .get_incident(&caller.0, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiIncident::from(incident)))
}

/// `PUT /api/incidents/{id}`
pub async fn update_incident(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<IncidentId>,
    body: web::Json<IncidentRequest>,
) -> ApiResult {
    let incident = state
        .incidents
        .update_incident(caller.0.id, path.into_inner(), body.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(ApiIncident::from(incident)))
}

/// `DELETE /api/incidents/{id}`
pub async fn delete_incident(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<IncidentId>,
) -> ApiResult {
    state
        .incidents
        .delete_incident(caller.0.id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// `GET /api/users`
pub async fn list_users(state: web::Data<AppState>, _caller: Caller) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.users.list_users().await?))
}

/// `POST /api/users`
///
/// The caller is the creator; its stored role decides what it may create.
pub async fn create_user(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<CreateUserRequest>,
) -> ApiResult {
    let CreateUserRequest {
        role,
        profile,
        boundary_wkt,
    } = body.into_inner();

    let (user, boundary) = state
        .users
        .create_user(caller.0.id, role, profile, boundary_wkt.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(CreatedUser {
        user,
        boundary_wkt: boundary.map(|b| b.to_wkt()),
    }))
}

/// `GET /api/users/{id}`
///
/// Internal lookup used by other services; no caller identity required.
pub async fn get_user(state: web::Data<AppState>, path: web::Path<UserId>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.users.get_user(path.into_inner()).await?))
}

/// `PUT /api/users/{id}`
pub async fn update_user(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<UserId>,
    body: web::Json<UserProfile>,
) -> ApiResult {
    let user = state
        .users
        .update_user(caller.0.id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// `DELETE /api/users/{id}`
pub async fn delete_user(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<UserId>,
) -> ApiResult {
    state
        .users
        .delete_user(caller.0.id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /api/users/station/{id}/officers`
///
/// Internal lookup: ids of the officers created by the station.
pub async fn station_officers(state: web::Data<AppState>, path: web::Path<UserId>) -> ApiResult {
    let officers = state.users.officer_ids(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(officers))
}

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// `GET /api/geo/boundary/{userId}`
pub async fn get_boundary(state: web::Data<AppState>, path: web::Path<UserId>) -> ApiResult {
    let user = path.into_inner();
    let boundary = state
        .users
        .get_boundary(user)
        .await?
        .ok_or_else(|| ApiFailure::NotFound {
            code: "BOUNDARY_NOT_FOUND",
            what: format!("Boundary for user {user}"),
        })?;
    Ok(HttpResponse::Ok().json(BoundaryResponse::new(user, &boundary)))
}

/// `PUT /api/geo/boundary/{userId}`
pub async fn set_boundary(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<UserId>,
    body: web::Json<BoundaryRequest>,
) -> ApiResult {
    let user = path.into_inner();
    let boundary = state
        .users
        .set_boundary(caller.0.id, user, &body.wkt)
        .await?;
    Ok(HttpResponse::Ok().json(BoundaryResponse::new(user, &boundary)))
}

/// `POST /api/geo/validate-point`
///
/// Internal check used by a remote incident service. Responds with a bare
/// JSON boolean.
pub async fn validate_point(
    state: web::Data<AppState>,
    body: web::Json<PointValidationRequest>,
) -> ApiResult {
    let request = body.into_inner();
    let role = request.user_role.as_deref().and_then(Role::from_claim);
    let authorized = state
        .users
        .authorize_location(
            request.user_id,
            role,
            GeoPoint::from_lat_lon(request.latitude, request.longitude),
        )
        .await?;
    Ok(HttpResponse::Ok().json(authorized))
}
