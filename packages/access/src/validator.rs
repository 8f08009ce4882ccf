//! Point-in-boundary check gating incident creation.

use precinct_geography_models::GeoPoint;
use precinct_identity_models::{Role, UserId};

use crate::AccessError;
use crate::store::BoundaryStore;

/// Whether `user`, acting as `role`, may place an incident at `point`.
///
/// A `SUPER_USER` has global jurisdiction and is authorized everywhere
/// without a lookup. Every other caller, including one whose role claim
/// was not recognized, is authorized only inside its stored boundary
/// (points on the ring count as inside). No boundary means no authorized
/// area.
///
/// Not re-applied when an incident is updated.
///
/// # Errors
///
/// Returns [`AccessError::Storage`] if the boundary lookup fails.
pub async fn is_authorized_location(
    boundaries: &dyn BoundaryStore,
    user: UserId,
    role: Option<Role>,
    point: GeoPoint,
) -> Result<bool, AccessError> {
    if role == Some(Role::SuperUser) {
        return Ok(true);
    }

    let Some(boundary) = boundaries.get_boundary(user).await? else {
        log::debug!("User {user} has no boundary; denying location {point:?}");
        return Ok(false);
    };

    Ok(boundary.covers(point))
}
