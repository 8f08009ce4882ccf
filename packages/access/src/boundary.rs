//! Per-user jurisdiction boundaries and their inheritance.
//!
//! A station's boundary is authored explicitly. An officer's boundary is a
//! snapshot copy of its station's boundary taken when the officer is
//! created; later changes to the station's boundary are not propagated.

use precinct_geography_models::Boundary;
use precinct_identity_models::{HierarchyNode, NewUser, User, UserId};

use crate::AccessError;
use crate::store::{BoundaryStore, UserStore};

/// Parses `wkt`, validates it, and stores it as the boundary of `user`,
/// replacing any previous one.
///
/// # Errors
///
/// Returns [`AccessError::InvalidGeometry`] if the polygon is not
/// well-formed, or [`AccessError::Storage`] if the write fails.
pub async fn set_boundary(
    boundaries: &dyn BoundaryStore,
    user: UserId,
    wkt: &str,
) -> Result<Boundary, AccessError> {
    let boundary = Boundary::from_wkt(wkt)?;
    boundaries.put_boundary(user, &boundary).await?;
    log::info!("Stored boundary for user {user}");
    Ok(boundary)
}

/// Fetches the boundary of `user`, if any.
///
/// # Errors
///
/// Returns [`AccessError::Storage`] if the lookup fails.
pub async fn get_boundary(
    boundaries: &dyn BoundaryStore,
    user: UserId,
) -> Result<Option<Boundary>, AccessError> {
    Ok(boundaries.get_boundary(user).await?)
}

/// Determines the boundary a new account starts with.
///
/// - Officers copy their station's boundary verbatim; any supplied WKT is
///   ignored.
/// - Stations use the supplied WKT if present. A station without a
///   boundary is allowed and simply cannot authorize any location.
/// - Super users never have one.
///
/// # Errors
///
/// Returns [`AccessError::CreatorBoundaryMissing`] if an officer's station
/// has no boundary, or [`AccessError::InvalidGeometry`] if the supplied WKT
/// is not well-formed.
pub async fn initial_boundary(
    boundaries: &dyn BoundaryStore,
    node: HierarchyNode,
    supplied_wkt: Option<&str>,
) -> Result<Option<Boundary>, AccessError> {
    let supplied_wkt = supplied_wkt.map(str::trim).filter(|s| !s.is_empty());

    match node {
        HierarchyNode::Officer { parent } => {
            if supplied_wkt.is_some() {
                log::debug!("Ignoring supplied boundary for officer of station {parent}");
            }
            boundaries
                .get_boundary(parent)
                .await?
                .map(Some)
                .ok_or(AccessError::CreatorBoundaryMissing { creator: parent })
        }
        HierarchyNode::PoliceStation { .. } => {
            Ok(supplied_wkt.map(Boundary::from_wkt).transpose()?)
        }
        HierarchyNode::SuperUser => Ok(None),
    }
}

/// Creates `new_user` and assigns its initial boundary.
///
/// The boundary is resolved before anything is written, so a rejected
/// geometry or a station without a boundary leaves no partial account
/// behind.
///
/// # Errors
///
/// See [`initial_boundary`]; also returns [`AccessError::Storage`] if a
/// write fails.
pub async fn create_with_inheritance(
    users: &dyn UserStore,
    boundaries: &dyn BoundaryStore,
    new_user: NewUser,
    supplied_wkt: Option<&str>,
) -> Result<(User, Option<Boundary>), AccessError> {
    let boundary = initial_boundary(boundaries, new_user.node, supplied_wkt).await?;
    let user = users.insert_user(new_user).await?;
    if let Some(boundary) = &boundary {
        boundaries.put_boundary(user.id, boundary).await?;
    }
    Ok((user, boundary))
}

#[cfg(test)]
mod tests {
    use precinct_geography_models::GeoPoint;
    use precinct_identity_models::UserProfile;

    use super::*;
    use crate::memory::MemoryStore;

    const UNIT_SQUARE: &str = "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))";
    const BIG_SQUARE: &str = "POLYGON((0 0, 10 0, 10 10, 0 10, 0 0))";

    fn new_user(node: HierarchyNode, username: &str) -> NewUser {
        NewUser {
            node,
            profile: UserProfile {
                username: username.to_string(),
                ..UserProfile::default()
            },
        }
    }

    #[tokio::test]
    async fn officer_snapshot_ignores_later_station_changes() {
        let store = MemoryStore::new();
        let (station, _) = create_with_inheritance(
            &store,
            &store,
            new_user(HierarchyNode::PoliceStation { parent: 1 }, "station"),
            Some(UNIT_SQUARE),
        )
        .await
        .unwrap();

        let (officer, inherited) = create_with_inheritance(
            &store,
            &store,
            new_user(HierarchyNode::Officer { parent: station.id }, "officer"),
            None,
        )
        .await
        .unwrap();
        let station_boundary = get_boundary(&store, station.id).await.unwrap();
        assert_eq!(inherited, station_boundary);

        set_boundary(&store, station.id, BIG_SQUARE).await.unwrap();

        let officer_boundary = get_boundary(&store, officer.id).await.unwrap().unwrap();
        assert_eq!(officer_boundary, Boundary::from_wkt(UNIT_SQUARE).unwrap());
        assert!(!officer_boundary.covers(GeoPoint::from_lat_lon(5.0, 5.0)));
    }

    #[tokio::test]
    async fn officer_of_station_without_boundary_is_rejected_without_writes() {
        let store = MemoryStore::new();
        let (station, none) = create_with_inheritance(
            &store,
            &store,
            new_user(HierarchyNode::PoliceStation { parent: 1 }, "bare"),
            None,
        )
        .await
        .unwrap();
        assert!(none.is_none());

        let err = create_with_inheritance(
            &store,
            &store,
            new_user(HierarchyNode::Officer { parent: station.id }, "orphan"),
            Some(UNIT_SQUARE),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AccessError::CreatorBoundaryMissing { creator } if creator == station.id
        ));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn station_with_invalid_geometry_is_rejected() {
        let store = MemoryStore::new();
        let err = create_with_inheritance(
            &store,
            &store,
            new_user(HierarchyNode::PoliceStation { parent: 1 }, "bowtie"),
            Some("POLYGON((0 0, 1 1, 1 0, 0 1, 0 0))"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AccessError::InvalidGeometry(_)));
        assert_eq!(store.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_station_boundary_counts_as_absent() {
        let store = MemoryStore::new();
        let boundary = initial_boundary(
            &store,
            HierarchyNode::PoliceStation { parent: 1 },
            Some("   "),
        )
        .await
        .unwrap();
        assert!(boundary.is_none());
    }

    #[tokio::test]
    async fn set_boundary_replaces_previous() {
        let store = MemoryStore::new();
        set_boundary(&store, 4, UNIT_SQUARE).await.unwrap();
        set_boundary(&store, 4, BIG_SQUARE).await.unwrap();
        let stored = get_boundary(&store, 4).await.unwrap().unwrap();
        assert!(stored.covers(GeoPoint::from_lat_lon(9.0, 9.0)));

        assert!(matches!(
            set_boundary(&store, 4, "POLYGON((0 0, 1 0, 1 1))").await,
            Err(AccessError::InvalidGeometry(_))
        ));
    }
}
