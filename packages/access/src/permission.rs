//! Mutation authorization for incidents.

use precinct_identity_models::{Actor, Role};
use precinct_incident_models::Incident;
use strum_macros::Display;

use crate::AccessError;
use crate::collaborators::IdentityDirectory;

/// A mutating action on an existing incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    /// Replace the incident's fields.
    Update,
    /// Remove the incident.
    Delete,
}

/// Checks that `actor` may perform `action` on `incident`.
///
/// In order:
/// 1. a `SUPER_USER` may mutate anything;
/// 2. the reporter may always mutate its own incident, whatever its role;
/// 3. a `POLICE_STATION` may mutate incidents reported by its officers;
/// 4. everyone else is denied.
///
/// The station's roster is fetched from `directory` on every call.
///
/// # Errors
///
/// Returns [`AccessError::InsufficientPermissions`] when denied, or the
/// directory's error if the roster lookup fails.
pub async fn can_mutate(
    directory: &dyn IdentityDirectory,
    actor: &Actor,
    incident: &Incident,
    action: Action,
) -> Result<(), AccessError> {
    if actor.role == Some(Role::SuperUser) {
        return Ok(());
    }
    if incident.reported_by == actor.id {
        return Ok(());
    }
    if actor.role == Some(Role::PoliceStation) {
        let officers = directory.officer_ids_by_station(actor.id).await?;
        if officers.contains(&incident.reported_by) {
            return Ok(());
        }
    }

    log::debug!(
        "User {} ({:?}) denied {action} on incident {} reported by {}",
        actor.id,
        actor.role,
        incident.id,
        incident.reported_by
    );
    Err(AccessError::denied(
        actor.id,
        format!("{action} incident {}", incident.id),
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;
    use chrono::Utc;
    use precinct_geography_models::GeoPoint;
    use precinct_identity_models::{User, UserId};
    use precinct_incident_models::IncidentFields;

    use super::*;

    /// Station 10 supervises officers 11 and 12; station 20 supervises 21.
    struct Roster;

    #[async_trait]
    impl IdentityDirectory for Roster {
        async fn user_by_id(&self, _id: UserId) -> Result<Option<User>, AccessError> {
            Ok(None)
        }

        async fn officer_ids_by_station(
            &self,
            station: UserId,
        ) -> Result<BTreeSet<UserId>, AccessError> {
            Ok(match station {
                10 => BTreeSet::from([11, 12]),
                20 => BTreeSet::from([21]),
                _ => BTreeSet::new(),
            })
        }
    }

    struct Down;

    #[async_trait]
    impl IdentityDirectory for Down {
        async fn user_by_id(&self, _id: UserId) -> Result<Option<User>, AccessError> {
            Err(unavailable())
        }

        async fn officer_ids_by_station(
            &self,
            _station: UserId,
        ) -> Result<BTreeSet<UserId>, AccessError> {
            Err(unavailable())
        }
    }

    fn unavailable() -> AccessError {
        AccessError::UpstreamUnavailable {
            service: "user-service".to_string(),
            message: "connection refused".to_string(),
        }
    }

    fn incident(reported_by: UserId) -> Incident {
        Incident {
            id: 100,
            fields: IncidentFields {
                title: "Break-in".to_string(),
                description: None,
                incident_type: "BURGLARY".to_string(),
                priority: "HIGH".to_string(),
                location: GeoPoint::from_lat_lon(0.5, 0.5),
            },
            reported_by,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn super_user_mutates_anything() {
        let admin = Actor::new(1, Role::SuperUser);
        for action in [Action::Update, Action::Delete] {
            assert!(can_mutate(&Down, &admin, &incident(21), action).await.is_ok());
        }
    }

    #[tokio::test]
    async fn reporter_always_mutates_own_incident() {
        for actor in [
            Actor::new(11, Role::Officer),
            Actor::new(11, Role::PoliceStation),
            Actor::from_claim(11, "NOT_A_ROLE"),
        ] {
            assert!(
                can_mutate(&Down, &actor, &incident(11), Action::Delete)
                    .await
                    .is_ok(),
                "{actor:?} should own incident"
            );
        }
    }

    #[tokio::test]
    async fn station_mutates_only_its_officers_incidents() {
        let station = Actor::new(10, Role::PoliceStation);
        assert!(
            can_mutate(&Roster, &station, &incident(12), Action::Update)
                .await
                .is_ok()
        );

        let err = can_mutate(&Roster, &station, &incident(21), Action::Delete)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::InsufficientPermissions { actor: 10, .. }));
    }

    #[tokio::test]
    async fn officer_cannot_mutate_colleague_incident() {
        let officer = Actor::new(11, Role::Officer);
        assert!(matches!(
            can_mutate(&Roster, &officer, &incident(12), Action::Update).await,
            Err(AccessError::InsufficientPermissions { .. })
        ));
    }

    #[tokio::test]
    async fn roster_outage_is_not_a_denial() {
        let station = Actor::new(10, Role::PoliceStation);
        assert!(matches!(
            can_mutate(&Down, &station, &incident(12), Action::Delete).await,
            Err(AccessError::UpstreamUnavailable { .. })
        ));
    }
}
