//! Which incidents a caller may see.

use precinct_identity_models::{Actor, Role};
use precinct_incident_models::ReporterFilter;

use crate::AccessError;
use crate::collaborators::IdentityDirectory;

/// Builds the reporter filter applied when `actor` lists incidents.
///
/// | role | visible reporters |
/// |---|---|
/// | `SUPER_USER` | everyone |
/// | `POLICE_STATION` | itself and its officers |
/// | `OFFICER` | itself |
/// | unrecognized | nobody |
///
/// # Errors
///
/// Propagates the directory's error if a station's roster cannot be
/// fetched.
pub async fn list_scope(
    directory: &dyn IdentityDirectory,
    actor: &Actor,
) -> Result<ReporterFilter, AccessError> {
    Ok(match actor.role {
        Some(Role::SuperUser) => ReporterFilter::All,
        Some(Role::PoliceStation) => {
            let mut reporters = directory.officer_ids_by_station(actor.id).await?;
            reporters.insert(actor.id);
            ReporterFilter::Reporters(reporters)
        }
        Some(Role::Officer) => ReporterFilter::only(actor.id),
        None => {
            log::debug!("User {} has no recognized role; empty scope", actor.id);
            ReporterFilter::nothing()
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;
    use precinct_identity_models::{User, UserId};

    use super::*;

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
            Ok(if station == 10 {
                BTreeSet::from([11, 12])
            } else {
                BTreeSet::new()
            })
        }
    }

    #[tokio::test]
    async fn scope_by_role() {
        assert_eq!(
            list_scope(&Roster, &Actor::new(1, Role::SuperUser))
                .await
                .unwrap(),
            ReporterFilter::All
        );
        assert_eq!(
            list_scope(&Roster, &Actor::new(10, Role::PoliceStation))
                .await
                .unwrap(),
            ReporterFilter::Reporters(BTreeSet::from([10, 11, 12]))
        );
        assert_eq!(
            list_scope(&Roster, &Actor::new(11, Role::Officer))
                .await
                .unwrap(),
            ReporterFilter::only(11)
        );
    }

    #[tokio::test]
    async fn station_without_officers_sees_only_itself() {
        let scope = list_scope(&Roster, &Actor::new(20, Role::PoliceStation))
            .await
            .unwrap();
        assert_eq!(scope, ReporterFilter::only(20));
    }

    #[tokio::test]
    async fn unrecognized_role_sees_nothing() {
        let scope = list_scope(&Roster, &Actor::from_claim(1, "ADMIN"))
            .await
            .unwrap();
        assert!(scope.is_empty());
    }
}
