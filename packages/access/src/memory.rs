//! In-process store implementing every storage trait.
//!
//! All state sits behind one [`RwLock`], so each call observes and
//! mutates a consistent snapshot. Used for colocated deployments without a
//! database file and as the test double for the stores.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use precinct_geography_models::Boundary;
use precinct_identity_models::{NewUser, User, UserId, UserProfile};
use precinct_incident_models::{Incident, IncidentFields, IncidentId, NewIncident, ReporterFilter};
use tokio::sync::RwLock;

use crate::store::{BoundaryStore, IncidentStore, StoreError, UserStore};

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    boundaries: BTreeMap<UserId, Boundary>,
    incidents: BTreeMap<IncidentId, Incident>,
    last_user_id: UserId,
    last_incident_id: IncidentId,
}

/// In-memory users, boundaries, and incidents.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        state.last_user_id += 1;
        let stored = User {
            id: state.last_user_id,
            role: user.node.role(),
            created_by: user.node.parent(),
            active: true,
            profile: user.profile,
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn update_profile(
        &self,
        id: UserId,
        profile: &UserProfile,
    ) -> Result<Option<User>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&id).map(|user| {
            user.profile = profile.clone();
            user.clone()
        }))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        state.boundaries.remove(&id);
        Ok(state.users.remove(&id).is_some())
    }

    async fn children_of(&self, parent: UserId) -> Result<BTreeSet<UserId>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .filter(|u| u.created_by == Some(parent))
            .map(|u| u.id)
            .collect())
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(self.state.read().await.users.len() as u64)
    }
}

#[async_trait]
impl BoundaryStore for MemoryStore {
    async fn put_boundary(&self, user: UserId, boundary: &Boundary) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .boundaries
            .insert(user, boundary.clone());
        Ok(())
    }

    async fn get_boundary(&self, user: UserId) -> Result<Option<Boundary>, StoreError> {
        Ok(self.state.read().await.boundaries.get(&user).cloned())
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn insert_incident(&self, incident: NewIncident) -> Result<Incident, StoreError> {
        let mut state = self.state.write().await;
        state.last_incident_id += 1;
        let stored = Incident {
            id: state.last_incident_id,
            fields: incident.fields,
            reported_by: incident.reported_by,
            occurred_at: incident.occurred_at,
        };
        state.incidents.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, StoreError> {
        Ok(self.state.read().await.incidents.get(&id).cloned())
    }

    async fn list_incidents(&self, filter: &ReporterFilter) -> Result<Vec<Incident>, StoreError> {
        let state = self.state.read().await;
        let mut incidents: Vec<Incident> = state
            .incidents
            .values()
            .filter(|i| filter.permits(i.reported_by))
            .cloned()
            .collect();
        incidents.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(incidents)
    }

    async fn update_incident(
        &self,
        id: IncidentId,
        fields: &IncidentFields,
    ) -> Result<Option<Incident>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.incidents.get_mut(&id).map(|incident| {
            incident.fields = fields.clone();
            incident.clone()
        }))
    }

    async fn delete_incident(&self, id: IncidentId) -> Result<bool, StoreError> {
        Ok(self.state.write().await.incidents.remove(&id).is_some())
    }
}
