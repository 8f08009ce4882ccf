//! Incident operations with authorization applied.

use std::sync::Arc;

use chrono::Utc;
use precinct_identity_models::{Actor, UserId};
use precinct_incident_models::{Incident, IncidentFields, IncidentId, NewIncident};

use crate::AccessError;
use crate::collaborators::{IdentityDirectory, LocationValidator};
use crate::permission::{self, Action};
use crate::scope;
use crate::store::IncidentStore;

/// Create, read, update, delete, and list incidents on behalf of a caller.
#[derive(Clone)]
pub struct IncidentService {
    incidents: Arc<dyn IncidentStore>,
    directory: Arc<dyn IdentityDirectory>,
    validator: Arc<dyn LocationValidator>,
}

impl IncidentService {
    /// Wires the service to its store and collaborators.
    #[must_use]
    pub fn new(
        incidents: Arc<dyn IncidentStore>,
        directory: Arc<dyn IdentityDirectory>,
        validator: Arc<dyn LocationValidator>,
    ) -> Self {
        Self {
            incidents,
            directory,
            validator,
        }
    }

    /// Records a new incident reported by `reporter`.
    ///
    /// The reporter must exist, and the location must lie inside its
    /// jurisdiction for the role it is acting as.
    ///
    /// # Errors
    ///
    /// * [`AccessError::InvalidRequest`] if the fields are malformed
    /// * [`AccessError::UserNotFound`] if the reporter is unknown
    /// * [`AccessError::OutOfBoundary`] if the location is not authorized
    /// * [`AccessError::UpstreamUnavailable`] if a collaborator fails
    pub async fn create_incident(
        &self,
        reporter: &Actor,
        fields: IncidentFields,
    ) -> Result<Incident, AccessError> {
        check_fields(&fields)?;

        if self.directory.user_by_id(reporter.id).await?.is_none() {
            return Err(AccessError::UserNotFound { id: reporter.id });
        }

        let authorized = self
            .validator
            .validate_point_in_boundary(reporter.id, reporter.role, fields.location)
            .await?;
        if !authorized {
            log::warn!(
                "User {} ({:?}) attempted to report an incident outside its boundary at {:?}",
                reporter.id,
                reporter.role,
                fields.location
            );
            return Err(AccessError::OutOfBoundary);
        }

        let incident = self
            .incidents
            .insert_incident(NewIncident {
                fields,
                reported_by: reporter.id,
                occurred_at: Utc::now(),
            })
            .await?;
        log::info!(
            "Incident {} created by user {}",
            incident.id,
            incident.reported_by
        );
        Ok(incident)
    }

    /// Fetches one incident if it is within the caller's listing scope.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::IncidentNotFound`] if the incident does not
    /// exist or is not visible to `actor`.
    pub async fn get_incident(
        &self,
        actor: &Actor,
        id: IncidentId,
    ) -> Result<Incident, AccessError> {
        let filter = scope::list_scope(self.directory.as_ref(), actor).await?;
        self.incidents
            .get_incident(id)
            .await?
            .filter(|incident| filter.permits(incident.reported_by))
            .ok_or(AccessError::IncidentNotFound { id })
    }

    /// Lists the incidents visible to `actor`, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store and collaborator failures.
    pub async fn list_incidents(&self, actor: &Actor) -> Result<Vec<Incident>, AccessError> {
        let filter = scope::list_scope(self.directory.as_ref(), actor).await?;
        if filter.is_empty() {
            return Ok(vec![]);
        }
        Ok(self.incidents.list_incidents(&filter).await?)
    }

    /// Replaces the mutable fields of an incident.
    ///
    /// The actor's role is looked up rather than taken from the request.
    /// The new location is not checked against any boundary.
    ///
    /// # Errors
    ///
    /// * [`AccessError::UserNotFound`] if the actor is unknown
    /// * [`AccessError::IncidentNotFound`] if the incident is gone
    /// * [`AccessError::InsufficientPermissions`] if the actor may not
    ///   update it
    pub async fn update_incident(
        &self,
        actor_id: UserId,
        id: IncidentId,
        fields: IncidentFields,
    ) -> Result<Incident, AccessError> {
        check_fields(&fields)?;
        let actor = self.resolve_actor(actor_id).await?;
        let existing = self.existing(id).await?;
        permission::can_mutate(self.directory.as_ref(), &actor, &existing, Action::Update).await?;

        let updated = self
            .incidents
            .update_incident(id, &fields)
            .await?
            .ok_or(AccessError::IncidentNotFound { id })?;
        log::info!("Incident {id} updated by user {actor_id}");
        Ok(updated)
    }

    /// Deletes an incident.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_incident`].
    pub async fn delete_incident(
        &self,
        actor_id: UserId,
        id: IncidentId,
    ) -> Result<(), AccessError> {
        let actor = self.resolve_actor(actor_id).await?;
        let existing = self.existing(id).await?;
        permission::can_mutate(self.directory.as_ref(), &actor, &existing, Action::Delete).await?;

        if !self.incidents.delete_incident(id).await? {
            return Err(AccessError::IncidentNotFound { id });
        }
        log::info!("Incident {id} deleted by user {actor_id}");
        Ok(())
    }

    async fn resolve_actor(&self, id: UserId) -> Result<Actor, AccessError> {
        self.directory
            .user_by_id(id)
            .await?
            .map(|user| user.actor())
            .ok_or(AccessError::UserNotFound { id })
    }

    async fn existing(&self, id: IncidentId) -> Result<Incident, AccessError> {
        self.incidents
            .get_incident(id)
            .await?
            .ok_or(AccessError::IncidentNotFound { id })
    }
}

fn check_fields(fields: &IncidentFields) -> Result<(), AccessError> {
    if fields.title.trim().is_empty() {
        return Err(AccessError::InvalidRequest {
            message: "title must not be empty".to_string(),
        });
    }
    if !fields.location.latitude.is_finite() || !fields.location.longitude.is_finite() {
        return Err(AccessError::InvalidRequest {
            message: "location coordinates must be finite".to_string(),
        });
    }
    Ok(())
}
