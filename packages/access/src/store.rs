//! Storage traits for users, boundaries, and incidents.
//!
//! Implementations must be `Send + Sync` so they can sit in shared server
//! state. Updates and deletes of one incident must be atomic with respect
//! to each other: an update that races a delete affects nothing and
//! reports the incident as missing.

use std::collections::BTreeSet;

use async_trait::async_trait;
use precinct_geography_models::Boundary;
use precinct_identity_models::{NewUser, User, UserId, UserProfile};
use precinct_incident_models::{Incident, IncidentFields, IncidentId, NewIncident, ReporterFilter};
use thiserror::Error;

/// Errors returned by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend-specific failure (connection, query, I/O).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored row could not be decoded into a model.
    #[error("corrupt row: {message}")]
    Corrupt {
        /// What failed to decode.
        message: String,
    },
}

/// Persistence for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new account and returns it with its assigned id.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Fetches an account by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Lists all accounts ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Replaces an account's profile. Returns `None` if it does not exist.
    async fn update_profile(
        &self,
        id: UserId,
        profile: &UserProfile,
    ) -> Result<Option<User>, StoreError>;

    /// Deletes an account. Returns whether a row was removed.
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;

    /// Ids of the accounts whose creator is `parent`.
    async fn children_of(&self, parent: UserId) -> Result<BTreeSet<UserId>, StoreError>;

    /// Total number of accounts.
    async fn count_users(&self) -> Result<u64, StoreError>;
}

/// Persistence for jurisdiction boundaries, one per user.
#[async_trait]
pub trait BoundaryStore: Send + Sync {
    /// Stores or replaces the boundary of `user`.
    async fn put_boundary(&self, user: UserId, boundary: &Boundary) -> Result<(), StoreError>;

    /// Fetches the boundary of `user`, if any.
    async fn get_boundary(&self, user: UserId) -> Result<Option<Boundary>, StoreError>;
}

/// Persistence for incidents.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Inserts a new incident and returns it with its assigned id.
    async fn insert_incident(&self, incident: NewIncident) -> Result<Incident, StoreError>;

    /// Fetches an incident by id.
    async fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, StoreError>;

    /// Lists incidents passing `filter`, newest first.
    async fn list_incidents(&self, filter: &ReporterFilter) -> Result<Vec<Incident>, StoreError>;

    /// Replaces the mutable fields of an incident. Returns `None` if it no
    /// longer exists.
    async fn update_incident(
        &self,
        id: IncidentId,
        fields: &IncidentFields,
    ) -> Result<Option<Incident>, StoreError>;

    /// Deletes an incident. Returns whether a row was removed.
    async fn delete_incident(&self, id: IncidentId) -> Result<bool, StoreError>;
}
