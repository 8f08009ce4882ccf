//! Capabilities the authorization logic consumes from other services.
//!
//! The permission gate and the incident service only see these traits.
//! When identity or geography data lives in the same process, the
//! store-backed implementations below are used; otherwise the HTTP
//! clients in `precinct_client` implement the same traits.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use precinct_geography_models::GeoPoint;
use precinct_identity_models::{Role, User, UserId};

use crate::AccessError;
use crate::store::{BoundaryStore, UserStore};
use crate::validator;

/// Lookup of accounts and station rosters.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Fetches an account, `None` if unknown.
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, AccessError>;

    /// Ids of the officers created by `station`; empty if none.
    async fn officer_ids_by_station(&self, station: UserId)
    -> Result<BTreeSet<UserId>, AccessError>;
}

/// The point-in-boundary check, local or remote.
#[async_trait]
pub trait LocationValidator: Send + Sync {
    /// Whether `user`, acting as `role`, may place an incident at `point`.
    async fn validate_point_in_boundary(
        &self,
        user: UserId,
        role: Option<Role>,
        point: GeoPoint,
    ) -> Result<bool, AccessError>;
}

/// [`IdentityDirectory`] answered from a colocated [`UserStore`].
pub struct StoreDirectory {
    users: Arc<dyn UserStore>,
}

impl StoreDirectory {
    /// Wraps a user store.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityDirectory for StoreDirectory {
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, AccessError> {
        Ok(self.users.get_user(id).await?)
    }

    async fn officer_ids_by_station(
        &self,
        station: UserId,
    ) -> Result<BTreeSet<UserId>, AccessError> {
        Ok(self.users.children_of(station).await?)
    }
}

/// [`LocationValidator`] answered from a colocated [`BoundaryStore`].
pub struct LocalValidator {
    boundaries: Arc<dyn BoundaryStore>,
}

impl LocalValidator {
    /// Wraps a boundary store.
    #[must_use]
    pub fn new(boundaries: Arc<dyn BoundaryStore>) -> Self {
        Self { boundaries }
    }
}

#[async_trait]
impl LocationValidator for LocalValidator {
    async fn validate_point_in_boundary(
        &self,
        user: UserId,
        role: Option<Role>,
        point: GeoPoint,
    ) -> Result<bool, AccessError> {
        validator::is_authorized_location(self.boundaries.as_ref(), user, role, point).await
    }
}
