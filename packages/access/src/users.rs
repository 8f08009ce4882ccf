//! Account administration and boundary management.

use std::collections::BTreeSet;
use std::sync::Arc;

use precinct_geography_models::{Boundary, GeoPoint};
use precinct_identity_models::{HierarchyNode, NewUser, Role, User, UserId, UserProfile};

use crate::AccessError;
use crate::boundary;
use crate::hierarchy;
use crate::store::{BoundaryStore, UserStore};
use crate::validator;

/// Username given to the super user seeded into an empty store.
pub const SEED_SUPER_USER: &str = "admin";

/// User and boundary operations for the identity and geography endpoints.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    boundaries: Arc<dyn BoundaryStore>,
}

impl UserService {
    /// Wires the service to its stores.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, boundaries: Arc<dyn BoundaryStore>) -> Self {
        Self { users, boundaries }
    }

    /// Creates an account of `requested` role on behalf of `creator_id`.
    ///
    /// The creator's role is read from its stored record. `boundary_wkt`
    /// is used for stations and ignored for officers, who inherit their
    /// station's boundary.
    ///
    /// # Errors
    ///
    /// * [`AccessError::UserNotFound`] if the creator is unknown
    /// * [`AccessError::RoleCreationDenied`] if the pairing is not allowed
    /// * [`AccessError::CreatorBoundaryMissing`] for an officer of a station
    ///   without a boundary
    /// * [`AccessError::InvalidGeometry`] if the supplied boundary is bad
    /// * [`AccessError::InvalidRequest`] if the username is blank
    pub async fn create_user(
        &self,
        creator_id: UserId,
        requested: Role,
        profile: UserProfile,
        boundary_wkt: Option<&str>,
    ) -> Result<(User, Option<Boundary>), AccessError> {
        let creator = self.require(creator_id).await?;
        let node = hierarchy::authorize_creation(&creator, requested)?;

        if profile.username.trim().is_empty() {
            return Err(AccessError::InvalidRequest {
                message: "username must not be empty".to_string(),
            });
        }

        let (user, boundary) = boundary::create_with_inheritance(
            self.users.as_ref(),
            self.boundaries.as_ref(),
            NewUser { node, profile },
            boundary_wkt,
        )
        .await?;
        log::info!(
            "User {} ({}) created by {} ({})",
            user.id,
            user.role,
            creator.id,
            creator.role
        );
        Ok((user, boundary))
    }

    /// Fetches an account.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::UserNotFound`] if it does not exist.
    pub async fn get_user(&self, id: UserId) -> Result<User, AccessError> {
        self.require(id).await
    }

    /// Lists every account.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_users(&self) -> Result<Vec<User>, AccessError> {
        Ok(self.users.list_users().await?)
    }

    /// Replaces the profile of `id`. Role and creator never change.
    ///
    /// # Errors
    ///
    /// * [`AccessError::UserNotFound`] if either account is unknown
    /// * [`AccessError::InsufficientPermissions`] if `actor_id` may not
    ///   edit the target
    pub async fn update_user(
        &self,
        actor_id: UserId,
        id: UserId,
        profile: UserProfile,
    ) -> Result<User, AccessError> {
        let actor = self.require(actor_id).await?;
        let target = self.require(id).await?;
        hierarchy::check_user_update(&actor, &target)?;

        if profile.username.trim().is_empty() {
            return Err(AccessError::InvalidRequest {
                message: "username must not be empty".to_string(),
            });
        }

        let updated = self
            .users
            .update_profile(id, &profile)
            .await?
            .ok_or(AccessError::UserNotFound { id })?;
        log::info!("User {id} updated by {actor_id}");
        Ok(updated)
    }

    /// Deletes `id` and its boundary. Incidents it reported are kept.
    ///
    /// # Errors
    ///
    /// * [`AccessError::UserNotFound`] if either account is unknown
    /// * [`AccessError::InsufficientPermissions`] if `actor_id` may not
    ///   delete the target
    pub async fn delete_user(&self, actor_id: UserId, id: UserId) -> Result<(), AccessError> {
        let actor = self.require(actor_id).await?;
        let target = self.require(id).await?;
        hierarchy::check_user_delete(&actor, &target)?;

        if !self.users.delete_user(id).await? {
            return Err(AccessError::UserNotFound { id });
        }
        log::info!("User {id} deleted by {actor_id}");
        Ok(())
    }

    /// Ids of the officers created by `station`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn officer_ids(&self, station: UserId) -> Result<BTreeSet<UserId>, AccessError> {
        Ok(self.users.children_of(station).await?)
    }

    /// Fetches the boundary of `user`, `None` if it has none.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::UserNotFound`] if the account is unknown.
    pub async fn get_boundary(&self, user: UserId) -> Result<Option<Boundary>, AccessError> {
        self.require(user).await?;
        boundary::get_boundary(self.boundaries.as_ref(), user).await
    }

    /// Replaces the boundary of `target` on behalf of `actor_id`.
    ///
    /// Officers already holding a copy of a station's boundary keep their
    /// copy.
    ///
    /// # Errors
    ///
    /// * [`AccessError::UserNotFound`] if either account is unknown
    /// * [`AccessError::InsufficientPermissions`] if `actor_id` may not
    ///   assign the target's boundary
    /// * [`AccessError::InvalidGeometry`] if `wkt` is not well-formed
    pub async fn set_boundary(
        &self,
        actor_id: UserId,
        target: UserId,
        wkt: &str,
    ) -> Result<Boundary, AccessError> {
        let actor = self.require(actor_id).await?;
        let target = self.require(target).await?;
        hierarchy::check_boundary_assignment(&actor, &target)?;
        boundary::set_boundary(self.boundaries.as_ref(), target.id, wkt).await
    }

    /// Answers a point-in-boundary question for a remote incident service.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn authorize_location(
        &self,
        user: UserId,
        role: Option<Role>,
        point: GeoPoint,
    ) -> Result<bool, AccessError> {
        validator::is_authorized_location(self.boundaries.as_ref(), user, role, point).await
    }

    /// Inserts the initial super user if the store has no accounts.
    ///
    /// Returns the seeded account, or `None` if the store was not empty.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn seed_super_user(&self) -> Result<Option<User>, AccessError> {
        if self.users.count_users().await? > 0 {
            return Ok(None);
        }

        let user = self
            .users
            .insert_user(NewUser {
                node: HierarchyNode::SuperUser,
                profile: UserProfile {
                    username: SEED_SUPER_USER.to_string(),
                    first_name: Some("System".to_string()),
                    last_name: Some("Administrator".to_string()),
                    ..UserProfile::default()
                },
            })
            .await?;
        log::info!("Seeded super user '{SEED_SUPER_USER}' with id {}", user.id);
        Ok(Some(user))
    }

    async fn require(&self, id: UserId) -> Result<User, AccessError> {
        self.users
            .get_user(id)
            .await?
            .ok_or(AccessError::UserNotFound { id })
    }
}
