#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! User, role, and creation-hierarchy types.
//!
//! Every account in the system is one of three roles. Accounts form a
//! forest built strictly top-down: a `SUPER_USER` creates police stations
//! and a police station creates officers. The shape of the tree is fixed
//! at creation time and never re-evaluated.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Identifier of a user account.
pub type UserId = i64;

/// The role an account holds in the hierarchy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Root role with global jurisdiction.
    SuperUser,
    /// Mid-tier unit that owns a jurisdiction and supervises officers.
    PoliceStation,
    /// Leaf role that reports incidents inside its station's jurisdiction.
    Officer,
}

impl Role {
    /// Returns the only role an account with this role may create, if any.
    #[must_use]
    pub const fn creatable_role(self) -> Option<Self> {
        match self {
            Self::SuperUser => Some(Self::PoliceStation),
            Self::PoliceStation => Some(Self::Officer),
            Self::Officer => None,
        }
    }

    /// Whether an account with this role may create an account with
    /// `requested` role.
    #[must_use]
    pub fn may_create(self, requested: Self) -> bool {
        self.creatable_role() == Some(requested)
    }

    /// Parses a role claim as forwarded by the gateway.
    ///
    /// Unrecognized values yield `None`; callers treat that as a role with
    /// no rights at all.
    #[must_use]
    pub fn from_claim(claim: &str) -> Option<Self> {
        claim.trim().parse().ok()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::SuperUser, Self::PoliceStation, Self::Officer]
    }
}

/// The authenticated caller of a request.
///
/// Identity and role come from the upstream token collaborator and are
/// never re-derived here. `role` is `None` when the forwarded role claim
/// was missing or not one of the known variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The caller's user id.
    pub id: UserId,
    /// The caller's role, if recognized.
    pub role: Option<Role>,
}

impl Actor {
    /// Creates an actor with a recognized role.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self {
            id,
            role: Some(role),
        }
    }

    /// Creates an actor from a raw role claim.
    #[must_use]
    pub fn from_claim(id: UserId, claim: &str) -> Self {
        Self {
            id,
            role: Role::from_claim(claim),
        }
    }
}

/// Position of an account in the creation tree.
///
/// Derived from the stored `(role, created_by)` pair. Construction rejects
/// pairs that cannot occur in a tree built by the creation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HierarchyNode {
    /// A root of the forest.
    SuperUser,
    /// A station created by the `SUPER_USER` in `parent`.
    PoliceStation {
        /// The creating super user.
        parent: UserId,
    },
    /// An officer created by the station in `parent`.
    Officer {
        /// The creating police station.
        parent: UserId,
    },
}

/// Error returned when a `(role, created_by)` pair is not a valid tree
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// A super user was given a parent.
    #[error("SUPER_USER accounts are roots and cannot have a creator (got {parent})")]
    RootWithParent {
        /// The unexpected parent id.
        parent: UserId,
    },
    /// A non-root account is missing its creator.
    #[error("{role} accounts must reference the account that created them")]
    MissingParent {
        /// The role lacking a parent.
        role: Role,
    },
    /// An account references itself as its creator.
    #[error("user {id} cannot be its own creator")]
    SelfParent {
        /// The offending id.
        id: UserId,
    },
}

impl HierarchyNode {
    /// Builds a node from its stored parts.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError`] if a super user has a parent or any
    /// other role is missing one.
    pub const fn from_parts(role: Role, created_by: Option<UserId>) -> Result<Self, HierarchyError> {
        match (role, created_by) {
            (Role::SuperUser, None) => Ok(Self::SuperUser),
            (Role::SuperUser, Some(parent)) => Err(HierarchyError::RootWithParent { parent }),
            (Role::PoliceStation, Some(parent)) => Ok(Self::PoliceStation { parent }),
            (Role::Officer, Some(parent)) => Ok(Self::Officer { parent }),
            (role, None) => Err(HierarchyError::MissingParent { role }),
        }
    }

    /// The role at this position.
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::SuperUser => Role::SuperUser,
            Self::PoliceStation { .. } => Role::PoliceStation,
            Self::Officer { .. } => Role::Officer,
        }
    }

    /// The creating account, `None` for roots.
    #[must_use]
    pub const fn parent(self) -> Option<UserId> {
        match self {
            Self::SuperUser => None,
            Self::PoliceStation { parent } | Self::Officer { parent } => Some(parent),
        }
    }
}

/// Descriptive profile fields carried alongside an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Badge or unit number.
    pub badge_number: Option<String>,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Primary key.
    pub id: UserId,
    /// Role in the hierarchy.
    pub role: Role,
    /// The account that created this one; `None` only for super users.
    pub created_by: Option<UserId>,
    /// Whether the account is active.
    pub active: bool,
    /// Descriptive fields.
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl User {
    /// Returns this account's position in the creation tree.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError`] if the stored role and creator are
    /// inconsistent.
    pub fn node(&self) -> Result<HierarchyNode, HierarchyError> {
        if self.created_by == Some(self.id) {
            return Err(HierarchyError::SelfParent { id: self.id });
        }
        HierarchyNode::from_parts(self.role, self.created_by)
    }

    /// The caller identity this account acts as.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// A user record handed to storage before an id has been assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Tree position of the new account.
    pub node: HierarchyNode,
    /// Descriptive fields.
    pub profile: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_rule_is_strictly_top_down() {
        assert!(Role::SuperUser.may_create(Role::PoliceStation));
        assert!(Role::PoliceStation.may_create(Role::Officer));

        assert!(!Role::SuperUser.may_create(Role::SuperUser));
        assert!(!Role::SuperUser.may_create(Role::Officer));
        assert!(!Role::PoliceStation.may_create(Role::PoliceStation));
        assert!(!Role::PoliceStation.may_create(Role::SuperUser));
        for requested in Role::all() {
            assert!(
                !Role::Officer.may_create(*requested),
                "officer must not create {requested}"
            );
        }
    }

    #[test]
    fn role_claims_parse_screaming_snake_case() {
        assert_eq!(Role::from_claim("SUPER_USER"), Some(Role::SuperUser));
        assert_eq!(Role::from_claim(" POLICE_STATION "), Some(Role::PoliceStation));
        assert_eq!(Role::from_claim("OFFICER"), Some(Role::Officer));
        assert_eq!(Role::from_claim("officer"), None);
        assert_eq!(Role::from_claim(""), None);
        assert_eq!(Role::from_claim("ADMIN"), None);
    }

    #[test]
    fn role_display_matches_claim_form() {
        for role in Role::all() {
            assert_eq!(Role::from_claim(&role.to_string()), Some(*role));
        }
    }

    #[test]
    fn hierarchy_node_rejects_inconsistent_parts() {
        assert_eq!(
            HierarchyNode::from_parts(Role::SuperUser, None),
            Ok(HierarchyNode::SuperUser)
        );
        assert_eq!(
            HierarchyNode::from_parts(Role::Officer, Some(4)),
            Ok(HierarchyNode::Officer { parent: 4 })
        );
        assert_eq!(
            HierarchyNode::from_parts(Role::SuperUser, Some(1)),
            Err(HierarchyError::RootWithParent { parent: 1 })
        );
        assert_eq!(
            HierarchyNode::from_parts(Role::PoliceStation, None),
            Err(HierarchyError::MissingParent {
                role: Role::PoliceStation
            })
        );
    }

    #[test]
    fn user_cannot_be_its_own_creator() {
        let user = User {
            id: 7,
            role: Role::Officer,
            created_by: Some(7),
            active: true,
            profile: UserProfile::default(),
        };
        assert_eq!(user.node(), Err(HierarchyError::SelfParent { id: 7 }));
    }

    #[test]
    fn user_serializes_flat_camel_case() {
        let user = User {
            id: 3,
            role: Role::Officer,
            created_by: Some(2),
            active: true,
            profile: UserProfile {
                username: "officer_001".to_string(),
                badge_number: Some("OFF-001".to_string()),
                ..UserProfile::default()
            },
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "OFFICER");
        assert_eq!(json["createdBy"], 2);
        assert_eq!(json["username"], "officer_001");
        assert_eq!(json["badgeNumber"], "OFF-001");
    }
}
