//! Account administration rules derived from the creation tree.
//!
//! Creation is evaluated once, when the account is made. Update, delete,
//! and boundary assignment look at the stored `created_by` of the target,
//! which never changes after creation.

use precinct_identity_models::{HierarchyNode, Role, User};

use crate::AccessError;

/// Checks that `creator` may create an account with `requested` role and
/// returns the new account's tree position.
///
/// # Errors
///
/// Returns [`AccessError::RoleCreationDenied`] for every pairing other
/// than `SUPER_USER → POLICE_STATION` and `POLICE_STATION → OFFICER`.
pub fn authorize_creation(creator: &User, requested: Role) -> Result<HierarchyNode, AccessError> {
    if !creator.role.may_create(requested) {
        log::debug!(
            "User {} ({}) denied creating a {requested}",
            creator.id,
            creator.role
        );
        return Err(AccessError::RoleCreationDenied {
            creator: Some(creator.role),
            requested,
        });
    }

    Ok(match requested {
        Role::SuperUser => HierarchyNode::SuperUser,
        Role::PoliceStation => HierarchyNode::PoliceStation { parent: creator.id },
        Role::Officer => HierarchyNode::Officer { parent: creator.id },
    })
}

/// Whether `actor` created `target`.
fn is_creator_of(actor: &User, target: &User) -> bool {
    target.created_by == Some(actor.id)
}

/// Checks that `actor` may edit the profile of `target`.
///
/// Super users may edit anyone, a station may edit the officers it
/// created, and every account may edit itself.
///
/// # Errors
///
/// Returns [`AccessError::InsufficientPermissions`] otherwise.
pub fn check_user_update(actor: &User, target: &User) -> Result<(), AccessError> {
    let allowed = match actor.role {
        Role::SuperUser => true,
        Role::PoliceStation => is_creator_of(actor, target) || actor.id == target.id,
        Role::Officer => actor.id == target.id,
    };
    if allowed {
        Ok(())
    } else {
        Err(AccessError::denied(
            actor.id,
            format!("update user {}", target.id),
        ))
    }
}

/// Checks that `actor` may delete `target`.
///
/// Super users may delete anyone and a station may delete the officers it
/// created. Accounts cannot delete themselves.
///
/// # Errors
///
/// Returns [`AccessError::InsufficientPermissions`] otherwise.
pub fn check_user_delete(actor: &User, target: &User) -> Result<(), AccessError> {
    let allowed = match actor.role {
        Role::SuperUser => actor.id != target.id,
        Role::PoliceStation => is_creator_of(actor, target),
        Role::Officer => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(AccessError::denied(
            actor.id,
            format!("delete user {}", target.id),
        ))
    }
}

/// Checks that `actor` may (re)assign the boundary of `target`.
///
/// Super users may assign any boundary; a station may assign the
/// boundaries of its own officers but not its own.
///
/// # Errors
///
/// Returns [`AccessError::InsufficientPermissions`] otherwise.
pub fn check_boundary_assignment(actor: &User, target: &User) -> Result<(), AccessError> {
    let allowed = match actor.role {
        Role::SuperUser => true,
        Role::PoliceStation => is_creator_of(actor, target),
        Role::Officer => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(AccessError::denied(
            actor.id,
            format!("assign the boundary of user {}", target.id),
        ))
    }
}
