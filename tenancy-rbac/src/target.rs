//! # Targets
//!
//! The resource an operation acts on, reduced to the identifiers an access
//! decision needs.

use serde::{Deserialize, Serialize};
use tenancy_org::{Organization, User};
use uuid::Uuid;

/// Shape of a target, without identifiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    None,
    User,
    Organization,
}

/// The resource an operation is requested against.
///
/// A user target always carries the organization the user belongs to, so
/// organization scope can be checked without a second lookup.
///
/// # Example
///
/// ```
/// use tenancy_rbac::{Target, TargetKind};
/// use uuid::Uuid;
///
/// let org_id = Uuid::now_v7();
/// let target = Target::user(Uuid::now_v7(), org_id);
/// assert_eq!(target.kind(), TargetKind::User);
/// assert_eq!(target.organization_id(), Some(org_id));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// No resource exists yet (e.g. creating an organization).
    None,

    /// A user within an organization.
    User { user_id: Uuid, organization_id: Uuid },

    /// An organization.
    Organization { organization_id: Uuid },
}

impl Target {
    /// Target a user by identifiers.
    pub fn user(user_id: Uuid, organization_id: Uuid) -> Self {
        Target::User {
            user_id,
            organization_id,
        }
    }

    /// Target an organization by identifier.
    pub fn organization(organization_id: Uuid) -> Self {
        Target::Organization { organization_id }
    }

    /// Get the shape of this target.
    pub fn kind(&self) -> TargetKind {
        match self {
            Target::None => TargetKind::None,
            Target::User { .. } => TargetKind::User,
            Target::Organization { .. } => TargetKind::Organization,
        }
    }

    /// The organization the target lives in, if any.
    pub fn organization_id(&self) -> Option<Uuid> {
        match self {
            Target::None => None,
            Target::User {
                organization_id, ..
            }
            | Target::Organization { organization_id } => Some(*organization_id),
        }
    }

    /// The targeted user, if this is a user target.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Target::User { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }
}

impl From<&User> for Target {
    fn from(user: &User) -> Self {
        Target::user(user.id, user.organization_id)
    }
}

impl From<&Organization> for Target {
    fn from(organization: &Organization) -> Self {
        Target::organization(organization.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenancy_org::Role;

    #[test]
    fn test_user_target_carries_organization() {
        let org_id = Uuid::now_v7();
        let user = User::new("Ada", "ada@example.com", "hash", org_id, Role::Member);
        let target = Target::from(&user);

        assert_eq!(target.kind(), TargetKind::User);
        assert_eq!(target.user_id(), Some(user.id));
        assert_eq!(target.organization_id(), Some(org_id));
    }

    #[test]
    fn test_organization_target() {
        let org = Organization::new("acme", "Acme");
        let target = Target::from(&org);

        assert_eq!(target.kind(), TargetKind::Organization);
        assert_eq!(target.organization_id(), Some(org.id));
        assert_eq!(target.user_id(), None);
    }

    #[test]
    fn test_none_target() {
        assert_eq!(Target::None.kind(), TargetKind::None);
        assert_eq!(Target::None.organization_id(), None);
    }
}
