//! # Operations
//!
//! Defines every operation the directory exposes, and the static facts the
//! access-control policy needs about each one.

use serde::{Deserialize, Serialize};

use crate::target::TargetKind;

/// Operations that can be requested against users and organizations.
///
/// Operations fall into three groups:
/// - **Bootstrap**: creating an organization and self-registering as a
///   member need no prior authentication
/// - **Self-service**: reading one's own profile and organization
/// - **Managed**: everything touching another user or the organization
///   itself, which requires the admin role in the same organization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Create an organization together with its first admin.
    CreateOrganization,

    /// Register a new member of an organization.
    RegisterMember,

    /// Register a new user directly with the admin role.
    RegisterAdmin,

    /// Read the caller's own profile.
    ReadOwnProfile,

    /// Read the caller's own organization.
    ReadOwnOrganization,

    /// List organizations visible to the caller.
    ListOrganizations,

    /// Read a user record.
    ReadUser,

    /// Update a user record.
    UpdateUser,

    /// Soft-delete a user record.
    DeleteUser,

    /// Change a user's role.
    ChangeUserRole,

    /// List the users of an organization.
    ListOrganizationUsers,

    /// Update an organization.
    UpdateOrganization,

    /// Soft-delete an organization and its users.
    DeleteOrganization,
}

impl Operation {
    /// Get the string representation of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateOrganization => "create_organization",
            Operation::RegisterMember => "register_member",
            Operation::RegisterAdmin => "register_admin",
            Operation::ReadOwnProfile => "read_own_profile",
            Operation::ReadOwnOrganization => "read_own_organization",
            Operation::ListOrganizations => "list_organizations",
            Operation::ReadUser => "read_user",
            Operation::UpdateUser => "update_user",
            Operation::DeleteUser => "delete_user",
            Operation::ChangeUserRole => "change_user_role",
            Operation::ListOrganizationUsers => "list_organization_users",
            Operation::UpdateOrganization => "update_organization",
            Operation::DeleteOrganization => "delete_organization",
        }
    }

    /// Parse operation from string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use tenancy_rbac::Operation;
    ///
    /// assert_eq!(Operation::parse("delete_user"), Some(Operation::DeleteUser));
    /// assert_eq!(Operation::parse("DELETE_USER"), Some(Operation::DeleteUser));
    /// assert_eq!(Operation::parse("drop_table"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::all().into_iter().find(|op| op.as_str() == s)
    }

    /// Get all operations.
    pub fn all() -> Vec<Self> {
        vec![
            Operation::CreateOrganization,
            Operation::RegisterMember,
            Operation::RegisterAdmin,
            Operation::ReadOwnProfile,
            Operation::ReadOwnOrganization,
            Operation::ListOrganizations,
            Operation::ReadUser,
            Operation::UpdateUser,
            Operation::DeleteUser,
            Operation::ChangeUserRole,
            Operation::ListOrganizationUsers,
            Operation::UpdateOrganization,
            Operation::DeleteOrganization,
        ]
    }

    /// Check if the operation needs a verified caller.
    ///
    /// Only the bootstrap operations run anonymously.
    pub fn requires_authentication(&self) -> bool {
        !matches!(
            self,
            Operation::CreateOrganization | Operation::RegisterMember
        )
    }

    /// Check if the operation always needs the admin role.
    ///
    /// User reads, updates and deletes are not listed: those are also
    /// open to the user acting on itself.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Operation::RegisterAdmin
                | Operation::ChangeUserRole
                | Operation::ListOrganizationUsers
                | Operation::UpdateOrganization
                | Operation::DeleteOrganization
        )
    }

    /// The kind of target this operation acts on.
    pub fn target_kind(&self) -> TargetKind {
        match self {
            Operation::CreateOrganization => TargetKind::None,
            Operation::ReadOwnProfile
            | Operation::ReadUser
            | Operation::UpdateUser
            | Operation::DeleteUser
            | Operation::ChangeUserRole => TargetKind::User,
            Operation::RegisterMember
            | Operation::RegisterAdmin
            | Operation::ReadOwnOrganization
            | Operation::ListOrganizations
            | Operation::ListOrganizationUsers
            | Operation::UpdateOrganization
            | Operation::DeleteOrganization => TargetKind::Organization,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips() {
        for op in Operation::all() {
            assert_eq!(Operation::parse(op.as_str()), Some(op));
        }
    }

    #[test]
    fn test_bootstrap_operations_are_anonymous() {
        let anonymous: Vec<_> = Operation::all()
            .into_iter()
            .filter(|op| !op.requires_authentication())
            .collect();
        assert_eq!(
            anonymous,
            vec![Operation::CreateOrganization, Operation::RegisterMember]
        );
    }

    #[test]
    fn test_admin_operations_are_authenticated() {
        for op in Operation::all().into_iter().filter(Operation::requires_admin) {
            assert!(op.requires_authentication(), "{op} runs anonymously");
        }
    }
}
