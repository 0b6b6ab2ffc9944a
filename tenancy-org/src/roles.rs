//! Role-based access control
//!
//! This module defines the two-level role a user holds inside the single
//! organization it belongs to.

use serde::{Deserialize, Serialize};


/// User role within its organization.
///
/// The hierarchy is: Member < Admin. A role only ever applies to the
/// organization the user belongs to; there is no cross-organization role.
///
/// # Permission Model
///
/// - **Member**: Can read and manage its own profile and read its own organization
/// - **Admin**: Can additionally manage every user of the organization and the
///   organization itself
///
/// # Examples
///
/// ```
/// use tenancy_org::Role;
///
/// let role = Role::Member;
/// assert!(!role.is_admin());
///
/// let admin = Role::Admin;
/// assert!(admin.can_manage_members());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular organization member
    Member = 0,

    /// Organization administrator
    Admin = 1,
}

impl Role {
    /// Check if this role has admin privileges.
    ///
    /// # Returns
    ///
    /// `true` for Admin
    pub fn is_admin(&self) -> bool {
        *self >= Role::Admin
    }

    /// Check if this role can manage other members.
    ///
    /// This includes reading, updating, deleting and changing the role of
    /// other users in the same organization.
    pub fn can_manage_members(&self) -> bool {
        self.is_admin()
    }

    /// Check if this role can update or delete the organization.
    pub fn can_manage_organization(&self) -> bool {
        self.is_admin()
    }

    /// Parse role from string representation.
    ///
    /// Parsing is case-insensitive. The legacy value `user` is accepted as
    /// an alias for [`Role::Member`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tenancy_org::Role;
    ///
    /// assert_eq!(Role::parse("admin"), Some(Role::Admin));
    /// assert_eq!(Role::parse("MEMBER"), Some(Role::Member));
    /// assert_eq!(Role::parse("user"), Some(Role::Member));
    /// assert_eq!(Role::parse("owner"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "member" | "user" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Get string representation of the role.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenancy_org::Role;
    ///
    /// assert_eq!(Role::Admin.as_str(), "admin");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    /// Get a human-readable display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Member => "Member",
            Self::Admin => "Admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Member
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
