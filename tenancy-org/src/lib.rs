//! # Tenancy Organization Model
//!
//! This crate provides the data model of the multi-tenant user management
//! core: organizations, the users they own, and the role a user holds.
//!
//! ## Overview
//!
//! The tenancy-org crate handles:
//! - **Organizations**: Tenant entities; names double as URL-safe slugs
//! - **Users**: Exactly one organization per user, role stored on the user
//! - **Roles**: Two-level `member` / `admin` role scoped to one organization
//! - **Lifecycle**: Soft deletion as an explicit `Active | Deleted { at }` state
//! - **Pagination**: Normalized page requests and result pages
//!
//! ## Architecture
//!
//! ```text
//! Organization
//!   └─ User (role, lifecycle)
//! ```
//!
//! Email uniqueness is scoped to `(email, organization_id)`: the same address
//! may exist once in every organization.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tenancy_org::{Organization, Role, User};
//!
//! let org = Organization::new("acme-corp", "Acme Corp");
//! let admin = User::new("Ann", "ann@acme.test", "$argon2id$...", org.id, Role::Admin);
//! assert!(admin.belongs_to(org.id));
//! ```
//!
//! ## Integration
//!
//! This crate is designed to work with:
//! - `tenancy-auth`: Role and identifiers carried in token claims
//! - `tenancy-rbac`: Access decisions over users and organizations
//! - `tenancy-directory`: Storage and tenancy-scoped operations

pub mod error;
pub mod lifecycle;
pub mod organization;
pub mod page;
pub mod roles;
pub mod user;

// Re-export main types for convenience
pub use error::{OrgError, OrgResult};
pub use lifecycle::Lifecycle;
pub use organization::{NewOrganization, Organization, OrganizationUpdate};
pub use page::{Page, PageRequest};
pub use roles::Role;
pub use user::{normalize_email, NewUser, User, UserUpdate, UserView};
