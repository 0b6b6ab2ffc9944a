//! Organization domain models
//!
//! This module provides the Organization entity. Organizations are the
//! tenants of the system: every user belongs to exactly one of them and all
//! authorization decisions are scoped to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OrgError, OrgResult};
use crate::lifecycle::Lifecycle;

/// Characters that may not appear in an organization name.
///
/// The name doubles as the tenant slug, so it has to be safe inside URLs.
const FORBIDDEN_NAME_CHARS: &str = "!@#$%^&*()+={}[]|\\:;\"'<>,.?/";

/// An organization represents a tenant in the multi-tenant system.
///
/// # Architecture
///
/// ```text
/// Organization
///   └─ Users (each user belongs to exactly one organization)
/// ```
///
/// # Examples
///
/// ```
/// use tenancy_org::Organization;
///
/// let org = Organization::new("acme-corp", "Acme Corp");
/// assert_eq!(org.name, "acme-corp");
/// assert!(org.is_active);
/// assert!(!org.is_deleted());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// Tenant slug (unique, no whitespace or special characters)
    pub name: String,

    /// Human-readable name
    pub display_name: String,

    /// Optional description
    pub description: Option<String>,

    /// Primary website URL
    pub website: Option<String>,

    /// Whether the organization accepts registrations and logins
    pub is_active: bool,

    /// Soft-delete state
    #[serde(default)]
    pub lifecycle: Lifecycle,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new, active organization.
    ///
    /// The organization is created with:
    /// - A newly generated UUID v7 ID
    /// - Active status
    /// - Current timestamp for created_at and updated_at
    ///
    /// # Arguments
    ///
    /// * `name` - The tenant slug (must be unique)
    /// * `display_name` - The human-readable name
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            website: None,
            is_active: true,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_empty(description.into());
        self
    }

    /// Set the website URL.
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = non_empty(website.into());
        self
    }

    /// Check if the organization was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    /// Check if the organization can accept new registrations and logins.
    pub fn accepts_members(&self) -> bool {
        self.is_active && !self.is_deleted()
    }

    /// Validate a tenant slug.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenancy_org::Organization;
    ///
    /// assert!(Organization::validate_name("acme-corp").is_ok());
    /// assert!(Organization::validate_name("acme corp").is_err());
    /// assert!(Organization::validate_name("acme.corp").is_err());
    /// ```
    pub fn validate_name(name: &str) -> OrgResult<()> {
        if name.is_empty() {
            return Err(OrgError::validation("name is required"));
        }

        if name
            .chars()
            .any(|c| c.is_whitespace() || FORBIDDEN_NAME_CHARS.contains(c))
        {
            return Err(OrgError::validation(
                "name must not contain spaces or special characters",
            ));
        }

        Ok(())
    }

    /// Apply a partial update. Returns `true` if anything changed.
    pub fn apply(&mut self, update: OrganizationUpdate) -> bool {
        let mut changed = false;

        if let Some(display_name) = update.display_name.and_then(non_empty) {
            self.display_name = display_name;
            changed = true;
        }
        if let Some(description) = update.description.and_then(non_empty) {
            self.description = Some(description);
            changed = true;
        }
        if let Some(website) = update.website.and_then(non_empty) {
            self.website = Some(website);
            changed = true;
        }
        if let Some(is_active) = update.is_active {
            changed |= self.is_active != is_active;
            self.is_active = is_active;
        }

        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// Input for creating an organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrganization {
    /// Tenant slug
    pub name: String,

    /// Human-readable name
    pub display_name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Optional website
    #[serde(default)]
    pub website: Option<String>,
}

impl NewOrganization {
    /// Create input with a name and display name.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// Validate the organization input.
    pub fn validate(&self) -> OrgResult<()> {
        Organization::validate_name(&self.name)?;

        if self.display_name.trim().is_empty() {
            return Err(OrgError::validation("display name is required"));
        }

        Ok(())
    }

    /// Build the organization record.
    pub fn into_organization(self) -> Organization {
        let mut org = Organization::new(self.name, self.display_name);
        org.description = self.description.and_then(non_empty);
        org.website = self.website.and_then(non_empty);
        org
    }
}

/// Partial update of an organization. Absent or empty fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    /// New display name
    #[serde(default)]
    pub display_name: Option<String>,

    /// New description
    #[serde(default)]
    pub description: Option<String>,

    /// New website
    #[serde(default)]
    pub website: Option<String>,

    /// Activate or deactivate the organization
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
