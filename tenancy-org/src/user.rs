//! User domain models
//!
//! A user belongs to exactly one organization and carries its role directly.
//! Email addresses are unique per organization, not globally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OrgError, OrgResult};
use crate::lifecycle::Lifecycle;
use crate::roles::Role;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A user record as held by storage.
///
/// The password hash never leaves the process: it is skipped on
/// serialization and excluded from [`UserView`].
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Normalized email (unique within the organization)
    pub email: String,

    /// PHC-formatted password digest
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Owning organization
    pub organization_id: Uuid,

    /// Role within the organization
    pub role: Role,

    /// Soft-delete state
    #[serde(default)]
    pub lifecycle: Lifecycle,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("organization_id", &self.organization_id)
            .field("role", &self.role)
            .field("lifecycle", &self.lifecycle)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// Creates a new active user.
    ///
    /// The email is normalized; the password must already be hashed.
    ///
    /// # Examples
    ///
    /// ```
    /// use uuid::Uuid;
    /// use tenancy_org::{Role, User};
    ///
    /// let org_id = Uuid::now_v7();
    /// let user = User::new("Ann", "Ann@X.com", "$argon2id$...", org_id, Role::Member);
    /// assert_eq!(user.email, "ann@x.com");
    /// assert!(!user.is_deleted());
    /// ```
    pub fn new(
        name: impl Into<String>,
        email: &str,
        password_hash: impl Into<String>,
        organization_id: Uuid,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            email: normalize_email(email),
            password_hash: password_hash.into(),
            organization_id,
            role,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    /// Check if the user belongs to the given organization.
    pub fn belongs_to(&self, organization_id: Uuid) -> bool {
        self.organization_id == organization_id
    }

    /// Project the user into its externally visible shape.
    pub fn view(&self) -> UserView {
        UserView::from(self)
    }

    /// Mark the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Externally visible projection of a user. It has no password field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserView {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email
    pub email: String,

    /// Owning organization
    pub organization_id: Uuid,

    /// Role within the organization
    pub role: Role,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            organization_id: user.organization_id,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Registration input for a user.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Plaintext password
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl NewUser {
    /// Create registration input.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Validate registration input.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenancy_org::NewUser;
    ///
    /// assert!(NewUser::new("Ann", "ann@x.com", "secret1").validate().is_ok());
    /// assert!(NewUser::new("Ann", "ann.x.com", "secret1").validate().is_err());
    /// assert!(NewUser::new("Ann", "ann@x.com", "short").validate().is_err());
    /// ```
    pub fn validate(&self) -> OrgResult<()> {
        if self.name.trim().is_empty() {
            return Err(OrgError::validation("name is required"));
        }
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Partial update of a user profile. Absent or empty fields are kept.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    /// New display name
    #[serde(default)]
    pub name: Option<String>,

    /// New email
    #[serde(default)]
    pub email: Option<String>,

    /// New plaintext password
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserUpdate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl UserUpdate {
    /// New name, if one was supplied.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// New normalized email, if one was supplied.
    pub fn email(&self) -> Option<String> {
        self.email
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(normalize_email)
    }

    /// New password, if one was supplied.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|s| !s.is_empty())
    }

    /// Validate the supplied fields.
    pub fn validate(&self) -> OrgResult<()> {
        if let Some(email) = self.email() {
            validate_email(&email)?;
        }
        if let Some(password) = self.password() {
            validate_password(password)?;
        }
        Ok(())
    }
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> OrgResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(OrgError::validation("email is required"));
    }
    if !email.contains('@') {
        return Err(OrgError::validation("invalid email format"));
    }
    Ok(())
}

fn validate_password(password: &str) -> OrgResult<()> {
    if password.is_empty() {
        return Err(OrgError::validation("password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(OrgError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let org_id = Uuid::now_v7();
        let user = User::new("Ann", " Ann@X.com ", "hash", org_id, Role::Member);

        assert_eq!(user.email, "ann@x.com");
        assert!(user.belongs_to(org_id));
        assert!(!user.belongs_to(Uuid::now_v7()));
        assert_eq!(user.role, Role::Member);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User::new("Ann", "ann@x.com", "secret-hash", Uuid::now_v7(), Role::Admin);

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());

        let view = serde_json::to_value(user.view()).unwrap();
        assert!(view.get("password").is_none());
        assert!(view.get("password_hash").is_none());
        assert_eq!(view["role"], "admin");
    }

    #[test]
    fn test_registration_validation() {
        assert_eq!(
            NewUser::new("", "ann@x.com", "secret1").validate(),
            Err(OrgError::validation("name is required"))
        );
        assert_eq!(
            NewUser::new("Ann", "", "secret1").validate(),
            Err(OrgError::validation("email is required"))
        );
        assert_eq!(
            NewUser::new("Ann", "ann@x.com", "").validate(),
            Err(OrgError::validation("password is required"))
        );
        assert!(NewUser::new("Ann", "ann@x.com", "123456").validate().is_ok());
    }

    #[test]
    fn test_update_treats_empty_as_absent() {
        let update = UserUpdate {
            name: Some("  ".to_string()),
            email: Some(" New@X.com".to_string()),
            password: Some(String::new()),
        };

        assert_eq!(update.name(), None);
        assert_eq!(update.email().as_deref(), Some("new@x.com"));
        assert_eq!(update.password(), None);
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let input = NewUser::new("Ann", "ann@x.com", "secret1");
        assert!(!format!("{:?}", input).contains("secret1"));

        let update = UserUpdate {
            password: Some("secret2".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", update).contains("secret2"));

        let user = User::new("Ann", "ann@x.com", "$argon2id$v=19$digest", Uuid::now_v7(), Role::Member);
        let rendered = format!("{:?}", user);
        assert!(!rendered.contains("argon2id"));
        assert!(rendered.contains("ann@x.com"));
    }
}
