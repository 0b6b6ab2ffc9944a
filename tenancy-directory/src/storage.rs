//! Storage port
//!
//! The directory depends only on the [`Storage`] trait. Writes are grouped
//! into a [`WriteBatch`] that the backend applies all-or-nothing; the
//! single-record helpers are one-write batches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tenancy_org::{Organization, User};
use thiserror::Error;
use uuid::Uuid;

/// Storage error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record a write targets does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A referential or state constraint was violated
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// The backend could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A single write inside a batch.
#[derive(Debug, Clone)]
pub enum Write {
    CreateOrganization(Organization),
    UpdateOrganization(Organization),
    SoftDeleteOrganization { id: Uuid, at: DateTime<Utc> },
    CreateUser(User),
    UpdateUser(User),
    SoftDeleteUser { id: Uuid, at: DateTime<Utc> },
    /// Soft-delete every active user of an organization.
    SoftDeleteOrganizationUsers { organization_id: Uuid, at: DateTime<Utc> },
}

impl Write {
    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Write::CreateOrganization(_) => "create_organization",
            Write::UpdateOrganization(_) => "update_organization",
            Write::SoftDeleteOrganization { .. } => "soft_delete_organization",
            Write::CreateUser(_) => "create_user",
            Write::UpdateUser(_) => "update_user",
            Write::SoftDeleteUser { .. } => "soft_delete_user",
            Write::SoftDeleteOrganizationUsers { .. } => "soft_delete_organization_users",
        }
    }
}

/// An ordered set of writes applied as one transaction.
///
/// # Examples
///
/// ```
/// use tenancy_directory::storage::WriteBatch;
/// use tenancy_org::{Organization, Role, User};
///
/// let org = Organization::new("acme", "Acme");
/// let admin = User::new("Ann", "ann@x.com", "$argon2id$...", org.id, Role::Admin);
///
/// let batch = WriteBatch::new()
///     .create_organization(org)
///     .create_user(admin);
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a write.
    pub fn push(mut self, write: Write) -> Self {
        self.writes.push(write);
        self
    }

    pub fn create_organization(self, organization: Organization) -> Self {
        self.push(Write::CreateOrganization(organization))
    }

    pub fn update_organization(self, organization: Organization) -> Self {
        self.push(Write::UpdateOrganization(organization))
    }

    pub fn soft_delete_organization(self, id: Uuid, at: DateTime<Utc>) -> Self {
        self.push(Write::SoftDeleteOrganization { id, at })
    }

    pub fn create_user(self, user: User) -> Self {
        self.push(Write::CreateUser(user))
    }

    pub fn update_user(self, user: User) -> Self {
        self.push(Write::UpdateUser(user))
    }

    pub fn soft_delete_user(self, id: Uuid, at: DateTime<Utc>) -> Self {
        self.push(Write::SoftDeleteUser { id, at })
    }

    pub fn soft_delete_organization_users(self, organization_id: Uuid, at: DateTime<Utc>) -> Self {
        self.push(Write::SoftDeleteOrganizationUsers {
            organization_id,
            at,
        })
    }

    /// Number of writes in the batch.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Check if the batch has no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consume the batch into its writes.
    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Persistence port for users and organizations.
///
/// Finds never return soft-deleted records. Implementations must apply a
/// [`WriteBatch`] atomically: either every write is visible afterwards or
/// none is.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Find an active user by ID.
    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>>;

    /// Find an active user by normalized email within one organization.
    async fn find_user_by_email(
        &self,
        email: &str,
        organization_id: Uuid,
    ) -> StorageResult<Option<User>>;

    /// Find an active organization by ID.
    async fn find_organization_by_id(&self, id: Uuid) -> StorageResult<Option<Organization>>;

    /// Find an active organization by its unique name.
    async fn find_organization_by_name(&self, name: &str) -> StorageResult<Option<Organization>>;

    /// List active users of an organization, oldest first.
    ///
    /// Returns one page of users and the total number of active users.
    async fn list_users_by_organization(
        &self,
        organization_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> StorageResult<(Vec<User>, usize)>;

    /// Apply a batch of writes atomically.
    async fn commit(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Count the active admins of an organization.
    async fn count_admins(&self, organization_id: Uuid) -> StorageResult<usize> {
        let (users, _) = self
            .list_users_by_organization(organization_id, 0, usize::MAX)
            .await?;
        Ok(users.iter().filter(|user| user.role.is_admin()).count())
    }

    /// Persist a new user.
    async fn create_user(&self, user: User) -> StorageResult<()> {
        self.commit(WriteBatch::new().create_user(user)).await
    }

    /// Replace an existing user.
    async fn update_user(&self, user: User) -> StorageResult<()> {
        self.commit(WriteBatch::new().update_user(user)).await
    }

    /// Soft-delete a user.
    async fn soft_delete_user(&self, id: Uuid, at: DateTime<Utc>) -> StorageResult<()> {
        self.commit(WriteBatch::new().soft_delete_user(id, at)).await
    }

    /// Persist a new organization.
    async fn create_organization(&self, organization: Organization) -> StorageResult<()> {
        self.commit(WriteBatch::new().create_organization(organization))
            .await
    }

    /// Replace an existing organization.
    async fn update_organization(&self, organization: Organization) -> StorageResult<()> {
        self.commit(WriteBatch::new().update_organization(organization))
            .await
    }

    /// Soft-delete an organization without touching its users.
    async fn soft_delete_organization(&self, id: Uuid, at: DateTime<Utc>) -> StorageResult<()> {
        self.commit(WriteBatch::new().soft_delete_organization(id, at))
            .await
    }
}
