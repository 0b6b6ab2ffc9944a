//! Tenancy-scoped directory
//!
//! Every operation resolves its target from storage, runs the access check
//! against that fresh record, and only then touches storage again. No scope
//! decision is carried from one call into the next.
//!
//! Visibility rules:
//! - a user or organization outside the caller's organization, or one that
//!   was soft-deleted, reads as not found
//! - a same-organization request that fails the role rule is forbidden
//! - organization mutations and listings check scope against the requested
//!   id before any lookup, so they are forbidden for foreign ids

use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::storage::{Storage, StorageError, StorageResult, WriteBatch};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tenancy_auth::{
    Authenticator, IssuedToken, PasswordConfig, PasswordHasher, Principal, TokenService,
};
use tenancy_org::{
    normalize_email, NewOrganization, NewUser, Organization, OrganizationUpdate, Page,
    PageRequest, Role, User, UserUpdate, UserView,
};
use tenancy_rbac::{AccessControl, Operation, Target};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Plaintext hashed once at startup; unknown-account logins verify against
/// its digest so they cost the same as real ones.
const DUMMY_PASSWORD: &str = "tenancy-directory-timing-equalizer";

/// A successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The bearer token and the claims it carries
    pub token: IssuedToken,

    /// The authenticated user
    pub user: UserView,
}

/// An organization together with its bootstrap admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedOrganization {
    pub organization: Organization,
    pub admin: UserView,
}

/// The tenancy-scoped directory.
///
/// Cloning is cheap; storage and services are shared.
pub struct Directory<S: Storage + ?Sized> {
    storage: Arc<S>,
    tokens: Arc<TokenService>,
    hasher: Arc<PasswordHasher>,
    dummy_digest: Arc<str>,
    storage_timeout: Duration,
}

impl<S: Storage + ?Sized> Clone for Directory<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            tokens: Arc::clone(&self.tokens),
            hasher: Arc::clone(&self.hasher),
            dummy_digest: Arc::clone(&self.dummy_digest),
            storage_timeout: self.storage_timeout,
        }
    }
}

impl<S: Storage + ?Sized> std::fmt::Debug for Directory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("tokens", &self.tokens)
            .field("hasher", &self.hasher)
            .field("storage_timeout", &self.storage_timeout)
            .finish_non_exhaustive()
    }
}

impl<S: Storage + ?Sized> Directory<S> {
    /// Create a directory over the given storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the token secret is empty or the password
    /// hashing parameters are rejected.
    pub fn new(storage: Arc<S>, config: &DirectoryConfig) -> DirectoryResult<Self> {
        let tokens = Arc::new(TokenService::new(config.token.clone())?);
        Self::from_parts(storage, tokens, config.password, config.storage_timeout())
    }

    /// Create a directory from an existing token service.
    pub fn from_parts(
        storage: Arc<S>,
        tokens: Arc<TokenService>,
        password: PasswordConfig,
        storage_timeout: Duration,
    ) -> DirectoryResult<Self> {
        let hasher = PasswordHasher::new(password)?;
        let dummy_digest = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            storage,
            tokens,
            hasher: Arc::new(hasher),
            dummy_digest: dummy_digest.into(),
            storage_timeout,
        })
    }

    /// The token service used to issue tokens.
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// An authenticator for the transport layer, sharing this directory's
    /// token service.
    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(Arc::clone(&self.tokens))
    }

    /// Create an organization and its first admin as one atomic unit.
    ///
    /// # Errors
    ///
    /// - `Validation` for invalid organization or admin input
    /// - `DuplicateOrganizationName` if the name is taken
    /// - `Rollback` wrapping the cause if the transaction fails; neither
    ///   record exists afterwards
    #[instrument(skip_all, fields(organization = %input.name))]
    pub async fn create_organization(
        &self,
        input: NewOrganization,
        admin: NewUser,
    ) -> DirectoryResult<CreatedOrganization> {
        authorize(None, Operation::CreateOrganization, &Target::None)?;
        input.validate()?;
        admin.validate()?;

        let existing = self
            .bounded(
                "find_organization_by_name",
                self.storage.find_organization_by_name(&input.name),
            )
            .await?;
        if existing.is_some() {
            warn!("Organization name already exists");
            return Err(DirectoryError::DuplicateOrganizationName);
        }

        let organization = input.into_organization();
        let digest = self.hash_password(admin.password).await?;
        let user = User::new(
            admin.name,
            &admin.email,
            digest,
            organization.id,
            Role::Admin,
        );

        let batch = WriteBatch::new()
            .create_organization(organization.clone())
            .create_user(user.clone());
        self.bounded("commit", self.storage.commit(batch))
            .await
            .map_err(|e| {
                error!(error = %e, "Organization creation rolled back");
                DirectoryError::rollback(e)
            })?;

        info!(
            organization_id = %organization.id,
            user_id = %user.id,
            "Organization created"
        );
        Ok(CreatedOrganization {
            organization,
            admin: user.view(),
        })
    }

    /// Register a user in an organization.
    ///
    /// Members register anonymously. Registering directly as admin needs an
    /// admin principal of the same organization. The role defaults to
    /// member.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` / `Forbidden` when registering an admin without
    ///   the right principal
    /// - `Validation` for invalid input
    /// - `OrganizationNotFound` if the organization is absent or deleted
    /// - `OrganizationInactive` if it is deactivated
    /// - `DuplicateEmail` if the email is taken within the organization
    #[instrument(skip_all, fields(organization_id = %organization_id))]
    pub async fn register_user(
        &self,
        principal: Option<&Principal>,
        organization_id: Uuid,
        input: NewUser,
        role: Option<Role>,
    ) -> DirectoryResult<UserView> {
        let role = role.unwrap_or_default();
        let operation = if role.is_admin() {
            Operation::RegisterAdmin
        } else {
            Operation::RegisterMember
        };
        authorize(principal, operation, &Target::organization(organization_id))?;
        input.validate()?;

        let organization = self
            .bounded(
                "find_organization_by_id",
                self.storage.find_organization_by_id(organization_id),
            )
            .await?
            .ok_or_else(|| {
                warn!("Organization not found during registration");
                DirectoryError::OrganizationNotFound
            })?;
        if !organization.accepts_members() {
            warn!("Registration into inactive organization");
            return Err(DirectoryError::OrganizationInactive);
        }

        let email = normalize_email(&input.email);
        let existing = self
            .bounded(
                "find_user_by_email",
                self.storage.find_user_by_email(&email, organization_id),
            )
            .await?;
        if existing.is_some() {
            warn!("Email already registered in this organization");
            return Err(DirectoryError::DuplicateEmail);
        }

        let digest = self.hash_password(input.password).await?;
        let user = User::new(input.name, &email, digest, organization_id, role);
        self.bounded("create_user", self.storage.create_user(user.clone()))
            .await
            .map_err(duplicate_email_on_conflict)?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user.view())
    }

    /// Authenticate with email and password within one organization.
    ///
    /// An unknown email, a wrong password and an inactive organization all
    /// produce the same `InvalidCredentials` error after the same amount of
    /// hashing work.
    #[instrument(skip_all, fields(organization_id = %organization_id))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        organization_id: Uuid,
    ) -> DirectoryResult<Session> {
        let email = normalize_email(email);

        let organization = self
            .bounded(
                "find_organization_by_id",
                self.storage.find_organization_by_id(organization_id),
            )
            .await?;
        let user = self
            .bounded(
                "find_user_by_email",
                self.storage.find_user_by_email(&email, organization_id),
            )
            .await?;

        let digest = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_digest.to_string(),
        };
        let verified = self.verify_password(digest, password.to_string()).await?;

        let accepts_logins = organization.is_some_and(|org| org.accepts_members());
        let user = match user {
            Some(user) if verified && accepts_logins => user,
            _ => {
                warn!("Login rejected");
                return Err(DirectoryError::InvalidCredentials);
            }
        };

        let token = self
            .tokens
            .mint(user.id, user.organization_id, user.role)
            .inspect_err(|e| error!(error = %e, "Failed to issue token"))?;

        info!(user_id = %user.id, "User logged in");
        Ok(Session {
            token,
            user: user.view(),
        })
    }

    /// Read the caller's own profile.
    #[instrument(skip_all, fields(user_id = %principal.user_id()))]
    pub async fn get_profile(&self, principal: &Principal) -> DirectoryResult<UserView> {
        let user = self
            .load_user(principal, Operation::ReadOwnProfile, principal.user_id())
            .await?;
        Ok(user.view())
    }

    /// Read a user in the caller's organization.
    #[instrument(skip_all, fields(user_id = %principal.user_id(), target_id = %user_id))]
    pub async fn get_user(&self, principal: &Principal, user_id: Uuid) -> DirectoryResult<UserView> {
        let user = self
            .load_user(principal, Operation::ReadUser, user_id)
            .await?;
        Ok(user.view())
    }

    /// Update the caller's own profile.
    pub async fn update_profile(
        &self,
        principal: &Principal,
        update: UserUpdate,
    ) -> DirectoryResult<UserView> {
        self.update_user(principal, principal.user_id(), update)
            .await
    }

    /// Update a user's name, email or password.
    ///
    /// Admins may update any user of their organization; everyone else only
    /// themselves.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user is not visible to the caller
    /// - `Forbidden` if the caller may not modify the user
    /// - `DuplicateEmail` if the new email is taken within the organization
    #[instrument(skip_all, fields(user_id = %principal.user_id(), target_id = %user_id))]
    pub async fn update_user(
        &self,
        principal: &Principal,
        user_id: Uuid,
        update: UserUpdate,
    ) -> DirectoryResult<UserView> {
        update.validate()?;
        let mut user = self
            .load_user(principal, Operation::UpdateUser, user_id)
            .await?;

        if let Some(name) = update.name() {
            user.name = name.to_string();
        }

        if let Some(email) = update.email().filter(|email| *email != user.email) {
            let holder = self
                .bounded(
                    "find_user_by_email",
                    self.storage.find_user_by_email(&email, user.organization_id),
                )
                .await?;
            if holder.is_some_and(|holder| holder.id != user.id) {
                warn!("Email already in use in this organization");
                return Err(DirectoryError::DuplicateEmail);
            }
            user.email = email;
        }

        if let Some(password) = update.password() {
            user.password_hash = self.hash_password(password.to_string()).await?;
        }

        user.touch();
        self.bounded("update_user", self.storage.update_user(user.clone()))
            .await
            .map_err(duplicate_email_on_conflict)
            .map_err(user_missing_on_not_found)?;

        info!("User updated");
        Ok(user.view())
    }

    /// Change a user's role. Admin only.
    ///
    /// Demoting the organization's only admin fails with `LastAdmin`.
    #[instrument(skip_all, fields(user_id = %principal.user_id(), target_id = %user_id, role = %role))]
    pub async fn update_user_role(
        &self,
        principal: &Principal,
        user_id: Uuid,
        role: Role,
    ) -> DirectoryResult<UserView> {
        let mut user = self
            .load_user(principal, Operation::ChangeUserRole, user_id)
            .await?;
        if user.role.is_admin() && !role.is_admin() {
            self.ensure_other_admin(&user).await?;
        }

        user.role = role;
        user.touch();
        self.bounded("update_user", self.storage.update_user(user.clone()))
            .await
            .map_err(user_missing_on_not_found)?;

        info!("User role updated");
        Ok(user.view())
    }

    /// Soft-delete the caller's own account.
    pub async fn delete_profile(&self, principal: &Principal) -> DirectoryResult<()> {
        self.delete_user(principal, principal.user_id()).await
    }

    /// Soft-delete a user.
    ///
    /// Deleting the organization's only admin fails with `LastAdmin`.
    #[instrument(skip_all, fields(user_id = %principal.user_id(), target_id = %user_id))]
    pub async fn delete_user(&self, principal: &Principal, user_id: Uuid) -> DirectoryResult<()> {
        let user = self
            .load_user(principal, Operation::DeleteUser, user_id)
            .await?;
        if user.role.is_admin() {
            self.ensure_other_admin(&user).await?;
        }

        self.bounded(
            "soft_delete_user",
            self.storage.soft_delete_user(user.id, Utc::now()),
        )
        .await
        .map_err(user_missing_on_not_found)?;

        info!("User deleted");
        Ok(())
    }

    /// List the users of an organization. Admin only.
    #[instrument(skip_all, fields(user_id = %principal.user_id(), organization_id = %organization_id))]
    pub async fn list_organization_users(
        &self,
        principal: &Principal,
        organization_id: Uuid,
        page: PageRequest,
    ) -> DirectoryResult<Page<UserView>> {
        authorize(
            Some(principal),
            Operation::ListOrganizationUsers,
            &Target::organization(organization_id),
        )?;
        self.load_organization(organization_id).await?;

        let (users, total) = self
            .bounded(
                "list_users_by_organization",
                self.storage.list_users_by_organization(
                    organization_id,
                    page.offset(),
                    page.limit(),
                ),
            )
            .await?;

        debug!(count = users.len(), total, "Listed organization users");
        let views = users.iter().map(User::view).collect();
        Ok(Page::new(views, total as u64, page))
    }

    /// Read an organization. Only the caller's own organization is visible.
    #[instrument(skip_all, fields(user_id = %principal.user_id(), organization_id = %organization_id))]
    pub async fn get_organization(
        &self,
        principal: &Principal,
        organization_id: Uuid,
    ) -> DirectoryResult<Organization> {
        if !principal.in_organization(organization_id) {
            debug!("Organization outside caller scope");
            return Err(DirectoryError::OrganizationNotFound);
        }

        let organization = self.load_organization(organization_id).await?;
        authorize(
            Some(principal),
            Operation::ReadOwnOrganization,
            &Target::from(&organization),
        )?;
        Ok(organization)
    }

    /// Read the caller's own organization.
    pub async fn get_own_organization(&self, principal: &Principal) -> DirectoryResult<Organization> {
        self.get_organization(principal, principal.organization_id())
            .await
    }

    /// List the organizations visible to the caller.
    ///
    /// The result holds at most the caller's own organization.
    #[instrument(skip_all, fields(user_id = %principal.user_id()))]
    pub async fn list_organizations(
        &self,
        principal: &Principal,
        page: PageRequest,
    ) -> DirectoryResult<Page<Organization>> {
        let organization_id = principal.organization_id();
        authorize(
            Some(principal),
            Operation::ListOrganizations,
            &Target::organization(organization_id),
        )?;

        let visible: Vec<Organization> = self
            .bounded(
                "find_organization_by_id",
                self.storage.find_organization_by_id(organization_id),
            )
            .await?
            .into_iter()
            .collect();

        let total = visible.len() as u64;
        let items = visible
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();
        Ok(Page::new(items, total, page))
    }

    /// Update an organization. Admin only.
    ///
    /// Deactivating an organization blocks new registrations and logins
    /// into it.
    #[instrument(skip_all, fields(user_id = %principal.user_id(), organization_id = %organization_id))]
    pub async fn update_organization(
        &self,
        principal: &Principal,
        organization_id: Uuid,
        update: OrganizationUpdate,
    ) -> DirectoryResult<Organization> {
        let target = Target::organization(organization_id);
        authorize(Some(principal), Operation::UpdateOrganization, &target)?;

        let mut organization = self.load_organization(organization_id).await?;
        authorize(
            Some(principal),
            Operation::UpdateOrganization,
            &Target::from(&organization),
        )?;

        if organization.apply(update) {
            self.bounded(
                "update_organization",
                self.storage.update_organization(organization.clone()),
            )
            .await
            .map_err(organization_missing_on_not_found)?;
            info!(is_active = organization.is_active, "Organization updated");
        }

        Ok(organization)
    }

    /// Soft-delete an organization and all of its users atomically. Admin
    /// only.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the caller is an admin of this organization
    /// - `OrganizationNotFound` if it is already gone
    /// - `Rollback` wrapping the cause if the transaction fails
    #[instrument(skip_all, fields(user_id = %principal.user_id(), organization_id = %organization_id))]
    pub async fn delete_organization(
        &self,
        principal: &Principal,
        organization_id: Uuid,
    ) -> DirectoryResult<()> {
        let target = Target::organization(organization_id);
        authorize(Some(principal), Operation::DeleteOrganization, &target)?;

        let organization = self.load_organization(organization_id).await?;
        authorize(
            Some(principal),
            Operation::DeleteOrganization,
            &Target::from(&organization),
        )?;

        let at = Utc::now();
        let batch = WriteBatch::new()
            .soft_delete_organization(organization.id, at)
            .soft_delete_organization_users(organization.id, at);
        self.bounded("commit", self.storage.commit(batch))
            .await
            .map_err(|e| {
                error!(error = %e, "Organization deletion rolled back");
                DirectoryError::rollback(e)
            })?;

        info!("Organization deleted");
        Ok(())
    }

    /// Fetch a user visible to the principal and check the operation
    /// against it.
    async fn load_user(
        &self,
        principal: &Principal,
        operation: Operation,
        user_id: Uuid,
    ) -> DirectoryResult<User> {
        let user = self
            .bounded("find_user_by_id", self.storage.find_user_by_id(user_id))
            .await?
            .filter(|user| principal.in_organization(user.organization_id))
            .ok_or_else(|| {
                debug!(%operation, "User not visible to caller");
                DirectoryError::UserNotFound
            })?;

        authorize(Some(principal), operation, &Target::from(&user))?;
        Ok(user)
    }

    /// Fail unless the user's organization has an admin besides them.
    async fn ensure_other_admin(&self, user: &User) -> DirectoryResult<()> {
        let admins = self
            .bounded(
                "count_admins",
                self.storage.count_admins(user.organization_id),
            )
            .await?;
        if admins <= 1 {
            warn!(target_id = %user.id, "Refusing to remove the last admin");
            return Err(DirectoryError::LastAdmin);
        }
        Ok(())
    }

    async fn load_organization(&self, organization_id: Uuid) -> DirectoryResult<Organization> {
        self.bounded(
            "find_organization_by_id",
            self.storage.find_organization_by_id(organization_id),
        )
        .await?
        .ok_or(DirectoryError::OrganizationNotFound)
    }

    /// Run a storage call under the storage timeout.
    ///
    /// On expiry the call's future is dropped, which cancels it.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> DirectoryResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        match tokio::time::timeout(self.storage_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                match e {
                    StorageError::Unavailable(_) | StorageError::Constraint(_) => {
                        error!(operation, error = %e, "Storage call failed")
                    }
                    StorageError::Conflict(_) | StorageError::NotFound(_) => {
                        warn!(operation, error = %e, "Storage call rejected")
                    }
                }
                Err(DirectoryError::Storage(e))
            }
            Err(_) => {
                error!(
                    operation,
                    timeout_ms = self.storage_timeout.as_millis() as u64,
                    "Storage call timed out"
                );
                Err(DirectoryError::Timeout { operation })
            }
        }
    }

    async fn hash_password(&self, password: String) -> DirectoryResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DirectoryError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(DirectoryError::from)
    }

    async fn verify_password(&self, digest: String, password: String) -> DirectoryResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| DirectoryError::Internal(format!("Verification task failed: {}", e)))
    }
}

/// Run the access check and log denials.
fn authorize(
    principal: Option<&Principal>,
    operation: Operation,
    target: &Target,
) -> DirectoryResult<()> {
    AccessControl::authorize(principal, operation, target).map_err(|e| {
        warn!(
            %operation,
            user_id = ?principal.map(Principal::user_id),
            error_code = e.error_code(),
            "Access denied"
        );
        DirectoryError::from(e)
    })
}

fn duplicate_email_on_conflict(err: DirectoryError) -> DirectoryError {
    match err {
        DirectoryError::Storage(StorageError::Conflict(_)) => DirectoryError::DuplicateEmail,
        other => other,
    }
}

fn user_missing_on_not_found(err: DirectoryError) -> DirectoryError {
    match err {
        DirectoryError::Storage(StorageError::NotFound(_)) => DirectoryError::UserNotFound,
        other => other,
    }
}

fn organization_missing_on_not_found(err: DirectoryError) -> DirectoryError {
    match err {
        DirectoryError::Storage(StorageError::NotFound(_)) => DirectoryError::OrganizationNotFound,
        other => other,
    }
}
