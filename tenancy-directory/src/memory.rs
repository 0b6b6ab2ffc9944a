//! In-memory storage
//!
//! Suitable for single-process deployments and testing. Commits are
//! copy-on-write: a batch is applied to a clone of the current state and
//! swapped in only if every write succeeded.

use crate::storage::{Storage, StorageError, StorageResult, Write, WriteBatch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tenancy_org::{Lifecycle, Organization, User};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct State {
    organizations: HashMap<Uuid, Organization>,
    users: HashMap<Uuid, User>,
}

impl State {
    fn active_organization(&self, id: Uuid) -> Option<&Organization> {
        self.organizations.get(&id).filter(|org| !org.is_deleted())
    }

    fn name_taken(&self, name: &str, except: Uuid) -> bool {
        self.organizations
            .values()
            .any(|org| org.id != except && !org.is_deleted() && org.name == name)
    }

    fn email_taken(&self, email: &str, organization_id: Uuid, except: Uuid) -> bool {
        self.users.values().any(|user| {
            user.id != except
                && !user.is_deleted()
                && user.organization_id == organization_id
                && user.email == email
        })
    }

    fn check_user(&self, user: &User) -> StorageResult<()> {
        if self.active_organization(user.organization_id).is_none() {
            return Err(StorageError::Constraint(format!(
                "organization {} does not exist",
                user.organization_id
            )));
        }
        if self.email_taken(&user.email, user.organization_id, user.id) {
            return Err(StorageError::Conflict(format!(
                "email already registered in organization {}",
                user.organization_id
            )));
        }
        Ok(())
    }

    fn apply(&mut self, write: Write) -> StorageResult<()> {
        match write {
            Write::CreateOrganization(org) => {
                if self.organizations.contains_key(&org.id) {
                    return Err(StorageError::Conflict(format!("organization {}", org.id)));
                }
                if self.name_taken(&org.name, org.id) {
                    return Err(StorageError::Conflict(format!(
                        "organization name '{}'",
                        org.name
                    )));
                }
                self.organizations.insert(org.id, org);
            }
            Write::UpdateOrganization(org) => {
                if self.active_organization(org.id).is_none() {
                    return Err(StorageError::NotFound(format!("organization {}", org.id)));
                }
                if self.name_taken(&org.name, org.id) {
                    return Err(StorageError::Conflict(format!(
                        "organization name '{}'",
                        org.name
                    )));
                }
                self.organizations.insert(org.id, org);
            }
            Write::SoftDeleteOrganization { id, at } => {
                let org = self
                    .organizations
                    .get_mut(&id)
                    .filter(|org| !org.is_deleted())
                    .ok_or_else(|| StorageError::NotFound(format!("organization {}", id)))?;
                org.lifecycle = Lifecycle::Deleted { at };
                org.updated_at = at;
            }
            Write::CreateUser(user) => {
                if self.users.contains_key(&user.id) {
                    return Err(StorageError::Conflict(format!("user {}", user.id)));
                }
                self.check_user(&user)?;
                self.users.insert(user.id, user);
            }
            Write::UpdateUser(user) => {
                if !self.users.get(&user.id).is_some_and(|u| !u.is_deleted()) {
                    return Err(StorageError::NotFound(format!("user {}", user.id)));
                }
                self.check_user(&user)?;
                self.users.insert(user.id, user);
            }
            Write::SoftDeleteUser { id, at } => {
                let user = self
                    .users
                    .get_mut(&id)
                    .filter(|user| !user.is_deleted())
                    .ok_or_else(|| StorageError::NotFound(format!("user {}", id)))?;
                mark_deleted(user, at);
            }
            Write::SoftDeleteOrganizationUsers {
                organization_id,
                at,
            } => {
                if !self.organizations.contains_key(&organization_id) {
                    return Err(StorageError::NotFound(format!(
                        "organization {}",
                        organization_id
                    )));
                }
                self.users
                    .values_mut()
                    .filter(|user| user.organization_id == organization_id && !user.is_deleted())
                    .for_each(|user| mark_deleted(user, at));
            }
        }
        Ok(())
    }
}

fn mark_deleted(user: &mut User, at: DateTime<Utc>) {
    user.lifecycle = Lifecycle::Deleted { at };
    user.updated_at = at;
}

/// In-memory storage implementation.
///
/// Cloning is cheap and clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<State>>,
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage").finish_non_exhaustive()
    }
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of organization records, soft-deleted ones included.
    pub async fn organization_count(&self) -> usize {
        self.state.read().await.organizations.len()
    }

    /// Number of user records, soft-deleted ones included.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    /// Fetch a user record regardless of its lifecycle.
    pub async fn user_record(&self, id: Uuid) -> Option<User> {
        self.state.read().await.users.get(&id).cloned()
    }

    /// Fetch an organization record regardless of its lifecycle.
    pub async fn organization_record(&self, id: Uuid) -> Option<Organization> {
        self.state.read().await.organizations.get(&id).cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn find_user_by_email(
        &self,
        email: &str,
        organization_id: Uuid,
    ) -> StorageResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| !u.is_deleted() && u.organization_id == organization_id && u.email == email)
            .cloned())
    }

    async fn find_organization_by_id(&self, id: Uuid) -> StorageResult<Option<Organization>> {
        let state = self.state.read().await;
        Ok(state.active_organization(id).cloned())
    }

    async fn find_organization_by_name(&self, name: &str) -> StorageResult<Option<Organization>> {
        let state = self.state.read().await;
        Ok(state
            .organizations
            .values()
            .find(|org| !org.is_deleted() && org.name == name)
            .cloned())
    }

    async fn list_users_by_organization(
        &self,
        organization_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> StorageResult<(Vec<User>, usize)> {
        let state = self.state.read().await;
        let mut users: Vec<&User> = state
            .users
            .values()
            .filter(|u| !u.is_deleted() && u.organization_id == organization_id)
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));

        let total = users.len();
        let page = users
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn commit(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        for write in batch.into_writes() {
            next.apply(write)?;
        }
        *state = next;
        Ok(())
    }
}
