//! # Tenancy Directory
//!
//! This crate provides the tenancy-scoped user and organization directory:
//! the business rules that sit between a verified request principal and
//! storage.
//!
//! ## Overview
//!
//! The tenancy-directory crate handles:
//! - **Directory**: Registration, login, and user/organization management
//! - **Storage**: The persistence port and an in-memory implementation
//! - **Errors**: One taxonomy for every failure a caller can see
//! - **Configuration**: Environment-driven settings and logging bootstrap
//!
//! ## Request flow
//!
//! ```text
//! Authorization header
//!   -> Authenticator (tenancy-auth)  -> Principal
//!   -> Directory operation
//!        -> storage lookup of the target
//!        -> AccessControl (tenancy-rbac) on the fresh record
//!        -> storage write, bounded by the storage timeout
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenancy_directory::{Directory, DirectoryConfig, MemoryStorage};
//! use tenancy_org::{NewOrganization, NewUser};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DirectoryConfig::from_env()?;
//! tenancy_directory::telemetry::init_logging(&config.log)?;
//!
//! let directory = Directory::new(Arc::new(MemoryStorage::new()), &config)?;
//! let created = directory
//!     .create_organization(
//!         NewOrganization::new("acme", "Acme Inc"),
//!         NewUser::new("Ann", "ann@acme.com", "secret1"),
//!     )
//!     .await?;
//!
//! let session = directory
//!     .authenticate("ann@acme.com", "secret1", created.organization.id)
//!     .await?;
//! let principal = directory
//!     .authenticator()
//!     .authenticate(Some(&format!("Bearer {}", session.token.token)))?;
//! let me = directory.get_profile(&principal).await?;
//! assert_eq!(me.email, "ann@acme.com");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod memory;
pub mod storage;
pub mod telemetry;

// Re-export main types for convenience
pub use config::{ConfigError, DirectoryConfig, LogConfig, LogFormat};
pub use directory::{CreatedOrganization, Directory, Session};
pub use error::{DirectoryError, DirectoryResult, ErrorKind};
pub use memory::MemoryStorage;
pub use storage::{Storage, StorageError, StorageResult, Write, WriteBatch};
