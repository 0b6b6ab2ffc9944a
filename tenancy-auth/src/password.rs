//! Password hashing and verification
//!
//! Argon2id with a fresh random salt per hash. The cost parameters are
//! tunable; hashing is deliberately slow, so callers on an async runtime
//! should run it on a blocking thread.

use crate::error::{AuthError, AuthResult};
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Salt length in bytes.
const SALT_LENGTH: usize = 16;

/// Configuration for password hashing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 2)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP recommended minimum for Argon2id
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// Create a new password config with custom settings.
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Cheap settings for tests. Never use in production.
    pub fn fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Hashes and verifies passwords using Argon2id.
#[derive(Clone)]
pub struct PasswordHasher {
    config: PasswordConfig,
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("config", &self.config)
            .finish()
    }
}

impl PasswordHasher {
    /// Create a hasher with the given cost parameters.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if Argon2 rejects the parameters.
    pub fn new(config: PasswordConfig) -> AuthResult<Self> {
        let params = Params::new(config.memory_cost, config.time_cost, config.parallelism, None)
            .map_err(|e| AuthError::ConfigError(format!("Invalid Argon2 params: {}", e)))?;

        Ok(Self {
            config,
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password.
    ///
    /// Returns the PHC-formatted digest (algorithm, params, salt and hash).
    ///
    /// # Errors
    ///
    /// - `EmptyInput` if the password is empty
    /// - `Internal` if the RNG or Argon2 fails
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        if password.is_empty() {
            return Err(AuthError::EmptyInput);
        }

        let mut salt = [0u8; SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| AuthError::Internal(format!("Salt generation failed: {}", e)))?;
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| AuthError::Internal(format!("Salt encoding failed: {}", e)))?;

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored digest.
    ///
    /// Comparison is delegated to Argon2, which is constant-time. A digest
    /// that cannot be parsed never matches.
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password digest is malformed");
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Get the configuration.
    pub fn config(&self) -> &PasswordConfig {
        &self.config
    }
}
