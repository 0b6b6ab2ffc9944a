//! JWT token generation and validation
//!
//! This module provides the token service: HS256-signed, expiring bearer
//! tokens carrying a user's identity, organization and role. Only HS256 is
//! ever accepted; the `alg` header of an incoming token is checked against
//! that and never used to pick a verification scheme.

use crate::claims::{IdentityClaims, Principal};
use crate::error::{AuthError, AuthResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tenancy_org::Role;
use uuid::Uuid;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// The only signing algorithm issued and accepted.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const SIGNING_ALGORITHM_NAME: &str = "HS256";

/// Token service configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Shared HMAC secret
    pub secret: String,

    /// Token lifetime in hours
    pub expiry_hours: u32,

    /// Token issuer
    pub issuer: String,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("expiry_hours", &self.expiry_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenConfig {
    /// Default token lifetime in hours.
    pub const DEFAULT_EXPIRY_HOURS: u32 = 24;

    /// Longest accepted token lifetime in hours.
    pub const MAX_EXPIRY_HOURS: u32 = 24 * 366;

    /// Create a configuration with the default lifetime and issuer.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours: Self::DEFAULT_EXPIRY_HOURS,
            issuer: IdentityClaims::DEFAULT_ISSUER.to_string(),
        }
    }

    /// Set the token lifetime.
    pub fn with_expiry_hours(mut self, hours: u32) -> Self {
        self.expiry_hours = hours;
        self
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Check the configuration before keys are derived from it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the secret is empty or the lifetime
    /// exceeds [`Self::MAX_EXPIRY_HOURS`].
    pub fn validate(&self) -> AuthResult<()> {
        if self.secret.is_empty() {
            return Err(AuthError::ConfigError("Secret required for HMAC".to_string()));
        }
        if self.expiry_hours > Self::MAX_EXPIRY_HOURS {
            return Err(AuthError::ConfigError(format!(
                "Token lifetime of {} hours exceeds the maximum of {}",
                self.expiry_hours,
                Self::MAX_EXPIRY_HOURS
            )));
        }
        Ok(())
    }

    /// Token lifetime as a duration.
    pub fn lifetime(&self) -> Duration {
        Duration::hours(i64::from(self.expiry_hours))
    }
}

/// A freshly minted token together with the claims it carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Encoded token
    pub token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Seconds until expiry
    pub expires_in: i64,

    /// Claims embedded in the token
    pub claims: IdentityClaims,
}

/// JWT service for token operations.
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl TokenService {
    /// Create a new token service with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the secret is empty or the lifetime
    /// is out of range.
    pub fn new(config: TokenConfig) -> AuthResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Create with a secret and the default lifetime.
    pub fn with_secret(secret: impl Into<String>) -> AuthResult<Self> {
        Self::new(TokenConfig::new(secret))
    }

    /// Issue a token for a user.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The user's unique identifier
    /// * `organization_id` - The organization the token is scoped to
    /// * `role` - The user's role in that organization
    ///
    /// # Returns
    ///
    /// Encoded JWT token string
    pub fn issue(&self, user_id: Uuid, organization_id: Uuid, role: Role) -> AuthResult<String> {
        self.mint(user_id, organization_id, role).map(|issued| issued.token)
    }

    /// Issue a token and return it with its claims.
    pub fn mint(&self, user_id: Uuid, organization_id: Uuid, role: Role) -> AuthResult<IssuedToken> {
        let claims = IdentityClaims::new(user_id, organization_id, role, self.config.lifetime())
            .inspect_err(|e| tracing::error!(error = %e, "Token expiry overflowed"))?
            .with_issuer(self.config.issuer.clone());
        let token = self.encode_claims(&claims)?;

        Ok(IssuedToken {
            token,
            token_type: "Bearer".to_string(),
            expires_in: claims.exp - claims.iat,
            claims,
        })
    }

    /// Encode existing claims.
    pub fn encode_claims(&self, claims: &IdentityClaims) -> AuthResult<String> {
        let header = Header::new(SIGNING_ALGORITHM);
        encode(&header, claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Token encoding failed");
            AuthError::Signing(e.to_string())
        })
    }

    /// Validate and decode a token.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` if the signature does not verify against the
    ///   configured secret or the token names any algorithm other than HS256
    /// - `ExpiredToken` if the current time is at or past `exp`
    /// - `MalformedToken` for anything structurally invalid
    pub fn validate(&self, token: &str) -> AuthResult<IdentityClaims> {
        check_algorithm(token)?;

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        let token_data = decode::<IdentityClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidKeyFormat => AuthError::InvalidSignature,
                ErrorKind::InvalidToken => AuthError::MalformedToken("Malformed token".to_string()),
                ErrorKind::InvalidIssuer => AuthError::MalformedToken("Invalid issuer".to_string()),
                _ => AuthError::MalformedToken(e.to_string()),
            })?;

        let claims = token_data.claims;
        if claims.is_expired() {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    /// Validate a token and produce the request principal.
    pub fn authenticate(&self, token: &str) -> AuthResult<Principal> {
        let claims = self.validate(token)?;
        Ok(Principal::from_verified(&claims))
    }

    /// Get the configuration.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }
}

/// Reject any token whose header does not name HS256.
///
/// Tokens naming an unknown algorithm (such as `none`) fail header parsing
/// inside `jsonwebtoken`, which would surface as a malformed token. Reading the
/// header here reports every foreign algorithm uniformly.
fn check_algorithm(token: &str) -> AuthResult<()> {
    #[derive(Deserialize)]
    struct RawHeader {
        alg: Option<String>,
    }

    let mut parts = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::MalformedToken("Malformed token".to_string()));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedToken("Invalid header encoding".to_string()))?;
    let header: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|_| AuthError::MalformedToken("Invalid header".to_string()))?;

    match header.alg.as_deref() {
        Some(SIGNING_ALGORITHM_NAME) => Ok(()),
        Some(other) => {
            tracing::warn!(alg = %other, "Rejected token with unexpected algorithm");
            Err(AuthError::InvalidSignature)
        }
        None => Err(AuthError::MalformedToken("Missing algorithm".to_string())),
    }
}
