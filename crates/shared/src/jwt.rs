//! Admin access tokens.
//!
//! Tokens are HS256-signed JWTs carrying the actor id, the role at issue time,
//! and a `jti` that ties the token to a server-side session row.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Default leeway in seconds for clock skew tolerance.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// JWT claims for an admin session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (actor ID)
    pub sub: String,
    /// Role at the time the token was issued
    pub role: String,
    /// Issuer
    pub iss: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token ID, fingerprinted into the session table
    pub jti: String,
}

impl Claims {
    /// Parses the subject as an actor ID.
    pub fn actor_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Configuration for token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    pub access_token_expiry_secs: i64,
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtConfig {
    /// Creates a config from a shared secret.
    pub fn new(
        secret: &str,
        issuer: impl Into<String>,
        access_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::InvalidKey(format!(
                "Signing secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            access_token_expiry_secs,
            leeway_secs,
        })
    }

    /// Issues an access token for the given actor.
    pub fn generate_access_token(
        &self,
        actor_id: Uuid,
        role: &str,
    ) -> Result<IssuedToken, JwtError> {
        self.generate_token_at(actor_id, role, Utc::now())
    }

    fn generate_token_at(
        &self,
        actor_id: Uuid,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let jti = Uuid::new_v4().to_string();
        let expires_at = now + Duration::seconds(self.access_token_expiry_secs);

        let claims = Claims {
            sub: actor_id.to_string(),
            role: role.to_string(),
            iss: self.issuer.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Validates a token and returns its claims.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;
        validation.set_issuer(&[self.issuer.as_str()]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn config() -> JwtConfig {
        JwtConfig::new(SECRET, "backoffice", 900, 0).unwrap()
    }

    #[test]
    fn test_rejects_short_secret() {
        let result = JwtConfig::new("short", "backoffice", 900, 0);
        assert!(matches!(result, Err(JwtError::InvalidKey(_))));
    }

    #[test]
    fn test_issue_and_validate() {
        let config = config();
        let actor_id = Uuid::new_v4();
        let issued = config.generate_access_token(actor_id, "super_admin").unwrap();

        let claims = config.validate_access_token(&issued.token).unwrap();
        assert_eq!(claims.actor_id().unwrap(), actor_id);
        assert_eq!(claims.role, "super_admin");
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_expired_token() {
        let config = config();
        let issued = config
            .generate_token_at(Uuid::new_v4(), "admin", Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(
            config.validate_access_token(&issued.token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issued = config()
            .generate_access_token(Uuid::new_v4(), "admin")
            .unwrap();
        let other = JwtConfig::new("another-secret-that-is-long-enough-too", "backoffice", 900, 0)
            .unwrap();
        assert!(matches!(
            other.validate_access_token(&issued.token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_issuer_is_invalid() {
        let issued = config()
            .generate_access_token(Uuid::new_v4(), "admin")
            .unwrap();
        let other = JwtConfig::new(SECRET, "someone-else", 900, 0).unwrap();
        assert!(matches!(
            other.validate_access_token(&issued.token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(config().validate_access_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(SECRET));
    }
}
