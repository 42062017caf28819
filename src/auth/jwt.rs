//! JWT token handling

use crate::auth::models::Role;
use crate::error::{Error, Result};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Account role
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Check if the claims are expired at the given instant
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signature verification failed")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Issues and verifies HS256 bearer tokens. Read-only after construction.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenCodec {
    /// Create a codec from the server secret and token lifetime
    pub fn new(secret: &str, ttl: chrono::Duration) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("auth.secret must not be empty".to_string()));
        }
        if ttl <= chrono::Duration::zero() {
            return Err(Error::Config("auth.token_ttl_minutes must be positive".to_string()));
        }

        // Expiry is checked by verify_at against an explicit clock, without leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Issue a token for `subject` valid from now for the configured TTL
    pub fn issue(&self, subject: &str, role: Role) -> std::result::Result<String, TokenError> {
        self.issue_at(subject, role, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        now: i64,
    ) -> std::result::Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify signature, then expiry against `now`
    pub fn verify_at(&self, token: &str, now: i64) -> std::result::Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", chrono::Duration::minutes(30)).unwrap()
    }

    #[test]
    fn test_create_and_validate_token() {
        let codec = codec();
        let token = codec.issue("alice", Role::Admin).expect("Failed to create token");
        let claims = codec.verify(&token).expect("Failed to validate token");

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_invalid_token() {
        let result = codec().verify("invalid.token.here");
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_issue_is_deterministic_for_same_instant() {
        let codec = codec();
        let a = codec.issue_at("bob", Role::User, 1_700_000_000).unwrap();
        let b = codec.issue_at("bob", Role::User, 1_700_000_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec();
        let now = 1_700_000_000;
        let token = codec.issue_at("bob", Role::User, now).unwrap();
        let exp = now + 30 * 60;

        assert!(codec.verify_at(&token, exp - 1).is_ok());
        assert_eq!(codec.verify_at(&token, exp), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let token = codec().issue("alice", Role::User).unwrap();
        let other = TokenCodec::new("other-secret", chrono::Duration::minutes(30)).unwrap();
        assert_eq!(other.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenCodec::new("", chrono::Duration::minutes(30)).is_err());
    }
}
