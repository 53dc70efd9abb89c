//! Token service - issues and verifies signed, purpose-tagged bearer tokens.
//!
//! The signing secret is injected once at construction from [`Config`] and is
//! immutable for the life of the process.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::domain::UserRole;

/// What a token is allowed to be used for.
///
/// Consumers must check the decoded purpose before acting; a password-reset
/// token must never pass as a login token, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Login,
    EmailVerification,
    PasswordReset,
}

/// Token verification failures.
///
/// The distinction between variants is for internal logging only; responses
/// to clients collapse all of these into a generic 401.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

/// Decoded, normalized claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Canonical subject id
    pub subject: i64,
    /// Role, present on login-purpose tokens only
    pub role: Option<UserRole>,
    pub purpose: Purpose,
    /// Absolute expiry, unix seconds
    pub expires_at: i64,
}

/// Claims as emitted into new tokens. Only ever carries the canonical `id`.
#[derive(Debug, Serialize)]
struct EmittedClaims<'a> {
    id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    purpose: Purpose,
    exp: i64,
    iat: i64,
}

/// Claims as accepted on the wire.
///
/// Compatibility shim: older tokens carried the subject under `user_id` and
/// omitted `purpose` on login tokens. Normalization happens here, in one
/// place, so the rest of the codebase only ever sees [`Claims`].
#[derive(Debug, Deserialize)]
struct RawClaims {
    id: Option<i64>,
    user_id: Option<i64>,
    role: Option<String>,
    purpose: Option<Purpose>,
    exp: i64,
}

impl RawClaims {
    fn normalize(self) -> Result<Claims, TokenError> {
        let subject = self.id.or(self.user_id).ok_or(TokenError::Malformed)?;
        Ok(Claims {
            subject,
            role: self.role.as_deref().map(UserRole::parse),
            purpose: self.purpose.unwrap_or(Purpose::Login),
            expires_at: self.exp,
        })
    }
}

/// Issues and verifies signed tokens. Pure: no storage side effects.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret_bytes()),
        }
    }

    /// Issue a signed token for `subject_id`.
    ///
    /// The role is embedded for login-purpose tokens only.
    pub fn issue(
        &self,
        subject_id: i64,
        role: Option<UserRole>,
        purpose: Purpose,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let role_str = match purpose {
            Purpose::Login => role.map(|r| r.as_str()),
            _ => None,
        };
        let claims = EmittedClaims {
            id: subject_id,
            role: role_str,
            purpose,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Malformed)
    }

    /// Verify a token's signature and expiry and normalize its claims.
    ///
    /// The token must be non-empty; callers check presence first.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // No clock leeway: a token past its exp is expired, full stop.
        validation.leeway = 0;

        let data = decode::<RawClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        data.claims.normalize()
    }
}
