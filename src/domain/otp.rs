//! One-time passcode domain entity.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::{OTP_MAX_ATTEMPTS, OTP_TTL_MINUTES};
use crate::domain::Password;
use crate::errors::AppResult;

/// A password-reset passcode as stored in the database.
///
/// Only the argon2 hash of the code is persisted. A code becomes unusable
/// once consumed, once expired, or once the attempt budget is spent.
#[derive(Debug, Clone)]
pub struct Otp {
    pub id: i64,
    pub user_id: i64,
    pub code_hash: String,
    pub attempts: i32,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Otp {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Too many wrong entries; the code can no longer be redeemed.
    pub fn is_locked(&self) -> bool {
        self.attempts >= OTP_MAX_ATTEMPTS
    }

    /// Check a submitted code against the stored hash.
    pub fn matches(&self, code: &str) -> bool {
        Password::from_hash(self.code_hash.clone()).verify(code)
    }
}

/// A freshly generated passcode, before persistence.
///
/// Carries both the plain code (for the email) and its hash (for storage).
/// The plain code is dropped once the mail has been handed off.
pub struct FreshOtp {
    pub code: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl FreshOtp {
    /// Generate a random six-digit code and hash it.
    pub fn generate(now: DateTime<Utc>) -> AppResult<Self> {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let code_hash = Password::new(&code)?.into_string();
        Ok(Self {
            code,
            code_hash,
            expires_at: now + chrono::Duration::minutes(OTP_TTL_MINUTES),
        })
    }
}
