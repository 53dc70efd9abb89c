//! Password-reset flow: one-time passcodes and the reset itself.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidateEmail;

use super::mail;
use super::token_service::{Purpose, TokenService};
use crate::config::{
    OTP_MAX_REQUESTS_PER_WINDOW, OTP_RATE_WINDOW_MINUTES, PASSWORD_RESET_TTL_MINUTES,
};
use crate::domain::{FreshOtp, Password, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::{OtpRepository, UserRepository};
use crate::infra::Mailer;

/// Response to a successful code verification: carries the short-lived
/// reset token the client presents when setting the new password.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub reset_token: String,
}

pub struct OtpService {
    users: Arc<dyn UserRepository>,
    otps: Arc<dyn OtpRepository>,
    mailer: Arc<dyn Mailer>,
    tokens: Arc<TokenService>,
}

impl OtpService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        otps: Arc<dyn OtpRepository>,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            otps,
            mailer,
            tokens,
        }
    }

    /// Issue a fresh passcode and mail it out.
    ///
    /// At most three codes per user within a trailing 30-minute window; the
    /// fourth request is refused and the earlier codes are left untouched.
    /// Issuing a new code retires any still-live predecessor, so only the
    /// latest code can ever be redeemed.
    pub async fn request_otp(&self, email: &str) -> AppResult<()> {
        let email = email.trim().to_lowercase();
        if !email.validate_email() {
            return Err(AppError::validation("A valid email address is required"));
        }

        let user = self.lookup_user(&email).await?;

        let now = Utc::now();
        let window_start = now - Duration::minutes(OTP_RATE_WINDOW_MINUTES);
        let issued = self.otps.count_since(user.id, window_start).await?;
        if issued >= OTP_MAX_REQUESTS_PER_WINDOW {
            return Err(AppError::rate_limited(
                "Too many reset codes requested. Please try again later.",
            ));
        }

        let fresh = FreshOtp::generate(now)?;
        self.otps.invalidate_live(user.id, now).await?;
        self.otps
            .insert(user.id, email.clone(), fresh.code_hash, fresh.expires_at)
            .await?;

        let (subject, body) = mail::otp_email(&user.full_name, &fresh.code);
        self.mailer.send(&email, subject, body).await
    }

    /// Redeem a passcode for a short-lived password-reset token.
    pub async fn verify_otp(&self, email: &str, code: &str) -> AppResult<VerifyOtpResponse> {
        let email = email.trim().to_lowercase();
        if !email.validate_email() {
            return Err(AppError::validation("A valid email address is required"));
        }
        let code = code.trim();
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::validation("The code must be 6 digits"));
        }

        let user = self.lookup_user(&email).await?;

        let otp = self
            .otps
            .latest_unused(user.id, &email)
            .await?
            .ok_or_else(|| AppError::validation("No active code. Please request a new one."))?;

        let now = Utc::now();
        if otp.is_expired(now) {
            self.otps.mark_used(otp.id).await?;
            return Err(AppError::validation(
                "The code has expired. Please request a new one.",
            ));
        }
        // Spent attempt budget locks the code even if the right digits come in now.
        if otp.is_locked() {
            self.otps.mark_used(otp.id).await?;
            return Err(AppError::validation(
                "Too many wrong attempts. Please request a new code.",
            ));
        }
        if !otp.matches(code) {
            self.otps.increment_attempts(otp.id).await?;
            return Err(AppError::InvalidCredentials);
        }

        self.otps.mark_used(otp.id).await?;

        let reset_token = self
            .tokens
            .issue(
                user.id,
                None,
                Purpose::PasswordReset,
                Duration::minutes(PASSWORD_RESET_TTL_MINUTES),
            )
            .map_err(|e| AppError::internal(format!("Failed to sign token: {}", e)))?;

        Ok(VerifyOtpResponse {
            message: "Code verified. You can now set a new password.".to_string(),
            reset_token,
        })
    }

    /// Set a new password using a reset token from [`verify_otp`](Self::verify_otp).
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!("password reset token rejected: {}", e);
            AppError::Unauthenticated
        })?;
        if claims.purpose != Purpose::PasswordReset {
            return Err(AppError::forbidden("This token cannot reset a password"));
        }

        let user = self
            .users
            .find_by_id(claims.subject)
            .await?
            .ok_or_not_found("User")?;

        let new_hash = Password::new(new_password)?.into_string();
        self.users.set_password_hash(user.id, new_hash).await
    }

    async fn lookup_user(&self, email: &str) -> AppResult<User> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_not_found("Account")
    }
}
