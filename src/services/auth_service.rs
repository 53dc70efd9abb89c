//! Authentication service: login, registration, email verification and
//! account maintenance.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidateEmail;

use super::mail;
use super::token_service::{Purpose, TokenService};
use crate::config::{
    EMAIL_VERIFICATION_TTL_HOURS, LOGIN_TOKEN_TTL_HOURS, MIN_PASSWORD_LENGTH,
};
use crate::domain::{CouponGrant, Password, User, UserResponse, UserRole, WelcomeCoupon};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::{
    CouponRepository, NewUser, NotificationRepository, UserRepository,
};
use crate::infra::Mailer;

/// Public projection of a user included in login responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role.to_string(),
            phone: user.phone,
            address: user.address,
        }
    }
}

/// Successful login response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: SessionUser,
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterPayload {
    #[schema(example = "user@example.com")]
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Successful registration response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<CouponGrant>,
}

/// Outcome of following a verification link, rendered as a frontend redirect.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifyEmailOutcome {
    pub status: &'static str,
    pub message: &'static str,
}

impl VerifyEmailOutcome {
    fn error(message: &'static str) -> Self {
        Self {
            status: "error",
            message,
        }
    }
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    coupons: Arc<dyn CouponRepository>,
    notifications: Arc<dyn NotificationRepository>,
    mailer: Arc<dyn Mailer>,
    tokens: Arc<TokenService>,
    backend_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        coupons: Arc<dyn CouponRepository>,
        notifications: Arc<dyn NotificationRepository>,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<TokenService>,
        backend_url: String,
    ) -> Self {
        Self {
            users,
            coupons,
            notifications,
            mailer,
            tokens,
            backend_url,
        }
    }

    /// Authenticate by email and password.
    ///
    /// Failure ordering is part of the contract: input validation, then
    /// unknown email (generic 401), then locked account (403, before any
    /// password comparison), then unverified email (403), then wrong
    /// password (generic 401).
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self.verify_credentials(email, password).await?;
        self.open_session(user).await
    }

    /// Authenticate for the admin dashboard. Same checks as [`login`](Self::login)
    /// plus a role gate; plain customers are rejected before the session opens.
    pub async fn admin_login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self.verify_credentials(email, password).await?;
        if !user.role.is_staff_or_admin() {
            return Err(AppError::forbidden(
                "You do not have permission to access the dashboard",
            ));
        }
        self.open_session(user).await
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(AppError::validation("A valid email address is required"));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Locked accounts are refused before the password is even looked at.
        if user.is_disabled() {
            return Err(AppError::forbidden(
                "This account has been locked. Please contact support.",
            ));
        }
        if !user.email_active {
            return Err(AppError::forbidden(
                "Please verify your email address before logging in",
            ));
        }

        let hash = user
            .password_hash
            .clone()
            .ok_or(AppError::InvalidCredentials)?;
        if !Password::from_hash(hash).verify(password) {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Issue a login token and persist it as the user's single session token.
    async fn open_session(&self, user: User) -> AppResult<LoginResponse> {
        let token = self
            .tokens
            .issue(
                user.id,
                Some(user.role),
                Purpose::Login,
                Duration::hours(LOGIN_TOKEN_TTL_HOURS),
            )
            .map_err(|e| AppError::internal(format!("Failed to sign token: {}", e)))?;

        self.users
            .set_session_token(user.id, Some(token.clone()))
            .await?;

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user: SessionUser::from(user),
        })
    }

    /// Register a new account.
    ///
    /// Validation failures come back as a per-field error map. On success the
    /// pending verification token is stored on the user and mailed out; if
    /// the mail cannot be delivered the pending token is cleared again so a
    /// later registration attempt starts clean. The welcome coupon and
    /// notification are best-effort.
    pub async fn register(&self, payload: RegisterPayload) -> AppResult<RegisterResponse> {
        let email = normalize_email(&payload.email);
        let mut errors: BTreeMap<&'static str, String> = BTreeMap::new();

        if !email.validate_email() {
            errors.insert("email", "A valid email address is required".to_string());
        }
        if payload.password.len() < MIN_PASSWORD_LENGTH {
            errors.insert(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        }
        if payload.full_name.trim().is_empty() {
            errors.insert("full_name", "Full name is required".to_string());
        }
        let phone = payload.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
        if let Some(p) = phone {
            if !is_valid_phone(p) {
                errors.insert("phone", "Phone number is not valid".to_string());
            }
        }
        if !errors.is_empty() {
            return Err(AppError::FieldValidation(errors));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            errors.insert("email", "Email is already registered".to_string());
        }
        if let Some(p) = phone {
            if self.users.phone_in_use(p).await? {
                errors.insert("phone", "Phone number is already registered".to_string());
            }
        }
        if !errors.is_empty() {
            return Err(AppError::FieldValidation(errors));
        }

        let password_hash = Password::new(&payload.password)?.into_string();
        let user = self
            .users
            .create(NewUser {
                email,
                password_hash: Some(password_hash),
                full_name: payload.full_name.trim().to_string(),
                phone: phone.map(str::to_string),
                address: payload.address.clone().filter(|a| !a.trim().is_empty()),
                role: UserRole::User,
            })
            .await?;

        let verification_token = self
            .tokens
            .issue(
                user.id,
                None,
                Purpose::EmailVerification,
                Duration::hours(EMAIL_VERIFICATION_TTL_HOURS),
            )
            .map_err(|e| AppError::internal(format!("Failed to sign token: {}", e)))?;

        self.users
            .set_session_token(user.id, Some(verification_token.clone()))
            .await?;

        let link = format!(
            "{}/api/auth/verify-email?token={}",
            self.backend_url, verification_token
        );
        let (subject, body) = mail::verification_email(&user.full_name, &link);
        if let Err(e) = self.mailer.send(&user.email, subject, body).await {
            // Leave no dangling verification token behind a failed mail.
            if let Err(clear_err) = self.users.set_session_token(user.id, None).await {
                tracing::error!(user_id = user.id, "failed to clear pending token: {}", clear_err);
            }
            return Err(e);
        }

        let coupon = self.grant_welcome_coupon(&user).await;

        let login_token = self
            .tokens
            .issue(
                user.id,
                Some(user.role),
                Purpose::Login,
                Duration::hours(LOGIN_TOKEN_TTL_HOURS),
            )
            .map_err(|e| AppError::internal(format!("Failed to sign token: {}", e)))?;

        Ok(RegisterResponse {
            message: "Registration successful. Please check your email to verify your account."
                .to_string(),
            token: login_token,
            user: UserResponse::from(user),
            coupon,
        })
    }

    /// Welcome coupon plus inbox notification. Failures are logged, never
    /// surfaced; the account itself is already created.
    async fn grant_welcome_coupon(&self, user: &User) -> Option<CouponGrant> {
        let welcome = WelcomeCoupon::for_user(user.id, Utc::now());
        match self.coupons.grant(user.id, welcome).await {
            Ok(coupon) => {
                let (title, message) = mail::welcome_notification(&coupon.code);
                if let Err(e) = self.notifications.notify(user.id, title, message).await {
                    tracing::warn!(user_id = user.id, "welcome notification failed: {}", e);
                }
                Some(CouponGrant {
                    code: coupon.code,
                    expires: coupon.exp_time,
                })
            }
            Err(e) => {
                tracing::warn!(user_id = user.id, "welcome coupon grant failed: {}", e);
                None
            }
        }
    }

    /// Resolve a verification link to an outcome for the frontend redirect.
    ///
    /// Every failure is an outcome rather than an error; the handler turns
    /// outcomes into redirect query parameters.
    pub async fn verify_email(&self, token: Option<&str>) -> AppResult<VerifyEmailOutcome> {
        let token = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => return Ok(VerifyEmailOutcome::error("Missing verification token")),
        };

        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("email verification token rejected: {}", e);
                return Ok(VerifyEmailOutcome::error(
                    "Verification link is invalid or has expired",
                ));
            }
        };
        if claims.purpose != Purpose::EmailVerification {
            return Ok(VerifyEmailOutcome::error("Verification link is invalid"));
        }

        let user = match self.users.find_by_id(claims.subject).await? {
            Some(user) => user,
            None => return Ok(VerifyEmailOutcome::error("Account no longer exists")),
        };

        if user.email_active && user.session_token.is_none() {
            return Ok(VerifyEmailOutcome {
                status: "already_verified",
                message: "Email address is already verified",
            });
        }
        if user.session_token.as_deref() != Some(token) {
            return Ok(VerifyEmailOutcome::error(
                "Verification link has been superseded",
            ));
        }

        self.users.mark_verified(user.id).await?;

        Ok(VerifyEmailOutcome {
            status: "success",
            message: "Email verified successfully",
        })
    }

    /// Change the password of an authenticated user.
    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")?;

        let hash = user.password_hash.ok_or(AppError::InvalidCredentials)?;
        if !Password::from_hash(hash).verify(current_password) {
            return Err(AppError::InvalidCredentials);
        }

        let new_hash = Password::new(new_password)?.into_string();
        self.users.set_password_hash(user_id, new_hash).await
    }

    /// Invalidate the stored session token.
    pub async fn logout(&self, user_id: i64) -> AppResult<()> {
        self.users.set_session_token(user_id, None).await
    }

    /// Load the authenticated user's own profile.
    pub async fn profile(&self, user_id: i64) -> AppResult<UserResponse> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")?;
        Ok(UserResponse::from(user))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose phone check: optional leading `+`, then 9 to 14 digits.
fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (9..=14).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::infra::repositories::{
        MockCouponRepository, MockNotificationRepository, MockUserRepository,
    };
    use crate::infra::MockMailer;
    use mockall::predicate::eq;

    fn token_service() -> Arc<TokenService> {
        Arc::new(TokenService::new(&Config::for_tests(
            "test-secret-key-at-least-32-chars!",
        )))
    }

    fn service(users: MockUserRepository) -> AuthService {
        service_with(
            users,
            MockCouponRepository::new(),
            MockNotificationRepository::new(),
            MockMailer::new(),
        )
    }

    fn service_with(
        users: MockUserRepository,
        coupons: MockCouponRepository,
        notifications: MockNotificationRepository,
        mailer: MockMailer,
    ) -> AuthService {
        AuthService::new(
            Arc::new(users),
            Arc::new(coupons),
            Arc::new(notifications),
            Arc::new(mailer),
            token_service(),
            "http://localhost:3501".to_string(),
        )
    }

    fn test_user(id: i64, email: &str, password: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id,
            email: email.to_string(),
            password_hash: password.map(|p| Password::new(p).unwrap().into_string()),
            full_name: "Test User".to_string(),
            phone: None,
            address: None,
            role: UserRole::User,
            email_active: true,
            verified_at: Some(now),
            disabled_at: None,
            session_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn login_rejects_malformed_email_before_lookup() {
        // No expectations on the mock: the store must not be touched.
        let svc = service(MockUserRepository::new());
        let err = svc.login("not-an-email", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn login_unknown_email_is_generic_unauthorized() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .with(eq("ghost@example.com"))
            .returning(|_| Ok(None));

        let err = service(users)
            .login("ghost@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn disabled_account_is_refused_before_password_check() {
        let mut user = test_user(1, "locked@example.com", None);
        user.disabled_at = Some(Utc::now());

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        // A user with no stored hash would fail the password check with 401;
        // getting 403 proves the disabled check ran first.
        let err = service(users)
            .login("locked@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unverified_email_is_forbidden() {
        let mut user = test_user(1, "new@example.com", Some("secret1"));
        user.email_active = false;
        user.verified_at = None;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let err = service(users)
            .login("new@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn wrong_password_is_generic_unauthorized() {
        let user = test_user(1, "someone@example.com", Some("right-password"));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let err = service(users)
            .login("someone@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn successful_login_persists_session_token() {
        let user = test_user(7, "ok@example.com", Some("secret1"));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_set_session_token()
            .withf(|id, token| *id == 7 && token.is_some())
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = service(users);
        let response = svc.login("OK@example.com ", "secret1").await.unwrap();
        assert_eq!(response.user.id, 7);
        assert!(response.user.phone.is_none());

        let claims = token_service().verify(&response.token).unwrap();
        assert_eq!(claims.subject, 7);
        assert_eq!(claims.purpose, Purpose::Login);
        assert_eq!(claims.role, Some(UserRole::User));
    }

    #[tokio::test]
    async fn admin_login_rejects_plain_customers() {
        let user = test_user(2, "user@example.com", Some("secret1"));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let err = service(users)
            .admin_login("user@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_login_accepts_staff() {
        let mut user = test_user(3, "staff@example.com", Some("secret1"));
        user.role = UserRole::Staff;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_set_session_token()
            .returning(|_, _| Ok(()));

        let response = service(users)
            .admin_login("staff@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(response.user.role, "staff");
    }

    fn register_payload(email: &str) -> RegisterPayload {
        RegisterPayload {
            email: email.to_string(),
            password: "secret1".to_string(),
            full_name: "New Customer".to_string(),
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn register_reports_field_errors() {
        let svc = service(MockUserRepository::new());
        let err = svc
            .register(RegisterPayload {
                email: "bad".to_string(),
                password: "123".to_string(),
                full_name: "  ".to_string(),
                phone: Some("abc".to_string()),
                address: None,
            })
            .await
            .unwrap_err();

        match err {
            AppError::FieldValidation(errors) => {
                assert!(errors.contains_key("email"));
                assert!(errors.contains_key("password"));
                assert!(errors.contains_key("full_name"));
                assert!(errors.contains_key("phone"));
            }
            other => panic!("expected field validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_as_field_error() {
        let existing = test_user(1, "taken@example.com", Some("secret1"));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));

        let err = service(users)
            .register(register_payload("taken@example.com"))
            .await
            .unwrap_err();
        match err {
            AppError::FieldValidation(errors) => assert!(errors.contains_key("email")),
            other => panic!("expected field validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn register_mail_failure_clears_pending_token() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create().returning(|new_user| {
            let mut user = test_user(9, &new_user.email, None);
            user.password_hash = new_user.password_hash;
            user.email_active = false;
            user.verified_at = None;
            Ok(user)
        });
        let mut seq = mockall::Sequence::new();
        users
            .expect_set_session_token()
            .withf(|id, token| *id == 9 && token.is_some())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        users
            .expect_set_session_token()
            .withf(|id, token| *id == 9 && token.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_, _, _| Err(AppError::Mail("smtp down".to_string())));

        let svc = service_with(
            users,
            MockCouponRepository::new(),
            MockNotificationRepository::new(),
            mailer,
        );
        let err = svc
            .register(register_payload("fresh@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Mail(_)));
    }

    #[tokio::test]
    async fn register_grants_coupon_and_notification() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create().returning(|new_user| {
            let mut user = test_user(11, &new_user.email, None);
            user.email_active = false;
            user.verified_at = None;
            Ok(user)
        });
        users
            .expect_set_session_token()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut mailer = MockMailer::new();
        mailer.expect_send().times(1).returning(|_, _, _| Ok(()));

        let mut coupons = MockCouponRepository::new();
        coupons.expect_grant().times(1).returning(|user_id, welcome| {
            assert_eq!(user_id, 11);
            Ok(crate::domain::Coupon {
                id: 1,
                code: welcome.code,
                title: welcome.title,
                percent: welcome.percent,
                description: Some(welcome.description),
                min_order: welcome.min_order,
                start_time: welcome.start_time,
                exp_time: welcome.exp_time,
                status: 1,
            })
        });

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_notify()
            .times(1)
            .returning(|_, title, message| {
                Ok(crate::domain::Notification {
                    id: 1,
                    title,
                    message,
                    created_by: "system".to_string(),
                    created_at: Utc::now(),
                })
            });

        let svc = service_with(users, coupons, notifications, mailer);
        let response = svc
            .register(register_payload("fresh@example.com"))
            .await
            .unwrap();
        assert_eq!(response.user.id, 11);
        let coupon = response.coupon.expect("coupon granted");
        assert!(coupon.code.starts_with("WELCOME05_011_"));
    }

    #[tokio::test]
    async fn verify_email_happy_path_marks_verified() {
        let tokens = token_service();
        let token = tokens
            .issue(5, None, Purpose::EmailVerification, Duration::hours(24))
            .unwrap();

        let stored = token.clone();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().with(eq(5)).returning(move |_| {
            let mut user = test_user(5, "v@example.com", None);
            user.email_active = false;
            user.verified_at = None;
            user.session_token = Some(stored.clone());
            Ok(Some(user))
        });
        users
            .expect_mark_verified()
            .with(eq(5))
            .times(1)
            .returning(|_| Ok(()));

        let outcome = service(users).verify_email(Some(&token)).await.unwrap();
        assert_eq!(outcome.status, "success");
    }

    #[tokio::test]
    async fn verify_email_rejects_login_purpose_tokens() {
        let tokens = token_service();
        let token = tokens
            .issue(5, Some(UserRole::User), Purpose::Login, Duration::hours(1))
            .unwrap();

        // Wrong purpose never reaches the store.
        let outcome = service(MockUserRepository::new())
            .verify_email(Some(&token))
            .await
            .unwrap();
        assert_eq!(outcome.status, "error");
    }

    #[tokio::test]
    async fn verify_email_reports_already_verified() {
        let tokens = token_service();
        let token = tokens
            .issue(5, None, Purpose::EmailVerification, Duration::hours(24))
            .unwrap();

        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| {
            // Verified earlier; token already cleared.
            Ok(Some(test_user(5, "v@example.com", None)))
        });

        let outcome = service(users).verify_email(Some(&token)).await.unwrap();
        assert_eq!(outcome.status, "already_verified");
    }

    #[tokio::test]
    async fn verify_email_missing_token_is_an_error_outcome() {
        let outcome = service(MockUserRepository::new())
            .verify_email(None)
            .await
            .unwrap();
        assert_eq!(outcome.status, "error");
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let user = test_user(4, "p@example.com", Some("old-secret"));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let err = service(users)
            .change_password(4, "not-the-old-one", "new-secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn logout_clears_session_token() {
        let mut users = MockUserRepository::new();
        users
            .expect_set_session_token()
            .withf(|id, token| *id == 8 && token.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        service(users).logout(8).await.unwrap();
    }
}
