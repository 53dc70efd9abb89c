//! Authentication handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Json, Redirect},
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration as CookieDuration;
use utoipa::ToSchema;

use crate::api::middleware::{auth_middleware, require_admin_only, CurrentUser};
use crate::api::AppState;
use crate::config::{LOGIN_TOKEN_TTL_HOURS, TOKEN_COOKIE_NAME};
use crate::domain::UserResponse;
use crate::errors::AppResult;
use crate::services::{
    LoginResponse, RegisterPayload, RegisterResponse, VerifyOtpResponse,
};
use crate::types::MessageResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

/// Token introspection response, admin tooling only.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct CheckTokenResponse {
    pub valid: bool,
    pub user: UserResponse,
}

pub fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/change-password", post(change_password))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_only = Router::new()
        .route("/check-token", get(check_token))
        .route_layer(axum::middleware::from_fn(require_admin_only))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            auth_middleware,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin/login", post(admin_login))
        .route("/verify-email", get(verify_email))
        .route("/request-otp", post(request_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/reset-password", post(reset_password))
        .merge(protected)
        .merge(admin_only)
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error or duplicate email/phone"),
        (status = 500, description = "Verification mail could not be sent")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let response = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Unknown email or wrong password"),
        (status = 403, description = "Account locked or email unverified")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(response))
}

/// Login to the admin dashboard; sets the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/admin/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Unknown email or wrong password"),
        (status = 403, description = "Not a staff or admin account")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let response = state
        .auth_service
        .admin_login(&payload.email, &payload.password)
        .await?;

    let cookie = Cookie::build((TOKEN_COOKIE_NAME, response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(LOGIN_TOKEN_TTL_HOURS))
        .build();

    Ok((jar.add(cookie), Json(response)))
}

/// Follow an email verification link. Always redirects to the frontend
/// verification page with `status` and `message` query parameters.
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Redirect {
    let outcome = match state.auth_service.verify_email(query.token.as_deref()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("email verification failed: {}", e);
            crate::services::VerifyEmailOutcome {
                status: "error",
                message: "Verification failed. Please try again later.",
            }
        }
    };

    let query = serde_urlencoded::to_string([
        ("status", outcome.status),
        ("message", outcome.message),
    ])
    .unwrap_or_default();

    Redirect::to(&format!(
        "{}/verify-email?{}",
        state.config.frontend_url, query
    ))
}

/// Request a password-reset passcode by email
#[utoipa::path(
    post,
    path = "/api/auth/request-otp",
    tag = "Authentication",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "Code sent"),
        (status = 404, description = "No account with this email"),
        (status = 429, description = "Too many codes requested")
    )
)]
pub async fn request_otp(
    State(state): State<AppState>,
    Json(payload): Json<RequestOtpRequest>,
) -> AppResult<MessageResponse> {
    state.otp_service.request_otp(&payload.email).await?;
    Ok(MessageResponse::new(
        "A reset code has been sent to your email",
    ))
}

/// Redeem a passcode for a password-reset token
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    tag = "Authentication",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted", body = VerifyOtpResponse),
        (status = 400, description = "No active code, expired, or locked"),
        (status = 401, description = "Wrong code")
    )
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<Json<VerifyOtpResponse>> {
    let response = state
        .otp_service
        .verify_otp(&payload.email, &payload.otp)
        .await?;
    Ok(Json(response))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Token has the wrong purpose")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<MessageResponse> {
    state
        .otp_service
        .reset_password(&payload.token, &payload.new_password)
        .await?;
    Ok(MessageResponse::new("Password has been reset"))
}

/// Change the password of the authenticated user
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 401, description = "Wrong current password")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<MessageResponse> {
    state
        .auth_service
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(MessageResponse::new("Password has been changed"))
}

/// Invalidate the stored session token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Logged out"))
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, MessageResponse)> {
    state.auth_service.logout(user.id).await?;
    Ok((
        jar.remove(Cookie::from(TOKEN_COOKIE_NAME)),
        MessageResponse::new("Logged out"),
    ))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<UserResponse>> {
    let profile = state.auth_service.profile(user.id).await?;
    Ok(Json(profile))
}

/// Token introspection for the admin dashboard
#[utoipa::path(
    get,
    path = "/api/auth/check-token",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token is valid", body = CheckTokenResponse),
        (status = 403, description = "Not an admin account")
    )
)]
pub async fn check_token(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<CheckTokenResponse>> {
    let profile = state.auth_service.profile(user.id).await?;
    Ok(Json(CheckTokenResponse {
        valid: true,
        user: profile,
    }))
}
