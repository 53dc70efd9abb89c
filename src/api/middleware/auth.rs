//! Token authentication and role authorization middleware.
//!
//! Authentication and failure presentation are decoupled: the same checks
//! back both the JSON API variant and the page variant, and the caller picks
//! which one to mount on a route group. Role gates run strictly after
//! authentication and fail closed when no user was attached.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::api::AppState;
use crate::config::{BEARER_TOKEN_PREFIX, TOKEN_COOKIE_NAME};
use crate::domain::UserRole;
use crate::errors::AppError;
use crate::services::Purpose;

/// Authenticated user attached to request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

/// Bearer header first, then the `token` cookie.
fn extract_token(request: &Request) -> Option<String> {
    if let Some(token) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
    {
        return Some(token.to_string());
    }

    CookieJar::from_headers(request.headers())
        .get(TOKEN_COOKIE_NAME)
        .map(|c| c.value().to_string())
}

/// Run the full authentication pipeline for an already-extracted token.
///
/// Takes the token by value rather than borrowing the request: the request
/// body is not `Sync`, and holding a reference to it across the store lookup
/// would make the middleware futures non-`Send`.
///
/// Token failures are logged with their concrete reason but collapse into a
/// single generic error so response bodies never reveal whether a signature
/// or an expiry was at fault.
async fn authenticate(state: &AppState, token: Option<String>) -> Result<CurrentUser, AppError> {
    let token = token.ok_or(AppError::Unauthenticated)?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        tracing::debug!("token rejected: {}", e);
        AppError::Unauthenticated
    })?;
    if claims.purpose != Purpose::Login {
        tracing::debug!("non-login token presented for authentication");
        return Err(AppError::Unauthenticated);
    }

    let user = state
        .users
        .find_by_id(claims.subject)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    // The stored role wins over whatever the token carries; tokens outlive
    // role changes by up to their TTL.
    Ok(CurrentUser {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}

/// Authentication for API routes: failures answer with structured JSON 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let current_user = authenticate(&state, extract_token(&request)).await?;
    request.extensions_mut().insert(current_user);
    Ok(next.run(request).await)
}

/// Authentication for server-rendered pages: failures redirect home.
pub async fn page_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, extract_token(&request)).await {
        Ok(current_user) => {
            request.extensions_mut().insert(current_user);
            next.run(request).await
        }
        Err(_) => Redirect::to("/").into_response(),
    }
}

/// Best-effort authentication: attaches the user when the token checks out,
/// proceeds anonymously on any failure.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Ok(current_user) = authenticate(&state, extract_token(&request)).await {
        request.extensions_mut().insert(current_user);
    }
    next.run(request).await
}

/// Allow staff and admin. Mount after an authentication middleware.
pub async fn require_staff(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::forbidden("Access denied"))?;
    if !user.role.is_staff_or_admin() {
        return Err(AppError::forbidden("Access denied"));
    }
    Ok(next.run(request).await)
}

/// Allow admin only. Mount after an authentication middleware.
pub async fn require_admin_only(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::forbidden("Access denied"))?;
    if !user.role.is_admin() {
        return Err(AppError::forbidden("Access denied"));
    }
    Ok(next.run(request).await)
}
