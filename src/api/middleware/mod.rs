//! HTTP middleware.

mod auth;

pub use auth::{
    auth_middleware, optional_auth_middleware, page_auth_middleware, require_admin_only,
    require_staff, CurrentUser,
};
