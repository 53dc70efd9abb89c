//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{ROLE_ADMIN, ROLE_STAFF, ROLE_USER};

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Staff,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Check if this role may access the admin dashboard
    pub fn is_staff_or_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Staff)
    }

    /// Parse a role string, case-insensitively. Unknown values map to `User`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            ROLE_ADMIN => UserRole::Admin,
            ROLE_STAFF => UserRole::Staff,
            _ => UserRole::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::Staff => ROLE_STAFF,
            UserRole::User => ROLE_USER,
        }
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        UserRole::parse(s)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// None for accounts created without a password (e.g. federated signups)
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    /// False until the verification link has been followed
    pub email_active: bool,
    pub verified_at: Option<DateTime<Utc>>,
    /// Set when an administrator locks the account (None = active)
    pub disabled_at: Option<DateTime<Utc>>,
    /// The single currently-valid session token, if any
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_disabled(&self) -> bool {
        self.disabled_at.is_some()
    }
}

/// User response (safe to return to client — never carries the hash)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = 42)]
    pub id: i64,
    /// User email address
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User display name
    pub full_name: String,
    /// User role
    #[schema(example = "user")]
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub email_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role.to_string(),
            phone: user.phone,
            address: user.address,
            email_active: user.email_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(UserRole::parse("Admin"), UserRole::Admin);
        assert_eq!(UserRole::parse("STAFF"), UserRole::Staff);
        assert_eq!(UserRole::parse(" user "), UserRole::User);
        assert_eq!(UserRole::parse("something-else"), UserRole::User);
    }

    #[test]
    fn staff_and_admin_reach_dashboard() {
        assert!(UserRole::Admin.is_staff_or_admin());
        assert!(UserRole::Staff.is_staff_or_admin());
        assert!(!UserRole::User.is_staff_or_admin());
        assert!(!UserRole::Staff.is_admin());
    }
}
