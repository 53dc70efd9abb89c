//! User repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{User, UserRole};
use crate::errors::{AppError, AppResult};

#[cfg(test)]
use mockall::automock;

/// Fields required to insert a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
}

/// User repository trait for dependency injection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Find user by email address (stored lowercase, exact match)
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Whether any user already holds this phone number
    async fn phone_in_use(&self, phone: &str) -> AppResult<bool>;

    /// Create a new user (email_active starts false)
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    /// Overwrite the single stored session token (None clears it)
    async fn set_session_token(&self, id: i64, token: Option<String>) -> AppResult<()>;

    /// Replace the stored password hash
    async fn set_password_hash(&self, id: i64, password_hash: String) -> AppResult<()>;

    /// Mark the email verified and clear the pending verification token
    async fn mark_verified(&self, id: i64) -> AppResult<()>;
}

/// Concrete implementation backed by sea-orm
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn active_model(&self, id: i64) -> AppResult<ActiveModel> {
        let model = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(model.into())
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn phone_in_use(&self, phone: &str) -> AppResult<bool> {
        let result = UserEntity::find()
            .filter(user::Column::Phone.eq(phone))
            .one(&self.db)
            .await?;
        Ok(result.is_some())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let active = ActiveModel {
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            full_name: Set(new_user.full_name),
            phone: Set(new_user.phone),
            address: Set(new_user.address),
            role: Set(new_user.role.to_string()),
            email_active: Set(false),
            verified_at: Set(None),
            disabled_at: Set(None),
            session_token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.db).await?;
        Ok(User::from(model))
    }

    async fn set_session_token(&self, id: i64, token: Option<String>) -> AppResult<()> {
        let mut active = self.active_model(id).await?;
        active.session_token = Set(token);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    async fn set_password_hash(&self, id: i64, password_hash: String) -> AppResult<()> {
        let mut active = self.active_model(id).await?;
        active.password_hash = Set(Some(password_hash));
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    async fn mark_verified(&self, id: i64) -> AppResult<()> {
        let now = Utc::now();
        let mut active = self.active_model(id).await?;
        active.email_active = Set(true);
        active.verified_at = Set(Some(now));
        active.session_token = Set(None);
        active.updated_at = Set(now);
        active.update(&self.db).await?;
        Ok(())
    }
}
