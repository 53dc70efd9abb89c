//! One-time passcode repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::entities::otp::{self, ActiveModel, Entity as OtpEntity};
use crate::domain::Otp;
use crate::errors::{AppError, AppResult};

#[cfg(test)]
use mockall::automock;

/// OTP repository trait for dependency injection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Count codes issued to this user since the given instant
    async fn count_since(&self, user_id: i64, since: DateTime<Utc>) -> AppResult<u64>;

    /// Mark every live (unused, unexpired) code for this user as used
    async fn invalidate_live(&self, user_id: i64, now: DateTime<Utc>) -> AppResult<()>;

    /// Insert a fresh code row (attempts 0, unused)
    async fn insert(
        &self,
        user_id: i64,
        email: String,
        code_hash: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Otp>;

    /// Most recent unused code for the (user, email) pair
    async fn latest_unused(&self, user_id: i64, email: &str) -> AppResult<Option<Otp>>;

    /// Terminally close a code
    async fn mark_used(&self, id: i64) -> AppResult<()>;

    /// Record a wrong entry
    async fn increment_attempts(&self, id: i64) -> AppResult<()>;
}

/// Concrete implementation backed by sea-orm
pub struct OtpStore {
    db: DatabaseConnection,
}

impl OtpStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn active_model(&self, id: i64) -> AppResult<ActiveModel> {
        let model = OtpEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("OTP not found"))?;
        Ok(model.into())
    }
}

#[async_trait]
impl OtpRepository for OtpStore {
    async fn count_since(&self, user_id: i64, since: DateTime<Utc>) -> AppResult<u64> {
        let count = OtpEntity::find()
            .filter(otp::Column::UserId.eq(user_id))
            .filter(otp::Column::CreatedAt.gte(since))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn invalidate_live(&self, user_id: i64, now: DateTime<Utc>) -> AppResult<()> {
        let live = OtpEntity::find()
            .filter(otp::Column::UserId.eq(user_id))
            .filter(otp::Column::IsUsed.eq(false))
            .filter(otp::Column::ExpiresAt.gt(now))
            .all(&self.db)
            .await?;

        for model in live {
            let mut active: ActiveModel = model.into();
            active.is_used = Set(true);
            active.update(&self.db).await?;
        }
        Ok(())
    }

    async fn insert(
        &self,
        user_id: i64,
        email: String,
        code_hash: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Otp> {
        let active = ActiveModel {
            user_id: Set(user_id),
            otp_code: Set(code_hash),
            email: Set(email),
            is_used: Set(false),
            attempts: Set(0),
            created_at: Set(Utc::now()),
            expires_at: Set(expires_at),
            ..Default::default()
        };

        let model = active.insert(&self.db).await?;
        Ok(Otp::from(model))
    }

    async fn latest_unused(&self, user_id: i64, email: &str) -> AppResult<Option<Otp>> {
        let result = OtpEntity::find()
            .filter(otp::Column::UserId.eq(user_id))
            .filter(otp::Column::Email.eq(email))
            .filter(otp::Column::IsUsed.eq(false))
            .order_by_desc(otp::Column::CreatedAt)
            .one(&self.db)
            .await?;
        Ok(result.map(Otp::from))
    }

    async fn mark_used(&self, id: i64) -> AppResult<()> {
        let mut active = self.active_model(id).await?;
        active.is_used = Set(true);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn increment_attempts(&self, id: i64) -> AppResult<()> {
        let model = OtpEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("OTP not found"))?;
        let attempts = model.attempts;
        let mut active: ActiveModel = model.into();
        active.attempts = Set(attempts + 1);
        active.update(&self.db).await?;
        Ok(())
    }
}
