//! Coupon and notification repositories (registration side effects).

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use super::entities::{coupon, notification, user_coupon, user_notification};
use crate::domain::{Coupon, Notification, WelcomeCoupon};
use crate::errors::AppResult;

#[cfg(test)]
use mockall::automock;

/// Coupon repository trait for dependency injection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Insert the coupon and grant it to the user
    async fn grant(&self, user_id: i64, welcome: WelcomeCoupon) -> AppResult<Coupon>;
}

/// Notification repository trait for dependency injection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a notification and link it to the user, unread
    async fn notify(&self, user_id: i64, title: String, message: String)
        -> AppResult<Notification>;
}

pub struct CouponStore {
    db: DatabaseConnection,
}

impl CouponStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CouponRepository for CouponStore {
    async fn grant(&self, user_id: i64, welcome: WelcomeCoupon) -> AppResult<Coupon> {
        let active = coupon::ActiveModel {
            code: Set(welcome.code),
            title: Set(welcome.title),
            percent: Set(welcome.percent),
            description: Set(Some(welcome.description)),
            min_order: Set(welcome.min_order),
            start_time: Set(welcome.start_time),
            exp_time: Set(welcome.exp_time),
            status: Set(1),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(&self.db).await?;

        let link = user_coupon::ActiveModel {
            user_id: Set(user_id),
            coupon_id: Set(model.id),
            status: Set(0),
        };
        link.insert(&self.db).await?;

        Ok(Coupon::from(model))
    }
}

pub struct NotificationStore {
    db: DatabaseConnection,
}

impl NotificationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for NotificationStore {
    async fn notify(
        &self,
        user_id: i64,
        title: String,
        message: String,
    ) -> AppResult<Notification> {
        let active = notification::ActiveModel {
            title: Set(title),
            message: Set(message),
            created_by: Set("system".to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(&self.db).await?;

        let link = user_notification::ActiveModel {
            user_id: Set(user_id),
            notification_id: Set(model.id),
            is_read: Set(false),
            read_at: Set(None),
        };
        link.insert(&self.db).await?;

        Ok(Notification::from(model))
    }
}
