//! Welcome coupon and notification domain types.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::{WELCOME_COUPON_MIN_ORDER, WELCOME_COUPON_PERCENT, WELCOME_COUPON_VALID_DAYS};

/// Discount coupon
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub percent: i32,
    pub description: Option<String>,
    pub min_order: i64,
    pub start_time: DateTime<Utc>,
    pub exp_time: DateTime<Utc>,
    pub status: i16,
}

/// Coupon summary included in the registration response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CouponGrant {
    pub code: String,
    pub expires: DateTime<Utc>,
}

/// Parameters for the welcome coupon granted on registration.
pub struct WelcomeCoupon {
    pub code: String,
    pub title: String,
    pub percent: i32,
    pub description: String,
    pub min_order: i64,
    pub start_time: DateTime<Utc>,
    pub exp_time: DateTime<Utc>,
}

impl WelcomeCoupon {
    /// Build the welcome coupon for a freshly registered user.
    ///
    /// Code format follows the storefront convention:
    /// `WELCOME<percent>_<zero-padded user id>_<timestamp suffix>`.
    pub fn for_user(user_id: i64, now: DateTime<Utc>) -> Self {
        let ts = now.timestamp_millis().to_string();
        let suffix = &ts[ts.len().saturating_sub(6)..];
        let code = format!("WELCOME{:02}_{:03}_{}", WELCOME_COUPON_PERCENT, user_id, suffix);
        let exp_time = now + Duration::days(WELCOME_COUPON_VALID_DAYS);

        Self {
            code,
            title: "Welcome discount".to_string(),
            percent: WELCOME_COUPON_PERCENT,
            description: format!(
                "{}% off for new customers. Applies to orders from {}.",
                WELCOME_COUPON_PERCENT, WELCOME_COUPON_MIN_ORDER
            ),
            min_order: WELCOME_COUPON_MIN_ORDER,
            start_time: now,
            exp_time,
        }
    }
}

/// Notification shown in the user's inbox
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_coupon_code_embeds_user_id() {
        let now = Utc::now();
        let coupon = WelcomeCoupon::for_user(7, now);
        assert!(coupon.code.starts_with("WELCOME05_007_"));
        assert_eq!(coupon.percent, WELCOME_COUPON_PERCENT);
        assert_eq!(coupon.exp_time - now, Duration::days(WELCOME_COUPON_VALID_DAYS));
    }
}
