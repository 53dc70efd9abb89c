//! SeaORM entity definitions
//!
//! Database-specific entities, separate from domain models.

pub mod attribute;
pub mod banner;
pub mod category;
pub mod color;
pub mod coupon;
pub mod notification;
pub mod otp;
pub mod product;
pub mod room;
pub mod room_product;
pub mod user;
pub mod user_coupon;
pub mod user_notification;
