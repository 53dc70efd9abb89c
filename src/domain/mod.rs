//! Domain layer - Core business entities and logic
//!
//! Business concepts independent of infrastructure concerns.

pub mod catalog;
pub mod coupon;
pub mod otp;
pub mod password;
pub mod user;

pub use catalog::{
    Attribute, Banner, BannerView, Category, CategoryWithCount, Color, ColorWithCount,
    ProductSummary, Room, RoomWithCount,
};
pub use coupon::{Coupon, CouponGrant, Notification, WelcomeCoupon};
pub use otp::{FreshOtp, Otp};
pub use password::Password;
pub use user::{User, UserResponse, UserRole};
