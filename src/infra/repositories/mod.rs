//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence; traits for
//! dependency injection, `*Store` types as the sea-orm-backed implementations.

pub(crate) mod entities;

mod attribute_repository;
mod banner_repository;
mod category_repository;
mod color_repository;
mod coupon_repository;
mod otp_repository;
mod room_repository;
mod user_repository;

pub use attribute_repository::{AttributeRepository, AttributeStore, NewAttribute};
pub use banner_repository::{BannerPatch, BannerRepository, BannerStore, NewBanner};
pub use category_repository::{CategoryPatch, CategoryRepository, CategoryStore, NewCategory};
pub use color_repository::{ColorRepository, ColorStore, ColorUpdate, NewColor};
pub use coupon_repository::{
    CouponRepository, CouponStore, NotificationRepository, NotificationStore,
};
pub use otp_repository::{OtpRepository, OtpStore};
pub use room_repository::{NewRoom, RoomPatch, RoomRepository, RoomStore};
pub use user_repository::{NewUser, UserRepository, UserStore};

#[cfg(test)]
pub use coupon_repository::{MockCouponRepository, MockNotificationRepository};
#[cfg(test)]
pub use otp_repository::MockOtpRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
