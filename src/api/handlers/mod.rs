//! HTTP request handlers.

pub mod attribute_handler;
pub mod auth_handler;
pub mod banner_handler;
pub mod category_handler;
pub mod color_handler;
pub mod room_handler;

pub use attribute_handler::attribute_routes;
pub use auth_handler::auth_routes;
pub use banner_handler::banner_routes;
pub use category_handler::category_routes;
pub use color_handler::color_routes;
pub use room_handler::room_routes;
