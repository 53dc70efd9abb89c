//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    attribute_handler, auth_handler, banner_handler, category_handler, color_handler,
    room_handler,
};
use crate::domain::{
    Attribute, Banner, BannerView, Category, CategoryWithCount, Color, ColorWithCount,
    CouponGrant, Room, RoomWithCount, UserResponse, UserRole,
};
use crate::services::{
    LoginResponse, RegisterPayload, RegisterResponse, SessionUser, VerifyOtpResponse,
};

/// OpenAPI documentation for the Furnitown API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Furnitown API",
        version = "0.1.0",
        description = "REST API backend for the Furnitown furniture storefront",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3501", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        auth_handler::admin_login,
        auth_handler::request_otp,
        auth_handler::verify_otp,
        auth_handler::reset_password,
        auth_handler::change_password,
        auth_handler::logout,
        auth_handler::profile,
        auth_handler::check_token,
        // Category endpoints
        category_handler::list_visible,
        category_handler::filter_list,
        category_handler::list_all,
        category_handler::get_by_slug,
        category_handler::products,
        category_handler::create,
        category_handler::update,
        category_handler::remove,
        // Room endpoints
        room_handler::list_visible,
        room_handler::list_all,
        room_handler::get_by_slug,
        room_handler::products,
        room_handler::create,
        room_handler::update,
        room_handler::remove,
        room_handler::add_product,
        room_handler::remove_product,
        // Banner endpoints
        banner_handler::list,
        banner_handler::by_page,
        banner_handler::by_pages,
        banner_handler::page_types,
        banner_handler::get_by_id,
        banner_handler::create,
        banner_handler::update,
        banner_handler::remove,
        banner_handler::toggle_status,
        // Color endpoints
        color_handler::filter_list,
        color_handler::list_with_counts,
        color_handler::get_by_slug,
        color_handler::create,
        color_handler::update,
        color_handler::toggle_status,
        color_handler::remove,
        // Attribute endpoints
        attribute_handler::list_by_category,
        attribute_handler::create,
    ),
    components(
        schemas(
            // Domain types
            UserRole,
            UserResponse,
            SessionUser,
            CouponGrant,
            Category,
            CategoryWithCount,
            Room,
            RoomWithCount,
            Banner,
            BannerView,
            Color,
            ColorWithCount,
            Attribute,
            // Auth types
            RegisterPayload,
            RegisterResponse,
            LoginResponse,
            VerifyOtpResponse,
            auth_handler::LoginRequest,
            auth_handler::RequestOtpRequest,
            auth_handler::VerifyOtpRequest,
            auth_handler::ResetPasswordRequest,
            auth_handler::ChangePasswordRequest,
            auth_handler::CheckTokenResponse,
            // Catalog request/response types
            category_handler::CreateCategoryRequest,
            category_handler::UpdateCategoryRequest,
            category_handler::CategoryMutationResponse,
            room_handler::CreateRoomRequest,
            room_handler::UpdateRoomRequest,
            room_handler::AddRoomProductRequest,
            room_handler::RoomMutationResponse,
            banner_handler::CreateBannerRequest,
            banner_handler::UpdateBannerRequest,
            banner_handler::BannerMutationResponse,
            color_handler::CreateColorRequest,
            color_handler::UpdateColorRequest,
            color_handler::ColorMutationResponse,
            attribute_handler::CreateAttributeRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and password recovery"),
        (name = "Categories", description = "Product category catalog"),
        (name = "Rooms", description = "Showroom groupings"),
        (name = "Banners", description = "Storefront banners"),
        (name = "Colors", description = "Product color swatches"),
        (name = "Attributes", description = "Category specification attributes")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Login token from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
