//! Room handlers.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::middleware::{auth_middleware, require_admin_only, require_staff};
use crate::api::AppState;
use crate::domain::{ProductSummary, Room, RoomWithCount};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::{NewRoom, RoomPatch};
use crate::types::{Created, MessageResponse, PaginationMeta, PaginationParams};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    /// Generated from the name when absent
    pub slug: Option<String>,
    pub status: Option<i16>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub priority: Option<i32>,
    pub status: Option<i16>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddRoomProductRequest {
    pub product_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomMutationResponse {
    pub message: String,
    pub room: Room,
}

#[derive(Debug, Serialize)]
pub struct RoomProductsResponse {
    pub products: Vec<ProductSummary>,
    pub pagination: PaginationMeta,
}

pub fn room_routes(state: AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/admin/all", get(list_all))
        .route("/", post(create))
        .route("/:slug", put(update))
        .route("/:slug/products", post(add_product))
        .route("/:slug/products/:product_id", delete(remove_product))
        .route_layer(axum::middleware::from_fn(require_staff))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Room deletion is destructive across the join table; admin only.
    let admin = Router::new()
        .route("/:slug", delete(remove))
        .route_layer(axum::middleware::from_fn(require_admin_only))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            auth_middleware,
        ));

    Router::new()
        .route("/", get(list_visible))
        .route("/filter", get(filter_list))
        .route("/by-product/:product_slug", get(by_product))
        .route("/:slug", get(get_by_slug))
        .route("/:slug/products", get(products))
        .merge(staff)
        .merge(admin)
}

/// Visible rooms with product counts
#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "Rooms",
    responses((status = 200, description = "Visible rooms", body = [RoomWithCount]))
)]
pub async fn list_visible(State(state): State<AppState>) -> AppResult<Json<Vec<RoomWithCount>>> {
    Ok(Json(state.rooms.list(true).await?))
}

/// Lightweight room listing for storefront filters
pub async fn filter_list(State(state): State<AppState>) -> AppResult<Json<Vec<Room>>> {
    Ok(Json(state.rooms.filter_list().await?))
}

/// All rooms including hidden ones, for the dashboard
#[utoipa::path(
    get,
    path = "/api/rooms/admin/all",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All rooms", body = [RoomWithCount]))
)]
pub async fn list_all(State(state): State<AppState>) -> AppResult<Json<Vec<RoomWithCount>>> {
    Ok(Json(state.rooms.list(false).await?))
}

/// Room by slug, with its product count
#[utoipa::path(
    get,
    path = "/api/rooms/{slug}",
    tag = "Rooms",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 200, description = "Room", body = RoomWithCount),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<RoomWithCount>> {
    let room = state
        .rooms
        .find_by_slug(&slug)
        .await?
        .ok_or_not_found("Room")?;
    Ok(Json(room))
}

/// Rooms containing a product
pub async fn by_product(
    State(state): State<AppState>,
    Path(product_slug): Path<String>,
) -> AppResult<Json<Vec<Room>>> {
    Ok(Json(state.rooms.by_product_slug(&product_slug).await?))
}

/// Page of products assigned to a room, newest first
#[utoipa::path(
    get,
    path = "/api/rooms/{slug}/products",
    tag = "Rooms",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("page" = Option<u64>, Query, description = "1-indexed page"),
        ("limit" = Option<u64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Products with pagination metadata"),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<RoomProductsResponse>> {
    let room = state
        .rooms
        .find_by_slug(&slug)
        .await?
        .ok_or_not_found("Room")?;

    let (products, total) = state
        .rooms
        .products_page(room.room.id, params.page, params.limit())
        .await?;

    Ok(Json(RoomProductsResponse {
        products,
        pagination: PaginationMeta::new(&params, total),
    }))
}

/// Create a room. Name, image and banner are required.
#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RoomMutationResponse),
        (status = 400, description = "Missing fields or duplicate room")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoomRequest>,
) -> AppResult<Created<RoomMutationResponse>> {
    let name = payload.name.trim().to_string();
    let mut errors: BTreeMap<&'static str, String> = BTreeMap::new();
    if name.is_empty() {
        errors.insert("name", "Room name is required".to_string());
    }
    let image = payload.image.clone().filter(|v| !v.trim().is_empty());
    if image.is_none() {
        errors.insert("image", "Room image is required".to_string());
    }
    let banner = payload.banner.clone().filter(|v| !v.trim().is_empty());
    if banner.is_none() {
        errors.insert("banner", "Room banner is required".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::FieldValidation(errors));
    }

    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slug::slugify(&name));
    if state.rooms.exists(&name, &slug).await? {
        return Err(AppError::field("name", "This room already exists"));
    }

    let room = state
        .rooms
        .create(NewRoom {
            name,
            description: payload.description,
            image: image.unwrap_or_default(),
            banner: banner.unwrap_or_default(),
            slug,
            status: payload.status.unwrap_or(1),
        })
        .await?;

    Ok(Created(RoomMutationResponse {
        message: "Room created".to_string(),
        room,
    }))
}

/// Update a room; absent fields keep their stored values
#[utoipa::path(
    put,
    path = "/api/rooms/{slug}",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    request_body = UpdateRoomRequest,
    responses(
        (status = 200, description = "Room updated", body = RoomMutationResponse),
        (status = 400, description = "Name already used by another room"),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateRoomRequest>,
) -> AppResult<Json<RoomMutationResponse>> {
    if state.rooms.find_by_slug(&slug).await?.is_none() {
        return Err(AppError::not_found("Room not found"));
    }

    if let Some(name) = payload.name.as_deref() {
        if state.rooms.name_taken_elsewhere(name, &slug).await? {
            return Err(AppError::field("name", "Another room already uses this name"));
        }
    }

    let room = state
        .rooms
        .update(
            &slug,
            RoomPatch {
                name: payload.name,
                image: payload.image,
                banner: payload.banner,
                priority: payload.priority,
                status: payload.status,
            },
        )
        .await?;

    Ok(Json(RoomMutationResponse {
        message: "Room updated".to_string(),
        room,
    }))
}

/// Delete a room together with its product links
#[utoipa::path(
    delete,
    path = "/api/rooms/{slug}",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Room deleted"),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn remove(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<MessageResponse> {
    let room = state
        .rooms
        .find_by_slug(&slug)
        .await?
        .ok_or_not_found("Room")?;

    state.rooms.delete(room.room.id).await?;
    Ok(MessageResponse::new("Room deleted"))
}

/// Assign a product to a room
#[utoipa::path(
    post,
    path = "/api/rooms/{slug}/products",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    request_body = AddRoomProductRequest,
    responses(
        (status = 200, description = "Product assigned"),
        (status = 400, description = "Product already in the room"),
        (status = 404, description = "Unknown room or product")
    )
)]
pub async fn add_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<AddRoomProductRequest>,
) -> AppResult<MessageResponse> {
    let room = state
        .rooms
        .find_by_slug(&slug)
        .await?
        .ok_or_not_found("Room")?;

    if !state.rooms.product_exists(payload.product_id).await? {
        return Err(AppError::not_found("Product not found"));
    }
    if state.rooms.link_exists(room.room.id, payload.product_id).await? {
        return Err(AppError::validation("Product is already in this room"));
    }

    state
        .rooms
        .add_product(room.room.id, payload.product_id)
        .await?;
    Ok(MessageResponse::new("Product added to room"))
}

/// Remove a product from a room
#[utoipa::path(
    delete,
    path = "/api/rooms/{slug}/products/{product_id}",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product removed"),
        (status = 404, description = "Unknown room or product not in the room")
    )
)]
pub async fn remove_product(
    State(state): State<AppState>,
    Path((slug, product_id)): Path<(String, i64)>,
) -> AppResult<MessageResponse> {
    let room = state
        .rooms
        .find_by_slug(&slug)
        .await?
        .ok_or_not_found("Room")?;

    let removed = state.rooms.remove_product(room.room.id, product_id).await?;
    if !removed {
        return Err(AppError::not_found("Product is not in this room"));
    }
    Ok(MessageResponse::new("Product removed from room"))
}
