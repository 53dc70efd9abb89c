//! Color handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::middleware::{auth_middleware, require_staff};
use crate::api::AppState;
use crate::domain::{Color, ColorWithCount};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::{ColorUpdate, NewColor};
use crate::types::{Created, MessageResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateColorRequest {
    pub name: String,
    pub hex: String,
    /// Generated from the name when absent
    pub slug: Option<String>,
    pub priority: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateColorRequest {
    pub name: String,
    pub hex: String,
    pub slug: Option<String>,
    pub priority: i32,
    pub status: i16,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ColorMutationResponse {
    pub message: String,
    pub color: Color,
}

pub fn color_routes(state: AppState) -> Router<AppState> {
    // Dashboard surface under /admin; the get-by-slug route shares the
    // /admin/:id path with the id-keyed mutations, so the placeholder name
    // is :id for all three.
    let admin = Router::new()
        .route("/admin", get(list_with_counts).post(create))
        .route("/admin/:id", get(get_by_slug).put(update).delete(remove))
        .route("/admin/:id/toggle-status", put(toggle_status))
        .route_layer(axum::middleware::from_fn(require_staff))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            auth_middleware,
        ));

    Router::new()
        .route("/filter", get(filter_list))
        .route("/by-product/:product_slug", get(by_product))
        .merge(admin)
}

/// Colors for the storefront filter sidebar, priority order
#[utoipa::path(
    get,
    path = "/api/color/filter",
    tag = "Colors",
    responses((status = 200, description = "Colors", body = [Color]))
)]
pub async fn filter_list(State(state): State<AppState>) -> AppResult<Json<Vec<Color>>> {
    Ok(Json(state.colors.filter_list().await?))
}

/// Colors used by a product
pub async fn by_product(
    State(state): State<AppState>,
    Path(product_slug): Path<String>,
) -> AppResult<Json<Vec<Color>>> {
    Ok(Json(state.colors.by_product_slug(&product_slug).await?))
}

/// All colors with product counts, for the dashboard
#[utoipa::path(
    get,
    path = "/api/color/admin",
    tag = "Colors",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Colors with product counts", body = [ColorWithCount]))
)]
pub async fn list_with_counts(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ColorWithCount>>> {
    Ok(Json(state.colors.list_with_counts().await?))
}

/// Color by slug
#[utoipa::path(
    get,
    path = "/api/color/admin/{slug}",
    tag = "Colors",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Color slug")),
    responses(
        (status = 200, description = "Color", body = Color),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Color>> {
    let color = state
        .colors
        .find_by_slug(&slug)
        .await?
        .ok_or_not_found("Color")?;
    Ok(Json(color))
}

/// Create a color
#[utoipa::path(
    post,
    path = "/api/color/admin",
    tag = "Colors",
    security(("bearer_auth" = [])),
    request_body = CreateColorRequest,
    responses(
        (status = 201, description = "Color created", body = ColorMutationResponse),
        (status = 400, description = "Missing name or hex value")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateColorRequest>,
) -> AppResult<Created<ColorMutationResponse>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::field("name", "Color name is required"));
    }
    let hex = payload.hex.trim().to_string();
    if hex.is_empty() {
        return Err(AppError::field("hex", "Hex value is required"));
    }

    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slug::slugify(&name));

    let color = state
        .colors
        .create(NewColor {
            name,
            hex,
            slug: Some(slug),
            priority: payload.priority.unwrap_or(0),
        })
        .await?;

    Ok(Created(ColorMutationResponse {
        message: "Color created".to_string(),
        color,
    }))
}

/// Replace a color's fields (the admin form submits the full row)
#[utoipa::path(
    put,
    path = "/api/color/admin/{id}",
    tag = "Colors",
    security(("bearer_auth" = [])),
    request_body = UpdateColorRequest,
    responses(
        (status = 200, description = "Color updated", body = ColorMutationResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateColorRequest>,
) -> AppResult<Json<ColorMutationResponse>> {
    let color = state
        .colors
        .update(
            id,
            ColorUpdate {
                name: payload.name,
                hex: payload.hex,
                slug: payload.slug,
                priority: payload.priority,
                status: payload.status,
            },
        )
        .await?;

    Ok(Json(ColorMutationResponse {
        message: "Color updated".to_string(),
        color,
    }))
}

/// Flip a color's visibility status
#[utoipa::path(
    put,
    path = "/api/color/admin/{id}/toggle-status",
    tag = "Colors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status toggled", body = ColorMutationResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ColorMutationResponse>> {
    let color = state.colors.toggle_status(id).await?;
    Ok(Json(ColorMutationResponse {
        message: "Color status updated".to_string(),
        color,
    }))
}

/// Delete a color. When products still reference it the color is hidden
/// instead of removed, so existing products keep their swatch.
#[utoipa::path(
    delete,
    path = "/api/color/admin/{id}",
    tag = "Colors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Color deleted or hidden"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<MessageResponse> {
    let referencing = state.colors.product_count(id).await?;
    if referencing > 0 {
        state.colors.set_status(id, 0).await?;
        return Ok(MessageResponse::new(format!(
            "Color is used by {} products and was hidden instead of deleted",
            referencing
        )));
    }

    if !state.colors.delete(id).await? {
        return Err(AppError::not_found("Color not found"));
    }
    Ok(MessageResponse::new("Color deleted"))
}
