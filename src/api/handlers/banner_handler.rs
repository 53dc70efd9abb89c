//! Banner handlers.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::middleware::{auth_middleware, require_admin_only};
use crate::api::AppState;
use crate::domain::{Banner, BannerView};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::{BannerPatch, NewBanner};
use crate::types::{Created, MessageResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBannerRequest {
    pub title: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub page_type: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
    pub category_id: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Update request; `category_id`, `start_date` and `end_date` distinguish
/// "absent" (keep) from "null" (clear) via the double Option.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBannerRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub page_type: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
}

/// Absent field stays `None` via the default; an explicit `null` arrives as
/// `Some(None)` and clears the column.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BannerMutationResponse {
    pub message: String,
    pub banner: Banner,
}

#[derive(Debug, Deserialize)]
pub struct PagesQuery {
    /// Comma-separated page types
    pub types: String,
}

pub fn banner_routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create))
        .route("/:id", put(update))
        .route("/:id", delete(remove))
        .route("/:id/toggle-status", put(toggle_status))
        .route_layer(axum::middleware::from_fn(require_admin_only))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            auth_middleware,
        ));

    Router::new()
        .route("/", get(list))
        .route("/pages", get(by_pages))
        .route("/page-types", get(page_types))
        .route("/page/:page_type", get(by_page))
        .route("/:id", get(get_by_id))
        .merge(admin)
}

/// All banners with derived status and category names
#[utoipa::path(
    get,
    path = "/api/banners",
    tag = "Banners",
    responses((status = 200, description = "All banners", body = [BannerView]))
)]
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<BannerView>>> {
    Ok(Json(state.banners.list().await?))
}

/// Active banners for one page type
#[utoipa::path(
    get,
    path = "/api/banners/page/{page_type}",
    tag = "Banners",
    params(("page_type" = String, Path, description = "Storefront page type")),
    responses((status = 200, description = "Active banners", body = [BannerView]))
)]
pub async fn by_page(
    State(state): State<AppState>,
    Path(page_type): Path<String>,
) -> AppResult<Json<Vec<BannerView>>> {
    Ok(Json(state.banners.list_by_page(&page_type).await?))
}

/// Active banners for several page types, grouped by page type
#[utoipa::path(
    get,
    path = "/api/banners/pages",
    tag = "Banners",
    params(("types" = String, Query, description = "Comma-separated page types")),
    responses((status = 200, description = "Banners grouped by page type"))
)]
pub async fn by_pages(
    State(state): State<AppState>,
    Query(query): Query<PagesQuery>,
) -> AppResult<Json<BTreeMap<String, Vec<Banner>>>> {
    let types: Vec<String> = query
        .types
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if types.is_empty() {
        return Err(AppError::validation("At least one page type is required"));
    }

    let banners = state.banners.list_by_pages(&types).await?;
    let mut grouped: BTreeMap<String, Vec<Banner>> =
        types.into_iter().map(|t| (t, Vec::new())).collect();
    for banner in banners {
        grouped
            .entry(banner.page_type.clone())
            .or_default()
            .push(banner);
    }

    Ok(Json(grouped))
}

/// Distinct page types with at least one active banner
#[utoipa::path(
    get,
    path = "/api/banners/page-types",
    tag = "Banners",
    responses((status = 200, description = "Page types", body = [String]))
)]
pub async fn page_types(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.banners.page_types().await?))
}

/// Banner by id
#[utoipa::path(
    get,
    path = "/api/banners/{id}",
    tag = "Banners",
    params(("id" = i64, Path, description = "Banner id")),
    responses(
        (status = 200, description = "Banner", body = BannerView),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BannerView>> {
    let banner = state.banners.find(id).await?.ok_or_not_found("Banner")?;
    Ok(Json(banner))
}

/// Create a banner
#[utoipa::path(
    post,
    path = "/api/banners",
    tag = "Banners",
    security(("bearer_auth" = [])),
    request_body = CreateBannerRequest,
    responses(
        (status = 201, description = "Banner created", body = BannerMutationResponse),
        (status = 400, description = "Missing title")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateBannerRequest>,
) -> AppResult<Created<BannerMutationResponse>> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::field("title", "Banner title is required"));
    }

    let banner = state
        .banners
        .create(NewBanner {
            title,
            image_url: payload.image_url,
            link_url: payload.link_url,
            page_type: payload.page_type.unwrap_or_else(|| "home".to_string()),
            position: payload.position.unwrap_or(0),
            is_active: payload.is_active.unwrap_or(true),
            category_id: payload.category_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
        })
        .await?;

    Ok(Created(BannerMutationResponse {
        message: "Banner created".to_string(),
        banner,
    }))
}

/// Update a banner; absent fields keep their stored values
#[utoipa::path(
    put,
    path = "/api/banners/{id}",
    tag = "Banners",
    security(("bearer_auth" = [])),
    request_body = UpdateBannerRequest,
    responses(
        (status = 200, description = "Banner updated", body = BannerMutationResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateBannerRequest>,
) -> AppResult<Json<BannerMutationResponse>> {
    let banner = state
        .banners
        .update(
            id,
            BannerPatch {
                title: payload.title,
                image_url: payload.image_url,
                link_url: payload.link_url,
                page_type: payload.page_type,
                position: payload.position,
                is_active: payload.is_active,
                category_id: payload.category_id,
                start_date: payload.start_date,
                end_date: payload.end_date,
            },
        )
        .await?;

    Ok(Json(BannerMutationResponse {
        message: "Banner updated".to_string(),
        banner,
    }))
}

/// Delete a banner
#[utoipa::path(
    delete,
    path = "/api/banners/{id}",
    tag = "Banners",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Banner deleted"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<MessageResponse> {
    state.banners.delete(id).await?;
    Ok(MessageResponse::new("Banner deleted"))
}

/// Flip a banner's active flag
#[utoipa::path(
    put,
    path = "/api/banners/{id}/toggle-status",
    tag = "Banners",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status toggled", body = BannerMutationResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BannerMutationResponse>> {
    let banner = state.banners.toggle_status(id).await?;
    Ok(Json(BannerMutationResponse {
        message: format!("Banner is now {}", banner.status()),
        banner,
    }))
}
