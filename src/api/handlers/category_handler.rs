//! Category handlers.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::middleware::{auth_middleware, require_staff};
use crate::api::AppState;
use crate::domain::{Category, CategoryWithCount, ProductSummary};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::{Created, MessageResponse, PaginationMeta, PaginationParams};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    /// Generated from the name when absent
    pub slug: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub status: Option<i16>,
    pub priority: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub priority: Option<i32>,
    pub status: Option<i16>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryMutationResponse {
    pub message: String,
    pub category: Category,
}

/// Paginated products-in-category response
#[derive(Debug, Serialize)]
pub struct CategoryProductsResponse {
    pub products: Vec<ProductSummary>,
    pub pagination: PaginationMeta,
}

pub fn category_routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/admin/all", get(list_all))
        .route("/", post(create))
        .route("/:slug", put(update))
        .route("/:slug", delete(remove))
        .route_layer(axum::middleware::from_fn(require_staff))
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
        .merge(admin)
}

/// Visible categories with product counts
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categories",
    responses((status = 200, description = "Visible categories", body = [CategoryWithCount]))
)]
pub async fn list_visible(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CategoryWithCount>>> {
    Ok(Json(state.categories.list(true).await?))
}

/// Lightweight visible listing for storefront filters
#[utoipa::path(
    get,
    path = "/api/categories/filter",
    tag = "Categories",
    responses((status = 200, description = "Filter options", body = [Category]))
)]
pub async fn filter_list(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.categories.filter_list().await?))
}

/// All categories including hidden ones, for the dashboard
#[utoipa::path(
    get,
    path = "/api/categories/admin/all",
    tag = "Categories",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All categories", body = [CategoryWithCount]))
)]
pub async fn list_all(State(state): State<AppState>) -> AppResult<Json<Vec<CategoryWithCount>>> {
    Ok(Json(state.categories.list(false).await?))
}

/// Category by slug
#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    tag = "Categories",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Category>> {
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .ok_or_not_found("Category")?;
    Ok(Json(category))
}

/// Categories containing a product
pub async fn by_product(
    State(state): State<AppState>,
    Path(product_slug): Path<String>,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.categories.by_product_slug(&product_slug).await?))
}

/// Page of products in a category, newest first
#[utoipa::path(
    get,
    path = "/api/categories/{slug}/products",
    tag = "Categories",
    params(
        ("slug" = String, Path, description = "Category slug"),
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
) -> AppResult<Json<CategoryProductsResponse>> {
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .ok_or_not_found("Category")?;

    let (products, total) = state
        .categories
        .products_page(category.id, params.page, params.limit())
        .await?;

    Ok(Json(CategoryProductsResponse {
        products,
        pagination: PaginationMeta::new(&params, total),
    }))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryMutationResponse),
        (status = 400, description = "Missing name or duplicate slug")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<Created<CategoryMutationResponse>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::field("name", "Category name is required"));
    }

    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slug::slugify(&name));
    if state.categories.slug_exists(&slug).await? {
        return Err(AppError::field("slug", "A category with this slug already exists"));
    }

    let category = state
        .categories
        .create(crate::infra::repositories::NewCategory {
            name,
            slug,
            image: payload.image,
            banner: payload.banner,
            status: payload.status.unwrap_or(1),
            priority: payload.priority.unwrap_or(0),
        })
        .await?;

    Ok(Created(CategoryMutationResponse {
        message: "Category created".to_string(),
        category,
    }))
}

/// Update a category; absent fields keep their stored values
#[utoipa::path(
    put,
    path = "/api/categories/{slug}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryMutationResponse),
        (status = 400, description = "Name already used by another category"),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<Json<CategoryMutationResponse>> {
    if !state.categories.slug_exists(&slug).await? {
        return Err(AppError::not_found("Category not found"));
    }

    if let Some(name) = payload.name.as_deref() {
        if state.categories.name_taken_elsewhere(name, &slug).await? {
            return Err(AppError::field(
                "name",
                "Another category already uses this name",
            ));
        }
    }

    let category = state
        .categories
        .update(
            &slug,
            crate::infra::repositories::CategoryPatch {
                name: payload.name,
                image: payload.image,
                banner: payload.banner,
                priority: payload.priority,
                status: payload.status,
            },
        )
        .await?;

    Ok(Json(CategoryMutationResponse {
        message: "Category updated".to_string(),
        category,
    }))
}

/// Delete a category. Refused while products still reference it.
#[utoipa::path(
    delete,
    path = "/api/categories/{slug}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 400, description = "Products still assigned"),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn remove(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<MessageResponse> {
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .ok_or_not_found("Category")?;

    let product_ids = state.categories.product_ids(category.id).await?;
    if !product_ids.is_empty() {
        return Err(AppError::validation(format!(
            "Cannot delete: {} products are still assigned to this category",
            product_ids.len()
        )));
    }

    state.categories.delete_by_slug(&slug).await?;
    Ok(MessageResponse::new("Category deleted"))
}

