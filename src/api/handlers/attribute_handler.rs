//! Category attribute handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::middleware::{auth_middleware, require_staff};
use crate::api::AppState;
use crate::domain::Attribute;
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::NewAttribute;
use crate::types::Created;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAttributeRequest {
    pub name: String,
    /// "text", "number" or "boolean"
    pub value_type: String,
    pub unit: Option<String>,
    #[serde(default)]
    pub is_required: bool,
}

pub fn attribute_routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/:category_id", post(create))
        .route_layer(axum::middleware::from_fn(require_staff))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            auth_middleware,
        ));

    Router::new()
        .route("/:category_id/attributes", get(list_by_category))
        .merge(admin)
}

/// Attributes of a category
#[utoipa::path(
    get,
    path = "/api/attributes/{category_id}/attributes",
    tag = "Attributes",
    params(("category_id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Attributes", body = [Attribute]),
        (status = 404, description = "Unknown category")
    )
)]
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> AppResult<Json<Vec<Attribute>>> {
    let category = state
        .categories
        .find_by_id(category_id)
        .await?
        .ok_or_not_found("Category")?;
    Ok(Json(state.attributes.list_by_category(category.id).await?))
}

/// Create an attribute under a category
#[utoipa::path(
    post,
    path = "/api/attributes/{category_id}",
    tag = "Attributes",
    security(("bearer_auth" = [])),
    request_body = CreateAttributeRequest,
    params(("category_id" = i64, Path, description = "Category id")),
    responses(
        (status = 201, description = "Attribute created", body = Attribute),
        (status = 400, description = "Missing name or bad value type"),
        (status = 404, description = "Unknown category")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Json(payload): Json<CreateAttributeRequest>,
) -> AppResult<Created<Attribute>> {
    let category = state
        .categories
        .find_by_id(category_id)
        .await?
        .ok_or_not_found("Category")?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::field("name", "Attribute name is required"));
    }
    let value_type = payload.value_type.trim().to_lowercase();
    if !matches!(value_type.as_str(), "text" | "number" | "boolean") {
        return Err(AppError::field(
            "value_type",
            "Value type must be text, number or boolean",
        ));
    }

    let attribute = state
        .attributes
        .create(
            category.id,
            NewAttribute {
                name,
                value_type,
                unit: payload.unit.filter(|u| !u.trim().is_empty()),
                is_required: payload.is_required,
            },
        )
        .await?;

    Ok(Created(attribute))
}
