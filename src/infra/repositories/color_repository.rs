//! Color repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::entities::{
    color::{self, ActiveModel, Entity as ColorEntity},
    product::{self, Entity as ProductEntity},
};
use crate::domain::{Color, ColorWithCount};
use crate::errors::{AppError, AppResult};

/// Fields for color creation.
#[derive(Debug, Clone)]
pub struct NewColor {
    pub name: String,
    pub hex: String,
    pub slug: Option<String>,
    pub priority: i32,
}

/// Full-row update, matching the admin form which submits every field.
#[derive(Debug, Clone)]
pub struct ColorUpdate {
    pub name: String,
    pub hex: String,
    pub slug: Option<String>,
    pub priority: i32,
    pub status: i16,
}

#[derive(FromQueryResult)]
struct ColorCountRow {
    color_id: Option<i64>,
    count: i64,
}

#[async_trait]
pub trait ColorRepository: Send + Sync {
    /// Lightweight listing for storefront filters, priority order
    async fn filter_list(&self) -> AppResult<Vec<Color>>;

    /// Colors used by the product with the given slug
    async fn by_product_slug(&self, product_slug: &str) -> AppResult<Vec<Color>>;

    /// All colors with product counts, priority order
    async fn list_with_counts(&self) -> AppResult<Vec<ColorWithCount>>;

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Color>>;

    async fn create(&self, new: NewColor) -> AppResult<Color>;

    async fn update(&self, id: i64, update: ColorUpdate) -> AppResult<Color>;

    async fn set_status(&self, id: i64, status: i16) -> AppResult<Color>;

    /// Flip visibility, 1 to 0 or 0 to 1
    async fn toggle_status(&self, id: i64) -> AppResult<Color>;

    /// Number of products referencing this color
    async fn product_count(&self, color_id: i64) -> AppResult<u64>;

    /// Hard delete; Ok(false) when no row existed
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

pub struct ColorStore {
    db: DatabaseConnection,
}

impl ColorStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn model(&self, id: i64) -> AppResult<color::Model> {
        ColorEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Color not found"))
    }
}

#[async_trait]
impl ColorRepository for ColorStore {
    async fn filter_list(&self) -> AppResult<Vec<Color>> {
        let models = ColorEntity::find()
            .order_by_asc(color::Column::Priority)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Color::from).collect())
    }

    async fn by_product_slug(&self, product_slug: &str) -> AppResult<Vec<Color>> {
        let rows = ProductEntity::find()
            .filter(product::Column::Slug.eq(product_slug))
            .find_also_related(ColorEntity)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(_, c)| c.map(Color::from))
            .collect())
    }

    async fn list_with_counts(&self) -> AppResult<Vec<ColorWithCount>> {
        let counts: HashMap<i64, i64> = ProductEntity::find()
            .select_only()
            .column(product::Column::ColorId)
            .column_as(product::Column::Id.count(), "count")
            .group_by(product::Column::ColorId)
            .into_model::<ColorCountRow>()
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|r| r.color_id.map(|id| (id, r.count)))
            .collect();

        let models = ColorEntity::find()
            .order_by_asc(color::Column::Priority)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let count = counts.get(&m.id).copied().unwrap_or(0);
                ColorWithCount {
                    color: Color::from(m),
                    product_count: count,
                }
            })
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Color>> {
        let model = ColorEntity::find()
            .filter(color::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        Ok(model.map(Color::from))
    }

    async fn create(&self, new: NewColor) -> AppResult<Color> {
        let active = ActiveModel {
            name: Set(new.name),
            hex: Set(new.hex),
            slug: Set(new.slug),
            priority: Set(new.priority),
            status: Set(1),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        };
        let model = active.insert(&self.db).await?;
        Ok(Color::from(model))
    }

    async fn update(&self, id: i64, update: ColorUpdate) -> AppResult<Color> {
        let model = self.model(id).await?;
        let mut active: ActiveModel = model.into();
        active.name = Set(update.name);
        active.hex = Set(update.hex);
        active.slug = Set(update.slug);
        active.priority = Set(update.priority);
        active.status = Set(update.status);
        active.updated_at = Set(Some(Utc::now()));

        let model = active.update(&self.db).await?;
        Ok(Color::from(model))
    }

    async fn set_status(&self, id: i64, status: i16) -> AppResult<Color> {
        let model = self.model(id).await?;
        let mut active: ActiveModel = model.into();
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now()));

        let model = active.update(&self.db).await?;
        Ok(Color::from(model))
    }

    async fn toggle_status(&self, id: i64) -> AppResult<Color> {
        let model = self.model(id).await?;
        let next = if model.status == 1 { 0 } else { 1 };
        let mut active: ActiveModel = model.into();
        active.status = Set(next);
        active.updated_at = Set(Some(Utc::now()));

        let model = active.update(&self.db).await?;
        Ok(Color::from(model))
    }

    async fn product_count(&self, color_id: i64) -> AppResult<u64> {
        let count = ProductEntity::find()
            .filter(product::Column::ColorId.eq(color_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = ColorEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
