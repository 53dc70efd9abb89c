//! Category repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::entities::{
    category::{self, ActiveModel, Entity as CategoryEntity},
    product::{self, Entity as ProductEntity},
};
use crate::domain::{Category, CategoryWithCount, ProductSummary};
use crate::errors::{AppError, AppResult};

/// Fields for category creation.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub status: i16,
    pub priority: i32,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub priority: Option<i32>,
    pub status: Option<i16>,
}

#[derive(FromQueryResult)]
struct ProductCountRow {
    category_id: Option<i64>,
    count: i64,
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Categories with product counts, priority order. `visible_only`
    /// restricts to status 1 (the public listing).
    async fn list(&self, visible_only: bool) -> AppResult<Vec<CategoryWithCount>>;

    /// Lightweight visible listing for storefront filters
    async fn filter_list(&self) -> AppResult<Vec<Category>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Category>>;

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Category>>;

    async fn slug_exists(&self, slug: &str) -> AppResult<bool>;

    /// Whether another category (different slug) already uses this name
    async fn name_taken_elsewhere(&self, name: &str, slug: &str) -> AppResult<bool>;

    async fn create(&self, new: NewCategory) -> AppResult<Category>;

    async fn update(&self, slug: &str, patch: CategoryPatch) -> AppResult<Category>;

    async fn delete_by_slug(&self, slug: &str) -> AppResult<()>;

    /// IDs of products still assigned to the category
    async fn product_ids(&self, category_id: i64) -> AppResult<Vec<i64>>;

    /// Page of products in a category, newest first, with total count
    async fn products_page(
        &self,
        category_id: i64,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<ProductSummary>, u64)>;

    /// Categories containing the product with the given slug
    async fn by_product_slug(&self, product_slug: &str) -> AppResult<Vec<Category>>;
}

pub struct CategoryStore {
    db: DatabaseConnection,
}

impl CategoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn counts_by_category(&self) -> AppResult<HashMap<i64, i64>> {
        let rows = ProductEntity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product::Column::Id.count(), "count")
            .group_by(product::Column::CategoryId)
            .into_model::<ProductCountRow>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|r| r.category_id.map(|id| (id, r.count)))
            .collect())
    }
}

#[async_trait]
impl CategoryRepository for CategoryStore {
    async fn list(&self, visible_only: bool) -> AppResult<Vec<CategoryWithCount>> {
        let mut query = CategoryEntity::find().order_by_asc(category::Column::Priority);
        if visible_only {
            query = query.filter(category::Column::Status.eq(1i16));
        }
        let models = query.all(&self.db).await?;
        let counts = self.counts_by_category().await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let count = counts.get(&m.id).copied().unwrap_or(0);
                CategoryWithCount {
                    category: Category::from(m),
                    product_count: count,
                }
            })
            .collect())
    }

    async fn filter_list(&self) -> AppResult<Vec<Category>> {
        let models = CategoryEntity::find()
            .filter(category::Column::Status.eq(1i16))
            .order_by_asc(category::Column::Priority)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Category::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Category>> {
        let model = CategoryEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Category::from))
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        let model = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        Ok(model.map(Category::from))
    }

    async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        Ok(self.find_by_slug(slug).await?.is_some())
    }

    async fn name_taken_elsewhere(&self, name: &str, slug: &str) -> AppResult<bool> {
        let model = CategoryEntity::find()
            .filter(category::Column::Name.eq(name))
            .filter(category::Column::Slug.ne(slug))
            .one(&self.db)
            .await?;
        Ok(model.is_some())
    }

    async fn create(&self, new: NewCategory) -> AppResult<Category> {
        let active = ActiveModel {
            name: Set(new.name),
            slug: Set(new.slug),
            image: Set(new.image),
            banner: Set(new.banner),
            status: Set(new.status),
            priority: Set(new.priority),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        };
        let model = active.insert(&self.db).await?;
        Ok(Category::from(model))
    }

    async fn update(&self, slug: &str, patch: CategoryPatch) -> AppResult<Category> {
        let model = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Category not found"))?;

        let mut active: ActiveModel = model.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(image) = patch.image {
            active.image = Set(Some(image));
        }
        if let Some(banner) = patch.banner {
            active.banner = Set(Some(banner));
        }
        if let Some(priority) = patch.priority {
            active.priority = Set(priority);
        }
        if let Some(status) = patch.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Some(Utc::now()));

        let model = active.update(&self.db).await?;
        Ok(Category::from(model))
    }

    async fn delete_by_slug(&self, slug: &str) -> AppResult<()> {
        CategoryEntity::delete_many()
            .filter(category::Column::Slug.eq(slug))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn product_ids(&self, category_id: i64) -> AppResult<Vec<i64>> {
        let models = ProductEntity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(|p| p.id).collect())
    }

    async fn products_page(
        &self,
        category_id: i64,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<ProductSummary>, u64)> {
        let paginator = ProductEntity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .order_by_desc(product::Column::CreatedAt)
            .find_also_related(CategoryEntity)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let products = rows
            .into_iter()
            .map(|(p, c)| ProductSummary {
                id: p.id,
                name: p.name,
                slug: p.slug,
                image: p.image,
                category_id: p.category_id,
                category_name: c.map(|c| c.name),
                created_at: p.created_at,
                updated_at: p.updated_at,
            })
            .collect();

        Ok((products, total))
    }

    async fn by_product_slug(&self, product_slug: &str) -> AppResult<Vec<Category>> {
        let rows = ProductEntity::find()
            .filter(product::Column::Slug.eq(product_slug))
            .find_also_related(CategoryEntity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, c)| c.map(Category::from))
            .collect())
    }
}
