//! Banner repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::entities::{
    banner::{self, ActiveModel, Entity as BannerEntity},
    category::Entity as CategoryEntity,
};
use crate::domain::{Banner, BannerView};
use crate::errors::{AppError, AppResult};

/// Fields for banner creation.
#[derive(Debug, Clone)]
pub struct NewBanner {
    pub title: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub page_type: String,
    pub position: i32,
    pub is_active: bool,
    pub category_id: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct BannerPatch {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub page_type: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
    pub category_id: Option<Option<i64>>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
}

#[async_trait]
pub trait BannerRepository: Send + Sync {
    /// All banners with their category names, position order
    async fn list(&self) -> AppResult<Vec<BannerView>>;

    /// Active banners for one page type
    async fn list_by_page(&self, page_type: &str) -> AppResult<Vec<BannerView>>;

    /// Active banners across several page types
    async fn list_by_pages(&self, page_types: &[String]) -> AppResult<Vec<Banner>>;

    /// Distinct page types that have at least one active banner
    async fn page_types(&self) -> AppResult<Vec<String>>;

    async fn find(&self, id: i64) -> AppResult<Option<BannerView>>;

    async fn create(&self, new: NewBanner) -> AppResult<Banner>;

    async fn update(&self, id: i64, patch: BannerPatch) -> AppResult<Banner>;

    async fn delete(&self, id: i64) -> AppResult<()>;

    /// Flip is_active and return the updated banner
    async fn toggle_status(&self, id: i64) -> AppResult<Banner>;
}

pub struct BannerStore {
    db: DatabaseConnection,
}

impl BannerStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn into_views(rows: Vec<(banner::Model, Option<super::entities::category::Model>)>) -> Vec<BannerView> {
        rows.into_iter()
            .map(|(b, c)| BannerView::new(Banner::from(b), c.map(|c| c.name)))
            .collect()
    }

    async fn model(&self, id: i64) -> AppResult<banner::Model> {
        BannerEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Banner not found"))
    }
}

#[async_trait]
impl BannerRepository for BannerStore {
    async fn list(&self) -> AppResult<Vec<BannerView>> {
        let rows = BannerEntity::find()
            .order_by_asc(banner::Column::Position)
            .order_by_desc(banner::Column::CreatedAt)
            .find_also_related(CategoryEntity)
            .all(&self.db)
            .await?;
        Ok(Self::into_views(rows))
    }

    async fn list_by_page(&self, page_type: &str) -> AppResult<Vec<BannerView>> {
        let rows = BannerEntity::find()
            .filter(banner::Column::PageType.eq(page_type))
            .filter(banner::Column::IsActive.eq(true))
            .order_by_asc(banner::Column::Position)
            .order_by_desc(banner::Column::CreatedAt)
            .find_also_related(CategoryEntity)
            .all(&self.db)
            .await?;
        Ok(Self::into_views(rows))
    }

    async fn list_by_pages(&self, page_types: &[String]) -> AppResult<Vec<Banner>> {
        let models = BannerEntity::find()
            .filter(banner::Column::PageType.is_in(page_types.iter().cloned()))
            .filter(banner::Column::IsActive.eq(true))
            .order_by_asc(banner::Column::PageType)
            .order_by_asc(banner::Column::Position)
            .order_by_desc(banner::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Banner::from).collect())
    }

    async fn page_types(&self) -> AppResult<Vec<String>> {
        let rows: Vec<String> = BannerEntity::find()
            .select_only()
            .column(banner::Column::PageType)
            .filter(banner::Column::IsActive.eq(true))
            .distinct()
            .order_by_asc(banner::Column::PageType)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn find(&self, id: i64) -> AppResult<Option<BannerView>> {
        let rows = BannerEntity::find_by_id(id)
            .find_also_related(CategoryEntity)
            .all(&self.db)
            .await?;
        Ok(Self::into_views(rows).into_iter().next())
    }

    async fn create(&self, new: NewBanner) -> AppResult<Banner> {
        let active = ActiveModel {
            title: Set(new.title),
            image_url: Set(new.image_url),
            link_url: Set(new.link_url),
            page_type: Set(new.page_type),
            position: Set(new.position),
            is_active: Set(new.is_active),
            category_id: Set(new.category_id),
            start_date: Set(new.start_date),
            end_date: Set(new.end_date),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        };
        let model = active.insert(&self.db).await?;
        Ok(Banner::from(model))
    }

    async fn update(&self, id: i64, patch: BannerPatch) -> AppResult<Banner> {
        let model = self.model(id).await?;
        let mut active: ActiveModel = model.into();

        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(link_url) = patch.link_url {
            active.link_url = Set(Some(link_url));
        }
        if let Some(page_type) = patch.page_type {
            active.page_type = Set(page_type);
        }
        if let Some(position) = patch.position {
            active.position = Set(position);
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(category_id) = patch.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(start_date) = patch.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = patch.end_date {
            active.end_date = Set(end_date);
        }
        active.updated_at = Set(Some(Utc::now()));

        let model = active.update(&self.db).await?;
        Ok(Banner::from(model))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = BannerEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("Banner not found"));
        }
        Ok(())
    }

    async fn toggle_status(&self, id: i64) -> AppResult<Banner> {
        let model = self.model(id).await?;
        let flipped = !model.is_active;
        let mut active: ActiveModel = model.into();
        active.is_active = Set(flipped);
        active.updated_at = Set(Some(Utc::now()));

        let model = active.update(&self.db).await?;
        Ok(Banner::from(model))
    }
}
