//! Room repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use super::entities::{
    category::Entity as CategoryEntity,
    product::{self, Entity as ProductEntity},
    room::{self, ActiveModel, Entity as RoomEntity},
    room_product::{self, Entity as RoomProductEntity},
};
use crate::domain::{ProductSummary, Room, RoomWithCount};
use crate::errors::{AppError, AppResult};

/// Fields for room creation.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub description: Option<String>,
    pub image: String,
    pub banner: String,
    pub slug: String,
    pub status: i16,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub priority: Option<i32>,
    pub status: Option<i16>,
}

#[derive(FromQueryResult)]
struct RoomCountRow {
    room_id: i64,
    count: i64,
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Rooms with product counts, name order. `visible_only` restricts to
    /// status 1 (the public listing).
    async fn list(&self, visible_only: bool) -> AppResult<Vec<RoomWithCount>>;

    /// Lightweight listing for storefront filters
    async fn filter_list(&self) -> AppResult<Vec<Room>>;

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<RoomWithCount>>;

    /// Whether a room with both this name and slug already exists
    async fn exists(&self, name: &str, slug: &str) -> AppResult<bool>;

    /// Whether another room (different slug) already uses this name
    async fn name_taken_elsewhere(&self, name: &str, slug: &str) -> AppResult<bool>;

    async fn create(&self, new: NewRoom) -> AppResult<Room>;

    async fn update(&self, slug: &str, patch: RoomPatch) -> AppResult<Room>;

    /// Delete the room and its product links
    async fn delete(&self, room_id: i64) -> AppResult<()>;

    /// Page of products in the room, newest first, with total count
    async fn products_page(
        &self,
        room_id: i64,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<ProductSummary>, u64)>;

    async fn product_exists(&self, product_id: i64) -> AppResult<bool>;

    async fn link_exists(&self, room_id: i64, product_id: i64) -> AppResult<bool>;

    async fn add_product(&self, room_id: i64, product_id: i64) -> AppResult<()>;

    /// Remove a product link; Ok(false) when no link existed
    async fn remove_product(&self, room_id: i64, product_id: i64) -> AppResult<bool>;

    /// Rooms containing the product with the given slug
    async fn by_product_slug(&self, product_slug: &str) -> AppResult<Vec<Room>>;
}

pub struct RoomStore {
    db: DatabaseConnection,
}

impl RoomStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn counts_by_room(&self) -> AppResult<HashMap<i64, i64>> {
        let rows = RoomProductEntity::find()
            .select_only()
            .column(room_product::Column::RoomId)
            .column_as(room_product::Column::ProductId.count(), "count")
            .group_by(room_product::Column::RoomId)
            .into_model::<RoomCountRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|r| (r.room_id, r.count)).collect())
    }
}

#[async_trait]
impl RoomRepository for RoomStore {
    async fn list(&self, visible_only: bool) -> AppResult<Vec<RoomWithCount>> {
        let mut query = RoomEntity::find().order_by_asc(room::Column::Name);
        if visible_only {
            query = query.filter(room::Column::Status.eq(1i16));
        }
        let models = query.all(&self.db).await?;
        let counts = self.counts_by_room().await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let count = counts.get(&m.id).copied().unwrap_or(0);
                RoomWithCount {
                    room: Room::from(m),
                    product_count: count,
                }
            })
            .collect())
    }

    async fn filter_list(&self) -> AppResult<Vec<Room>> {
        let models = RoomEntity::find()
            .order_by_asc(room::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Room::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<RoomWithCount>> {
        let model = RoomEntity::find()
            .filter(room::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;

        let Some(model) = model else {
            return Ok(None);
        };

        let count = RoomProductEntity::find()
            .filter(room_product::Column::RoomId.eq(model.id))
            .count(&self.db)
            .await?;

        Ok(Some(RoomWithCount {
            room: Room::from(model),
            product_count: count as i64,
        }))
    }

    async fn exists(&self, name: &str, slug: &str) -> AppResult<bool> {
        let model = RoomEntity::find()
            .filter(room::Column::Name.eq(name))
            .filter(room::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        Ok(model.is_some())
    }

    async fn name_taken_elsewhere(&self, name: &str, slug: &str) -> AppResult<bool> {
        let model = RoomEntity::find()
            .filter(room::Column::Name.eq(name))
            .filter(room::Column::Slug.ne(slug))
            .one(&self.db)
            .await?;
        Ok(model.is_some())
    }

    async fn create(&self, new: NewRoom) -> AppResult<Room> {
        let active = ActiveModel {
            name: Set(new.name),
            description: Set(new.description),
            image: Set(Some(new.image)),
            banner: Set(Some(new.banner)),
            slug: Set(new.slug),
            status: Set(new.status),
            priority: Set(0),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        };
        let model = active.insert(&self.db).await?;
        Ok(Room::from(model))
    }

    async fn update(&self, slug: &str, patch: RoomPatch) -> AppResult<Room> {
        let model = RoomEntity::find()
            .filter(room::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Room not found"))?;

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
        Ok(Room::from(model))
    }

    async fn delete(&self, room_id: i64) -> AppResult<()> {
        RoomProductEntity::delete_many()
            .filter(room_product::Column::RoomId.eq(room_id))
            .exec(&self.db)
            .await?;
        RoomEntity::delete_by_id(room_id).exec(&self.db).await?;
        Ok(())
    }

    async fn products_page(
        &self,
        room_id: i64,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<ProductSummary>, u64)> {
        let paginator = ProductEntity::find()
            .join(JoinType::InnerJoin, product::Relation::RoomProduct.def())
            .filter(room_product::Column::RoomId.eq(room_id))
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

    async fn product_exists(&self, product_id: i64) -> AppResult<bool> {
        let model = ProductEntity::find_by_id(product_id).one(&self.db).await?;
        Ok(model.is_some())
    }

    async fn link_exists(&self, room_id: i64, product_id: i64) -> AppResult<bool> {
        let model = RoomProductEntity::find_by_id((room_id, product_id))
            .one(&self.db)
            .await?;
        Ok(model.is_some())
    }

    async fn add_product(&self, room_id: i64, product_id: i64) -> AppResult<()> {
        let active = room_product::ActiveModel {
            room_id: Set(room_id),
            product_id: Set(product_id),
        };
        active.insert(&self.db).await?;
        Ok(())
    }

    async fn remove_product(&self, room_id: i64, product_id: i64) -> AppResult<bool> {
        let result = RoomProductEntity::delete_by_id((room_id, product_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn by_product_slug(&self, product_slug: &str) -> AppResult<Vec<Room>> {
        let models = RoomEntity::find()
            .join(JoinType::InnerJoin, room::Relation::RoomProduct.def())
            .join(
                JoinType::InnerJoin,
                room_product::Relation::Product.def(),
            )
            .filter(product::Column::Slug.eq(product_slug))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Room::from).collect())
    }
}
