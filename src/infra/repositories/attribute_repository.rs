//! Category attribute repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::entities::attribute::{self, ActiveModel, Entity as AttributeEntity};
use crate::domain::Attribute;
use crate::errors::AppResult;

/// Fields for attribute creation.
#[derive(Debug, Clone)]
pub struct NewAttribute {
    pub name: String,
    pub value_type: String,
    pub unit: Option<String>,
    pub is_required: bool,
}

#[async_trait]
pub trait AttributeRepository: Send + Sync {
    async fn create(&self, category_id: i64, new: NewAttribute) -> AppResult<Attribute>;

    /// Attributes of a category, name order
    async fn list_by_category(&self, category_id: i64) -> AppResult<Vec<Attribute>>;
}

pub struct AttributeStore {
    db: DatabaseConnection,
}

impl AttributeStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AttributeRepository for AttributeStore {
    async fn create(&self, category_id: i64, new: NewAttribute) -> AppResult<Attribute> {
        let active = ActiveModel {
            category_id: Set(category_id),
            name: Set(new.name),
            value_type: Set(new.value_type),
            unit: Set(new.unit),
            is_required: Set(new.is_required),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(&self.db).await?;
        Ok(Attribute::from(model))
    }

    async fn list_by_category(&self, category_id: i64) -> AppResult<Vec<Attribute>> {
        let models = AttributeEntity::find()
            .filter(attribute::Column::CategoryId.eq(category_id))
            .order_by_asc(attribute::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Attribute::from).collect())
    }
}
