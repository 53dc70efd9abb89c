//! Color database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Color;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "colors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub hex: String,
    pub slug: Option<String>,
    pub priority: i32,
    pub status: i16,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Color {
    fn from(model: Model) -> Self {
        Color {
            id: model.id,
            name: model.name,
            hex: model.hex,
            slug: model.slug,
            priority: model.priority,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
