//! Room database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Room;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
    pub status: i16,
    pub priority: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::room_product::Entity")]
    RoomProduct,
}

impl Related<super::room_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoomProduct.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Room {
    fn from(model: Model) -> Self {
        Room {
            id: model.id,
            name: model.name,
            description: model.description,
            image: model.image,
            banner: model.banner,
            slug: model.slug,
            status: model.status,
            priority: model.priority,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
