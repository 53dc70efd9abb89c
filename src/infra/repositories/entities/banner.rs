//! Banner database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Banner;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "banners")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub page_type: String,
    pub position: i32,
    pub is_active: bool,
    pub category_id: Option<i64>,
    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Banner {
    fn from(model: Model) -> Self {
        Banner {
            id: model.id,
            title: model.title,
            image_url: model.image_url,
            link_url: model.link_url,
            page_type: model.page_type,
            position: model.position,
            is_active: model.is_active,
            category_id: model.category_id,
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
