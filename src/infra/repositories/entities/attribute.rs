//! Category attribute database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Attribute;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "attributes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub value_type: String,
    pub unit: Option<String>,
    pub is_required: bool,
    pub created_at: DateTimeUtc,
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

impl From<Model> for Attribute {
    fn from(model: Model) -> Self {
        Attribute {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
            value_type: model.value_type,
            unit: model.unit,
            is_required: model.is_required,
            created_at: model.created_at,
        }
    }
}
