//! One-time passcode database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Otp;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "otps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    /// Argon2 hash of the six-digit code
    pub otp_code: String,
    pub email: String,
    pub is_used: bool,
    pub attempts: i32,
    pub created_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Otp {
    fn from(model: Model) -> Self {
        Otp {
            id: model.id,
            user_id: model.user_id,
            code_hash: model.otp_code,
            attempts: model.attempts,
            is_used: model.is_used,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }
    }
}
