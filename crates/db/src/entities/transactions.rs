//! `SeaORM` Entity for transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub logbook_id: Option<Uuid>,
    pub summary: String,
    pub amount: i64,
    pub occurred: Option<i64>,
    pub deleted: Option<i64>,
    pub created: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::logbooks::Entity",
        from = "Column::LogbookId",
        to = "super::logbooks::Column::Id"
    )]
    Logbooks,
}

impl Related<super::logbooks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Logbooks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
