use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub jp_name: String,
    pub en_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dam_levels::Entity")]
    DamLevels,
}

impl Related<super::dam_levels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DamLevels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
