use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dam water-level observation. `(dam_id, observation_time)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dam_levels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dam_id: i32,
    pub observation_time: DateTimeWithTimeZone,
    pub dam_value: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dams::Entity",
        from = "Column::DamId",
        to = "super::dams::Column::Id"
    )]
    Dam,
}

impl Related<super::dams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dam.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
