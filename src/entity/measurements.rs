use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Hourly air-quality reading.
///
/// `(date, station_id, measurement_type_id, hour)` is unique; `date` is a
/// `YYYYMMDD` integer and `hour` runs 1..=24 as published in the source files.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "measurements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub date: i32,
    pub station_id: i32,
    pub measurement_type_id: i32,
    pub lat: f64,
    pub lng: f64,
    pub unit: String,
    pub hour: i32,
    pub value: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stations::Entity",
        from = "Column::StationId",
        to = "super::stations::Column::Id"
    )]
    Station,
    #[sea_orm(
        belongs_to = "super::measurement_types::Entity",
        from = "Column::MeasurementTypeId",
        to = "super::measurement_types::Column::Id"
    )]
    MeasurementType,
}

impl Related<super::stations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Station.def()
    }
}

impl Related<super::measurement_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeasurementType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
