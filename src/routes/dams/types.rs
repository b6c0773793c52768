use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::dams::DamLevelRow;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DamLevelResponse {
    pub id: i32,
    pub dam_id: i32,
    /// English (romanized) dam name
    pub dam_name: String,
    /// Japanese dam name
    pub dam_name_jp: String,
    pub observation_time: DateTime<Utc>,
    /// Reported water level value
    pub dam_value: i32,
}

impl From<DamLevelRow> for DamLevelResponse {
    fn from(row: DamLevelRow) -> Self {
        Self {
            id: row.id,
            dam_id: row.dam_id,
            dam_name: row.dam_name,
            dam_name_jp: row.dam_name_jp,
            observation_time: row.observation_time.with_timezone(&Utc),
            dam_value: row.dam_value,
        }
    }
}
