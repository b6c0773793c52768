//! Filter normalization and query building for `GET /measurements`.
//!
//! Raw query parameters arrive as strings. [`MeasurementFilter::from_params`]
//! turns them into a bounded filter (or a validation error), and
//! [`MeasurementFilter::query`] composes the read: measurements inner-joined
//! to their station and measurement type, one predicate per present filter,
//! combined with AND, ordered by id so `limit`/`offset` paging is stable.

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, sea_query::SimpleExpr,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::params::{non_empty, parse_int, saturate};
use crate::entity::{measurement_types, measurements, stations};
use crate::error::{AppError, AppResult};

pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: i64 = 500;

/// Accepted range for the single-day `date` filter (YYYYMMDD)
pub const MIN_DATE: i32 = 20_000_101;
pub const MAX_DATE: i32 = 21_001_231;

/// Raw `/measurements` query string. Every field is kept as text until normalized.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MeasurementParams {
    /// Station code (romanized name, e.g. `kashii`). Unknown codes match nothing.
    pub station: Option<String>,
    /// Measurement type code (e.g. `pm25`, `no2`).
    #[serde(rename = "type")]
    pub measurement_type: Option<String>,
    /// Single day, YYYYMMDD between 20000101 and 21001231
    pub date: Option<String>,
    /// First day of a range, YYYYMMDD (inclusive)
    pub date_from: Option<String>,
    /// Last day of a range, YYYYMMDD (inclusive)
    pub date_to: Option<String>,
    /// First hour (inclusive)
    pub hour_from: Option<String>,
    /// Last hour (inclusive)
    pub hour_to: Option<String>,
    /// Page size, default 100, capped at 500
    pub limit: Option<String>,
    /// Rows to skip, default 0
    pub offset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementFilter {
    pub station: Option<String>,
    pub measurement_type: Option<String>,
    pub date: Option<i32>,
    pub date_from: Option<i32>,
    pub date_to: Option<i32>,
    pub hour_from: Option<i32>,
    pub hour_to: Option<i32>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for MeasurementFilter {
    fn default() -> Self {
        Self {
            station: None,
            measurement_type: None,
            date: None,
            date_from: None,
            date_to: None,
            hour_from: None,
            hour_to: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Joined measurement row as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRow {
    pub id: i32,
    /// Date in YYYYMMDD format
    pub date: i32,
    pub hour: i32,
    /// Measured value, null when the source marked it missing
    pub value: Option<f64>,
    pub unit: String,
    pub lat: f64,
    pub lng: f64,
    pub station: String,
    pub station_kanji: String,
    pub measurement_type: String,
    pub measurement_type_kanji: String,
}

impl MeasurementFilter {
    /// Normalize raw parameters.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for non-integer numeric parameters and
    /// for a `date` outside [`MIN_DATE`, `MAX_DATE`].
    pub fn from_params(params: &MeasurementParams) -> AppResult<Self> {
        let date = parse_int::<i32>("date", params.date.as_deref())?;
        if let Some(day) = date
            && !(MIN_DATE..=MAX_DATE).contains(&day)
        {
            return Err(AppError::Validation("Invalid date".to_string()));
        }

        let limit = parse_int::<i64>("limit", params.limit.as_deref())?
            .map_or(DEFAULT_LIMIT, |requested| saturate(requested.min(MAX_LIMIT)));
        let offset = parse_int::<i64>("offset", params.offset.as_deref())?.map_or(0, saturate);

        Ok(Self {
            station: non_empty(params.station.as_deref()).map(str::to_string),
            measurement_type: non_empty(params.measurement_type.as_deref()).map(str::to_string),
            date,
            date_from: parse_int("date_from", params.date_from.as_deref())?,
            date_to: parse_int("date_to", params.date_to.as_deref())?,
            hour_from: parse_int("hour_from", params.hour_from.as_deref())?,
            hour_to: parse_int("hour_to", params.hour_to.as_deref())?,
            limit,
            offset,
        })
    }

    /// One predicate per present filter field, in a fixed order.
    #[must_use]
    pub fn conditions(&self) -> Vec<SimpleExpr> {
        let mut conditions = Vec::new();

        if let Some(station) = &self.station {
            conditions.push(stations::Column::NameEn.eq(station.as_str()));
        }
        if let Some(measurement_type) = &self.measurement_type {
            conditions.push(measurement_types::Column::NameEn.eq(measurement_type.as_str()));
        }
        if let Some(date) = self.date {
            conditions.push(measurements::Column::Date.eq(date));
        }
        if let Some(from) = self.date_from {
            conditions.push(measurements::Column::Date.gte(from));
        }
        if let Some(to) = self.date_to {
            conditions.push(measurements::Column::Date.lte(to));
        }
        if let Some(from) = self.hour_from {
            conditions.push(measurements::Column::Hour.gte(from));
        }
        if let Some(to) = self.hour_to {
            conditions.push(measurements::Column::Hour.lte(to));
        }

        conditions
    }

    /// Build the joined, filtered and paged select.
    #[must_use]
    pub fn query(&self) -> Select<measurements::Entity> {
        let mut query = measurements::Entity::find()
            .select_only()
            .columns([
                measurements::Column::Id,
                measurements::Column::Date,
                measurements::Column::Hour,
                measurements::Column::Value,
                measurements::Column::Unit,
                measurements::Column::Lat,
                measurements::Column::Lng,
            ])
            .column_as(stations::Column::NameEn, "station")
            .column_as(stations::Column::NameKanji, "station_kanji")
            .column_as(measurement_types::Column::NameEn, "measurement_type")
            .column_as(measurement_types::Column::NameKanji, "measurement_type_kanji")
            .join(JoinType::InnerJoin, measurements::Relation::Station.def())
            .join(JoinType::InnerJoin, measurements::Relation::MeasurementType.def());

        // No predicates means every row, not none
        let conditions = self.conditions();
        if !conditions.is_empty() {
            let all = conditions
                .into_iter()
                .fold(Condition::all(), |acc, expr| acc.add(expr));
            query = query.filter(all);
        }

        query
            .order_by_asc(measurements::Column::Id)
            .limit(self.limit)
            .offset(self.offset)
    }
}

/// Run the measurement query.
///
/// # Errors
///
/// Returns the underlying `DbErr` if the query fails.
pub async fn find_measurements<C: ConnectionTrait>(
    db: &C,
    filter: &MeasurementFilter,
) -> Result<Vec<MeasurementRow>, DbErr> {
    filter.query().into_model::<MeasurementRow>().all(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn params(pairs: &[(&str, &str)]) -> MeasurementParams {
        let mut p = MeasurementParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "station" => p.station = value,
                "type" => p.measurement_type = value,
                "date" => p.date = value,
                "date_from" => p.date_from = value,
                "date_to" => p.date_to = value,
                "hour_from" => p.hour_from = value,
                "hour_to" => p.hour_to = value,
                "limit" => p.limit = value,
                "offset" => p.offset = value,
                other => panic!("unknown parameter {other}"),
            }
        }
        p
    }

    fn sql(filter: &MeasurementFilter) -> String {
        filter.query().build(DbBackend::Postgres).to_string()
    }

    #[test]
    fn defaults_when_nothing_supplied() {
        let filter = MeasurementFilter::from_params(&MeasurementParams::default()).unwrap();
        assert_eq!(filter, MeasurementFilter::default());
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        for ok in ["20000101", "20250809", "21001231"] {
            assert!(MeasurementFilter::from_params(&params(&[("date", ok)])).is_ok());
        }
        for bad in ["19991231", "21010101", "0", "-20250809"] {
            let err = MeasurementFilter::from_params(&params(&[("date", bad)])).unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid date"), "{bad}");
        }
    }

    #[test]
    fn range_bounds_are_not_range_checked() {
        let filter =
            MeasurementFilter::from_params(&params(&[("date_from", "19990101")])).unwrap();
        assert_eq!(filter.date_from, Some(19_990_101));
    }

    #[test]
    fn limit_is_clamped() {
        let clamp = |raw: &str| {
            MeasurementFilter::from_params(&params(&[("limit", raw)]))
                .unwrap()
                .limit
        };
        assert_eq!(clamp("10000"), 500);
        assert_eq!(clamp("500"), 500);
        assert_eq!(clamp("25"), 25);
        assert_eq!(clamp("0"), 0);
        assert_eq!(clamp("-4"), 0);
    }

    #[test]
    fn negative_offset_saturates() {
        let filter = MeasurementFilter::from_params(&params(&[("offset", "-10")])).unwrap();
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn blank_text_filters_are_absent() {
        let filter =
            MeasurementFilter::from_params(&params(&[("station", ""), ("type", " ")])).unwrap();
        assert!(filter.conditions().is_empty());
    }

    #[test]
    fn one_condition_per_present_field() {
        let all = [
            ("station", "kashii"),
            ("type", "pm25"),
            ("date", "20250101"),
            ("date_from", "20240101"),
            ("date_to", "20251231"),
            ("hour_from", "0"),
            ("hour_to", "23"),
        ];

        for n in 0..=all.len() {
            let filter = MeasurementFilter::from_params(&params(&all[..n])).unwrap();
            assert_eq!(filter.conditions().len(), n);
        }
    }

    #[test]
    fn unconstrained_query_has_no_where_but_is_paged() {
        let sql = sql(&MeasurementFilter::default());
        assert!(!sql.contains("WHERE"), "{sql}");
        assert!(sql.contains("INNER JOIN \"stations\""), "{sql}");
        assert!(sql.contains("INNER JOIN \"measurement_types\""), "{sql}");
        assert!(sql.contains("ORDER BY \"measurements\".\"id\" ASC"), "{sql}");
        assert!(sql.contains("LIMIT 100"), "{sql}");
    }

    #[test]
    fn filters_are_conjunctive() {
        let filter = MeasurementFilter::from_params(&params(&[
            ("station", "tenjin"),
            ("type", "no2"),
            ("hour_from", "6"),
            ("limit", "20"),
            ("offset", "40"),
        ]))
        .unwrap();
        let sql = sql(&filter);

        assert!(sql.contains("\"stations\".\"name_en\" = 'tenjin'"), "{sql}");
        assert!(sql.contains("AND \"measurement_types\".\"name_en\" = 'no2'"), "{sql}");
        assert!(sql.contains("AND \"measurements\".\"hour\" >= 6"), "{sql}");
        assert!(sql.contains("LIMIT 20 OFFSET 40"), "{sql}");
    }
}
