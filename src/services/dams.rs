//! Filter normalization and query building for `GET /dams`.
//!
//! The `dam` parameter is resolved against the dam catalog first: a numeric
//! term matches by id, and any term matches as a case-insensitive substring
//! of the English name. Every matching dam is kept. When a term matches no
//! dam the fact table is never queried.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, SimpleExpr},
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::params::{non_empty, parse_int, saturate};
use crate::entity::{dam_levels, dams};
use crate::error::{AppError, AppResult};

pub const DEFAULT_LIMIT: u64 = 100;

/// Raw `/dams` query string.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DamParams {
    /// Dam id, or a fragment of its English name (case-insensitive), e.g. `Ino`
    pub dam: Option<String>,
    /// Observation day in UTC, exactly 8 digits (YYYYMMDD), e.g. `20250809`
    pub date: Option<String>,
    /// Maximum number of rows, default 100
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamFilter {
    pub dam: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: u64,
}

impl Default for DamFilter {
    fn default() -> Self {
        Self {
            dam: None,
            date: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct DamIdRow {
    id: i32,
}

/// Dam level joined with the dam's names.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct DamLevelRow {
    pub id: i32,
    pub dam_id: i32,
    pub dam_name: String,
    pub dam_name_jp: String,
    pub observation_time: DateTimeWithTimeZone,
    pub dam_value: i32,
}

/// Parse a strict `YYYYMMDD` day.
///
/// # Errors
///
/// Returns `AppError::Validation` unless `raw` is exactly eight digits naming a real date.
pub fn parse_day(raw: &str) -> AppResult<NaiveDate> {
    let invalid = || AppError::Validation("Invalid date format".to_string());

    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let year = raw[0..4].parse().map_err(|_| invalid())?;
    let month = raw[4..6].parse().map_err(|_| invalid())?;
    let day = raw[6..8].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Half-open UTC day: `[00:00 of day, 00:00 of next day)`.
#[must_use]
pub fn day_range(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Escape `LIKE` metacharacters so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl DamFilter {
    /// Normalize raw parameters.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a malformed `date` or a non-integer `limit`.
    pub fn from_params(params: &DamParams) -> AppResult<Self> {
        let date = non_empty(params.date.as_deref()).map(parse_day).transpose()?;
        let limit = parse_int::<i64>("limit", params.limit.as_deref())?.map_or(DEFAULT_LIMIT, saturate);

        Ok(Self {
            dam: non_empty(params.dam.as_deref()).map(str::to_string),
            date,
            limit,
        })
    }

    #[must_use]
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.date.map(day_range)
    }

    /// Predicates on the fact table, given the resolved dam ids (if a dam was requested).
    #[must_use]
    pub fn conditions(&self, dam_ids: Option<&[i32]>) -> Vec<SimpleExpr> {
        let mut conditions = Vec::new();

        if let Some(ids) = dam_ids {
            conditions.push(dam_levels::Column::DamId.is_in(ids.iter().copied()));
        }
        if let Some((start, end)) = self.date_range() {
            conditions.push(dam_levels::Column::ObservationTime.gte(start));
            conditions.push(dam_levels::Column::ObservationTime.lt(end));
        }

        conditions
    }

    /// Most recent observations first, limited to `self.limit` rows.
    #[must_use]
    pub fn query(&self, dam_ids: Option<&[i32]>) -> Select<dam_levels::Entity> {
        let mut query = dam_levels::Entity::find()
            .select_only()
            .columns([
                dam_levels::Column::Id,
                dam_levels::Column::DamId,
                dam_levels::Column::ObservationTime,
                dam_levels::Column::DamValue,
            ])
            .column_as(dams::Column::EnName, "dam_name")
            .column_as(dams::Column::JpName, "dam_name_jp")
            .join(JoinType::InnerJoin, dam_levels::Relation::Dam.def());

        let conditions = self.conditions(dam_ids);
        if !conditions.is_empty() {
            let all = conditions
                .into_iter()
                .fold(Condition::all(), |acc, expr| acc.add(expr));
            query = query.filter(all);
        }

        query
            .order_by_desc(dam_levels::Column::ObservationTime)
            .order_by_desc(dam_levels::Column::Id)
            .limit(self.limit)
    }
}

/// Id named by a numeric term. Integral decimals such as `3.0` or `1e1` count.
fn numeric_id(term: &str) -> Option<i32> {
    if let Ok(id) = term.parse::<i32>() {
        return Some(id);
    }
    let value = term.parse::<f64>().ok().filter(|v| v.is_finite() && v.fract() == 0.0)?;
    if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(value as i32)
}

/// Id match (numeric terms only) OR case-insensitive English-name substring match.
#[must_use]
pub fn dam_lookup_condition(term: &str) -> Condition {
    let mut condition = Condition::any();

    if let Some(id) = numeric_id(term) {
        condition = condition.add(dams::Column::Id.eq(id));
    }

    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    condition.add(Expr::cust_with_values("LOWER(en_name) LIKE $1", [pattern]))
}

/// Ids of every dam matching `term`, ascending.
///
/// # Errors
///
/// Returns the underlying `DbErr` if the lookup fails.
pub async fn resolve_dam_ids<C: ConnectionTrait>(db: &C, term: &str) -> Result<Vec<i32>, DbErr> {
    let rows = dams::Entity::find()
        .select_only()
        .column(dams::Column::Id)
        .filter(dam_lookup_condition(term))
        .order_by_asc(dams::Column::Id)
        .into_model::<DamIdRow>()
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|r| r.id).collect())
}

/// Resolve the dam term (if any) and fetch matching levels.
///
/// # Errors
///
/// Returns the underlying `DbErr` if either query fails.
pub async fn find_dam_levels<C: ConnectionTrait>(
    db: &C,
    filter: &DamFilter,
) -> Result<Vec<DamLevelRow>, DbErr> {
    let dam_ids = match &filter.dam {
        Some(term) => {
            let ids = resolve_dam_ids(db, term).await?;
            if ids.is_empty() {
                tracing::debug!(dam = %term, "No dam matches term");
                return Ok(Vec::new());
            }
            if ids.len() > 1 {
                tracing::debug!(dam = %term, matches = ids.len(), "Dam term is ambiguous, using all matches");
            }
            Some(ids)
        }
        None => None,
    };

    filter
        .query(dam_ids.as_deref())
        .into_model::<DamLevelRow>()
        .all(db)
        .await
}
