//! Dam water-level import (`fukuoka_9_damu_data.csv`).
//!
//! The file has one observation-time column `観測時刻` and one integer column
//! per dam, headed by the dam's Japanese name. Every known dam column becomes
//! one `dam_levels` row per CSV row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{ActiveValue::NotSet, ConnectionTrait, EntityTrait, Set, sea_query::OnConflict};
use std::collections::HashMap;
use std::path::Path;

use super::{CsvTable, ImportError, ImportReport, cell, insert_batches, labels, line_of};
use crate::entity::{dam_levels, dams};

pub const DEFAULT_FILE: &str = "fukuoka_9_damu_data.csv";

pub const TIME_COLUMN: &str = "観測時刻";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// One value for one dam at one observation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamObservation {
    pub dam: String,
    pub observed_at: DateTime<Utc>,
    pub value: i32,
}

/// Parse an observation time. The wall-clock value is taken as UTC.
#[must_use]
pub fn parse_observation_time(raw: &str) -> Option<DateTime<Utc>> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Integer dam value; decimals are truncated toward zero.
#[must_use]
pub fn parse_dam_value(raw: &str) -> Option<i32> {
    if let Ok(value) = raw.parse::<i32>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok().filter(|v| v.is_finite())?.trunc();
    if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(value as i32)
}

/// Known dam columns in the header, as `(index, japanese name)`.
#[must_use]
pub fn dam_columns(table: &CsvTable) -> Vec<(usize, String)> {
    table
        .headers()
        .enumerate()
        .filter(|(_, name)| labels::is_known_dam(name))
        .map(|(idx, name)| (idx, name.to_string()))
        .collect()
}

/// Parse every row into observations.
///
/// Rows with an empty time and empty or unreadable cells are skipped.
///
/// # Errors
///
/// `ImportError::MissingColumn` without a time column, and
/// `ImportError::InvalidTimestamp` for a time that matches no known format.
pub fn parse_observations(
    table: &CsvTable,
    columns: &[(usize, String)],
) -> Result<Vec<DamObservation>, ImportError> {
    let time_idx = table.require(TIME_COLUMN)?;
    let mut observations = Vec::with_capacity(table.rows().len() * columns.len());

    for row in table.rows() {
        let raw_time = cell(row, time_idx);
        if raw_time.is_empty() {
            continue;
        }
        let observed_at =
            parse_observation_time(raw_time).ok_or_else(|| ImportError::InvalidTimestamp {
                line: line_of(row),
                value: raw_time.to_string(),
            })?;

        for (idx, dam) in columns {
            let raw = cell(row, *idx);
            let Some(value) = parse_dam_value(raw) else {
                if !raw.is_empty() {
                    tracing::debug!(line = line_of(row), dam = %dam, value = raw, "Unreadable dam value, skipping");
                }
                continue;
            };
            observations.push(DamObservation {
                dam: dam.clone(),
                observed_at,
                value,
            });
        }
    }

    Ok(observations)
}

/// Insert any new dams, then map every dam's Japanese name to its id.
async fn seed_dams<C: ConnectionTrait>(
    db: &C,
    columns: &[(usize, String)],
) -> Result<HashMap<String, i32>, ImportError> {
    for (_, jp_name) in columns {
        let dam = dams::ActiveModel {
            id: NotSet,
            jp_name: Set(jp_name.clone()),
            en_name: Set(labels::dam_english_name(jp_name).to_string()),
        };
        dams::Entity::insert(dam)
            .on_conflict(OnConflict::column(dams::Column::JpName).do_nothing().to_owned())
            .exec_without_returning(db)
            .await?;
    }

    let ids = dams::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.jp_name, d.id))
        .collect();
    Ok(ids)
}

#[must_use]
pub fn to_active_models(
    observations: &[DamObservation],
    dam_ids: &HashMap<String, i32>,
) -> Vec<dam_levels::ActiveModel> {
    observations
        .iter()
        .filter_map(|obs| {
            let dam_id = *dam_ids.get(&obs.dam)?;
            Some(dam_levels::ActiveModel {
                id: NotSet,
                dam_id: Set(dam_id),
                observation_time: Set(obs.observed_at.fixed_offset()),
                dam_value: Set(obs.value),
            })
        })
        .collect()
}

/// Import already-read Shift_JIS bytes.
///
/// # Errors
///
/// Any decode, parse or database failure aborts the import.
pub async fn import_bytes<C: ConnectionTrait>(
    db: &C,
    bytes: &[u8],
    batch_size: usize,
) -> Result<ImportReport, ImportError> {
    let text = super::decode_shift_jis(bytes);
    let table = CsvTable::parse(&text)?;
    let columns = dam_columns(&table);
    if columns.is_empty() {
        tracing::warn!("No known dam columns in header");
    }

    let observations = parse_observations(&table, &columns)?;
    tracing::info!(
        rows = table.rows().len(),
        dams = columns.len(),
        observations = observations.len(),
        "Parsed dam-level rows"
    );

    let dam_ids = seed_dams(db, &columns).await?;
    tracing::info!(count = columns.len(), "Dams upserted");

    let rows = to_active_models(&observations, &dam_ids);
    let conflict = OnConflict::columns([
        dam_levels::Column::DamId,
        dam_levels::Column::ObservationTime,
    ])
    .do_nothing()
    .to_owned();

    Ok(insert_batches(db, rows, &conflict, batch_size, "dam_levels").await?)
}

/// Import a dam-level CSV file.
///
/// # Errors
///
/// See [`import_bytes`]; also fails if the file cannot be read.
pub async fn import_file<C: ConnectionTrait>(
    db: &C,
    path: &Path,
    batch_size: usize,
) -> Result<ImportReport, ImportError> {
    tracing::info!(path = %path.display(), "Importing dam-level CSV");
    let bytes = super::read_file(path).await?;
    import_bytes(db, &bytes, batch_size).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn observation_time_formats() {
        let expected = Utc.with_ymd_and_hms(2023, 4, 1, 9, 30, 0).unwrap();
        assert_eq!(parse_observation_time("2023/04/01 09:30"), Some(expected));
        assert_eq!(parse_observation_time("2023/4/1 9:30:00"), Some(expected));
        assert_eq!(parse_observation_time("2023-04-01 09:30"), Some(expected));
        assert_eq!(
            parse_observation_time("2023/04/01"),
            Some(Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_observation_time("yesterday"), None);
        assert_eq!(parse_observation_time("2023/13/01 00:00"), None);
    }

    #[test]
    fn dam_values() {
        assert_eq!(parse_dam_value("85"), Some(85));
        assert_eq!(parse_dam_value("-3"), Some(-3));
        assert_eq!(parse_dam_value("85.9"), Some(85));
        assert_eq!(parse_dam_value(""), None);
        assert_eq!(parse_dam_value("-"), None);
        assert_eq!(parse_dam_value("1e20"), None);
    }

    #[test]
    fn only_known_dam_columns() {
        let table = CsvTable::parse("観測時刻,猪野ダム,備考,南畑ダム\n").unwrap();
        let columns = dam_columns(&table);
        assert_eq!(
            columns,
            vec![(1, "猪野ダム".to_string()), (3, "南畑ダム".to_string())]
        );
    }

    #[test]
    fn parses_observations() {
        let csv = "観測時刻,猪野ダム,南畑ダム\n\
                   2023/04/01 01:00,90,88.5\n\
                   ,1,2\n\
                   2023/04/01 02:00,,87\n";
        let table = CsvTable::parse(csv).unwrap();
        let columns = dam_columns(&table);

        let observations = parse_observations(&table, &columns).unwrap();

        assert_eq!(observations.len(), 3);
        assert_eq!(observations[0].dam, "猪野ダム");
        assert_eq!(observations[0].value, 90);
        assert_eq!(observations[1].value, 88);
        assert_eq!(observations[2].dam, "南畑ダム");
        assert_eq!(
            observations[2].observed_at,
            Utc.with_ymd_and_hms(2023, 4, 1, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn bad_time_names_the_line() {
        let table = CsvTable::parse("観測時刻,猪野ダム\n2023/04/01 01:00,90\nnoon,91\n").unwrap();
        let columns = dam_columns(&table);

        let err = parse_observations(&table, &columns).unwrap_err();
        assert!(matches!(
            err,
            ImportError::InvalidTimestamp { line: 3, ref value } if value == "noon"
        ));
    }

    #[test]
    fn unknown_dams_are_dropped() {
        let observed_at = Utc.with_ymd_and_hms(2023, 4, 1, 1, 0, 0).unwrap();
        let observations = vec![
            DamObservation {
                dam: "猪野ダム".into(),
                observed_at,
                value: 90,
            },
            DamObservation {
                dam: "南畑ダム".into(),
                observed_at,
                value: 88,
            },
        ];
        let ids = HashMap::from([("猪野ダム".to_string(), 7)]);

        let rows = to_active_models(&observations, &ids);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].dam_id, Set(7));
        assert_eq!(rows[0].observation_time, Set(observed_at.fixed_offset()));
    }
}
