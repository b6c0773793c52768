//! Hourly air-quality import (`kankyodata48.csv`).
//!
//! One CSV row holds a day of readings for one station and measurement type,
//! with a value column per hour `測定値(1時)` .. `測定値(24時)`. Each row
//! expands into 24 `measurements` rows; `*` or empty cells become null.

use chrono::NaiveDate;
use sea_orm::{ActiveValue::NotSet, ConnectionTrait, EntityTrait, Set, sea_query::OnConflict};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use super::{CsvTable, ImportError, ImportReport, cell, insert_batches, labels, line_of};
use crate::entity::{measurement_types, measurements, stations};

pub const DEFAULT_FILE: &str = "kankyodata48.csv";

pub const DATE_COLUMN: &str = "年月日";
pub const STATION_COLUMN: &str = "測定局名称";
pub const TYPE_COLUMN: &str = "測定項目名称";
pub const LAT_COLUMN: &str = "緯度";
pub const LNG_COLUMN: &str = "経度";
pub const UNIT_COLUMN: &str = "単位";

pub const HOURS_PER_DAY: usize = 24;

#[must_use]
pub fn hour_column(hour: usize) -> String {
    format!("測定値({hour}時)")
}

/// One parsed CSV row: a day of hourly values for a station and measurement type.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: i32,
    pub station: String,
    pub measurement_type: String,
    pub lat: f64,
    pub lng: f64,
    pub unit: String,
    /// Index 0 is hour 1
    pub values: [Option<f64>; HOURS_PER_DAY],
}

/// `YYYYMMDD`, or `YYYY/MM/DD` (also with `-`), as a `YYYYMMDD` integer.
#[must_use]
pub fn parse_date_key(raw: &str) -> Option<i32> {
    let date = if raw.contains(['/', '-']) {
        let mut parts = raw.split(['/', '-']).map(str::parse::<u32>);
        let (Some(Ok(y)), Some(Ok(m)), Some(Ok(d)), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };
        NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, m, d)?
    } else {
        NaiveDate::parse_from_str(raw, "%Y%m%d").ok()?
    };

    date.format("%Y%m%d").to_string().parse().ok()
}

/// Hourly cell value. `*`, empty and non-numeric cells are missing readings.
#[must_use]
pub fn parse_reading(raw: &str) -> Option<f64> {
    match raw {
        "" | "*" => None,
        other => other.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

/// Parse every data row.
///
/// # Errors
///
/// Returns `ImportError::MissingColumn` when a fixed column is absent, and
/// `ImportError::InvalidValue` for an unreadable date or coordinate.
pub fn parse_records(table: &CsvTable) -> Result<Vec<DailyRecord>, ImportError> {
    let date_idx = table.require(DATE_COLUMN)?;
    let station_idx = table.require(STATION_COLUMN)?;
    let type_idx = table.require(TYPE_COLUMN)?;
    let lat_idx = table.require(LAT_COLUMN)?;
    let lng_idx = table.require(LNG_COLUMN)?;
    let unit_idx = table.require(UNIT_COLUMN)?;
    let hour_idx: Vec<Option<usize>> = (1..=HOURS_PER_DAY)
        .map(|hour| table.column(&hour_column(hour)))
        .collect();

    table
        .rows()
        .iter()
        .map(|row| {
            let invalid = |column: &str, value: &str| ImportError::InvalidValue {
                line: line_of(row),
                column: column.to_string(),
                value: value.to_string(),
            };
            let float = |idx: usize, column: &str| {
                let raw = cell(row, idx);
                raw.parse::<f64>().map_err(|_| invalid(column, raw))
            };

            let raw_date = cell(row, date_idx);
            let date = parse_date_key(raw_date).ok_or_else(|| invalid(DATE_COLUMN, raw_date))?;

            let mut values = [None; HOURS_PER_DAY];
            for (slot, idx) in values.iter_mut().zip(&hour_idx) {
                *slot = idx.and_then(|i| parse_reading(cell(row, i)));
            }

            Ok(DailyRecord {
                date,
                station: cell(row, station_idx).to_string(),
                measurement_type: cell(row, type_idx).to_string(),
                lat: float(lat_idx, LAT_COLUMN)?,
                lng: float(lng_idx, LNG_COLUMN)?,
                unit: cell(row, unit_idx).to_string(),
                values,
            })
        })
        .collect()
}

/// Insert any new stations, then map every station's kanji name to its id.
async fn seed_stations<C: ConnectionTrait>(
    db: &C,
    names: &BTreeSet<&str>,
) -> Result<HashMap<String, i32>, ImportError> {
    for &kanji in names {
        let station = stations::ActiveModel {
            id: NotSet,
            name_en: Set(labels::station_code(kanji).to_string()),
            name_kanji: Set(kanji.to_string()),
        };
        stations::Entity::insert(station)
            .on_conflict(
                OnConflict::column(stations::Column::NameKanji)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    let ids = stations::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.name_kanji, s.id))
        .collect();
    Ok(ids)
}

async fn seed_measurement_types<C: ConnectionTrait>(
    db: &C,
    names: &BTreeSet<&str>,
) -> Result<HashMap<String, i32>, ImportError> {
    for &kanji in names {
        let measurement_type = measurement_types::ActiveModel {
            id: NotSet,
            name_en: Set(labels::measurement_type_code(kanji).to_string()),
            name_kanji: Set(kanji.to_string()),
        };
        measurement_types::Entity::insert(measurement_type)
            .on_conflict(
                OnConflict::column(measurement_types::Column::NameKanji)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    let ids = measurement_types::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.name_kanji, t.id))
        .collect();
    Ok(ids)
}

/// Expand daily records into hourly fact rows (hour 1..=24).
///
/// Records whose station or type has no id are dropped.
#[must_use]
pub fn expand_records(
    records: &[DailyRecord],
    station_ids: &HashMap<String, i32>,
    type_ids: &HashMap<String, i32>,
) -> Vec<measurements::ActiveModel> {
    let mut rows = Vec::with_capacity(records.len() * HOURS_PER_DAY);

    for record in records {
        let (Some(&station_id), Some(&type_id)) = (
            station_ids.get(&record.station),
            type_ids.get(&record.measurement_type),
        ) else {
            tracing::warn!(
                station = %record.station,
                measurement_type = %record.measurement_type,
                date = record.date,
                "No dimension id for record, skipping"
            );
            continue;
        };

        for (hour, value) in (1..).zip(record.values) {
            rows.push(measurements::ActiveModel {
                id: NotSet,
                date: Set(record.date),
                station_id: Set(station_id),
                measurement_type_id: Set(type_id),
                lat: Set(record.lat),
                lng: Set(record.lng),
                unit: Set(record.unit.clone()),
                hour: Set(hour),
                value: Set(value),
            });
        }
    }

    rows
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
    let records = parse_records(&table)?;
    tracing::info!(rows = records.len(), "Parsed air-quality rows");

    let station_names: BTreeSet<&str> = records.iter().map(|r| r.station.as_str()).collect();
    let station_ids = seed_stations(db, &station_names).await?;
    tracing::info!(count = station_names.len(), "Stations upserted");

    let type_names: BTreeSet<&str> = records
        .iter()
        .map(|r| r.measurement_type.as_str())
        .collect();
    let type_ids = seed_measurement_types(db, &type_names).await?;
    tracing::info!(count = type_names.len(), "Measurement types upserted");

    let rows = expand_records(&records, &station_ids, &type_ids);
    let conflict = OnConflict::columns([
        measurements::Column::Date,
        measurements::Column::StationId,
        measurements::Column::MeasurementTypeId,
        measurements::Column::Hour,
    ])
    .do_nothing()
    .to_owned();

    Ok(insert_batches(db, rows, &conflict, batch_size, "measurements").await?)
}

/// Import an air-quality CSV file.
///
/// # Errors
///
/// See [`import_bytes`]; also fails if the file cannot be read.
pub async fn import_file<C: ConnectionTrait>(
    db: &C,
    path: &Path,
    batch_size: usize,
) -> Result<ImportReport, ImportError> {
    tracing::info!(path = %path.display(), "Importing air-quality CSV");
    let bytes = super::read_file(path).await?;
    import_bytes(db, &bytes, batch_size).await
}
