//! Offline CSV importers for the Fukuoka open-data files.
//!
//! Both pipelines have the same shape: decode Shift_JIS bytes, parse the CSV
//! by header label, upsert dimension rows, reload them into a label → id map,
//! then insert fact rows in batches with `ON CONFLICT DO NOTHING` so a rerun
//! over the same file adds nothing.

pub mod air_quality;
pub mod dam_levels;
pub mod labels;

use csv::StringRecord;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, sea_query::OnConflict,
};
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Line {line}: invalid observation time '{value}'")]
    InvalidTimestamp { line: u64, value: String },
}

/// Outcome of a fact-table load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Fact rows built from the file
    pub prepared: u64,
    /// Rows actually written
    pub inserted: u64,
    /// Rows dropped by `ON CONFLICT DO NOTHING`
    pub skipped: u64,
}

pub async fn read_file(path: &Path) -> Result<Vec<u8>, ImportError> {
    tokio::fs::read(path).await.map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode Shift_JIS, replacing malformed sequences.
#[must_use]
pub fn decode_shift_jis(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(bytes);
    if had_errors {
        tracing::warn!("Input contained invalid Shift_JIS sequences; replaced with U+FFFD");
    }
    text.into_owned()
}

/// Header-keyed CSV contents.
#[derive(Debug)]
pub struct CsvTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl CsvTable {
    /// Parse CSV text with a header row. Fields are trimmed, blank rows dropped,
    /// and rows may have fewer fields than the header.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Csv` on malformed CSV.
    pub fn parse(text: &str) -> Result<Self, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push(record);
        }

        Ok(Self { headers, rows })
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// # Errors
    ///
    /// Returns `ImportError::MissingColumn` if no header equals `name`.
    pub fn require(&self, name: &str) -> Result<usize, ImportError> {
        self.column(name)
            .ok_or_else(|| ImportError::MissingColumn(name.to_string()))
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    #[must_use]
    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }
}

/// Field by index, empty when the row is short.
pub(crate) fn cell(row: &StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or("")
}

/// 1-based source line of a record, for error messages.
pub(crate) fn line_of(row: &StringRecord) -> u64 {
    row.position().map_or(0, csv::Position::line)
}

/// Insert `rows` in chunks of `batch_size`, skipping conflicts.
///
/// Batches run sequentially; each is its own statement.
///
/// # Errors
///
/// Returns the first `DbErr`; earlier batches stay committed.
pub async fn insert_batches<A, C>(
    db: &C,
    rows: Vec<A>,
    on_conflict: &OnConflict,
    batch_size: usize,
    table: &'static str,
) -> Result<ImportReport, DbErr>
where
    A: ActiveModelTrait,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    let total = rows.len();
    let mut report = ImportReport {
        prepared: total as u64,
        ..ImportReport::default()
    };
    let mut processed = 0;

    for chunk in rows.chunks(batch_size.max(1)) {
        let inserted = <A::Entity as EntityTrait>::insert_many(chunk.to_vec())
            .on_conflict(on_conflict.clone())
            .exec_without_returning(db)
            .await?;

        processed += chunk.len();
        report.inserted += inserted;
        tracing::info!(
            table,
            processed,
            total,
            inserted = report.inserted,
            "Inserted batch"
        );
    }

    report.skipped = report.prepared - report.inserted;
    Ok(report)
}
