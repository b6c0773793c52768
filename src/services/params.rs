use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Trimmed value, or `None` when the parameter is absent or blank.
pub(crate) fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an optional integer parameter. Blank counts as absent.
pub(crate) fn parse_int<T: FromStr>(name: &str, raw: Option<&str>) -> AppResult<Option<T>> {
    non_empty(raw)
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| AppError::Validation(format!("Invalid {name}")))
        })
        .transpose()
}

/// Negative page sizes and offsets are not rejected; they saturate to zero.
pub(crate) fn saturate(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
