use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use super::model::{CellValue, Column, ColumnKind, Dataset};

/// Why a column could not be coerced to dates.
#[derive(Debug, Error, PartialEq)]
pub enum DateParseError {
    #[error("row {row}: '{value}' is not a recognised date")]
    Unparseable { row: usize, value: String },
    #[error("row {row}: {kind} cell cannot be read as a date")]
    NotText { row: usize, kind: &'static str },
    #[error("column has no values")]
    Empty,
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日", "%m/%d/%Y"];

// ---------------------------------------------------------------------------
// Temporal coercion
// ---------------------------------------------------------------------------

/// Coerce every column whose name contains a date token to a temporal column.
///
/// Columns that fail to parse are left exactly as loaded.
pub fn coerce_temporal_columns(dataset: &mut Dataset, date_tokens: &[String]) {
    for column in &mut dataset.columns {
        if column.kind == ColumnKind::Temporal || !is_date_like(&column.name, date_tokens) {
            continue;
        }
        match parse_column(&column.values) {
            Ok(values) => {
                log::info!("Column '{}' coerced to dates", column.name);
                *column = Column::new(std::mem::take(&mut column.name), values);
            }
            Err(e) => log::debug!("Column '{}' kept as {}: {e}", column.name, column.kind),
        }
    }
}

/// Whether a column name contains one of the tokens (case-insensitive).
pub fn is_date_like(name: &str, date_tokens: &[String]) -> bool {
    let lower = name.to_lowercase();
    date_tokens
        .iter()
        .any(|token| lower.contains(&token.to_lowercase()))
}

fn parse_column(values: &[CellValue]) -> Result<Vec<CellValue>, DateParseError> {
    let mut any = false;
    let parsed = values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            if value.is_null() {
                return Ok(CellValue::Null);
            }
            any = true;
            match value {
                CellValue::DateTime(dt) => Ok(CellValue::DateTime(*dt)),
                CellValue::Text(s) => parse_datetime(s)
                    .map(CellValue::DateTime)
                    .ok_or_else(|| DateParseError::Unparseable {
                        row,
                        value: s.clone(),
                    }),
                CellValue::Integer(_) | CellValue::Float(_) => {
                    Err(DateParseError::NotText { row, kind: "numeric" })
                }
                CellValue::Bool(_) => Err(DateParseError::NotText { row, kind: "boolean" }),
                CellValue::Null => Ok(CellValue::Null),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    if !any {
        return Err(DateParseError::Empty);
    }
    Ok(parsed)
}

/// Best-effort parse of a single date or date-time string.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn tokens() -> Vec<String> {
        ViewerConfig::default().date_tokens
    }

    #[test]
    fn valid_dates_become_temporal() {
        let mut ds = Dataset::from_columns(vec![Column::new(
            "Order Date",
            vec![text("2024-01-05"), CellValue::Null, text("2024/02/10 13:30")],
        )]);
        coerce_temporal_columns(&mut ds, &tokens());

        let col = &ds.columns[0];
        assert_eq!(col.kind, ColumnKind::Temporal);
        assert_eq!(col.values[1], CellValue::Null);
        let expected = NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap();
        assert_eq!(col.values[2], CellValue::DateTime(expected));
    }

    #[test]
    fn japanese_day_token_is_recognised() {
        let mut ds = Dataset::from_columns(vec![Column::new(
            "売上日",
            vec![text("2024年3月1日"), text("2024-03-02")],
        )]);
        coerce_temporal_columns(&mut ds, &tokens());
        assert_eq!(ds.columns[0].kind, ColumnKind::Temporal);
    }

    #[test]
    fn one_bad_value_leaves_column_unchanged() {
        let original = Column::new("update_date", vec![text("2024-01-01"), text("soon")]);
        let mut ds = Dataset::from_columns(vec![original.clone()]);
        coerce_temporal_columns(&mut ds, &tokens());
        assert_eq!(ds.columns[0], original);
    }

    #[test]
    fn numeric_and_empty_columns_are_not_dates() {
        let numeric = Column::new("date_key", vec![CellValue::Integer(20240101), CellValue::Integer(20240102)]);
        let empty = Column::new("DATE", vec![CellValue::Null, CellValue::Null]);
        let mut ds = Dataset::from_columns(vec![numeric.clone(), empty.clone()]);
        coerce_temporal_columns(&mut ds, &tokens());
        assert_eq!(ds.columns, vec![numeric, empty]);
    }

    #[test]
    fn other_columns_are_not_touched() {
        let col = Column::new("created", vec![text("2024-01-01")]);
        let mut ds = Dataset::from_columns(vec![col.clone()]);
        coerce_temporal_columns(&mut ds, &tokens());
        assert_eq!(ds.columns[0], col);
    }

    #[test]
    fn rfc3339_is_converted_to_utc() {
        let dt = parse_datetime("2024-06-01T09:00:00+09:00").unwrap();
        assert_eq!(dt.to_string(), "2024-06-01 00:00:00");
        assert!(parse_datetime("06/30/2024").is_some());
        assert!(parse_datetime("June").is_none());
    }
}
