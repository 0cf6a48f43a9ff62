use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use calamine::{Data, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, Dataset};

/// Cell texts treated as missing in CSV input: the usual NA spellings of
/// dataframe libraries.  A lone `-` is a value.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`                            – header row plus records
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first sheet, first row is the header
/// * `.json`                           – `[{ "col": value, ... }, ...]`
/// * `.parquet`                        – flat primitive columns
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, then one record per row.  Each column is
/// typed as a whole: integer, float, boolean, or text.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, cells) in raw.iter_mut().enumerate() {
            cells.push(record.get(col_idx).unwrap_or("").to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| Column::new(name, type_text_column(&cells)))
        .collect();
    Ok(Dataset::from_columns(columns))
}

/// Pick the narrowest storage type every non-missing cell fits.
fn type_text_column(cells: &[String]) -> Vec<CellValue> {
    let present = || cells.iter().map(|s| s.trim()).filter(|s| !is_null_token(s));

    if present().all(|s| s.parse::<i64>().is_ok()) {
        return map_cells(cells, |s| s.parse().ok().map(CellValue::Integer));
    }
    if present().all(|s| s.parse::<f64>().is_ok()) {
        return map_cells(cells, |s| s.parse().ok().map(CellValue::Float));
    }
    if present().all(|s| parse_bool(s).is_some()) {
        return map_cells(cells, |s| parse_bool(s).map(CellValue::Bool));
    }
    map_cells(cells, |s| Some(CellValue::Text(s.to_string())))
}

fn map_cells(cells: &[String], parse: impl Fn(&str) -> Option<CellValue>) -> Vec<CellValue> {
    cells
        .iter()
        .map(|s| {
            let s = s.trim();
            if is_null_token(s) {
                CellValue::Null
            } else {
                parse(s).unwrap_or(CellValue::Null)
            }
        })
        .collect()
}

fn is_null_token(s: &str) -> bool {
    NULL_TOKENS.contains(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Read the first worksheet.  Cells keep their spreadsheet storage type, so a
/// column mixing numbers and text stays mixed.
fn load_spreadsheet(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Dataset::default());
    };
    // Blank header cells are named by `Dataset::from_columns`.
    let headers: Vec<String> = header
        .iter()
        .map(|cell| match cell {
            Data::Empty => String::new(),
            other => other.to_string(),
        })
        .collect();

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col_idx, cells) in values.iter_mut().enumerate() {
            cells.push(row.get(col_idx).map_or(CellValue::Null, spreadsheet_cell));
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, cells)| Column::new(name, cells))
        .collect();
    Ok(Dataset::from_columns(columns))
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(CellValue::Null, CellValue::DateTime),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "region": "west", "sales": 120.5, "order_date": "2024-01-03" },
///   ...
/// ]
/// ```
///
/// Columns are ordered by first appearance; keys missing from a record are null.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values = records
                .iter()
                .map(|rec| rec.get(&name).map_or(CellValue::Null, json_to_cell))
                .collect();
            Column::new(name, values)
        })
        .collect();
    Ok(Dataset::from_columns(columns))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).  Nested columns are rendered as text.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, cells) in values.iter_mut().enumerate() {
            let col = batch.column(col_idx);
            cells.extend((0..batch.num_rows()).map(|row| arrow_cell(col, row)));
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, cells)| Column::new(name, cells))
        .collect();
    Ok(Dataset::from_columns(columns))
}

// -- Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int16 => downcast(any, |a: &Int16Array| CellValue::Integer(a.value(row).into())),
        DataType::Int32 => downcast(any, |a: &Int32Array| CellValue::Integer(a.value(row).into())),
        DataType::Int64 => downcast(any, |a: &Int64Array| CellValue::Integer(a.value(row))),
        DataType::UInt32 => downcast(any, |a: &UInt32Array| CellValue::Integer(a.value(row).into())),
        DataType::UInt64 => downcast(any, |a: &UInt64Array| {
            i64::try_from(a.value(row)).map_or(CellValue::Float(a.value(row) as f64), CellValue::Integer)
        }),
        DataType::Float32 => downcast(any, |a: &Float32Array| CellValue::Float(a.value(row).into())),
        DataType::Float64 => downcast(any, |a: &Float64Array| CellValue::Float(a.value(row))),
        DataType::Boolean => downcast(any, |a: &BooleanArray| CellValue::Bool(a.value(row))),
        DataType::Date32 => datetime_cell(col.as_primitive::<Date32Type>().value_as_datetime(row)),
        DataType::Date64 => datetime_cell(col.as_primitive::<Date64Type>().value_as_datetime(row)),
        DataType::Timestamp(unit, _) => datetime_cell(match unit {
            TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value_as_datetime(row),
            TimeUnit::Millisecond => {
                col.as_primitive::<TimestampMillisecondType>().value_as_datetime(row)
            }
            TimeUnit::Microsecond => {
                col.as_primitive::<TimestampMicrosecondType>().value_as_datetime(row)
            }
            TimeUnit::Nanosecond => {
                col.as_primitive::<TimestampNanosecondType>().value_as_datetime(row)
            }
        }),
        other => CellValue::Text(format!("{other:?}")),
    }
}

fn downcast<A: 'static>(any: &dyn std::any::Any, read: impl Fn(&A) -> CellValue) -> CellValue {
    any.downcast_ref::<A>().map_or(CellValue::Null, read)
}

fn datetime_cell(dt: Option<chrono::NaiveDateTime>) -> CellValue {
    dt.map_or(CellValue::Null, CellValue::DateTime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnKind;
    use std::io::Write;

    fn write_temp(ext: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(ext).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_columns_are_typed_as_a_whole() {
        let file = write_temp(
            ".csv",
            "region,sales,units,flag,note\nwest,10,1,true,a\neast,20.5,,false,\nwest,NA,3,TRUE,7\n",
        );
        let ds = load_file(file.path()).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.column_names(), vec!["region", "sales", "units", "flag", "note"]);
        let kinds: Vec<ColumnKind> = ds.columns.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Categorical,
                ColumnKind::Numeric,
                ColumnKind::Numeric,
                ColumnKind::Categorical,
                ColumnKind::Categorical,
            ]
        );
        let sales = ds.column("sales").unwrap();
        assert_eq!(sales.values, vec![CellValue::Float(10.0), CellValue::Float(20.5), CellValue::Null]);
        let units = ds.column("units").unwrap();
        assert_eq!(units.values[1], CellValue::Null);
        assert_eq!(units.values[2], CellValue::Integer(3));
        // "7" is kept as text because the rest of the column is text
        assert_eq!(ds.column("note").unwrap().values[2], CellValue::Text("7".into()));
    }

    #[test]
    fn dash_is_a_value_not_a_missing_marker() {
        let file = write_temp(".csv", "grade,score\nA,1\n-,2\nB,3\n<NA>,4\nn/a,5\n");
        let ds = load_file(file.path()).unwrap();
        let grade = ds.column("grade").unwrap();
        assert_eq!(
            grade.values,
            vec![
                CellValue::Text("A".into()),
                CellValue::Text("-".into()),
                CellValue::Text("B".into()),
                CellValue::Null,
                CellValue::Null,
            ]
        );
    }

    #[test]
    fn repeated_and_blank_csv_headers_get_distinct_names() {
        let file = write_temp(".csv", "x,x, \n1,a,u\n2,b,v\n");
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.column_names(), vec!["x", "x.1", "Unnamed: 2"]);
        assert_eq!(ds.column("x").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(ds.column("x.1").unwrap().kind, ColumnKind::Categorical);
    }

    #[test]
    fn xlsx_first_sheet_keeps_cell_types() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        sheet.write_string(0, 0, "region").unwrap();
        // header cell (0, 1) left blank
        sheet.write_string(0, 2, "order_date").unwrap();
        for (row, (region, sales, day)) in [("west", 10.0, 1), ("east", 20.5, 2)].into_iter().enumerate() {
            let row = row as u32 + 1;
            sheet.write_string(row, 0, region).unwrap();
            sheet.write_number(row, 1, sales).unwrap();
            let date = ExcelDateTime::from_ymd(2024, 1, day).unwrap();
            sheet.write_datetime_with_format(row, 2, &date, &date_format).unwrap();
        }
        workbook.save(file.path()).unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.column_names(), vec!["region", "Unnamed: 1", "order_date"]);
        let kinds: Vec<ColumnKind> = ds.columns.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ColumnKind::Categorical, ColumnKind::Numeric, ColumnKind::Temporal]);
        assert_eq!(ds.column("region").unwrap().values[1], CellValue::Text("east".into()));
        assert_eq!(ds.column("Unnamed: 1").unwrap().numeric_bounds(), Some((10.0, 20.5)));
        assert_eq!(ds.column("order_date").unwrap().values[0].to_string(), "2024-01-01");
    }

    #[test]
    fn json_records_fill_missing_keys_with_null() {
        let file = write_temp(
            ".json",
            r#"[{"name": "a", "qty": 1}, {"name": "b", "price": 2.5}]"#,
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.column_names(), vec!["name", "qty", "price"]);
        assert_eq!(ds.column("qty").unwrap().values, vec![CellValue::Integer(1), CellValue::Null]);
        assert_eq!(ds.column("price").unwrap().kind, ColumnKind::Numeric);
    }

    #[test]
    fn json_rows_must_be_objects() {
        let file = write_temp(".json", "[1, 2]");
        assert!(load_file(file.path()).is_err());
    }

    #[test]
    fn parquet_flat_columns_round_into_cells() {
        use arrow::array::StringArray;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("label", DataType::Utf8, true),
            Field::new("order_date", DataType::Date32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("x"), None])),
                Arc::new(arrow::array::Date32Array::from(vec![19723, 19724])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.column("id").unwrap().values, vec![CellValue::Integer(1), CellValue::Integer(2)]);
        assert_eq!(ds.column("label").unwrap().values[1], CellValue::Null);
        let dates = ds.column("order_date").unwrap();
        assert_eq!(dates.kind, ColumnKind::Temporal);
        assert_eq!(dates.values[0].to_string(), "2024-01-01");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_temp(".txt", "a,b\n1,2\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
