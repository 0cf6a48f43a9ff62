use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a column
// ---------------------------------------------------------------------------

/// One cell, tagged with the storage type it was read as.  Category
/// selections keep these in a `BTreeSet`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Null,
}

impl CellValue {
    /// Position of the variant in the total order used across storage types.
    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) => 2,
            CellValue::Float(_) => 3,
            CellValue::Text(_) => 4,
            CellValue::DateTime(_) => 5,
        }
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Float(a), CellValue::Float(b)) => a.total_cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.1}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` (numeric cells only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null) || matches!(self, CellValue::Float(v) if v.is_nan())
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – semantic type decided once at load
// ---------------------------------------------------------------------------

/// Semantic type of a column. Decides which filter widget it gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Temporal,
    Categorical,
    /// Mixed storage types, or nothing but missing values.
    Unrecognized,
}

impl ColumnKind {
    /// Classify a column from the storage types of its non-missing cells.
    pub fn infer(values: &[CellValue]) -> Self {
        let mut kind: Option<ColumnKind> = None;
        for value in values.iter().filter(|v| !v.is_null()) {
            let this = match value {
                CellValue::Integer(_) | CellValue::Float(_) => ColumnKind::Numeric,
                CellValue::DateTime(_) => ColumnKind::Temporal,
                CellValue::Text(_) | CellValue::Bool(_) => ColumnKind::Categorical,
                CellValue::Null => continue,
            };
            match kind {
                None => kind = Some(this),
                Some(k) if k != this => return ColumnKind::Unrecognized,
                Some(_) => {}
            }
        }
        kind.unwrap_or(ColumnKind::Unrecognized)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Unrecognized => "unrecognized",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// One named column with its inferred kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        let kind = ColumnKind::infer(&values);
        Column {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Smallest and largest numeric value, ignoring missing cells.
    pub fn numeric_bounds(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter_map(CellValue::as_f64)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Earliest and latest calendar date, ignoring missing cells.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.values.iter().filter_map(CellValue::as_datetime);
        let first = dates.next()?;
        let (lo, hi) = dates.fold((first, first), |(lo, hi), dt| (lo.min(dt), hi.max(dt)));
        Some((lo.date(), hi.date()))
    }

    /// Distinct non-missing values in order of first appearance.
    pub fn distinct_values(&self) -> Vec<CellValue> {
        let mut seen = HashSet::new();
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .filter(|v| seen.insert(*v))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full typed table for the current session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    /// Columns in file order; all of equal length.
    pub columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset, padding short columns with nulls so every column has
    /// the same length.  Column names are made unique: a blank name becomes
    /// `Unnamed: {position}` and a repeated name `name.1`, `name.2`, ...
    pub fn from_columns(mut columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        let mut taken: HashSet<String> = HashSet::new();
        for (i, col) in columns.iter_mut().enumerate() {
            let base = match col.name.trim() {
                "" => format!("Unnamed: {i}"),
                name => name.to_string(),
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while taken.contains(&name) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            taken.insert(name.clone());
            col.name = name;
        }
        for col in &mut columns {
            if col.values.len() < rows {
                col.values.resize(rows, CellValue::Null);
                col.kind = ColumnKind::infer(&col.values);
            }
        }
        Dataset { columns }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of the columns of the given kind, in file order.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Row subset with the same columns. Kinds are carried over, not re-inferred.
    pub fn take(&self, rows: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                values: rows.iter().map(|&r| c.values[r].clone()).collect(),
            })
            .collect();
        Dataset { columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn kind_follows_storage_types() {
        assert_eq!(
            ColumnKind::infer(&[CellValue::Integer(1), CellValue::Float(2.5), CellValue::Null]),
            ColumnKind::Numeric
        );
        assert_eq!(ColumnKind::infer(&[text("a"), CellValue::Bool(true)]), ColumnKind::Categorical);
        assert_eq!(ColumnKind::infer(&[text("a"), CellValue::Integer(3)]), ColumnKind::Unrecognized);
        assert_eq!(ColumnKind::infer(&[CellValue::Null, CellValue::Null]), ColumnKind::Unrecognized);
        assert_eq!(ColumnKind::infer(&[]), ColumnKind::Unrecognized);
    }

    #[test]
    fn nan_counts_as_missing() {
        let col = Column::new("v", vec![CellValue::Float(f64::NAN), CellValue::Integer(4)]);
        assert_eq!(col.kind, ColumnKind::Numeric);
        assert_eq!(col.numeric_bounds(), Some((4.0, 4.0)));
    }

    #[test]
    fn distinct_values_keep_first_appearance_order() {
        let col = Column::new(
            "region",
            vec![text("west"), text("east"), CellValue::Null, text("west"), text("north")],
        );
        assert_eq!(col.distinct_values(), vec![text("west"), text("east"), text("north")]);
    }

    #[test]
    fn take_keeps_every_column() {
        let ds = Dataset::from_columns(vec![
            Column::new("a", vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Integer(3)]),
            Column::new("b", vec![text("x"), text("y"), text("z")]),
        ]);
        let sub = ds.take(&[0, 2]);
        assert_eq!(sub.column_names(), vec!["a", "b"]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.column("b").unwrap().values, vec![text("x"), text("z")]);
        assert_eq!(sub.column("a").unwrap().kind, ColumnKind::Numeric);
    }

    #[test]
    fn short_columns_are_padded() {
        let ds = Dataset::from_columns(vec![
            Column::new("a", vec![CellValue::Integer(1), CellValue::Integer(2)]),
            Column::new("b", vec![text("x")]),
        ]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("b").unwrap().values[1], CellValue::Null);
    }

    #[test]
    fn blank_and_repeated_names_are_made_unique() {
        let ds = Dataset::from_columns(vec![
            Column::new("x", vec![CellValue::Integer(1)]),
            Column::new("", vec![CellValue::Integer(2)]),
            Column::new("x", vec![text("a")]),
            Column::new("x", vec![text("b")]),
            Column::new("x.1", vec![text("c")]),
        ]);
        assert_eq!(ds.column_names(), vec!["x", "Unnamed: 1", "x.1", "x.2", "x.1.1"]);
    }

    #[test]
    fn ordering_groups_by_storage_type() {
        let mut values = vec![text("b"), CellValue::Integer(2), CellValue::Null, text("a"), CellValue::Bool(true)];
        values.sort();
        assert_eq!(
            values,
            vec![CellValue::Null, CellValue::Bool(true), CellValue::Integer(2), text("a"), text("b")]
        );
    }

    #[test]
    fn midnight_datetimes_display_as_dates() {
        let dt = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_time(NaiveTime::MIN);
        assert_eq!(CellValue::DateTime(dt).to_string(), "2024-06-01");
        assert_eq!(CellValue::Float(3.0).to_string(), "3.0");
    }
}
