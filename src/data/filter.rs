use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::model::{CellValue, Column, ColumnKind, Dataset};

// ---------------------------------------------------------------------------
// Constraint: what a single column admits
// ---------------------------------------------------------------------------

/// Per-column filter, shaped by the column's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive calendar-date range.
    DateRange { from: NaiveDate, to: NaiveDate },
    /// Inclusive numeric range.
    NumericRange { min: f64, max: f64 },
    /// Offered choices (first-appearance order) and the chosen subset.
    Categories {
        choices: Vec<CellValue>,
        selected: BTreeSet<CellValue>,
    },
    /// Column passes through untouched.
    Unfiltered,
}

impl Constraint {
    /// Default constraint for a column: the full range, or every choice.
    pub fn for_column(column: &Column, max_choices: usize) -> Self {
        match column.kind {
            ColumnKind::Temporal => match column.date_bounds() {
                Some((from, to)) => Constraint::DateRange { from, to },
                None => Constraint::Unfiltered,
            },
            ColumnKind::Numeric => match column.numeric_bounds() {
                Some((min, max)) => Constraint::NumericRange { min, max },
                None => Constraint::Unfiltered,
            },
            ColumnKind::Categorical => {
                let choices = column.distinct_values();
                if choices.len() > max_choices {
                    return Constraint::Unfiltered;
                }
                let selected = choices.iter().cloned().collect();
                Constraint::Categories { choices, selected }
            }
            ColumnKind::Unrecognized => Constraint::Unfiltered,
        }
    }

    /// Whether a cell passes.  Missing cells never pass an active constraint.
    pub fn admits(&self, value: &CellValue) -> bool {
        match self {
            Constraint::Unfiltered => true,
            // Compared by calendar day, so a timestamp later on the `to` day
            // still passes.  A midnight cut-off would drop it.
            Constraint::DateRange { from, to } => value
                .as_datetime()
                .is_some_and(|dt| (*from..=*to).contains(&dt.date())),
            Constraint::NumericRange { min, max } => value
                .as_f64()
                .is_some_and(|v| v >= *min && v <= *max),
            Constraint::Categories { selected, .. } => !value.is_null() && selected.contains(value),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Constraint::Unfiltered)
    }
}

// ---------------------------------------------------------------------------
// Filter state: one constraint per column
// ---------------------------------------------------------------------------

/// Per-column constraints: maps column_name → constraint.
/// A column absent from the map is unfiltered.
pub type FilterState = BTreeMap<String, Constraint>;

/// Initialise a [`FilterState`] with every constraint wide open.
pub fn init_filter_state(dataset: &Dataset, max_choices: usize) -> FilterState {
    dataset
        .columns
        .iter()
        .map(|col| (col.name.clone(), Constraint::for_column(col, max_choices)))
        .collect()
}

/// Return indices of rows that pass all constraints (logical AND).
pub fn filtered_indices(dataset: &Dataset, filters: &FilterState) -> Vec<usize> {
    let active: Vec<(&Column, &Constraint)> = dataset
        .columns
        .iter()
        .filter_map(|col| {
            let constraint = filters.get(&col.name)?;
            constraint.is_active().then_some((col, constraint))
        })
        .collect();

    (0..dataset.len())
        .filter(|&row| {
            active
                .iter()
                .all(|(col, constraint)| constraint.admits(&col.values[row]))
        })
        .collect()
}

/// The filtered dataset: same columns, surviving rows only.
pub fn apply_filters(dataset: &Dataset, filters: &FilterState) -> Dataset {
    dataset.take(&filtered_indices(dataset, filters))
}
