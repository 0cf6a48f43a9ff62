/// Chart layer: turns axis / colour / chart-type selections into a [`Figure`].
///
/// ```text
///   ChartSpec ──arguments()──► ChartArgs ──validate──► figure::build ──► Figure
///                                              │
///                                              └─ MissingAxes → inline warning
/// ```
pub mod figure;

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::data::model::{ColumnKind, Dataset};
pub use figure::Figure;

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChartKind {
    #[default]
    Histogram,
    Bar,
    Line,
    Scatter,
    Box,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Histogram,
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Box,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Histogram => "Histogram",
            ChartKind::Bar => "Bar chart",
            ChartKind::Line => "Line chart",
            ChartKind::Scatter => "Scatter plot",
            ChartKind::Box => "Box plot",
        }
    }

    /// Axes that must be selected before anything is drawn.
    pub fn required_axes(self) -> &'static [Axis] {
        match self {
            ChartKind::Histogram => &[Axis::X],
            ChartKind::Bar | ChartKind::Line | ChartKind::Scatter | ChartKind::Box => {
                &[Axis::X, Axis::Y]
            }
        }
    }

    fn requirement(self) -> &'static str {
        match self.required_axes() {
            [Axis::X] => "an X axis",
            _ => "both an X and a Y axis",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    X,
    Y,
    Color,
}

/// Selections actually made: axis → column name.  Unselected axes are absent.
pub type ChartArgs = BTreeMap<Axis, String>;

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("{} requires {}.", .kind.label(), .kind.requirement())]
    MissingAxes { kind: ChartKind },
    #[error("Column '{0}' is not in the data.")]
    UnknownColumn(String),
}

/// The user's current chart selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSpec {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    pub kind: ChartKind,
}

impl ChartSpec {
    /// Collect only the selections that were made.  Empty names count as unselected.
    pub fn arguments(&self) -> ChartArgs {
        [(Axis::X, &self.x), (Axis::Y, &self.y), (Axis::Color, &self.color)]
            .into_iter()
            .filter_map(|(axis, col)| {
                col.as_ref()
                    .filter(|name| !name.is_empty())
                    .map(|name| (axis, name.clone()))
            })
            .collect()
    }

    /// Arguments for the chart, or the warning to show instead.
    pub fn validate(&self) -> Result<ChartArgs, ChartError> {
        let args = self.arguments();
        if self
            .kind
            .required_axes()
            .iter()
            .all(|axis| args.contains_key(axis))
        {
            Ok(args)
        } else {
            Err(ChartError::MissingAxes { kind: self.kind })
        }
    }

    /// Validate and build the figure over `dataset`.
    pub fn build(&self, dataset: &Dataset, max_bins: usize) -> Result<Figure, ChartError> {
        let args = self.validate()?;
        figure::build(dataset, self.kind, &args, max_bins)
    }
}

// ---------------------------------------------------------------------------
// Selector options
// ---------------------------------------------------------------------------

/// Columns eligible for each axis selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisOptions {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub color: Vec<String>,
}

impl AxisOptions {
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let names = |keep: fn(ColumnKind) -> bool| -> Vec<String> {
            dataset
                .columns
                .iter()
                .filter(|c| keep(c.kind))
                .map(|c| c.name.clone())
                .collect()
        };
        AxisOptions {
            x: dataset.column_names(),
            y: names(|k| k != ColumnKind::Unrecognized),
            color: names(|k| k == ColumnKind::Categorical),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Column};

    fn spec(x: Option<&str>, y: Option<&str>, color: Option<&str>, kind: ChartKind) -> ChartSpec {
        ChartSpec {
            x: x.map(String::from),
            y: y.map(String::from),
            color: color.map(String::from),
            kind,
        }
    }

    #[test]
    fn arguments_only_hold_made_selections() {
        let args = spec(Some("a"), Some(""), None, ChartKind::Histogram).arguments();
        assert_eq!(args.len(), 1);
        assert_eq!(args.get(&Axis::X).map(String::as_str), Some("a"));
        assert!(!args.contains_key(&Axis::Y));
        assert!(!args.contains_key(&Axis::Color));
    }

    #[test]
    fn bar_without_y_warns() {
        let err = spec(Some("region"), None, None, ChartKind::Bar).validate().unwrap_err();
        assert_eq!(err, ChartError::MissingAxes { kind: ChartKind::Bar });
        assert_eq!(err.to_string(), "Bar chart requires both an X and a Y axis.");
    }

    #[test]
    fn histogram_needs_only_x() {
        assert!(spec(Some("sales"), None, None, ChartKind::Histogram).validate().is_ok());
        let err = spec(None, Some("sales"), None, ChartKind::Histogram).validate().unwrap_err();
        assert_eq!(err.to_string(), "Histogram requires an X axis.");
    }

    #[test]
    fn two_axis_kinds_accept_x_and_y_with_optional_color() {
        for kind in [ChartKind::Bar, ChartKind::Line, ChartKind::Scatter, ChartKind::Box] {
            assert!(spec(Some("a"), Some("b"), None, kind).validate().is_ok());
            let args = spec(Some("a"), Some("b"), Some("c"), kind).validate().unwrap();
            assert_eq!(args.get(&Axis::Color).map(String::as_str), Some("c"));
            assert!(spec(None, Some("b"), Some("c"), kind).validate().is_err());
        }
    }

    #[test]
    fn default_selection_shows_histogram_warning() {
        let err = ChartSpec::default().validate().unwrap_err();
        assert_eq!(err, ChartError::MissingAxes { kind: ChartKind::Histogram });
    }

    #[test]
    fn axis_options_follow_column_kinds() {
        let ds = Dataset::from_columns(vec![
            Column::new("region", vec![CellValue::Text("w".into())]),
            Column::new("sales", vec![CellValue::Integer(1)]),
            Column::new("junk", vec![CellValue::Null]),
        ]);
        let options = AxisOptions::for_dataset(&ds);
        assert_eq!(options.x, vec!["region", "sales", "junk"]);
        assert_eq!(options.y, vec!["region", "sales"]);
        assert_eq!(options.color, vec!["region"]);
    }

    #[test]
    fn unknown_column_is_reported() {
        let ds = Dataset::from_columns(vec![Column::new("sales", vec![CellValue::Integer(1)])]);
        let err = spec(Some("gone"), None, None, ChartKind::Histogram)
            .build(&ds, 50)
            .unwrap_err();
        assert_eq!(err, ChartError::UnknownColumn("gone".into()));
    }
}
