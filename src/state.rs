use std::path::Path;

use anyhow::Result;

use crate::chart::{AxisOptions, ChartError, ChartSpec, Figure};
use crate::color::ColorMap;
use crate::config::ViewerConfig;
use crate::data::filter::{Constraint, FilterState, apply_filters, init_filter_state};
use crate::data::infer::coerce_temporal_columns;
use crate::data::loader::load_file;
use crate::data::model::{ColumnKind, Dataset};
use crate::data::summary::ColumnSummary;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which of the three views is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Data,
    Filters,
    Chart,
}

impl View {
    pub const ALL: [View; 3] = [View::Data, View::Filters, View::Chart];

    pub fn label(self) -> &'static str {
        match self {
            View::Data => "📄 Data",
            View::Filters => "🔎 Filters",
            View::Chart => "📈 Chart",
        }
    }
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    pub config: ViewerConfig,

    /// File name of the loaded dataset.
    pub source_name: Option<String>,

    /// Typed dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// Per-column constraints.
    pub filters: FilterState,

    /// Dataset with every constraint applied (cached).
    pub filtered: Dataset,

    /// Numeric column shown in the statistics block.
    pub stat_column: Option<String>,

    /// Current chart selection.
    pub chart: ChartSpec,

    /// Colours for the chart's colour column.
    pub color_map: Option<ColorMap>,

    pub view: View,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Load a file, infer date columns, and start a fresh session on it.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let mut dataset = load_file(path)?;
        coerce_temporal_columns(&mut dataset, &self.config.date_tokens);
        log::info!(
            "Loaded {} rows with columns {:?}",
            dataset.len(),
            dataset.column_names()
        );
        self.source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        self.set_dataset(dataset);
        Ok(())
    }

    /// Ingest a newly loaded dataset, resetting filters and selections.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters = init_filter_state(&dataset, self.config.max_category_choices);
        self.stat_column = dataset.columns_of_kind(ColumnKind::Numeric).into_iter().next();
        self.chart = ChartSpec::default();
        self.color_map = None;
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the filtered dataset from scratch.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filtered = apply_filters(ds, &self.filters);
        }
    }

    pub fn set_constraint(&mut self, column: &str, constraint: Constraint) {
        self.filters.insert(column.to_string(), constraint);
        self.refilter();
    }

    /// Set colour column and rebuild the map.
    pub fn set_color_column(&mut self, col: Option<String>) {
        self.color_map = col.as_deref().and_then(|name| {
            let column = self.dataset.as_ref()?.column(name)?;
            Some(ColorMap::new(name, &column.distinct_values()))
        });
        self.chart.color = col;
    }

    /// Summary of the selected statistics column over the raw dataset.
    pub fn stat_summary(&self) -> Option<ColumnSummary> {
        let name = self.stat_column.as_deref()?;
        ColumnSummary::of(self.dataset.as_ref()?.column(name)?)
    }

    pub fn axis_options(&self) -> AxisOptions {
        AxisOptions::for_dataset(&self.filtered)
    }

    /// Figure for the current chart selection over the filtered dataset.
    pub fn figure(&self) -> Result<Figure, ChartError> {
        self.chart
            .build(&self.filtered, self.config.max_histogram_bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use crate::data::model::CellValue;
    use std::io::Write;

    fn open_csv(contents: &str) -> AppState {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let mut state = AppState::new(ViewerConfig::default());
        state.open(file.path()).unwrap();
        state
    }

    const CSV: &str = "order_date,region,sales\n\
                       2024-01-15,west,10\n\
                       2024-06-01,east,20\n\
                       2024-06-30,west,30\n";

    #[test]
    fn opening_a_file_starts_a_session() {
        let state = open_csv(CSV);
        let ds = state.dataset.as_ref().unwrap();
        assert_eq!(ds.column("order_date").unwrap().kind, ColumnKind::Temporal);
        assert_eq!(state.filtered, *ds);
        assert_eq!(state.stat_column.as_deref(), Some("sales"));
        assert_eq!(state.view, View::Data);
    }

    #[test]
    fn statistics_ignore_filters() {
        let mut state = open_csv(CSV);
        state.set_constraint("sales", Constraint::NumericRange { min: 25.0, max: 30.0 });
        assert_eq!(state.filtered.len(), 1);

        let summary = state.stat_summary().unwrap();
        assert_eq!(summary.sum, 60.0);
        assert_eq!(summary.mean, 20.0);
    }

    #[test]
    fn chart_reads_filtered_rows() {
        let mut state = open_csv(CSV);
        let june = Constraint::DateRange {
            from: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            to: chrono::NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        };
        state.set_constraint("order_date", june);
        assert_eq!(
            state.filtered.column("sales").unwrap().values,
            vec![CellValue::Integer(20), CellValue::Integer(30)]
        );

        state.chart.x = Some("region".into());
        state.chart.kind = ChartKind::Histogram;
        state.set_color_column(Some("region".into()));
        let figure = state.figure().unwrap();
        assert_eq!(figure.traces.len(), 2);
        let map = state.color_map.as_ref().unwrap();
        assert_ne!(map.color_for("west"), map.color_for("east"));
    }

    #[test]
    fn repeated_headers_keep_every_row_under_defaults() {
        let state = open_csv("x,x\n1,a\n2,b\n");
        let ds = state.dataset.as_ref().unwrap();
        assert_eq!(ds.column_names(), vec!["x", "x.1"]);
        assert_eq!(state.filters.len(), 2);
        assert_eq!(state.filtered.len(), 2);
    }

    #[test]
    fn dash_category_survives_default_filters() {
        let state = open_csv("grade,score\nA,1\n-,2\nB,3\n");
        assert_eq!(state.filtered.len(), 3);
        match &state.filters["grade"] {
            Constraint::Categories { choices, .. } => {
                assert!(choices.contains(&CellValue::Text("-".into())))
            }
            other => panic!("expected a category constraint, got {other:?}"),
        }
    }

    #[test]
    fn new_file_resets_selections() {
        let mut state = open_csv(CSV);
        state.chart.x = Some("region".into());
        state.set_constraint("sales", Constraint::NumericRange { min: 0.0, max: 0.0 });

        let other = Dataset::from_columns(vec![crate::data::model::Column::new(
            "qty",
            vec![CellValue::Integer(1)],
        )]);
        state.set_dataset(other);
        assert_eq!(state.chart, ChartSpec::default());
        assert_eq!(state.filtered.len(), 1);
        assert_eq!(state.stat_column.as_deref(), Some("qty"));
    }
}
