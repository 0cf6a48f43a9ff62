use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::{ColumnKind, Dataset};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Data view – raw table and column statistics
// ---------------------------------------------------------------------------

/// Render the raw dataset followed by the statistics block.
pub fn data_view(ui: &mut Ui, state: &mut AppState) {
    if let Some(dataset) = &state.dataset {
        let rows = dataset.len().min(state.config.table_preview_rows);
        if rows < dataset.len() {
            ui.label(format!("Showing the first {rows} of {} rows", dataset.len()));
        }
        egui::ScrollArea::horizontal()
            .id_salt("raw_table")
            .show(ui, |ui: &mut Ui| raw_table(ui, dataset, rows));
    }
    ui.separator();
    statistics(ui, state);
}

fn raw_table(ui: &mut Ui, dataset: &Dataset, rows: usize) {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(360.0)
        .columns(TableColumn::auto().at_least(60.0), dataset.columns.len())
        .header(20.0, |mut header| {
            for col in &dataset.columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(&col.name).on_hover_text(col.kind.to_string());
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows, |mut row| {
                let i = row.index();
                for col in &dataset.columns {
                    row.col(|ui: &mut Ui| {
                        ui.label(col.values[i].to_string());
                    });
                }
            });
        });
}

/// Column picker plus sum / mean / min / max.  Hidden without numeric columns.
fn statistics(ui: &mut Ui, state: &mut AppState) {
    let numeric = state
        .dataset
        .as_ref()
        .map(|ds| ds.columns_of_kind(ColumnKind::Numeric))
        .unwrap_or_default();
    if numeric.is_empty() {
        return;
    }

    ui.strong("📊 Pick a column to summarise");
    egui::ComboBox::from_id_salt("stat_column")
        .selected_text(state.stat_column.as_deref().unwrap_or_default())
        .show_ui(ui, |ui: &mut Ui| {
            for col in &numeric {
                ui.selectable_value(&mut state.stat_column, Some(col.clone()), col);
            }
        });

    let (Some(name), Some(summary)) = (state.stat_column.as_deref(), state.stat_summary()) else {
        return;
    };
    ui.label(RichText::new(format!("✅ Statistics for {name}")).strong());
    ui.horizontal(|ui: &mut Ui| {
        for (label, value) in summary.metrics() {
            ui.group(|ui: &mut Ui| {
                ui.vertical(|ui: &mut Ui| {
                    ui.label(RichText::new(label).weak());
                    ui.label(RichText::new(value).heading());
                });
            });
        }
    });
}
