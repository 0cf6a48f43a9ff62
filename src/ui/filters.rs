use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::color::ColorMap;
use crate::data::filter::Constraint;
use crate::data::model::Column;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Filter view – one widget per column
// ---------------------------------------------------------------------------

/// Render the filter widgets and apply any edits.
pub fn filter_view(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    ui.strong("Pick conditions to narrow down the data");
    ui.separator();

    // Edits are collected first so the dataset borrow ends before refiltering.
    let mut edits: Vec<(String, Constraint)> = Vec::new();
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for column in &dataset.columns {
                let Some(current) = state.filters.get(&column.name) else {
                    continue;
                };
                let mut edited = current.clone();
                if constraint_widget(ui, column, &mut edited, state.color_map.as_ref()) {
                    edits.push((column.name.clone(), edited));
                }
                ui.add_space(6.0);
            }
        });

    for (column, constraint) in edits {
        state.set_constraint(&column, constraint);
    }
}

/// Draw the widget for one constraint; returns whether it was edited.
fn constraint_widget(
    ui: &mut Ui,
    column: &Column,
    constraint: &mut Constraint,
    color_map: Option<&ColorMap>,
) -> bool {
    let name = &column.name;
    match constraint {
        Constraint::DateRange { from, to } => {
            ui.strong(format!("📅 {name} period"));
            let from_id = format!("{name}_from");
            let to_id = format!("{name}_to");
            let mut changed = false;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("From");
                changed |= ui.add(DatePickerButton::new(from).id_salt(&from_id)).changed();
                ui.label("to");
                changed |= ui.add(DatePickerButton::new(to).id_salt(&to_id)).changed();
            });
            changed
        }
        Constraint::NumericRange { min, max } => {
            ui.strong(format!("🔢 {name} range"));
            let (lo, hi) = column.numeric_bounds().unwrap_or((*min, *max));
            let min_changed = ui.add(egui::Slider::new(min, lo..=hi).text("min")).changed();
            let max_changed = ui.add(egui::Slider::new(max, lo..=hi).text("max")).changed();
            // keep the range ordered, moving the handle that was not dragged
            if min_changed && *min > *max {
                *max = *min;
            }
            if max_changed && *max < *min {
                *min = *max;
            }
            min_changed || max_changed
        }
        Constraint::Categories { choices, selected } => {
            let header_text = format!("🧩 {name}  ({}/{})", selected.len(), choices.len());
            let tint = color_map.filter(|cm| cm.column == *name);
            let mut changed = false;
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt(name)
                .default_open(choices.len() <= 10)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            selected.extend(choices.iter().cloned());
                            changed = true;
                        }
                        if ui.small_button("None").clicked() {
                            selected.clear();
                            changed = true;
                        }
                    });

                    for val in choices.iter() {
                        let label = val.to_string();
                        let mut text = RichText::new(&label);
                        if let Some(cm) = tint {
                            text = text.color(cm.color_for(&label));
                        }

                        let mut checked = selected.contains(val);
                        if ui.checkbox(&mut checked, text).changed() {
                            if checked {
                                selected.insert(val.clone());
                            } else {
                                selected.remove(val);
                            }
                            changed = true;
                        }
                    }
                });
            changed
        }
        Constraint::Unfiltered => {
            ui.label(RichText::new(format!("{name}: no filter ({})", column.kind)).weak());
            false
        }
    }
}
