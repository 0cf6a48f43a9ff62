use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints, Points,
};

use crate::chart::figure::{AxisScale, Geometry};
use crate::chart::{ChartKind, Figure};
use crate::color::{ColorMap, generate_palette};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Chart view – selectors and plot
// ---------------------------------------------------------------------------

/// Render the axis / colour / chart-type selectors and the chart over the
/// filtered data.
pub fn chart_view(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to chart it  (File → Open…)");
        });
        return;
    }

    ui.strong("Chart the filtered data");
    let options = state.axis_options();
    egui::Grid::new("chart_selectors")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            column_selector(ui, "X axis", &mut state.chart.x, &options.x);
            ui.end_row();
            column_selector(ui, "Y axis", &mut state.chart.y, &options.y);
            ui.end_row();

            let mut color = state.chart.color.clone();
            if column_selector(ui, "Colour (optional)", &mut color, &options.color) {
                state.set_color_column(color);
            }
            ui.end_row();

            ui.label("Chart type");
            egui::ComboBox::from_id_salt("chart_kind")
                .selected_text(state.chart.kind.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in ChartKind::ALL {
                        ui.selectable_value(&mut state.chart.kind, kind, kind.label());
                    }
                });
            ui.end_row();
        });
    ui.separator();

    match state.figure() {
        Ok(figure) => draw_figure(ui, &figure, state.color_map.as_ref()),
        Err(e) => {
            log::debug!("Chart not drawn: {e}");
            ui.colored_label(Color32::from_rgb(230, 160, 30), format!("⚠ {e}"));
        }
    }
}

/// Combo box with an empty entry meaning "none".  Returns whether it changed.
fn column_selector(ui: &mut Ui, label: &str, selected: &mut Option<String>, options: &[String]) -> bool {
    ui.label(label);
    let before = selected.clone();
    egui::ComboBox::from_id_salt(label)
        .selected_text(selected.as_deref().unwrap_or(""))
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(selected, None, "—");
            for col in options {
                ui.selectable_value(selected, Some(col.clone()), col);
            }
        });
    *selected != before
}

fn draw_figure(ui: &mut Ui, figure: &Figure, color_map: Option<&ColorMap>) {
    let palette = generate_palette(figure.traces.len());

    let mut plot = Plot::new("chart")
        .legend(Legend::default())
        .x_axis_label(figure.x_title.clone())
        .y_axis_label(figure.y_title.clone())
        .width(ui.available_width())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if figure.x_scale != AxisScale::Linear {
        let scale = figure.x_scale.clone();
        plot = plot.x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            scale.format_tick(mark.value)
        });
    }
    if figure.y_scale != AxisScale::Linear {
        let scale = figure.y_scale.clone();
        plot = plot.y_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            scale.format_tick(mark.value)
        });
    }

    plot.show(ui, |plot_ui| {
        for (i, trace) in figure.traces.iter().enumerate() {
            // Named colour groups follow the colour map; otherwise the palette.
            let color = color_map
                .map(|cm| cm.color_for(&trace.name))
                .filter(|c| *c != Color32::GRAY)
                .or_else(|| palette.get(i).copied())
                .unwrap_or(Color32::LIGHT_BLUE);
            let name = trace.name.as_str();

            match &trace.geometry {
                Geometry::Bars(segments) => {
                    let bars = segments
                        .iter()
                        .map(|s| Bar::new(s.x, s.height).base_offset(s.base).width(s.width))
                        .collect();
                    plot_ui.bar_chart(BarChart::new(bars).name(name).color(color));
                }
                Geometry::Line(points) => {
                    let points: PlotPoints = points.iter().copied().collect();
                    plot_ui.line(Line::new(points).name(name).color(color).width(1.5));
                }
                Geometry::Points(points) => {
                    let points: PlotPoints = points.iter().copied().collect();
                    plot_ui.points(Points::new(points).name(name).color(color).radius(3.0));
                }
                Geometry::Boxes(boxes) => {
                    let elems = boxes
                        .iter()
                        .map(|b| {
                            let spread = BoxSpread::new(
                                b.lower_whisker,
                                b.q1,
                                b.median,
                                b.q3,
                                b.upper_whisker,
                            );
                            BoxElem::new(b.x, spread)
                                .box_width(b.width)
                                .fill(color.gamma_multiply(0.3))
                                .stroke(egui::Stroke::new(1.5, color))
                        })
                        .collect();
                    plot_ui.box_plot(BoxPlot::new(elems).name(name).color(color));
                }
            }
        }
    });
}
