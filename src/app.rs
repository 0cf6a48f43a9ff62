use eframe::egui;

use crate::config::ViewerConfig;
use crate::state::{AppState, View};
use crate::ui::{filters, panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyBoardApp {
    pub state: AppState,
}

impl RustyBoardApp {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for RustyBoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar and view tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: the selected view ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a CSV or spreadsheet to begin  (File → Open…)");
                });
                return;
            }
            match self.state.view {
                View::Data => table::data_view(ui, &mut self.state),
                View::Filters => filters::filter_view(ui, &mut self.state),
                View::Chart => plot::chart_view(ui, &mut self.state),
            }
        });
    }
}
