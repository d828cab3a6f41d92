use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, summary};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct PlastispecApp {
    pub state: AppState,
}

impl PlastispecApp {
    /// Start with a catalog already loaded (e.g. from the command line).
    pub fn with_catalog(path: &std::path::Path) -> Self {
        let mut state = AppState::default();
        if let Err(e) = state.load_catalog(path) {
            log::error!("failed to load catalog {}: {e}", path.display());
            state.status_message = Some(format!("Error: {e}"));
        }
        PlastispecApp { state }
    }
}

impl eframe::App for PlastispecApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar and metrics ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: facet filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: measurement-count summary ----
        if self.state.catalog.is_some() {
            egui::TopBottomPanel::bottom("summary_panel")
                .resizable(true)
                .default_height(180.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        summary::summary_panel(ui, &mut self.state);
                    });
                });
        }

        // ---- Central panel: plot (and raw tables on demand) ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.show_raw_data {
                egui::ScrollArea::vertical()
                    .max_height(ui.available_height() * 0.4)
                    .show(ui, |ui| {
                        panels::raw_data_section(ui, &self.state);
                    });
                ui.separator();
            }
            plot::spectra_plot(ui, &self.state);
        });
    }
}
