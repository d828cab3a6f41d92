use std::collections::BTreeSet;
use std::fmt::Display;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::catalog::Analysis;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – facet filters and toggles
// ---------------------------------------------------------------------------

/// Render one multi-select facet as a collapsible checkbox list with
/// All / None shortcuts. Returns true when the selection changed.
fn facet_section<T: Ord + Clone + Display>(
    ui: &mut Ui,
    label: &str,
    domain: &[T],
    selected: &mut BTreeSet<T>,
) -> bool {
    let mut changed = false;
    let header = format!("{label}  ({}/{})", selected.len(), domain.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(label)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    *selected = domain.iter().cloned().collect();
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                    changed = true;
                }
            });

            for val in domain {
                let mut checked = selected.contains(val);
                if ui.checkbox(&mut checked, val.to_string()).changed() {
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

/// Render the left filter panel: the seven facet controls plus the convert
/// and ruler toggles.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(catalog) = &state.catalog else {
        ui.label("No catalog loaded.");
        return;
    };

    // Facet domains, cloned so the selection can be mutated below.
    let regions = catalog.regions();
    let campaigns = catalog.campaigns();
    let states = catalog.states();
    let treatments = catalog.treatments();
    let exposure_days = catalog.exposure_days();
    let polymers = catalog.polymers();
    let analyses = catalog.analyses();

    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            changed |= facet_section(ui, "Region", &regions, &mut state.selection.regions);
            changed |= facet_section(ui, "Campaign", &campaigns, &mut state.selection.campaigns);
            changed |= facet_section(ui, "State", &states, &mut state.selection.states);
            changed |= facet_section(ui, "Treatment", &treatments, &mut state.selection.treatments);

            // Analysis is single-select by design: a plot mixing Raman and
            // ATR axes would be meaningless.
            ui.strong("Analysis");
            for analysis in &analyses {
                if ui
                    .radio(state.selection.analysis == Some(*analysis), analysis.to_string())
                    .clicked()
                {
                    state.selection.analysis = Some(*analysis);
                    changed = true;
                }
            }
            ui.separator();

            changed |= facet_section(
                ui,
                "Exposure_days",
                &exposure_days,
                &mut state.selection.exposure_days,
            );
            changed |= facet_section(ui, "Polymer", &polymers, &mut state.selection.polymers);

            ui.separator();
            if ui
                .checkbox(
                    &mut state.convert_wavelength,
                    "Convert wavelength [nm] to wavenumber [cm-1]",
                )
                .changed()
            {
                changed = true;
            }
            ui.checkbox(&mut state.show_ruler, "Show ruler");
            ui.checkbox(&mut state.show_raw_data, "Show raw data");
        });

    if changed {
        state.recompute();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar with the overview metrics.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open catalog…").clicked() {
                open_catalog_dialog(state);
                ui.close_menu();
            }
            let export = ui.add_enabled(
                state.export_enabled(),
                egui::Button::new("Export displayed spectra as CSV…"),
            );
            if export.clicked() {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(catalog) = &state.catalog {
            ui.label(format!(
                "Samples: {} ({} incl. replicates)",
                catalog.sample_count(),
                catalog.sample_count_with_replicates()
            ));
            ui.separator();
            ui.label(format!("Raman: {}", catalog.count_analysis(Analysis::Raman)));
            ui.label(format!("ATR: {}", catalog.count_analysis(Analysis::Atr)));
            ui.separator();
            ui.label(format!(
                "{} of {} measurements loaded, {} points",
                state.filtered.len(),
                catalog.len(),
                state.spectra.point_count()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Raw data tables
// ---------------------------------------------------------------------------

/// Expanders with the underlying tables, shown when "Show raw data" is on.
pub fn raw_data_section(ui: &mut Ui, state: &AppState) {
    let Some(catalog) = &state.catalog else {
        return;
    };

    egui::CollapsingHeader::new("All measurements (catalog)")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let all: Vec<usize> = (0..catalog.len()).collect();
            catalog_table(ui, state, &all, "catalog_table");
        });

    egui::CollapsingHeader::new("Loaded measurements (filtered)")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            catalog_table(ui, state, &state.filtered, "filtered_table");
        });
}

/// Render catalog rows as a scrollable table in declared column order.
fn catalog_table(ui: &mut Ui, state: &AppState, indices: &[usize], id: &str) {
    use egui_extras::{Column, TableBuilder};

    let Some(catalog) = &state.catalog else {
        return;
    };
    let columns = catalog.columns().to_vec();

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .columns(Column::auto().resizable(true), columns.len())
            .header(20.0, |mut header| {
                for col in &columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, indices.len(), |mut row| {
                    let rec = &catalog.records()[indices[row.index()]];
                    for col in &columns {
                        row.col(|ui: &mut Ui| {
                            ui.label(rec.cell(col));
                        });
                    }
                });
            });
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_catalog_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open metadata catalog")
        .add_filter("Catalog", &["json"])
        .pick_file();

    if let Some(path) = file {
        match state.load_catalog(&path) {
            Ok(()) => {
                log::info!(
                    "loaded catalog {} with {} measurements",
                    path.display(),
                    state.catalog.as_ref().map(|c| c.len()).unwrap_or(0)
                );
            }
            Err(e) => {
                log::error!("failed to load catalog: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export displayed spectra")
        .set_file_name("spectra.csv")
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_csv(&path) {
            log::error!("export failed: {e:#}");
            state.status_message = Some(format!("Export error: {e:#}"));
        }
    }
}
