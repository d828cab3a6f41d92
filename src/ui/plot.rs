use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, VLine};

use crate::data::spectrum::{X_WAVELENGTH, X_WAVENUMBER};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spectra plot (central panel)
// ---------------------------------------------------------------------------

/// Render the spectra of the current selection as one line per measurement
/// file, with the notices the data state calls for.
pub fn spectra_plot(ui: &mut Ui, state: &AppState) {
    if state.catalog.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a metadata catalog to view spectra  (File → Open catalog…)");
        });
        return;
    }

    if state.converted_any {
        ui.label(
            RichText::new("Spectra have been converted from wavelength [nm] to wavenumber [cm-1].")
                .color(Color32::LIGHT_BLUE),
        );
    }

    if state.spectra.is_empty() {
        if state.status_message.is_none() {
            ui.label(
                RichText::new("No spectra found. Please adjust filters.")
                    .color(Color32::YELLOW),
            );
        }
        return;
    }

    Plot::new("spectra_plot")
        .legend(Legend::default())
        .x_axis_label(x_axis_label(state))
        .y_axis_label(y_axis_label(state))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for sp in &state.spectra.spectra {
                let points: PlotPoints = sp
                    .x
                    .iter()
                    .zip(sp.y.iter())
                    .map(|(&xi, &yi)| [xi, yi])
                    .collect();

                let line = Line::new(points)
                    .name(&sp.record.file)
                    .color(state.color_map.color_for(&sp.record.file))
                    .width(1.5);
                plot_ui.line(line);
            }

            // Vertical ruler at the cursor, to compare peaks across spectra.
            if state.show_ruler {
                if let Some(pos) = plot_ui.pointer_coordinate() {
                    plot_ui.vline(VLine::new(pos.x).color(Color32::GRAY).width(1.0));
                }
            }
        });
}

fn x_axis_label(state: &AppState) -> String {
    let names: Vec<&str> = state.spectra.spectra.iter().map(|s| s.x_name.as_str()).collect();
    match names.split_first() {
        Some((first, rest)) if rest.iter().all(|n| n == first) => match *first {
            X_WAVENUMBER => "Wavenumber [cm-1]".to_string(),
            X_WAVELENGTH => "Wavelength [nm]".to_string(),
            other => other.to_string(),
        },
        _ => "x".to_string(),
    }
}

fn y_axis_label(state: &AppState) -> String {
    let names: Vec<&str> = state.spectra.spectra.iter().map(|s| s.y_name.as_str()).collect();
    match names.split_first() {
        Some((first, rest)) if rest.iter().all(|n| n == first) => match *first {
            "A" => "Absorbance".to_string(),
            other => other.to_string(),
        },
        _ => "y".to_string(),
    }
}
