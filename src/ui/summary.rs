use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::catalog::Analysis;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Summary view (bottom panel): count heatmap + full cross-tab
// ---------------------------------------------------------------------------

/// Render the measurement-count summary: radio controls picking one
/// Region/Treatment/Analysis slice, a Polymer × Exposure_days heatmap of the
/// counts in that slice, and the full cross-tab behind an expander.
pub fn summary_panel(ui: &mut Ui, state: &mut AppState) {
    let (regions, treatments, analyses) = match &state.catalog {
        Some(catalog) => (catalog.regions(), catalog.treatments(), catalog.analyses()),
        None => return,
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Measurement counts");
        ui.separator();

        ui.label("Region:");
        for region in regions {
            let selected = state.summary_region.as_deref() == Some(region.as_str());
            if ui.radio(selected, region.as_str()).clicked() {
                state.summary_region = Some(region);
            }
        }
        ui.separator();

        ui.label("Treatment:");
        for treatment in treatments {
            let selected = state.summary_treatment.as_deref() == Some(treatment.as_str());
            if ui.radio(selected, treatment.as_str()).clicked() {
                state.summary_treatment = Some(treatment);
            }
        }
        ui.separator();

        ui.label("Counts of:");
        for analysis in analyses {
            if ui
                .radio(state.summary_analysis == Some(analysis), analysis.to_string())
                .clicked()
            {
                state.summary_analysis = Some(analysis);
            }
        }
    });

    let (Some(region), Some(treatment), Some(analysis)) = (
        state.summary_region.clone(),
        state.summary_treatment.clone(),
        state.summary_analysis,
    ) else {
        return;
    };

    heatmap(ui, state, &region, &treatment, analysis);

    egui::CollapsingHeader::new("Full cross-tab")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            cross_tab_table(ui, state);
        });
}

/// Polymer × Exposure_days grid of counts for one summary slice, shaded by
/// count. Counts are summed over campaigns and states.
fn heatmap(ui: &mut Ui, state: &AppState, region: &str, treatment: &str, analysis: Analysis) {
    let Some(col) = state.summary.column_index(analysis, treatment) else {
        ui.label(format!("No {analysis} {treatment} measurements in the catalog."));
        return;
    };

    // Axis domains restricted to the chosen region, in sorted key order.
    let mut polymers: Vec<String> = Vec::new();
    let mut days: Vec<i64> = Vec::new();
    for row in state.summary.rows.iter().filter(|r| r.key.region == region) {
        if !polymers.contains(&row.key.polymer) {
            polymers.push(row.key.polymer.clone());
        }
        if !days.contains(&row.key.exposure_days) {
            days.push(row.key.exposure_days);
        }
    }
    days.sort_unstable();
    if polymers.is_empty() {
        ui.label(format!("No measurements from region {region}."));
        return;
    }

    let count_at = |polymer: &str, day: i64| -> usize {
        state
            .summary
            .rows
            .iter()
            .filter(|r| {
                r.key.region == region && r.key.polymer == polymer && r.key.exposure_days == day
            })
            .map(|r| r.counts[col].unwrap_or(0))
            .sum()
    };
    let max_count = polymers
        .iter()
        .flat_map(|p| days.iter().map(|&d| count_at(p, d)))
        .max()
        .unwrap_or(0)
        .max(1);

    egui::Grid::new("summary_heatmap")
        .spacing([4.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for &day in &days {
                ui.strong(format!("{day} d"));
            }
            ui.end_row();

            for polymer in &polymers {
                ui.label(polymer);
                for &day in &days {
                    let count = count_at(polymer, day);
                    let shade = (count as f32 / max_count as f32 * 200.0) as u8;
                    let fill = if count == 0 {
                        Color32::from_gray(40)
                    } else {
                        Color32::from_rgb(40, 55 + shade, 40)
                    };
                    let text = if count == 0 {
                        RichText::new("·").color(Color32::from_gray(100))
                    } else {
                        RichText::new(count.to_string()).color(Color32::WHITE)
                    };
                    egui::Frame::default()
                        .fill(fill)
                        .inner_margin(egui::Margin::same(6))
                        .show(ui, |ui: &mut Ui| {
                            ui.label(text);
                        });
                }
                ui.end_row();
            }
        });
}

/// The eleven-column cross-tab as a plain table.
fn cross_tab_table(ui: &mut Ui, state: &AppState) {
    use crate::data::summary::SUMMARY_KEY_COLUMNS;

    let n_cols = SUMMARY_KEY_COLUMNS.len() + state.summary.count_columns.len();
    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::auto().resizable(true), n_cols)
        .header(20.0, |mut header| {
            for col in SUMMARY_KEY_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(*col);
                });
            }
            for col in &state.summary.count_columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, state.summary.rows.len(), |mut row| {
                let summary_row = &state.summary.rows[row.index()];
                for cell in summary_row.key.cells() {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell);
                    });
                }
                for count in &summary_row.counts {
                    row.col(|ui: &mut Ui| {
                        ui.label(count.map(|c| c.to_string()).unwrap_or_default());
                    });
                }
            });
        });
}
