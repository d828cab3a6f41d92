use std::path::PathBuf;

use eframe::egui;
use plastispec::app::PlastispecApp;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional catalog path; defaults to metadata.json when present.
    let catalog: Option<PathBuf> = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| {
            let default = PathBuf::from("metadata.json");
            default.is_file().then_some(default)
        });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Plastispec – Weathered polymer and biofilm spectra",
        options,
        Box::new(move |_cc| {
            let app = match catalog {
                Some(path) => PlastispecApp::with_catalog(&path),
                None => PlastispecApp::default(),
            };
            Ok(Box::new(app))
        }),
    )
}
