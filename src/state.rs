use std::path::{Path, PathBuf};

use crate::color::ColorMap;
use crate::data::catalog::{Catalog, CatalogError};
use crate::data::filter::FilterSelection;
use crate::data::pipeline::{self, PipelineCaches};
use crate::data::spectrum::SpectrumTable;
use crate::data::summary::SummaryTable;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. Every interaction mutates the
/// selection or a toggle and then runs [`AppState::recompute`], which performs
/// the whole filter → assemble → aggregate pass (served from caches when the
/// inputs are unchanged).
pub struct AppState {
    /// Loaded catalog (None until a metadata file is opened).
    pub catalog: Option<Catalog>,

    /// Directory the measurement CSVs are read from.
    pub data_root: PathBuf,

    /// Current facet selection.
    pub selection: FilterSelection,

    /// Convert wavelength [nm] axes to wavenumber [cm-1] while assembling.
    pub convert_wavelength: bool,

    /// Show the hover ruler in the plot (presentation only).
    pub show_ruler: bool,

    /// Show the raw catalog / summary / spectra tables (presentation only).
    pub show_raw_data: bool,

    /// Catalog row indices passing the current selection.
    pub filtered: Vec<usize>,

    /// Assembled spectra of the current selection; empty on assembly failure.
    pub spectra: SpectrumTable,

    /// Cross-tab over the full catalog.
    pub summary: SummaryTable,

    /// Per-file line colours for the plot.
    pub color_map: ColorMap,

    /// Whether the last pass converted at least one wavelength axis.
    pub converted_any: bool,

    /// Error / status message shown in the UI.
    pub status_message: Option<String>,

    /// Region shown in the detailed summary heatmap.
    pub summary_region: Option<String>,
    /// Treatment shown in the detailed summary heatmap.
    pub summary_treatment: Option<String>,
    /// Analysis shown in the detailed summary heatmap.
    pub summary_analysis: Option<crate::data::catalog::Analysis>,

    caches: PipelineCaches,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            catalog: None,
            data_root: PathBuf::from("spectra"),
            selection: FilterSelection::default(),
            convert_wavelength: false,
            show_ruler: false,
            show_raw_data: false,
            filtered: Vec::new(),
            spectra: SpectrumTable::default(),
            summary: SummaryTable::default(),
            color_map: ColorMap::default(),
            converted_any: false,
            status_message: None,
            summary_region: None,
            summary_treatment: None,
            summary_analysis: None,
            caches: PipelineCaches::default(),
        }
    }
}

impl AppState {
    /// Load a catalog file; measurement files are resolved from a `spectra`
    /// directory next to it. A load error leaves the previous state untouched
    /// apart from the status message (no partial catalog is ever used).
    pub fn load_catalog(&mut self, path: &Path) -> Result<(), CatalogError> {
        let catalog = Catalog::load(path)?;
        let root = path
            .parent()
            .map(|p| p.join("spectra"))
            .unwrap_or_else(|| PathBuf::from("spectra"));
        self.set_catalog(catalog, root);
        Ok(())
    }

    /// Ingest a loaded catalog: reset caches, apply the deterministic default
    /// selection, and run the first pipeline pass.
    pub fn set_catalog(&mut self, catalog: Catalog, data_root: PathBuf) {
        self.selection = FilterSelection::defaults(&catalog);
        self.summary_region = catalog.regions().first().cloned();
        self.summary_treatment = catalog.treatments().first().cloned();
        self.summary_analysis = catalog.analyses().first().copied();
        self.catalog = Some(catalog);
        self.data_root = data_root;
        self.caches.clear();
        self.status_message = None;
        self.recompute();
    }

    /// Run the pipeline for the current selection and toggles. On assembly
    /// failure the spectra table is emptied and the error (naming the
    /// offending file) is surfaced; the failure is never silent.
    pub fn recompute(&mut self) {
        let Some(catalog) = &self.catalog else {
            return;
        };

        match pipeline::compute(
            catalog,
            &self.selection,
            self.convert_wavelength,
            &self.data_root,
            &mut self.caches,
        ) {
            Ok(out) => {
                self.filtered = out.filtered;
                self.spectra = out.spectra.clone();
                self.summary = out.summary.clone();
                self.color_map =
                    ColorMap::new(self.spectra.spectra.iter().map(|s| s.record.file.as_str()));
                self.converted_any = self.convert_wavelength
                    && self
                        .spectra
                        .spectra
                        .iter()
                        .any(|s| s.record.x_unit == crate::data::catalog::XUnit::Nanometer);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("assembly failed: {e}");
                self.filtered.clear();
                self.spectra = SpectrumTable::default();
                self.color_map = ColorMap::default();
                self.converted_any = false;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Export is offered only when the assembled table is non-empty.
    pub fn export_enabled(&self) -> bool {
        !self.spectra.is_empty()
    }

    /// Write the current spectra table as UTF-8 CSV.
    pub fn export_csv(&self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        self.spectra.write_csv(file)?;
        log::info!(
            "exported {} points to {}",
            self.spectra.point_count(),
            path.display()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::tests::sample_catalog_json;
    use crate::data::catalog::Analysis;

    /// A catalog directory with metadata.json and its spectra folder.
    fn dataset_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("metadata.json"), sample_catalog_json()).unwrap();
        let spectra = dir.path().join("spectra");
        std::fs::create_dir(&spectra).unwrap();
        std::fs::write(
            spectra.join("VLFR_LDPE_bio_a1b2.csv"),
            "nm,Intensity\n540.0,1.5\n545.0,2.5\n550.0,2.0\n",
        )
        .unwrap();
        std::fs::write(spectra.join("NAP_PP_nobio_c3d4.csv"), "cm-1,A\n4000.0,0.1\n3998.0,0.2\n")
            .unwrap();
        dir
    }

    #[test]
    fn load_applies_defaults_and_assembles() {
        let dir = dataset_dir();
        let mut state = AppState::default();
        state.load_catalog(&dir.path().join("metadata.json")).unwrap();

        // Defaults select exactly the first Raman record.
        assert_eq!(state.filtered, vec![0]);
        assert_eq!(state.spectra.point_count(), 3);
        assert!(state.export_enabled());
        assert!(state.status_message.is_none());
    }

    #[test]
    fn empty_selection_disables_export_without_error() {
        let dir = dataset_dir();
        let mut state = AppState::default();
        state.load_catalog(&dir.path().join("metadata.json")).unwrap();

        state.selection.regions.clear();
        state.recompute();
        assert!(state.filtered.is_empty());
        assert!(!state.export_enabled());
        assert!(state.status_message.is_none());
    }

    #[test]
    fn missing_measurement_file_surfaces_its_name() {
        let dir = dataset_dir();
        std::fs::remove_file(dir.path().join("spectra/NAP_PP_nobio_c3d4.csv")).unwrap();
        let mut state = AppState::default();
        state.load_catalog(&dir.path().join("metadata.json")).unwrap();

        // Switch to the ATR record whose file is gone.
        state.selection = FilterSelection {
            regions: ["NAP".to_string()].into_iter().collect(),
            campaigns: ["Autumn".to_string()].into_iter().collect(),
            states: ["ethanol".to_string()].into_iter().collect(),
            treatments: ["nobio".to_string()].into_iter().collect(),
            exposure_days: [30].into_iter().collect(),
            polymers: ["(03) PP".to_string()].into_iter().collect(),
            analysis: Some(Analysis::Atr),
        };
        state.recompute();

        assert!(state.spectra.is_empty());
        assert!(!state.export_enabled());
        let msg = state.status_message.as_deref().unwrap();
        assert!(msg.contains("NAP_PP_nobio_c3d4.csv"));
    }

    #[test]
    fn export_writes_csv() {
        let dir = dataset_dir();
        let mut state = AppState::default();
        state.load_catalog(&dir.path().join("metadata.json")).unwrap();
        state.convert_wavelength = true;
        state.recompute();
        assert!(state.converted_any);

        let out = dir.path().join("export.csv");
        state.export_csv(&out).unwrap();
        let text = std::fs::read_to_string(out).unwrap();
        assert!(text.starts_with("cm-1,Intensity,"));
        assert_eq!(text.lines().count(), 1 + state.spectra.point_count());
    }
}
