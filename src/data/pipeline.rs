use std::path::Path;

use super::catalog::Catalog;
use super::filter::{filtered_indices, FilterSelection};
use super::spectrum::{AssembleCache, SpectrumError, SpectrumTable};
use super::summary::{count_measurements, SummaryTable};

// ---------------------------------------------------------------------------
// The full recomputation pass, independent of any UI toolkit
// ---------------------------------------------------------------------------

/// Caches for the expensive stages, keyed purely by input value equality.
/// Cleared as a whole when a new catalog is loaded; safe to clear at any time.
#[derive(Debug, Default)]
pub struct PipelineCaches {
    pub assemble: AssembleCache,
    summary: Option<SummaryTable>,
}

impl PipelineCaches {
    pub fn clear(&mut self) {
        self.assemble.clear();
        self.summary = None;
    }
}

/// Result of one pipeline pass.
#[derive(Debug)]
pub struct PipelineOutput<'a> {
    /// Catalog row indices passing the selection, in catalog order.
    pub filtered: Vec<usize>,
    /// Assembled spectra of the filtered rows.
    pub spectra: &'a SpectrumTable,
    /// Cross-tab over the full (unfiltered) catalog.
    pub summary: &'a SummaryTable,
}

/// Run filter → assemble → aggregate for one interaction. Synchronous and
/// sequential; an unchanged (selection, convert flag) pair is served from the
/// caches without re-reading any file.
pub fn compute<'a>(
    catalog: &Catalog,
    selection: &FilterSelection,
    convert_wavelength: bool,
    data_root: &Path,
    caches: &'a mut PipelineCaches,
) -> Result<PipelineOutput<'a>, SpectrumError> {
    let filtered = filtered_indices(catalog, selection);
    let PipelineCaches { assemble, summary } = caches;
    let spectra = assemble.get_or_assemble(catalog, &filtered, convert_wavelength, data_root)?;
    let summary = summary.get_or_insert_with(|| count_measurements(catalog));
    Ok(PipelineOutput {
        filtered,
        spectra,
        summary,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::tests::sample_catalog_json;
    use crate::data::catalog::Analysis;

    fn catalog() -> Catalog {
        Catalog::parse(&sample_catalog_json()).unwrap()
    }

    fn write_fixture_files(dir: &Path) {
        std::fs::write(
            dir.join("VLFR_LDPE_bio_a1b2.csv"),
            "nm,Intensity\n540.0,1.5\n545.0,2.5\n550.0,2.0\n",
        )
        .unwrap();
        std::fs::write(dir.join("NAP_PP_nobio_c3d4.csv"), "cm-1,A\n4000.0,0.1\n3998.0,0.2\n")
            .unwrap();
    }

    #[test]
    fn empty_selection_produces_empty_table_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();
        let mut caches = PipelineCaches::default();
        // Default-constructed selection: every set empty, no analysis.
        let selection = FilterSelection::default();
        let out = compute(&catalog, &selection, true, dir.path(), &mut caches).unwrap();
        assert!(out.filtered.is_empty());
        assert!(out.spectra.is_empty());
        // The summary still covers the full catalog.
        assert_eq!(out.summary.total(), catalog.len());
    }

    #[test]
    fn repeated_pass_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_files(dir.path());
        let catalog = catalog();
        let mut caches = PipelineCaches::default();
        let mut selection = FilterSelection::defaults(&catalog);
        selection.analysis = Some(Analysis::Raman);

        let first = {
            let out = compute(&catalog, &selection, true, dir.path(), &mut caches).unwrap();
            out.spectra.clone()
        };
        // Remove the files: the identical pass must not touch the filesystem.
        std::fs::remove_file(dir.path().join("VLFR_LDPE_bio_a1b2.csv")).unwrap();
        let out = compute(&catalog, &selection, true, dir.path(), &mut caches).unwrap();
        assert_eq!(*out.spectra, first);
    }

    #[test]
    fn clear_invalidates_both_caches() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_files(dir.path());
        let catalog = catalog();
        let mut caches = PipelineCaches::default();
        let selection = FilterSelection::defaults(&catalog);

        compute(&catalog, &selection, false, dir.path(), &mut caches).unwrap();
        std::fs::remove_file(dir.path().join("VLFR_LDPE_bio_a1b2.csv")).unwrap();
        caches.clear();
        let err = compute(&catalog, &selection, false, dir.path(), &mut caches).unwrap_err();
        assert!(err.to_string().contains("VLFR_LDPE_bio_a1b2.csv"));
    }
}
