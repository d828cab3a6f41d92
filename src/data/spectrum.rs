use std::io::Write;
use std::path::Path;

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::catalog::{Analysis, Catalog, CatalogRecord};

// ---------------------------------------------------------------------------
// Wavelength ↔ wavenumber conversion
// ---------------------------------------------------------------------------

/// Laser excitation wavelength of the Raman instrument, in nm.
pub const RAMAN_EXCITATION_NM: f64 = 532.0;

/// x column name for spectra measured in wavelength.
pub const X_WAVELENGTH: &str = "nm";
/// x column name for spectra measured in Raman shift / wavenumber.
pub const X_WAVENUMBER: &str = "cm-1";

/// Convert an x value of a Raman spectrum from wavelength [nm] to Raman shift
/// wavenumber [cm-1]: `1e7/excitation − 1e7/w`.
///
/// Defined for `w > 0`. At `w == 0` the division yields infinity and the
/// non-finite result is propagated rather than treated as an error; catalog
/// data never contains a zero wavelength and a non-finite value is immediately
/// visible downstream.
pub fn wavelength_to_wavenumber(w_nm: f64, excitation_nm: f64) -> f64 {
    1e7 / excitation_nm - 1e7 / w_nm
}

// ---------------------------------------------------------------------------
// Spectrum integrity hash
// ---------------------------------------------------------------------------

/// sha256 hex digest of a series as an N×2 f64 row-major little-endian byte
/// array, the same layout the dataset's `spec_hash` column was computed from.
pub fn spectrum_hash(x: &[f64], y: &[f64]) -> String {
    let mut hasher = Sha256::new();
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        hasher.update(xi.to_le_bytes());
        hasher.update(yi.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SpectrumError {
    /// The measurement file is missing or unreadable.
    #[error("failed to read spectrum file '{file}': {source}")]
    Load {
        file: String,
        source: std::io::Error,
    },
    /// The measurement file does not have the expected two-column shape.
    #[error("spectrum file '{file}' is malformed: {reason}")]
    Format { file: String, reason: String },
    /// Conversion was requested for a wavelength axis on a non-Raman record.
    #[error("spectrum file '{file}' has a wavelength axis but the record is not a Raman measurement")]
    UnitMismatch { file: String },
}

// ---------------------------------------------------------------------------
// Measurement file reader
// ---------------------------------------------------------------------------

/// One raw measurement series as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSeries {
    pub x_name: String,
    pub y_name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Read a measurement CSV: one header row, exactly two numeric columns, the
/// first named `nm` or `cm-1`.
pub fn read_series(path: &Path, file: &str) -> Result<MeasurementSeries, SpectrumError> {
    let handle = std::fs::File::open(path).map_err(|source| SpectrumError::Load {
        file: file.to_string(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(handle);

    let headers = reader
        .headers()
        .map_err(|e| SpectrumError::Format {
            file: file.to_string(),
            reason: format!("unreadable header: {e}"),
        })?
        .clone();

    if headers.len() != 2 {
        return Err(SpectrumError::Format {
            file: file.to_string(),
            reason: format!("expected 2 columns, found {}", headers.len()),
        });
    }
    let x_name = headers[0].to_string();
    let y_name = headers[1].to_string();
    if x_name != X_WAVELENGTH && x_name != X_WAVENUMBER {
        return Err(SpectrumError::Format {
            file: file.to_string(),
            reason: format!("x column must be '{X_WAVELENGTH}' or '{X_WAVENUMBER}', found '{x_name}'"),
        });
    }

    let mut x = Vec::new();
    let mut y = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| SpectrumError::Format {
            file: file.to_string(),
            reason: format!("row {row}: {e}"),
        })?;
        if record.len() != 2 {
            return Err(SpectrumError::Format {
                file: file.to_string(),
                reason: format!("row {row}: expected 2 values, found {}", record.len()),
            });
        }
        let parse = |idx: usize, col: &str| -> Result<f64, SpectrumError> {
            record[idx].trim().parse::<f64>().map_err(|_| SpectrumError::Format {
                file: file.to_string(),
                reason: format!("row {row}, column '{col}': '{}' is not a number", &record[idx]),
            })
        };
        x.push(parse(0, &x_name)?);
        y.push(parse(1, &y_name)?);
    }

    Ok(MeasurementSeries { x_name, y_name, x, y })
}

// ---------------------------------------------------------------------------
// SpectrumTable – the assembled long-format table
// ---------------------------------------------------------------------------

/// Catalog columns broadcast onto every point, in catalog column order.
/// Administrative and legacy columns (Polymer_ID, file_legacy,
/// LocationDescription, Country, LAT, LON, spec_hash, x_unit, y_unit) are
/// excluded from the broadcast set.
pub const BROADCAST_COLUMNS: &[&str] = &[
    "Region",
    "Campaign",
    "State",
    "Treatment",
    "Analysis",
    "Exposure_days",
    "Polymer",
    "Supplier",
    "Product_ID",
    "Specifications",
    "file",
    "Replicate",
];

/// One record's series with its broadcast metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSpectrum {
    pub record: CatalogRecord,
    pub x_name: String,
    pub y_name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// The assembled spectra of the current selection, stored block-wise (one
/// block per record). The long format — one row per sample point with the
/// broadcast columns repeated — is materialized at export and plot time; row
/// order is catalog row order × within-file point order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumTable {
    pub spectra: Vec<AssembledSpectrum>,
}

impl SpectrumTable {
    /// Total number of sample points (long-format rows).
    pub fn point_count(&self) -> usize {
        self.spectra.iter().map(|s| s.x.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }

    /// Long-format column names: x column names in first-seen order, then y
    /// column names in first-seen order, then the broadcast metadata columns.
    pub fn columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = Vec::new();
        for sp in &self.spectra {
            if !cols.contains(&sp.x_name) {
                cols.push(sp.x_name.clone());
            }
        }
        for sp in &self.spectra {
            if !cols.contains(&sp.y_name) {
                cols.push(sp.y_name.clone());
            }
        }
        cols.extend(BROADCAST_COLUMNS.iter().map(|c| c.to_string()));
        cols
    }

    /// Serialize the long-format table as UTF-8 CSV. Points whose series does
    /// not use a given x/y column leave that cell empty, matching a column
    /// union over the per-record frames.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let columns = self.columns();
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&columns)?;

        for sp in &self.spectra {
            for (xi, yi) in sp.x.iter().zip(sp.y.iter()) {
                let row: Vec<String> = columns
                    .iter()
                    .map(|col| {
                        if *col == sp.x_name {
                            xi.to_string()
                        } else if *col == sp.y_name {
                            yi.to_string()
                        } else if BROADCAST_COLUMNS.contains(&col.as_str()) {
                            sp.record.cell(col)
                        } else {
                            String::new()
                        }
                    })
                    .collect();
                out.write_record(&row)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Assemble the spectra of the given catalog rows into one table.
///
/// Per record: read its measurement file from `data_root`, optionally convert
/// a wavelength axis to wavenumber, and attach the record for broadcasting.
/// Any per-file failure aborts the whole batch with an error naming the file;
/// no partial table is returned. A spec_hash mismatch is logged but not fatal.
pub fn assemble(
    catalog: &Catalog,
    indices: &[usize],
    convert_wavelength: bool,
    data_root: &Path,
) -> Result<SpectrumTable, SpectrumError> {
    let mut spectra = Vec::with_capacity(indices.len());

    for &idx in indices {
        let record = &catalog.records()[idx];
        let path = data_root.join(&record.file);
        let mut series = read_series(&path, &record.file)?;

        let computed = spectrum_hash(&series.x, &series.y);
        if computed != record.spec_hash {
            log::warn!(
                "spec_hash mismatch for '{}': catalog {}, file {}",
                record.file,
                record.spec_hash,
                computed
            );
        }

        if convert_wavelength && series.x_name == X_WAVELENGTH {
            // A wavelength axis only makes sense for Raman measurements;
            // converting an ATR series would silently corrupt its axis.
            if record.analysis != Analysis::Raman {
                return Err(SpectrumError::UnitMismatch {
                    file: record.file.clone(),
                });
            }
            for v in &mut series.x {
                *v = wavelength_to_wavenumber(*v, RAMAN_EXCITATION_NM);
            }
            series.x_name = X_WAVENUMBER.to_string();
        }

        spectra.push(AssembledSpectrum {
            record: record.clone(),
            x_name: series.x_name,
            y_name: series.y_name,
            x: series.x,
            y: series.y,
        });
    }

    Ok(SpectrumTable { spectra })
}

// ---------------------------------------------------------------------------
// Assembly cache
// ---------------------------------------------------------------------------

/// Cache key: the ordered file list of the filtered rows plus the convert
/// flag. `file` is unique per record, so this is equivalent to content
/// equality of the filtered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleKey {
    files: Vec<String>,
    convert_wavelength: bool,
}

impl AssembleKey {
    pub fn new(catalog: &Catalog, indices: &[usize], convert_wavelength: bool) -> Self {
        AssembleKey {
            files: indices
                .iter()
                .map(|&i| catalog.records()[i].file.clone())
                .collect(),
            convert_wavelength,
        }
    }
}

/// Single-entry memo for the assembler, invalidated explicitly on catalog
/// reload. Repeated calls with unchanged inputs return the cached table
/// without touching the filesystem.
#[derive(Debug, Default)]
pub struct AssembleCache {
    entry: Option<(AssembleKey, SpectrumTable)>,
}

impl AssembleCache {
    pub fn get_or_assemble(
        &mut self,
        catalog: &Catalog,
        indices: &[usize],
        convert_wavelength: bool,
        data_root: &Path,
    ) -> Result<&SpectrumTable, SpectrumError> {
        let key = AssembleKey::new(catalog, indices, convert_wavelength);
        let hit = matches!(&self.entry, Some((k, _)) if *k == key);
        if !hit {
            let table = assemble(catalog, indices, convert_wavelength, data_root)?;
            self.entry = Some((key, table));
        }
        Ok(&self.entry.as_ref().expect("cache entry just set").1)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::tests::sample_catalog_json;

    const RAMAN_FILE: &str = "VLFR_LDPE_bio_a1b2.csv";
    const ATR_FILE: &str = "NAP_PP_nobio_c3d4.csv";

    fn catalog() -> Catalog {
        Catalog::parse(&sample_catalog_json()).unwrap()
    }

    /// Write the two measurement files the sample catalog references:
    /// a 3-point Raman series in nm and a 2-point ATR series in cm-1.
    fn write_fixture_files(dir: &Path) {
        std::fs::write(dir.join(RAMAN_FILE), "nm,Intensity\n540.0,1.5\n545.0,2.5\n550.0,2.0\n")
            .unwrap();
        std::fs::write(dir.join(ATR_FILE), "cm-1,A\n4000.0,0.1\n3998.0,0.2\n").unwrap();
    }

    #[test]
    fn conversion_matches_closed_form() {
        let w = wavelength_to_wavenumber(540.0, RAMAN_EXCITATION_NM);
        let expected = 1e7 / 532.0 - 1e7 / 540.0;
        assert!((w - expected).abs() < 1e-9);
        // Sanity: a 540 nm line under 532 nm excitation sits near 278 cm-1.
        assert!((w - 278.474).abs() < 1e-2);
    }

    #[test]
    fn conversion_at_zero_propagates_non_finite() {
        let w = wavelength_to_wavenumber(0.0, RAMAN_EXCITATION_NM);
        assert!(w.is_infinite() && w < 0.0);
    }

    #[test]
    fn read_series_accepts_both_axis_names() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_files(dir.path());
        let raman = read_series(&dir.path().join(RAMAN_FILE), RAMAN_FILE).unwrap();
        assert_eq!(raman.x_name, "nm");
        assert_eq!(raman.y_name, "Intensity");
        assert_eq!(raman.x, vec![540.0, 545.0, 550.0]);
        let atr = read_series(&dir.path().join(ATR_FILE), ATR_FILE).unwrap();
        assert_eq!(atr.x_name, "cm-1");
        assert_eq!(atr.x.len(), 2);
    }

    #[test]
    fn read_series_rejects_bad_shapes() {
        let dir = tempfile::tempdir().unwrap();

        let three = dir.path().join("three.csv");
        std::fs::write(&three, "nm,Intensity,extra\n1.0,2.0,3.0\n").unwrap();
        let err = read_series(&three, "three.csv").unwrap_err();
        assert!(matches!(err, SpectrumError::Format { .. }));

        let axis = dir.path().join("axis.csv");
        std::fs::write(&axis, "wavelength,Intensity\n1.0,2.0\n").unwrap();
        let err = read_series(&axis, "axis.csv").unwrap_err();
        assert!(err.to_string().contains("axis.csv"));

        let text = dir.path().join("text.csv");
        std::fs::write(&text, "nm,Intensity\nabc,2.0\n").unwrap();
        let err = read_series(&text, "text.csv").unwrap_err();
        assert!(matches!(err, SpectrumError::Format { .. }));
    }

    #[test]
    fn assemble_converts_raman_and_leaves_atr_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_files(dir.path());
        let catalog = catalog();
        let table = assemble(&catalog, &[0, 1], true, dir.path()).unwrap();

        assert_eq!(table.spectra.len(), 2);
        assert_eq!(table.point_count(), 5);

        let raman = &table.spectra[0];
        assert_eq!(raman.x_name, "cm-1");
        let expected = wavelength_to_wavenumber(540.0, RAMAN_EXCITATION_NM);
        assert!((raman.x[0] - expected).abs() < 1e-9);

        let atr = &table.spectra[1];
        assert_eq!(atr.x_name, "cm-1");
        assert_eq!(atr.x, vec![4000.0, 3998.0]);
    }

    #[test]
    fn assemble_without_convert_is_a_no_op_on_axes() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_files(dir.path());
        let catalog = catalog();
        let table = assemble(&catalog, &[0, 1], false, dir.path()).unwrap();
        assert_eq!(table.spectra[0].x_name, "nm");
        assert_eq!(table.spectra[0].x, vec![540.0, 545.0, 550.0]);
        assert_eq!(table.spectra[1].x, vec![4000.0, 3998.0]);
    }

    #[test]
    fn assemble_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_files(dir.path());
        let catalog = catalog();
        let a = assemble(&catalog, &[0, 1], true, dir.path()).unwrap();
        let b = assemble(&catalog, &[0, 1], true, dir.path()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_file_fails_the_batch_naming_it() {
        let dir = tempfile::tempdir().unwrap();
        // Only the Raman file exists.
        std::fs::write(dir.path().join(RAMAN_FILE), "nm,Intensity\n540.0,1.5\n").unwrap();
        let catalog = catalog();
        let err = assemble(&catalog, &[0, 1], true, dir.path()).unwrap_err();
        assert!(matches!(err, SpectrumError::Load { .. }));
        assert!(err.to_string().contains(ATR_FILE));
    }

    #[test]
    fn wavelength_axis_on_non_raman_record_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(RAMAN_FILE), "nm,Intensity\n540.0,1.5\n").unwrap();
        // The ATR record's file carries a wavelength axis.
        std::fs::write(dir.path().join(ATR_FILE), "nm,A\n540.0,0.1\n").unwrap();
        let catalog = catalog();
        let err = assemble(&catalog, &[0, 1], true, dir.path()).unwrap_err();
        assert!(matches!(err, SpectrumError::UnitMismatch { .. }));
        assert!(err.to_string().contains(ATR_FILE));
        // Without conversion the same input is accepted unchanged.
        let table = assemble(&catalog, &[0, 1], false, dir.path()).unwrap();
        assert_eq!(table.spectra[1].x_name, "nm");
    }

    #[test]
    fn empty_selection_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();
        let table = assemble(&catalog, &[], true, dir.path()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.point_count(), 0);
    }

    #[test]
    fn cache_returns_memoized_table_until_cleared() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_files(dir.path());
        let catalog = catalog();
        let mut cache = AssembleCache::default();

        let first = cache
            .get_or_assemble(&catalog, &[0, 1], true, dir.path())
            .unwrap()
            .clone();

        // Remove the files: a cache hit must not touch the filesystem.
        std::fs::remove_file(dir.path().join(RAMAN_FILE)).unwrap();
        std::fs::remove_file(dir.path().join(ATR_FILE)).unwrap();
        let second = cache
            .get_or_assemble(&catalog, &[0, 1], true, dir.path())
            .unwrap()
            .clone();
        assert_eq!(first, second);

        // A different key misses and now fails on the missing files.
        assert!(cache
            .get_or_assemble(&catalog, &[0, 1], false, dir.path())
            .is_err());

        cache.clear();
        assert!(cache
            .get_or_assemble(&catalog, &[0, 1], true, dir.path())
            .is_err());
    }

    #[test]
    fn spec_hash_round_trip() {
        let x = vec![540.0, 545.0];
        let y = vec![1.5, 2.5];
        let h = spectrum_hash(&x, &y);
        assert_eq!(h.len(), 64);
        assert_eq!(h, spectrum_hash(&x, &y));
        // A corrupted series no longer verifies.
        assert_ne!(h, spectrum_hash(&x, &[1.5, 2.4999]));
    }

    #[test]
    fn csv_export_unions_columns_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_files(dir.path());
        let catalog = catalog();
        let table = assemble(&catalog, &[0, 1], true, dir.path()).unwrap();

        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert_eq!(
            header,
            "cm-1,Intensity,A,Region,Campaign,State,Treatment,Analysis,\
             Exposure_days,Polymer,Supplier,Product_ID,Specifications,file,Replicate"
        );
        // 5 points → 5 data rows; Raman rows leave the A column empty.
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 5);
        assert!(rows[0].contains("VLFR"));
        assert!(rows[0].contains(",Raman,"));
        assert!(rows[4].contains(",ATR,"));
    }
}
