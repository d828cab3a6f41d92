use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Enumerated columns
// ---------------------------------------------------------------------------

/// Type of spectroscopy used for a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Analysis {
    Raman,
    #[serde(rename = "ATR")]
    Atr,
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analysis::Raman => write!(f, "Raman"),
            Analysis::Atr => write!(f, "ATR"),
        }
    }
}

/// Unit of a spectrum's x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XUnit {
    #[serde(rename = "nm")]
    Nanometer,
    #[serde(rename = "cm-1")]
    Wavenumber,
}

impl fmt::Display for XUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XUnit::Nanometer => write!(f, "nm"),
            XUnit::Wavenumber => write!(f, "cm-1"),
        }
    }
}

/// Unit of a spectrum's y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YUnit {
    #[serde(rename = "A")]
    Absorbance,
    Intensity,
}

impl fmt::Display for YUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YUnit::Absorbance => write!(f, "A"),
            YUnit::Intensity => write!(f, "Intensity"),
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogRecord – one row of the metadata table
// ---------------------------------------------------------------------------

/// One measurement: experimental conditions plus a pointer to the spectrum file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Campaign")]
    pub campaign: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Treatment")]
    pub treatment: String,
    #[serde(rename = "Analysis")]
    pub analysis: Analysis,
    #[serde(rename = "Exposure_days")]
    pub exposure_days: i64,
    #[serde(rename = "Polymer")]
    pub polymer: String,
    #[serde(rename = "Polymer_ID")]
    pub polymer_id: i64,
    #[serde(rename = "Supplier")]
    pub supplier: String,
    #[serde(rename = "Product_ID")]
    pub product_id: String,
    #[serde(rename = "Specifications")]
    pub specifications: String,
    /// Relative path of the measurement CSV, unique per record.
    pub file: String,
    /// Original file name before dataset standardisation.
    pub file_legacy: String,
    #[serde(rename = "LocationDescription")]
    pub location_description: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "LAT")]
    pub lat: f64,
    #[serde(rename = "LON")]
    pub lon: f64,
    /// sha256 hex digest of the series as an N×2 f64 row-major LE byte array.
    pub spec_hash: String,
    pub x_unit: XUnit,
    pub y_unit: YUnit,
    #[serde(rename = "Replicate", default)]
    pub replicate: Option<String>,
}

impl CatalogRecord {
    /// Rendered cell value for a named column, for table display and export.
    pub fn cell(&self, column: &str) -> String {
        match column {
            "Region" => self.region.clone(),
            "Campaign" => self.campaign.clone(),
            "State" => self.state.clone(),
            "Treatment" => self.treatment.clone(),
            "Analysis" => self.analysis.to_string(),
            "Exposure_days" => self.exposure_days.to_string(),
            "Polymer" => self.polymer.clone(),
            "Polymer_ID" => self.polymer_id.to_string(),
            "Supplier" => self.supplier.clone(),
            "Product_ID" => self.product_id.clone(),
            "Specifications" => self.specifications.clone(),
            "file" => self.file.clone(),
            "file_legacy" => self.file_legacy.clone(),
            "LocationDescription" => self.location_description.clone(),
            "Country" => self.country.clone(),
            "LAT" => self.lat.to_string(),
            "LON" => self.lon.to_string(),
            "spec_hash" => self.spec_hash.clone(),
            "x_unit" => self.x_unit.to_string(),
            "y_unit" => self.y_unit.to_string(),
            "Replicate" => self.replicate.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog – the full metadata table
// ---------------------------------------------------------------------------

/// Columns that must be declared by the catalog schema.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Region",
    "Campaign",
    "State",
    "Treatment",
    "Analysis",
    "Exposure_days",
    "Polymer",
    "Polymer_ID",
    "Supplier",
    "Product_ID",
    "Specifications",
    "file",
    "file_legacy",
    "LocationDescription",
    "Country",
    "LAT",
    "LON",
    "spec_hash",
    "x_unit",
    "y_unit",
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("catalog {path} is not valid JSON: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("catalog is not table-oriented JSON: missing {0}")]
    NotTableOriented(&'static str),
    #[error("catalog schema is missing required column '{0}'")]
    MissingColumn(String),
    #[error("catalog row {row}: {source}")]
    Row {
        row: usize,
        source: serde_json::Error,
    },
}

/// The loaded catalog. Single source of truth, never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
    /// Column names in the order declared by the catalog schema.
    columns: Vec<String>,
}

impl Catalog {
    /// Load a catalog from a pandas `orient="table"` JSON file:
    /// `{"schema": {"fields": [{"name": ...}, ...]}, "data": [{...}, ...]}`.
    pub fn load(path: &Path) -> Result<Catalog, CatalogError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: display.clone(),
            source,
        })?;
        Self::parse(&text).map_err(|e| match e {
            CatalogError::Json { source, .. } => CatalogError::Json {
                path: display,
                source,
            },
            other => other,
        })
    }

    /// Parse a table-oriented JSON document.
    pub fn parse(text: &str) -> Result<Catalog, CatalogError> {
        let root: JsonValue =
            serde_json::from_str(text).map_err(|source| CatalogError::Json {
                path: String::new(),
                source,
            })?;

        let fields = root
            .get("schema")
            .and_then(|s| s.get("fields"))
            .and_then(|f| f.as_array())
            .ok_or(CatalogError::NotTableOriented("schema.fields"))?;

        // Declared column order; pandas emits the index as a field too, skip it.
        let columns: Vec<String> = fields
            .iter()
            .filter_map(|f| f.get("name").and_then(|n| n.as_str()))
            .filter(|name| *name != "index")
            .map(|name| name.to_string())
            .collect();

        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(CatalogError::MissingColumn(required.to_string()));
            }
        }

        let data = root
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or(CatalogError::NotTableOriented("data"))?;

        let mut records = Vec::with_capacity(data.len());
        for (row, value) in data.iter().enumerate() {
            let record: CatalogRecord = serde_json::from_value(value.clone())
                .map_err(|source| CatalogError::Row { row, source })?;
            records.push(record);
        }

        Ok(Catalog { records, columns })
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    /// Column names in declared order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // -- Facet domains ------------------------------------------------------

    /// Unique values of a string facet in first-occurrence order,
    /// matching the order a `unique()` call on the column would give.
    fn unique_strings(&self, get: impl Fn(&CatalogRecord) -> &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for rec in &self.records {
            let v = get(rec);
            if seen.insert(v.to_string()) {
                out.push(v.to_string());
            }
        }
        out
    }

    pub fn regions(&self) -> Vec<String> {
        self.unique_strings(|r| &r.region)
    }

    pub fn campaigns(&self) -> Vec<String> {
        self.unique_strings(|r| &r.campaign)
    }

    pub fn states(&self) -> Vec<String> {
        self.unique_strings(|r| &r.state)
    }

    pub fn treatments(&self) -> Vec<String> {
        self.unique_strings(|r| &r.treatment)
    }

    pub fn polymers(&self) -> Vec<String> {
        self.unique_strings(|r| &r.polymer)
    }

    pub fn exposure_days(&self) -> Vec<i64> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for rec in &self.records {
            if seen.insert(rec.exposure_days) {
                out.push(rec.exposure_days);
            }
        }
        out
    }

    pub fn analyses(&self) -> Vec<Analysis> {
        let mut out: Vec<Analysis> = Vec::new();
        for rec in &self.records {
            if !out.contains(&rec.analysis) {
                out.push(rec.analysis);
            }
        }
        out
    }

    // -- Overview metrics ---------------------------------------------------

    pub fn count_analysis(&self, analysis: Analysis) -> usize {
        self.records
            .iter()
            .filter(|r| r.analysis == analysis)
            .count()
    }

    /// Number of distinct samples: groups of
    /// (Region, Campaign, State, Exposure_days, Polymer_ID).
    pub fn sample_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| {
                (
                    &r.region,
                    &r.campaign,
                    &r.state,
                    r.exposure_days,
                    r.polymer_id,
                )
            })
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Sample count including replicates; a missing Replicate counts as "A".
    pub fn sample_count_with_replicates(&self) -> usize {
        self.records
            .iter()
            .map(|r| {
                (
                    &r.region,
                    &r.campaign,
                    &r.state,
                    r.exposure_days,
                    r.polymer_id,
                    r.replicate.as_deref().unwrap_or("A"),
                )
            })
            .collect::<BTreeSet<_>>()
            .len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A two-record table-orient catalog: one Raman/nm and one ATR/cm-1.
    pub(crate) fn sample_catalog_json() -> String {
        let fields: Vec<String> = std::iter::once("index".to_string())
            .chain(REQUIRED_COLUMNS.iter().map(|c| c.to_string()))
            .chain(std::iter::once("Replicate".to_string()))
            .map(|name| format!(r#"{{"name": "{name}"}}"#))
            .collect();
        format!(
            r#"{{
  "schema": {{"fields": [{fields}], "primaryKey": ["index"], "pandas_version": "1.4.0"}},
  "data": [
    {{
      "index": 0,
      "Region": "VLFR", "Campaign": "Summer", "State": "dry", "Treatment": "bio",
      "Analysis": "Raman", "Exposure_days": 7, "Polymer": "(01) LDPE", "Polymer_ID": 1,
      "Supplier": "Carat", "Product_ID": "CRT102.50", "Specifications": "without stabilizers",
      "file": "VLFR_LDPE_bio_a1b2.csv", "file_legacy": "old/raman_001.txt",
      "LocationDescription": "Villefranche-sur-Mer", "Country": "France",
      "LAT": 43.682, "LON": 7.309, "spec_hash": "00", "x_unit": "nm", "y_unit": "Intensity",
      "Replicate": "A"
    }},
    {{
      "index": 1,
      "Region": "NAP", "Campaign": "Autumn", "State": "ethanol", "Treatment": "nobio",
      "Analysis": "ATR", "Exposure_days": 30, "Polymer": "(03) PP", "Polymer_ID": 3,
      "Supplier": "Carat", "Product_ID": "CRT200.00", "Specifications": "homo polymer",
      "file": "NAP_PP_nobio_c3d4.csv", "file_legacy": "old/atr_014.txt",
      "LocationDescription": "Naples", "Country": "Italy",
      "LAT": 40.836, "LON": 14.306, "spec_hash": "00", "x_unit": "cm-1", "y_unit": "A",
      "Replicate": null
    }}
  ]
}}"#,
            fields = fields.join(", ")
        )
    }

    #[test]
    fn parses_table_oriented_json() {
        let catalog = Catalog::parse(&sample_catalog_json()).unwrap();
        assert_eq!(catalog.len(), 2);
        let rec = &catalog.records()[0];
        assert_eq!(rec.region, "VLFR");
        assert_eq!(rec.analysis, Analysis::Raman);
        assert_eq!(rec.exposure_days, 7);
        assert_eq!(rec.x_unit, XUnit::Nanometer);
        assert_eq!(rec.replicate.as_deref(), Some("A"));
        assert_eq!(catalog.records()[1].y_unit, YUnit::Absorbance);
        assert_eq!(catalog.records()[1].replicate, None);
    }

    #[test]
    fn preserves_declared_column_order() {
        let catalog = Catalog::parse(&sample_catalog_json()).unwrap();
        // "index" is dropped; the rest keep schema order.
        assert_eq!(catalog.columns()[0], "Region");
        assert_eq!(catalog.columns()[4], "Analysis");
        assert_eq!(*catalog.columns().last().unwrap(), "Replicate");
    }

    #[test]
    fn facet_domains_in_first_occurrence_order() {
        let catalog = Catalog::parse(&sample_catalog_json()).unwrap();
        assert_eq!(catalog.regions(), vec!["VLFR", "NAP"]);
        assert_eq!(catalog.exposure_days(), vec![7, 30]);
        assert_eq!(catalog.analyses(), vec![Analysis::Raman, Analysis::Atr]);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let text = sample_catalog_json().replace(r#"{"name": "spec_hash"}, "#, "");
        let err = Catalog::parse(&text).unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn(ref c) if c == "spec_hash"));
    }

    #[test]
    fn non_table_json_is_an_error() {
        let err = Catalog::parse(r#"[{"Region": "VLFR"}]"#).unwrap_err();
        assert!(matches!(err, CatalogError::NotTableOriented(_)));
    }

    #[test]
    fn overview_metrics() {
        let catalog = Catalog::parse(&sample_catalog_json()).unwrap();
        assert_eq!(catalog.count_analysis(Analysis::Raman), 1);
        assert_eq!(catalog.count_analysis(Analysis::Atr), 1);
        assert_eq!(catalog.sample_count(), 2);
        assert_eq!(catalog.sample_count_with_replicates(), 2);
    }
}
