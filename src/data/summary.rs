use std::collections::{BTreeMap, BTreeSet};

use super::catalog::{Analysis, Catalog};

// ---------------------------------------------------------------------------
// SummaryTable – measurement counts per sample, pivoted by Analysis×Treatment
// ---------------------------------------------------------------------------

/// Key columns of the summary cross-tab, in output order. Analysis and
/// Treatment are pivoted out of the key into the count columns.
pub const SUMMARY_KEY_COLUMNS: &[&str] = &[
    "Region",
    "Campaign",
    "State",
    "Exposure_days",
    "Polymer_ID",
    "Polymer",
    "Supplier",
    "Product_ID",
    "Specifications",
];

/// Identity of one sample in the summary view.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SampleKey {
    pub region: String,
    pub campaign: String,
    pub state: String,
    pub exposure_days: i64,
    pub polymer_id: i64,
    pub polymer: String,
    pub supplier: String,
    pub product_id: String,
    pub specifications: String,
}

impl SampleKey {
    /// Cell values in `SUMMARY_KEY_COLUMNS` order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.region.clone(),
            self.campaign.clone(),
            self.state.clone(),
            self.exposure_days.to_string(),
            self.polymer_id.to_string(),
            self.polymer.clone(),
            self.supplier.clone(),
            self.product_id.clone(),
            self.specifications.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub key: SampleKey,
    /// One entry per count column; `None` where the combination never occurs.
    pub counts: Vec<Option<usize>>,
}

/// Cross-tab of measurement counts. Derived from the full catalog, read-only,
/// recomputed only when the catalog is reloaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTable {
    /// Pivoted column names, `"{Analysis} {Treatment}"`, in sorted order.
    pub count_columns: Vec<String>,
    /// Rows in sorted key order.
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Index of the count column for an Analysis/Treatment pair.
    pub fn column_index(&self, analysis: Analysis, treatment: &str) -> Option<usize> {
        let name = pivot_column_name(analysis, treatment);
        self.count_columns.iter().position(|c| *c == name)
    }

    /// Sum of all counts; equals the catalog row count.
    pub fn total(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.counts.iter())
            .map(|c| c.unwrap_or(0))
            .sum()
    }
}

fn pivot_column_name(analysis: Analysis, treatment: &str) -> String {
    format!("{analysis} {treatment}").trim().to_string()
}

/// Count measurements per sample and pivot Analysis×Treatment into columns.
pub fn count_measurements(catalog: &Catalog) -> SummaryTable {
    let mut groups: BTreeMap<SampleKey, BTreeMap<(Analysis, String), usize>> = BTreeMap::new();
    let mut pivots: BTreeSet<(Analysis, String)> = BTreeSet::new();

    for rec in catalog.records() {
        let key = SampleKey {
            region: rec.region.clone(),
            campaign: rec.campaign.clone(),
            state: rec.state.clone(),
            exposure_days: rec.exposure_days,
            polymer_id: rec.polymer_id,
            polymer: rec.polymer.clone(),
            supplier: rec.supplier.clone(),
            product_id: rec.product_id.clone(),
            specifications: rec.specifications.clone(),
        };
        let pivot = (rec.analysis, rec.treatment.clone());
        pivots.insert(pivot.clone());
        *groups.entry(key).or_default().entry(pivot).or_insert(0) += 1;
    }

    let pivot_order: Vec<(Analysis, String)> = pivots.into_iter().collect();
    let count_columns: Vec<String> = pivot_order
        .iter()
        .map(|(a, t)| pivot_column_name(*a, t))
        .collect();

    let rows = groups
        .into_iter()
        .map(|(key, counts)| SummaryRow {
            counts: pivot_order
                .iter()
                .map(|p| counts.get(p).copied())
                .collect(),
            key,
        })
        .collect();

    SummaryTable {
        count_columns,
        rows,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::tests::sample_catalog_json;

    fn catalog() -> Catalog {
        Catalog::parse(&sample_catalog_json()).unwrap()
    }

    #[test]
    fn counts_sum_to_catalog_rows() {
        let catalog = catalog();
        let summary = count_measurements(&catalog);
        assert_eq!(summary.total(), catalog.len());
    }

    #[test]
    fn pivot_column_names_join_with_single_space() {
        let summary = count_measurements(&catalog());
        assert_eq!(summary.count_columns, vec!["Raman bio", "ATR nobio"]);
        for name in &summary.count_columns {
            assert_eq!(name, name.trim());
        }
    }

    #[test]
    fn rows_carry_counts_per_pivot() {
        let summary = count_measurements(&catalog());
        assert_eq!(summary.rows.len(), 2);

        // Rows come out in sorted key order: NAP before VLFR.
        let nap = &summary.rows[0];
        assert_eq!(nap.key.region, "NAP");
        let atr_col = summary.column_index(Analysis::Atr, "nobio").unwrap();
        assert_eq!(nap.counts[atr_col], Some(1));
        let raman_col = summary.column_index(Analysis::Raman, "bio").unwrap();
        assert_eq!(nap.counts[raman_col], None);

        let vlfr = &summary.rows[1];
        assert_eq!(vlfr.key.region, "VLFR");
        assert_eq!(vlfr.counts[raman_col], Some(1));
    }

    #[test]
    fn recomputation_is_deterministic() {
        let catalog = catalog();
        assert_eq!(count_measurements(&catalog), count_measurements(&catalog));
    }
}
