use std::collections::BTreeSet;

use super::catalog::{Analysis, Catalog, CatalogRecord};

// ---------------------------------------------------------------------------
// FilterSelection – which catalog rows the user wants loaded
// ---------------------------------------------------------------------------

/// Per-facet selection: six multi-select sets plus a single Analysis value.
///
/// A record passes when every set facet contains the record's value AND the
/// record's Analysis equals the selected one. An empty set excludes every row;
/// there is no implicit "select all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub regions: BTreeSet<String>,
    pub campaigns: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub treatments: BTreeSet<String>,
    pub exposure_days: BTreeSet<i64>,
    pub polymers: BTreeSet<String>,
    /// Single-select; `None` only for an empty catalog.
    pub analysis: Option<Analysis>,
}

impl FilterSelection {
    /// Initial selection for a freshly loaded catalog: each multi-select facet
    /// gets the first value of its facet domain (first-occurrence order), the
    /// Analysis radio gets the first observed value. Deterministic for a given
    /// catalog so a reload reproduces the same view.
    pub fn defaults(catalog: &Catalog) -> Self {
        fn first_str(domain: Vec<String>) -> BTreeSet<String> {
            domain.into_iter().take(1).collect()
        }
        FilterSelection {
            regions: first_str(catalog.regions()),
            campaigns: first_str(catalog.campaigns()),
            states: first_str(catalog.states()),
            treatments: first_str(catalog.treatments()),
            exposure_days: catalog.exposure_days().into_iter().take(1).collect(),
            polymers: first_str(catalog.polymers()),
            analysis: catalog.analyses().first().copied(),
        }
    }

    /// Conjunction of the seven per-facet predicates.
    pub fn matches(&self, rec: &CatalogRecord) -> bool {
        self.regions.contains(&rec.region)
            && self.campaigns.contains(&rec.campaign)
            && self.states.contains(&rec.state)
            && self.treatments.contains(&rec.treatment)
            && self.exposure_days.contains(&rec.exposure_days)
            && self.polymers.contains(&rec.polymer)
            && self.analysis == Some(rec.analysis)
    }
}

/// Indices of catalog rows passing the selection, in catalog order.
pub fn filtered_indices(catalog: &Catalog, selection: &FilterSelection) -> Vec<usize> {
    catalog
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
