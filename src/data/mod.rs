/// Data layer: catalog, filtering, spectrum assembly, aggregation.
///
/// Architecture:
/// ```text
///  metadata.json (table-orient)
///        │
///        ▼
///   ┌──────────┐
///   │ catalog   │  parse + validate → Catalog
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ filter    │  FilterSelection → filtered row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │ spectrum  │      │ summary   │
///   │ assembler │      │ cross-tab │
///   └──────────┘      └──────────┘
///        │                  │
///        └──── pipeline ────┘
/// ```
///
/// `remote` sits outside the pipeline: it fetches a Zenodo record archive
/// into the local layout before the catalog loader ever runs.
pub mod catalog;
pub mod filter;
pub mod pipeline;
pub mod remote;
pub mod spectrum;
pub mod summary;
