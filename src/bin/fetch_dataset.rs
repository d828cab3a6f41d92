use std::path::PathBuf;

use anyhow::{Context, Result};

use plastispec::data::remote;

/// Fetch a spectra dataset from Zenodo into the layout the viewer expects:
/// `metadata.json` plus a `spectra/` directory of measurement CSVs.
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let doi = args
        .next()
        .context("usage: fetch_dataset <DOI> [destination]")?;
    let dest = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    let metadata = remote::fetch_dataset(&doi, &dest)
        .with_context(|| format!("fetching dataset {doi}"))?;

    println!("Catalog ready at {}", metadata.display());
    println!("Start the viewer with: plastispec {}", metadata.display());
    Ok(())
}
