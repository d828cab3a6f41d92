use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Remote dataset acquisition (Zenodo)
// ---------------------------------------------------------------------------
//
// Resolves a dataset DOI to its Zenodo record, downloads the record archive,
// and unpacks `metadata.json` plus the gzip-compressed spectra bundle into
// the local layout the catalog loader expects. This runs before the viewer
// ever starts (see the `fetch_dataset` binary); failures here are fatal to
// the fetch step and simply retryable.

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("cannot resolve DOI '{0}' to a Zenodo record")]
    Resolution(String),
    #[error("download of {url} failed: {source}")]
    Http {
        url: String,
        source: Box<ureq::Error>,
    },
    #[error("i/o error during acquisition: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed archive: {0}")]
    Archive(String),
}

/// Extract the Zenodo record id from a DOI like `10.5281/zenodo.8313017`.
pub fn zenodo_record_id(doi: &str) -> Result<&str, RemoteError> {
    let (_, id) = doi
        .rsplit_once("zenodo.")
        .ok_or_else(|| RemoteError::Resolution(doi.to_string()))?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RemoteError::Resolution(doi.to_string()));
    }
    Ok(id)
}

/// Download the record archive for `doi` and unpack it into `dest`.
/// Returns the path of the extracted catalog file.
pub fn fetch_dataset(doi: &str, dest: &Path) -> Result<PathBuf, RemoteError> {
    let record = zenodo_record_id(doi)?;
    let url = format!("https://zenodo.org/api/records/{record}/files-archive");
    log::info!("downloading {url}");

    std::fs::create_dir_all(dest)?;
    let archive_path = dest.join(format!("zenodo-{record}.zip"));
    {
        let response = ureq::get(&url).call().map_err(|e| RemoteError::Http {
            url: url.clone(),
            source: Box::new(e),
        })?;
        let mut file = std::fs::File::create(&archive_path)?;
        std::io::copy(&mut response.into_reader(), &mut file)?;
    }

    let file = std::fs::File::open(&archive_path)?;
    let result = extract_archive(file, dest);
    // The downloaded archive is only an intermediate artifact.
    let _ = std::fs::remove_file(&archive_path);
    result?;

    Ok(dest.join("metadata.json"))
}

/// Unpack a record archive: the nested `metadata.json` lands at `dest`, a
/// `.tar.gz` spectra bundle is unpacked below `dest` (yielding
/// `spectra/*.csv`), and any plain CSV entries keep their relative paths.
pub fn extract_archive<R: Read + Seek>(reader: R, dest: &Path) -> Result<(), RemoteError> {
    let mut archive =
        zip::ZipArchive::new(reader).map_err(|e| RemoteError::Archive(e.to_string()))?;

    let mut found_metadata = false;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| RemoteError::Archive(e.to_string()))?;
        let Some(name) = entry.enclosed_name() else {
            return Err(RemoteError::Archive(format!(
                "unsafe entry path '{}'",
                entry.name()
            )));
        };
        let file_name = name
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if file_name == "metadata.json" {
            let mut out = std::fs::File::create(dest.join("metadata.json"))?;
            std::io::copy(&mut entry, &mut out)?;
            found_metadata = true;
        } else if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
            log::info!("unpacking spectra bundle '{file_name}'");
            let mut bundle = tar::Archive::new(GzDecoder::new(&mut entry));
            bundle
                .unpack(dest)
                .map_err(|e| RemoteError::Archive(format!("in '{file_name}': {e}")))?;
        } else if file_name.ends_with(".csv") {
            let target = dest.join(&name);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = std::fs::File::create(target)?;
            std::io::copy(&mut entry, &mut out)?;
        } else if !entry.is_dir() {
            log::debug!("skipping archive entry '{}'", entry.name());
        }
    }

    if !found_metadata {
        return Err(RemoteError::Archive(
            "no metadata.json in record archive".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
