//! Reading and writing the seed dataset on disk.
//!
//! The dataset lives at an explicit caller-supplied path; load and save are
//! plain function calls with no process-wide cache in between.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use thiserror::Error;

use geosweep_core::SeedData;

/// Errors raised when reading or writing the seed dataset.
#[derive(Debug, Error)]
pub enum SeedFileError {
    /// Failed to create the parent directory for the dataset.
    #[error("failed to create parent directory {path:?}")]
    CreateDirectory {
        /// Path of the directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Reading the dataset file failed.
    #[error("failed to read seed data from {path:?}")]
    Read {
        /// Location of the dataset.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The dataset file was not valid JSON.
    #[error("failed to parse seed data at {path:?}")]
    Parse {
        /// Location of the dataset.
        path: Utf8PathBuf,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Serialising the dataset failed.
    #[error("failed to encode seed data")]
    Encode {
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Writing the dataset file failed.
    #[error("failed to write seed data to {path:?}")]
    Write {
        /// Location of the dataset.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Load the seed dataset from a JSON file.
pub fn load_seed_data(path: &Utf8Path) -> Result<SeedData, SeedFileError> {
    let data = std::fs::read(path.as_std_path()).map_err(|source| SeedFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| SeedFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the seed dataset as pretty-printed JSON, creating parent
/// directories as needed.
pub fn save_seed_data(path: &Utf8Path, seed: &SeedData) -> Result<(), SeedFileError> {
    ensure_parent_dir(path)?;
    let payload =
        serde_json::to_string_pretty(seed).map_err(|source| SeedFileError::Encode { source })?;
    std::fs::write(path.as_std_path(), payload).map_err(|source| SeedFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent_dir(path: &Utf8Path) -> Result<(), SeedFileError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = base_dir_and_relative(parent)?;
    base_dir
        .create_dir_all(&relative)
        .map_err(|source| SeedFileError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;

    Ok(())
}

fn base_dir_and_relative(
    parent: &Utf8Path,
) -> Result<(fs_utf8::Dir, Utf8PathBuf), SeedFileError> {
    let (base, relative) = if parent.is_absolute() {
        ("/", parent.strip_prefix("/").unwrap_or(parent))
    } else {
        (".", parent)
    };

    let dir = fs_utf8::Dir::open_ambient_dir(base, ambient_authority()).map_err(|source| {
        SeedFileError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        }
    })?;

    Ok((dir, relative.to_path_buf()))
}
