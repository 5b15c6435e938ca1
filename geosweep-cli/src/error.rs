//! Error types emitted by the Geosweep CLI.

use thiserror::Error;

use geosweep_core::{ParseNavFormatError, SequencerError, StoreError};
use geosweep_data::SeedFileError;
use geosweep_data::fetch::FetchError;

/// Errors emitted by the Geosweep CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// The requested navigation format does not exist.
    #[error(transparent)]
    InvalidFormat(#[from] ParseNavFormatError),
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A sequencer operation failed.
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
    /// Downloading the bootstrap datasets failed.
    #[error("failed to fetch seed data: {0}")]
    Fetch(#[from] FetchError),
    /// Reading or writing the seed file failed.
    #[error(transparent)]
    SeedFile(#[from] SeedFileError),
    /// Serialising a response for output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Starting the async runtime for the fetch command failed.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
