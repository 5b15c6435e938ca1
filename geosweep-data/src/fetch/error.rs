//! Error types produced by the dataset fetch helpers.

use std::io;

use thiserror::Error;

/// Transport-level errors encountered while issuing HTTP requests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The server returned an HTTP error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description supplied by the server.
        message: String,
    },
    /// The request failed due to an I/O error.
    #[error("network error contacting {url}: {source}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// I/O error reported by the transport.
        source: io::Error,
    },
}

/// Errors produced while assembling the seed dataset.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The country listing could not be fetched.
    #[error("failed to fetch the country listing: {source}")]
    CountryListing {
        /// Transport failure.
        source: TransportError,
    },
    /// The city listing could not be fetched.
    #[error("failed to fetch the city listing: {source}")]
    CityListing {
        /// Transport failure.
        source: TransportError,
    },
    /// The country listing was not valid JSON.
    #[error("failed to parse the country listing: {source}")]
    ParseCountries {
        /// JSON decoding failure.
        source: serde_json::Error,
    },
    /// The city listing was not valid JSON.
    #[error("failed to parse the city listing: {source}")]
    ParseCities {
        /// JSON decoding failure.
        source: serde_json::Error,
    },
    /// A postal archive could not be fetched.
    #[error("failed to fetch the postal archive for {country}: {source}")]
    PostalArchive {
        /// Country the archive belongs to.
        country: String,
        /// Transport failure.
        source: TransportError,
    },
    /// A postal archive could not be opened.
    #[error("failed to open the postal archive for {country}")]
    OpenArchive {
        /// Country the archive belongs to.
        country: String,
        /// Archive decoding failure.
        #[source]
        source: zip::result::ZipError,
    },
    /// The expected entry was absent from a postal archive.
    #[error("postal archive for {country} does not contain {entry:?}")]
    MissingArchiveEntry {
        /// Country the archive belongs to.
        country: String,
        /// Name of the missing entry.
        entry: String,
    },
    /// Reading an entry out of a postal archive failed.
    #[error("failed to read {entry:?} from the {country} postal archive")]
    ReadArchiveEntry {
        /// Country the archive belongs to.
        country: String,
        /// Name of the entry being read.
        entry: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
