//! Facilities for downloading and normalising the bootstrap datasets.
//!
//! Geographic listings come from the public countries-states-cities dataset;
//! postal codes come from per-country GeoNames archives. A [`DatasetSource`]
//! abstracts the transport so tests can run against canned bytes.

mod error;
mod ops;
mod postal;
mod source;

#[cfg(test)]
mod test_support;
#[cfg(test)]
pub(crate) use test_support::StubSource;

pub use error::{FetchError, TransportError};
pub use ops::build_seed_data;
pub use postal::DEFAULT_POSTAL_COUNTRIES;
pub use source::{
    DEFAULT_LISTING_BASE_URL, DEFAULT_POSTAL_BASE_URL, DEFAULT_USER_AGENT, DatasetSource,
    HttpDatasetSource,
};
