//! Dataset acquisition for the Geosweep engine.
//!
//! Responsibilities:
//! - Download and normalise third-party geographic and postal-code datasets
//!   into the seed format the core consumes.
//! - Read and write the seed dataset on disk.
//!
//! Boundaries:
//! - No navigation logic (lives in `geosweep-core`).
//! - Data sources are explicit parameters; no ambient global cache.

#![forbid(unsafe_code)]

pub mod fetch;
mod seed_file;

pub use seed_file::{SeedFileError, load_seed_data, save_seed_data};
