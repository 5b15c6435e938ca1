//! Facade crate for the Geosweep navigation engine.
//!
//! This crate re-exports the core domain types and exposes the SQLite-backed
//! entity store behind a feature flag.

#![forbid(unsafe_code)]

pub use geosweep_core::{
    City, Country, EntityError, EntitySet, EntityStore, InitOptions, NavFormat, NavResponse,
    NavStep, NewCity, NewCountry, NewSession, NewState, PageProgress, PageState,
    ParseNavFormatError, SearchQuery, SeedBatches, SeedData, Sequencer, SequencerError,
    SequencerSummary, Session, State, StepRefs, StoreError, TargetCountry, Zip, expand,
};

#[cfg(feature = "store-sqlite")]
pub use geosweep_core::SqliteEntityStore;
