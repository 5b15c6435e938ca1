//! Core navigation sequencing and resumable session engine.
//!
//! The engine expands a set of geographic and search-term entities into a
//! deterministic ordered sequence of navigation steps under a selected
//! [`NavFormat`], and persists a resumable cursor over that sequence so a
//! long-running consumer can stop and restart without repeating or skipping
//! work. The sequence itself is never persisted; it is re-derived from the
//! entities whenever they change, and the persisted [`Session`] is
//! re-located in it by value match.

#![forbid(unsafe_code)]

mod entity;
mod expand;
mod format;
mod page;
mod seed;
mod sequencer;
mod session;
mod step;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use entity::{City, Country, EntityError, SearchQuery, State, TargetCountry, Zip};
pub use expand::{EntitySet, expand};
pub use format::{NavFormat, ParseNavFormatError};
pub use page::{PageProgress, PageState};
pub use seed::{SeedBatches, SeedData};
pub use sequencer::{
    InitOptions, NavResponse, NewCity, NewCountry, NewState, Sequencer, SequencerError,
    SequencerSummary,
};
pub use session::{NewSession, Session, StepRefs};
pub use step::NavStep;
pub use store::{EntityStore, StoreError};

#[cfg(feature = "store-sqlite")]
pub use store::SqliteEntityStore;
