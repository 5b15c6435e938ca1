//! The persistence capability the sequencer drives.
//!
//! The trait covers the handful of operations the engine needs — filtered
//! reads, idempotent bulk inserts, session bookkeeping and usage flags.
//! Every failure is surfaced; a swallowed store error would leave the
//! resumable cursor silently out of sync.

use std::error::Error as StdError;

use thiserror::Error;

use crate::entity::{City, Country, SearchQuery, State, TargetCountry, Zip};
use crate::page::PageState;
use crate::seed::SeedBatches;
use crate::session::{NewSession, Session, StepRefs};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteEntityStore;

/// Errors raised by an entity store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed to perform an operation.
    #[error("failed to {operation}")]
    Backend {
        /// Description of the failed operation.
        operation: &'static str,
        /// Underlying error reported by the backend.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// Encoding the pagination blob for persistence failed.
    #[error("failed to encode pagination state")]
    EncodePage {
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A persisted session row references an unknown navigation format.
    #[error("session {id} references unknown navigation format {value:?}")]
    CorruptSession {
        /// Identifier of the offending row.
        id: i64,
        /// The unparseable format string.
        value: String,
    },
}

impl StoreError {
    /// Wrap a backend failure with the operation it interrupted.
    pub fn backend(
        operation: &'static str,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            operation,
            source: Box::new(source),
        }
    }
}

/// Read and write access to the persisted entities and sessions.
///
/// Bulk inserts are idempotent per unique key; multi-row writes happen in an
/// atomic unit so a crash mid-write cannot leave usage flags and session
/// state inconsistent.
pub trait EntityStore {
    /// Countries matching the target filter.
    fn countries(&self, target: &TargetCountry) -> Result<Vec<Country>, StoreError>;

    /// States belonging to the given countries.
    fn states_in(&self, country_codes: &[String]) -> Result<Vec<State>, StoreError>;

    /// Cities belonging to the given countries.
    fn cities_in(&self, country_codes: &[String]) -> Result<Vec<City>, StoreError>;

    /// Postal codes belonging to the given countries.
    fn zips_in(&self, country_codes: &[String]) -> Result<Vec<Zip>, StoreError>;

    /// Every stored search query.
    fn queries(&self) -> Result<Vec<SearchQuery>, StoreError>;

    /// Insert countries, skipping codes that already exist.
    fn add_countries(&mut self, countries: &[Country], external: bool) -> Result<(), StoreError>;

    /// Insert states, skipping `(code, country)` pairs that already exist.
    fn add_states(&mut self, states: &[State], external: bool) -> Result<(), StoreError>;

    /// Insert cities, skipping names that already exist in their state.
    fn add_cities(&mut self, cities: &[City], external: bool) -> Result<(), StoreError>;

    /// Insert postal codes, skipping codes that already exist in their country.
    fn add_zips(&mut self, zips: &[Zip], external: bool) -> Result<(), StoreError>;

    /// Insert search queries, skipping duplicates.
    fn add_queries(&mut self, queries: &[SearchQuery], external: bool) -> Result<(), StoreError>;

    /// Remove the user-added search queries.
    fn clear_queries(&mut self) -> Result<(), StoreError>;

    /// Number of stored countries; zero means the store has never been seeded.
    fn country_count(&self) -> Result<u64, StoreError>;

    /// Insert a full bootstrap dataset in one atomic unit.
    fn seed_entities(&mut self, batches: &SeedBatches) -> Result<(), StoreError>;

    /// The single session with `completed == false`, if any.
    fn active_session(&self) -> Result<Option<Session>, StoreError>;

    /// Every persisted session, oldest first.
    fn all_sessions(&self) -> Result<Vec<Session>, StoreError>;

    /// Persist a new session row and return its identifier.
    fn save_session(&mut self, session: &NewSession) -> Result<i64, StoreError>;

    /// Replace the pagination blob of an existing session.
    fn update_session_page(&mut self, id: i64, page: &PageState) -> Result<(), StoreError>;

    /// Mark a session as completed.
    fn complete_session(&mut self, id: i64) -> Result<(), StoreError>;

    /// Flip the `used` flag on the entities a consumed step resolved to.
    ///
    /// Setting an already-set flag has no effect.
    fn mark_used(&mut self, refs: &StepRefs) -> Result<(), StoreError>;

    /// Record a consumed step and open its successor session.
    ///
    /// Implementations should make this atomic; the default falls back to
    /// two separate writes.
    fn advance_session(
        &mut self,
        used: &StepRefs,
        next: Option<&NewSession>,
    ) -> Result<Option<i64>, StoreError> {
        self.mark_used(used)?;
        match next {
            Some(session) => self.save_session(session).map(Some),
            None => Ok(None),
        }
    }

    /// Delete every session row.
    fn reset_sessions(&mut self) -> Result<(), StoreError>;

    /// Delete every session row and clear every `used` flag.
    fn reset_all(&mut self) -> Result<(), StoreError>;
}
