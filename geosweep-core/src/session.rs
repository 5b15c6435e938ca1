//! The durable representation of "where we are" in the sequence.

use serde::Serialize;

use crate::format::NavFormat;
use crate::page::PageState;

/// A persisted session row.
///
/// At most one session with `completed == false` exists at any time; the
/// store enforces this by only creating sessions through the sequencer's
/// restore and advance paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// Row identifier.
    pub id: i64,
    /// Format the sequence was expanded under when the session was written.
    pub format: NavFormat,
    /// Country code of the recorded step.
    pub country_code: String,
    /// Matched query, when the format is query-crossed.
    pub query_id: Option<i64>,
    /// Matched postal code, for zip formats.
    pub zip_id: Option<i64>,
    /// Matched city, for city formats.
    pub city_id: Option<i64>,
    /// Matched state code, for state and city-state formats.
    pub state_code: Option<String>,
    /// Pagination progress for the recorded step.
    pub page: PageState,
    /// Whether the step has been fully consumed.
    pub completed: bool,
    /// Whether the session was created at runtime rather than imported.
    pub external: bool,
}

/// A session about to be persisted; the store assigns the identifier and the
/// row always starts with `completed == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    /// Format the sequence was expanded under.
    pub format: NavFormat,
    /// Country code of the recorded step.
    pub country_code: String,
    /// Matched query, when the format is query-crossed.
    pub query_id: Option<i64>,
    /// Matched postal code, for zip formats.
    pub zip_id: Option<i64>,
    /// Matched city, for city formats.
    pub city_id: Option<i64>,
    /// Matched state code, for state and city-state formats.
    pub state_code: Option<String>,
    /// Initial pagination state.
    pub page: PageState,
    /// Whether the session was created at runtime rather than imported.
    pub external: bool,
}

/// The entity references a step resolves to, used to flip `used` flags when
/// the step has been consumed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepRefs {
    /// Country the step belongs to.
    pub country_code: Option<String>,
    /// Matched query row.
    pub query_id: Option<i64>,
    /// Matched zip row.
    pub zip_id: Option<i64>,
    /// Matched city row.
    pub city_id: Option<i64>,
    /// Matched state, scoped to [`Self::country_code`].
    pub state_code: Option<String>,
}
