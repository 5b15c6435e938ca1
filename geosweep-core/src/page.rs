//! Pagination progress attached to the step currently being consumed.

use std::collections::BTreeSet;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Column value recording a fully paginated step.
const COMPLETED_LITERAL: &str = "completed";

/// Pages completed so far against a declared total.
///
/// Page numbers live in a sorted set, so marking order does not affect the
/// persisted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageProgress {
    /// Pages already marked done.
    pub pages: BTreeSet<u32>,
    /// Declared page count for the step.
    pub total: u32,
}

impl PageProgress {
    /// Start tracking `total` pages, optionally with some already done.
    pub fn new(total: u32, done: impl IntoIterator<Item = u32>) -> Self {
        Self {
            pages: done.into_iter().collect(),
            total,
        }
    }

    /// Record a page as done. Returns `false` when the page was already
    /// marked, which callers treat as a no-op.
    pub fn mark_done(&mut self, page: u32) -> bool {
        self.pages.insert(page)
    }

    /// Whether every declared page has been marked done.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pages.len() as u64 >= u64::from(self.total)
    }
}

/// Tri-state pagination record for a step.
///
/// Persisted as SQL NULL (`NotStarted`), a `{"pages":[...],"total":n}` JSON
/// blob (`InProgress`) or the literal string `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageState {
    /// No pagination has been attached yet.
    #[default]
    NotStarted,
    /// Some pages are done, some remain.
    InProgress(PageProgress),
    /// Every declared page has been consumed.
    Completed,
}

impl PageState {
    /// Encode the state for the session row's page column.
    pub fn to_column(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            Self::NotStarted => Ok(None),
            Self::InProgress(progress) => serde_json::to_string(progress).map(Some),
            Self::Completed => Ok(Some(COMPLETED_LITERAL.to_owned())),
        }
    }

    /// Decode the session row's page column.
    ///
    /// A malformed blob is treated as `NotStarted` with a warning rather than
    /// failing the restore; pagination progress is the only thing lost.
    #[must_use]
    pub fn from_column(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Self::NotStarted,
            Some(COMPLETED_LITERAL) => Self::Completed,
            Some(blob) => match serde_json::from_str(blob) {
                Ok(progress) => Self::InProgress(progress),
                Err(err) => {
                    log::warn!("discarding malformed pagination blob {blob:?}: {err}");
                    Self::NotStarted
                }
            },
        }
    }
}

impl Serialize for PageState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NotStarted => serializer.serialize_none(),
            Self::InProgress(progress) => progress.serialize(serializer),
            Self::Completed => serializer.serialize_str(COMPLETED_LITERAL),
        }
    }
}

impl<'de> Deserialize<'de> for PageState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        match value {
            None | Some(serde_json::Value::Null) => Ok(Self::NotStarted),
            Some(serde_json::Value::String(text)) if text == COMPLETED_LITERAL => {
                Ok(Self::Completed)
            }
            Some(other) => serde_json::from_value(other)
                .map(Self::InProgress)
                .map_err(D::Error::custom),
        }
    }
}
