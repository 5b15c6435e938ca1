//! The format selector deciding which fields populate each navigation step.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Selects which of query, zip, city, state and county appear in each step,
/// and whether the geography is crossed with every stored search query.
///
/// The wire form is kebab-case and round-trips through [`std::fmt::Display`]
/// and [`FromStr`]:
///
/// ```
/// use geosweep_core::NavFormat;
///
/// let format: NavFormat = "query-city-state".parse()?;
/// assert_eq!(format, NavFormat::QueryCityState);
/// assert_eq!(format.to_string(), "query-city-state");
/// # Ok::<(), geosweep_core::ParseNavFormatError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavFormat {
    /// Postal code only.
    Zip,
    /// Postal code with country context.
    ZipCountry,
    /// Every query crossed with every postal code.
    QueryZip,
    /// Every query crossed with every postal code, with country context.
    QueryZipCountry,
    /// City only.
    City,
    /// City with its resolved state.
    CityState,
    /// City with its resolved state and country context.
    CityStateCountry,
    /// Every query crossed with every city.
    QueryCity,
    /// Every query crossed with every city and its resolved state.
    QueryCityState,
    /// Every query crossed with every city, state and country context.
    QueryCityStateCountry,
    /// State only.
    State,
    /// State with country context.
    StateCountry,
    /// Every query crossed with every state.
    QueryState,
    /// Every query crossed with every state, with country context.
    QueryStateCountry,
    /// Every query crossed with every county.
    QueryCounty,
    /// Every query, once per country.
    Query,
    /// County only.
    County,
}

impl NavFormat {
    /// All formats, in declaration order.
    pub const ALL: [Self; 17] = [
        Self::Zip,
        Self::ZipCountry,
        Self::QueryZip,
        Self::QueryZipCountry,
        Self::City,
        Self::CityState,
        Self::CityStateCountry,
        Self::QueryCity,
        Self::QueryCityState,
        Self::QueryCityStateCountry,
        Self::State,
        Self::StateCountry,
        Self::QueryState,
        Self::QueryStateCountry,
        Self::QueryCounty,
        Self::Query,
        Self::County,
    ];

    /// The kebab-case wire form of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::ZipCountry => "zip-country",
            Self::QueryZip => "query-zip",
            Self::QueryZipCountry => "query-zip-country",
            Self::City => "city",
            Self::CityState => "city-state",
            Self::CityStateCountry => "city-state-country",
            Self::QueryCity => "query-city",
            Self::QueryCityState => "query-city-state",
            Self::QueryCityStateCountry => "query-city-state-country",
            Self::State => "state",
            Self::StateCountry => "state-country",
            Self::QueryState => "query-state",
            Self::QueryStateCountry => "query-state-country",
            Self::QueryCounty => "query-county",
            Self::Query => "query",
            Self::County => "county",
        }
    }

    /// Whether every geographic unit is crossed with every stored query.
    #[must_use]
    pub const fn is_query_crossed(self) -> bool {
        matches!(
            self,
            Self::QueryZip
                | Self::QueryZipCountry
                | Self::QueryCity
                | Self::QueryCityState
                | Self::QueryCityStateCountry
                | Self::QueryState
                | Self::QueryStateCountry
                | Self::QueryCounty
                | Self::Query
        )
    }
}

impl std::fmt::Display for NavFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown format string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown navigation format {0:?}")]
pub struct ParseNavFormatError(pub String);

impl FromStr for NavFormat {
    type Err = ParseNavFormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == value)
            .ok_or_else(|| ParseNavFormatError(value.to_owned()))
    }
}
