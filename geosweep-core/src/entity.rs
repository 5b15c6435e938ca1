//! Geographic and search-term entities consumed by the sequence expander.
//!
//! Constructors validate required fields up front so bulk-add operations can
//! reject a whole batch before anything is written to the backing store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by entity constructors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    /// A required field was empty.
    #[error("all {entity} records must have a non-empty {field}")]
    MissingField {
        /// Entity kind the record belongs to.
        entity: &'static str,
        /// Name of the empty field.
        field: &'static str,
    },
}

fn require(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), EntityError> {
    if value.trim().is_empty() {
        return Err(EntityError::MissingField { entity, field });
    }
    Ok(())
}

/// A country, keyed by its two-letter code.
///
/// # Examples
///
/// ```
/// use geosweep_core::Country;
///
/// # fn main() -> Result<(), geosweep_core::EntityError> {
/// let country = Country::new("US", "United States")?;
/// assert_eq!(country.code, "US");
/// assert!(!country.used);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Two-letter country code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Whether a step for this country has been consumed.
    pub used: bool,
    /// Whether the record was user-added rather than bulk-loaded.
    pub external: bool,
}

impl Country {
    /// Validates and constructs a [`Country`].
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Result<Self, EntityError> {
        let code = code.into();
        let name = name.into();
        require("country", "code", &code)?;
        require("country", "name", &name)?;
        Ok(Self {
            code,
            name,
            used: false,
            external: false,
        })
    }
}

/// A state or province, keyed by `(code, country_code)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// State code, unique within its country.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Owning country code.
    pub country_code: String,
    /// Whether a step for this state has been consumed.
    pub used: bool,
    /// Whether the record was user-added rather than bulk-loaded.
    pub external: bool,
}

impl State {
    /// Validates and constructs a [`State`].
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Result<Self, EntityError> {
        let code = code.into();
        let name = name.into();
        let country_code = country_code.into();
        require("state", "code", &code)?;
        require("state", "name", &name)?;
        require("state", "country code", &country_code)?;
        Ok(Self {
            code,
            name,
            country_code,
            used: false,
            external: false,
        })
    }
}

/// A city within a state, with an optional county.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Surrogate identifier assigned by the store; `None` until persisted.
    pub id: Option<i64>,
    /// City name, unique within `(state_code, country_code)`.
    pub name: String,
    /// Code of the state the city belongs to.
    pub state_code: String,
    /// Owning country code.
    pub country_code: String,
    /// County the city belongs to, when known.
    pub county: Option<String>,
    /// Whether a step for this city has been consumed.
    pub used: bool,
    /// Whether the record was user-added rather than bulk-loaded.
    pub external: bool,
}

impl City {
    /// Validates and constructs a [`City`].
    pub fn new(
        name: impl Into<String>,
        state_code: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Result<Self, EntityError> {
        let name = name.into();
        let state_code = state_code.into();
        let country_code = country_code.into();
        require("city", "name", &name)?;
        require("city", "state code", &state_code)?;
        require("city", "country code", &country_code)?;
        Ok(Self {
            id: None,
            name,
            state_code,
            country_code,
            county: None,
            used: false,
            external: false,
        })
    }

    /// Attach a county to the city.
    #[must_use]
    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }
}

/// A postal code scoped to a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zip {
    /// Surrogate identifier assigned by the store; `None` until persisted.
    pub id: Option<i64>,
    /// Postal code, unique within its country.
    pub code: String,
    /// Owning country code.
    pub country_code: String,
    /// Whether a step for this postal code has been consumed.
    pub used: bool,
    /// Whether the record was user-added rather than bulk-loaded.
    pub external: bool,
}

impl Zip {
    /// Validates and constructs a [`Zip`].
    pub fn new(
        code: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Result<Self, EntityError> {
        let code = code.into();
        let country_code = country_code.into();
        require("zip", "code", &code)?;
        require("zip", "country code", &country_code)?;
        Ok(Self {
            id: None,
            code,
            country_code,
            used: false,
            external: false,
        })
    }
}

/// A free-text search term, orthogonal to geography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Surrogate identifier assigned by the store; `None` until persisted.
    pub id: Option<i64>,
    /// The search term; unique across the store.
    pub text: String,
    /// Whether a step for this query has been consumed.
    pub used: bool,
    /// Whether the record was user-added rather than bulk-loaded.
    pub external: bool,
}

impl SearchQuery {
    /// Validates and constructs a [`SearchQuery`].
    pub fn new(text: impl Into<String>) -> Result<Self, EntityError> {
        let text = text.into();
        require("query", "text", &text)?;
        Ok(Self {
            id: None,
            text,
            used: false,
            external: false,
        })
    }
}

/// Restricts entity loading and expansion to one country or all of them.
///
/// # Examples
///
/// ```
/// use geosweep_core::TargetCountry;
///
/// assert_eq!(TargetCountry::parse("all"), TargetCountry::All);
/// assert_eq!(TargetCountry::parse("us"), TargetCountry::Only("US".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetCountry {
    /// Expand every stored country.
    All,
    /// Expand a single country identified by its two-letter code.
    Only(String),
}

impl TargetCountry {
    /// Parse a target from its textual form; `"all"` (case-insensitive)
    /// selects every country, anything else is treated as a country code.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(value.to_ascii_uppercase())
        }
    }
}

impl std::fmt::Display for TargetCountry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(code) => f.write_str(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn country_requires_code_and_name() {
        assert!(Country::new("", "United States").is_err());
        assert!(Country::new("US", " ").is_err());
        assert!(Country::new("US", "United States").is_ok());
    }

    #[rstest]
    #[case("", "California", "US")]
    #[case("CA", "", "US")]
    #[case("CA", "California", "")]
    fn state_rejects_empty_fields(#[case] code: &str, #[case] name: &str, #[case] country: &str) {
        assert!(State::new(code, name, country).is_err());
    }

    #[rstest]
    fn city_carries_optional_county() {
        let city = City::new("Los Angeles", "CA", "US")
            .map(|c| c.with_county("Los Angeles County"));
        assert_eq!(
            city.as_ref().map(|c| c.county.as_deref()),
            Ok(Some("Los Angeles County"))
        );
    }

    #[rstest]
    fn query_rejects_blank_text() {
        let result = SearchQuery::new("   ");
        assert_eq!(
            result,
            Err(EntityError::MissingField {
                entity: "query",
                field: "text",
            })
        );
    }

    #[rstest]
    #[case("all", TargetCountry::All)]
    #[case("ALL", TargetCountry::All)]
    #[case("de", TargetCountry::Only("DE".into()))]
    fn target_parses(#[case] input: &str, #[case] expected: TargetCountry) {
        assert_eq!(TargetCountry::parse(input), expected);
    }
}
