//! The sparse navigation step record.
//!
//! A [`NavStep`] only ever carries the fields its format defines. The fields
//! are private and populated exclusively through the per-shape constructors
//! the sequence expander uses, so an impossible field combination cannot be
//! built.

use serde::Serialize;

use crate::entity::{City, Country, SearchQuery, State, Zip};

/// Whether a step carries the country display name alongside its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountryScope {
    /// Only the country code is recorded.
    CodeOnly,
    /// The country display name is recorded as well.
    Named,
}

/// One element of the expanded navigation sequence.
///
/// Every step records the code of the country it belongs to; all other
/// fields are populated (or not) by the active format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    county: Option<String>,
    country_code: String,
}

impl NavStep {
    fn bare(country: &Country, scope: CountryScope, query: Option<&SearchQuery>) -> Self {
        Self {
            query: query.map(|q| q.text.clone()),
            zip: None,
            city: None,
            state: None,
            state_code: None,
            country: match scope {
                CountryScope::CodeOnly => None,
                CountryScope::Named => Some(country.name.clone()),
            },
            county: None,
            country_code: country.code.clone(),
        }
    }

    pub(crate) fn for_zip(
        zip: &Zip,
        country: &Country,
        scope: CountryScope,
        query: Option<&SearchQuery>,
    ) -> Self {
        Self {
            zip: Some(zip.code.clone()),
            ..Self::bare(country, scope, query)
        }
    }

    pub(crate) fn for_city(city: &City, country: &Country, query: Option<&SearchQuery>) -> Self {
        Self {
            city: Some(city.name.clone()),
            ..Self::bare(country, CountryScope::CodeOnly, query)
        }
    }

    pub(crate) fn for_city_state(
        city: &City,
        state: &State,
        country: &Country,
        scope: CountryScope,
        query: Option<&SearchQuery>,
    ) -> Self {
        Self {
            city: Some(city.name.clone()),
            state: Some(state.name.clone()),
            state_code: Some(state.code.clone()),
            ..Self::bare(country, scope, query)
        }
    }

    pub(crate) fn for_state(
        state: &State,
        country: &Country,
        scope: CountryScope,
        query: Option<&SearchQuery>,
    ) -> Self {
        Self {
            state: Some(state.name.clone()),
            state_code: Some(state.code.clone()),
            ..Self::bare(country, scope, query)
        }
    }

    pub(crate) fn for_county(
        county: &str,
        country: &Country,
        query: Option<&SearchQuery>,
    ) -> Self {
        Self {
            county: Some(county.to_owned()),
            ..Self::bare(country, CountryScope::CodeOnly, query)
        }
    }

    pub(crate) fn for_query(query: &SearchQuery, country: &Country) -> Self {
        Self::bare(country, CountryScope::CodeOnly, Some(query))
    }

    /// Search term, for query-crossed formats.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Postal code, for zip formats.
    #[must_use]
    pub fn zip(&self) -> Option<&str> {
        self.zip.as_deref()
    }

    /// City name, for city formats.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// State display name, for state and city-state formats.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// State code, present whenever [`Self::state`] is.
    #[must_use]
    pub fn state_code(&self) -> Option<&str> {
        self.state_code.as_deref()
    }

    /// Country display name, for `-country` formats.
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// County name, for county formats.
    #[must_use]
    pub fn county(&self) -> Option<&str> {
        self.county.as_deref()
    }

    /// Code of the country the step belongs to; always present.
    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Human-readable label for the step.
    ///
    /// The query (when present) is joined with the most specific geographic
    /// field — city, then zip, then state, then county — by `##`. A step
    /// carrying none of those yields `"Unknown"`.
    #[must_use]
    pub fn placeholder(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(query) = self.query() {
            parts.push(query);
        }
        if let Some(unit) = self
            .city()
            .or_else(|| self.zip())
            .or_else(|| self.state())
            .or_else(|| self.county())
        {
            parts.push(unit);
        }
        if parts.is_empty() {
            return "Unknown".to_owned();
        }
        parts.join("##")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn country() -> Country {
        Country::new("US", "United States").unwrap()
    }

    #[fixture]
    fn state() -> State {
        State::new("CA", "California", "US").unwrap()
    }

    #[rstest]
    fn zip_step_without_country_context(country: Country) {
        let zip = Zip::new("90001", "US").unwrap();
        let step = NavStep::for_zip(&zip, &country, CountryScope::CodeOnly, None);
        assert_eq!(step.zip(), Some("90001"));
        assert_eq!(step.country(), None);
        assert_eq!(step.country_code(), "US");
    }

    #[rstest]
    fn named_scope_adds_the_country_name(country: Country, state: State) {
        let step = NavStep::for_state(&state, &country, CountryScope::Named, None);
        assert_eq!(step.country(), Some("United States"));
        assert_eq!(step.state(), Some("California"));
        assert_eq!(step.state_code(), Some("CA"));
    }

    #[rstest]
    fn placeholder_prefers_city_over_state(country: Country, state: State) {
        let city = City::new("Los Angeles", "CA", "US").unwrap();
        let step =
            NavStep::for_city_state(&city, &state, &country, CountryScope::Named, None);
        assert_eq!(step.placeholder(), "Los Angeles");
    }

    #[rstest]
    fn placeholder_joins_query_and_unit(country: Country) {
        let query = SearchQuery::new("Realtor").unwrap();
        let zip = Zip::new("90001", "US").unwrap();
        let step = NavStep::for_zip(&zip, &country, CountryScope::CodeOnly, Some(&query));
        assert_eq!(step.placeholder(), "Realtor##90001");
    }

    #[rstest]
    fn placeholder_falls_back_to_unknown(country: Country) {
        let step = NavStep::bare(&country, CountryScope::Named, None);
        assert_eq!(step.placeholder(), "Unknown");
    }

    #[rstest]
    fn serialization_omits_absent_fields(country: Country) {
        let query = SearchQuery::new("Realtor").unwrap();
        let step = NavStep::for_query(&query, &country);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"query": "Realtor", "country_code": "US"})
        );
    }
}
