//! The pure sequence expander.
//!
//! Expansion applies an explicit sort at every level — countries by code,
//! states by code, cities by name, zips by code, queries by insertion id —
//! so re-deriving the sequence from unchanged entities yields identical
//! ordering regardless of how the store returned its rows. Index `i + 1` in
//! the result is the successor of index `i`; nothing else defines "next".

use crate::entity::{City, Country, SearchQuery, State, Zip};
use crate::format::NavFormat;
use crate::step::{CountryScope, NavStep};

/// The in-memory snapshot of loaded entities the expander and the restore
/// logic operate on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySet {
    /// Countries matching the target filter.
    pub countries: Vec<Country>,
    /// States of those countries.
    pub states: Vec<State>,
    /// Cities of those countries.
    pub cities: Vec<City>,
    /// Postal codes of those countries.
    pub zips: Vec<Zip>,
    /// Every stored search query.
    pub queries: Vec<SearchQuery>,
}

impl EntitySet {
    /// Find a country by code.
    #[must_use]
    pub fn country(&self, code: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.code == code)
    }

    /// Find a state by code within a country.
    #[must_use]
    pub fn state(&self, code: &str, country_code: &str) -> Option<&State> {
        self.states
            .iter()
            .find(|s| s.code == code && s.country_code == country_code)
    }

    /// Find a city by its store-assigned id.
    #[must_use]
    pub fn city_by_id(&self, id: i64) -> Option<&City> {
        self.cities.iter().find(|c| c.id == Some(id))
    }

    /// Find a zip by its store-assigned id.
    #[must_use]
    pub fn zip_by_id(&self, id: i64) -> Option<&Zip> {
        self.zips.iter().find(|z| z.id == Some(id))
    }

    /// Find a query by its store-assigned id.
    #[must_use]
    pub fn query_by_id(&self, id: i64) -> Option<&SearchQuery> {
        self.queries.iter().find(|q| q.id == Some(id))
    }
}

/// Expand the loaded entities into the ordered step sequence for `format`.
///
/// Pure and deterministic; malformed or partial entity data yields fewer
/// steps, never an error. Cities whose state cannot be resolved are skipped
/// for city-state formats (state data is authoritative over city data), and
/// county formats only emit for cities carrying a non-empty county.
#[must_use]
pub fn expand(entities: &EntitySet, format: NavFormat) -> Vec<NavStep> {
    let mut steps = Vec::new();

    let mut countries: Vec<&Country> = entities.countries.iter().collect();
    countries.sort_by(|a, b| a.code.cmp(&b.code));

    let mut queries: Vec<&SearchQuery> = entities.queries.iter().collect();
    queries.sort_by(|a, b| (a.id, &a.text).cmp(&(b.id, &b.text)));

    for country in countries {
        let mut states: Vec<&State> = entities
            .states
            .iter()
            .filter(|s| s.country_code == country.code)
            .collect();
        states.sort_by(|a, b| a.code.cmp(&b.code));

        let mut cities: Vec<&City> = entities
            .cities
            .iter()
            .filter(|c| c.country_code == country.code)
            .collect();
        cities.sort_by(|a, b| (&a.name, &a.state_code).cmp(&(&b.name, &b.state_code)));

        let mut zips: Vec<&Zip> = entities
            .zips
            .iter()
            .filter(|z| z.country_code == country.code)
            .collect();
        zips.sort_by(|a, b| a.code.cmp(&b.code));

        if format.is_query_crossed() {
            for query in queries.iter().copied() {
                emit(&mut steps, format, Some(query), country, &states, &cities, &zips);
            }
        } else {
            emit(&mut steps, format, None, country, &states, &cities, &zips);
        }
    }

    steps
}

fn emit(
    steps: &mut Vec<NavStep>,
    format: NavFormat,
    query: Option<&SearchQuery>,
    country: &Country,
    states: &[&State],
    cities: &[&City],
    zips: &[&Zip],
) {
    match format {
        NavFormat::Zip | NavFormat::QueryZip => {
            for zip in zips {
                steps.push(NavStep::for_zip(zip, country, CountryScope::CodeOnly, query));
            }
        }
        NavFormat::ZipCountry | NavFormat::QueryZipCountry => {
            for zip in zips {
                steps.push(NavStep::for_zip(zip, country, CountryScope::Named, query));
            }
        }
        NavFormat::City | NavFormat::QueryCity => {
            for city in cities {
                steps.push(NavStep::for_city(city, country, query));
            }
        }
        NavFormat::CityState | NavFormat::QueryCityState => {
            emit_city_state(steps, CountryScope::CodeOnly, query, country, states, cities);
        }
        NavFormat::CityStateCountry | NavFormat::QueryCityStateCountry => {
            emit_city_state(steps, CountryScope::Named, query, country, states, cities);
        }
        NavFormat::State | NavFormat::QueryState => {
            for state in states {
                steps.push(NavStep::for_state(state, country, CountryScope::CodeOnly, query));
            }
        }
        NavFormat::StateCountry | NavFormat::QueryStateCountry => {
            for state in states {
                steps.push(NavStep::for_state(state, country, CountryScope::Named, query));
            }
        }
        NavFormat::County | NavFormat::QueryCounty => {
            for city in cities {
                if let Some(county) = city.county.as_deref().filter(|c| !c.is_empty()) {
                    steps.push(NavStep::for_county(county, country, query));
                }
            }
        }
        NavFormat::Query => {
            if let Some(query) = query {
                steps.push(NavStep::for_query(query, country));
            }
        }
    }
}

fn emit_city_state(
    steps: &mut Vec<NavStep>,
    scope: CountryScope,
    query: Option<&SearchQuery>,
    country: &Country,
    states: &[&State],
    cities: &[&City],
) {
    for city in cities {
        let Some(state) = states.iter().find(|s| s.code == city.state_code) else {
            log::warn!(
                "skipping city {:?}: state {:?} not found in {}",
                city.name,
                city.state_code,
                country.code
            );
            continue;
        };
        steps.push(NavStep::for_city_state(city, state, country, scope, query));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn query(id: i64, text: &str) -> SearchQuery {
        SearchQuery {
            id: Some(id),
            ..SearchQuery::new(text).unwrap()
        }
    }

    #[fixture]
    fn entities() -> EntitySet {
        EntitySet {
            countries: vec![
                Country::new("US", "United States").unwrap(),
                Country::new("CA", "Canada").unwrap(),
            ],
            states: vec![
                State::new("CA", "California", "US").unwrap(),
                State::new("ON", "Ontario", "CA").unwrap(),
            ],
            cities: vec![
                City::new("San Diego", "CA", "US").unwrap(),
                City::new("Los Angeles", "CA", "US").unwrap(),
                City::new("Toronto", "ON", "CA").unwrap(),
            ],
            zips: vec![
                Zip::new("90001", "US").unwrap(),
                Zip::new("10001", "US").unwrap(),
            ],
            queries: vec![query(2, "Restaurant"), query(1, "Realtor")],
        }
    }

    #[rstest]
    fn expansion_is_deterministic(entities: EntitySet) {
        let first = expand(&entities, NavFormat::QueryCityStateCountry);
        let second = expand(&entities, NavFormat::QueryCityStateCountry);
        assert_eq!(first, second);
    }

    #[rstest]
    fn countries_iterate_in_code_order(entities: EntitySet) {
        let steps = expand(&entities, NavFormat::City);
        let codes: Vec<&str> = steps.iter().map(NavStep::country_code).collect();
        assert_eq!(codes, ["CA", "US", "US"]);
    }

    #[rstest]
    fn zips_sort_by_code_within_a_country(entities: EntitySet) {
        let steps = expand(&entities, NavFormat::Zip);
        let zips: Vec<Option<&str>> = steps.iter().map(NavStep::zip).collect();
        assert_eq!(zips, [Some("10001"), Some("90001")]);
    }

    #[rstest]
    fn queries_cross_every_unit_in_insertion_order(entities: EntitySet) {
        let steps = expand(&entities, NavFormat::QueryZip);
        let labels: Vec<String> = steps.iter().map(NavStep::placeholder).collect();
        assert_eq!(
            labels,
            [
                "Realtor##10001",
                "Realtor##90001",
                "Restaurant##10001",
                "Restaurant##90001",
            ]
        );
    }

    #[rstest]
    fn city_without_resolvable_state_is_skipped(mut entities: EntitySet) {
        entities
            .cities
            .push(City::new("Ghost Town", "ZZ", "US").unwrap());
        let steps = expand(&entities, NavFormat::CityState);
        assert!(steps.iter().all(|s| s.city() != Some("Ghost Town")));
        assert_eq!(steps.len(), 3);
    }

    #[rstest]
    fn county_formats_only_emit_for_counties(mut entities: EntitySet) {
        entities.cities = vec![
            City::new("Los Angeles", "CA", "US")
                .unwrap()
                .with_county("Los Angeles County"),
            City::new("San Diego", "CA", "US").unwrap(),
        ];
        let steps = expand(&entities, NavFormat::County);
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps.first().and_then(NavStep::county),
            Some("Los Angeles County")
        );
    }

    #[rstest]
    fn query_format_emits_once_per_country_and_query(entities: EntitySet) {
        let steps = expand(&entities, NavFormat::Query);
        assert_eq!(steps.len(), 4);
        assert!(steps.iter().all(|s| s.query().is_some()));
        assert!(steps.iter().all(|s| s.zip().is_none() && s.city().is_none()));
    }

    #[rstest]
    fn populated_fields_match_the_format(entities: EntitySet) {
        for step in expand(&entities, NavFormat::CityStateCountry) {
            assert!(step.city().is_some());
            assert!(step.state().is_some() && step.state_code().is_some());
            assert!(step.country().is_some());
            assert!(step.query().is_none() && step.zip().is_none() && step.county().is_none());
        }
        for step in expand(&entities, NavFormat::StateCountry) {
            assert!(step.state().is_some() && step.country().is_some());
            assert!(step.city().is_none());
        }
    }
}
