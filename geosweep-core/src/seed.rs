//! The bootstrap dataset contract and its composite-key parsing.
//!
//! The dataset is a nested mapping of composite keys: `"<ISO2>#<country
//! name>"` at the top level, `"<state code>##<state name>"` below it, plus a
//! flat `country code -> postal codes` map. Keys that do not split into
//! exactly two parts on the literal delimiters are skipped with a warning;
//! a best-effort partial seed beats aborting the bootstrap.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{City, Country, State, Zip};

/// Delimiter between a country code and its display name.
const COUNTRY_DELIMITER: char = '#';
/// Delimiter between a state code and its display name.
const STATE_DELIMITER: &str = "##";

/// The bootstrap dataset the sequencer seeds an empty store from.
///
/// Ordered maps keep traversal deterministic, so two bootstraps from the
/// same file produce identically ordered inserts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    /// `"<ISO2>#<country name>"` -> `"<state code>##<state name>"` -> city names.
    pub city_data: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// Country code -> postal codes.
    pub zip_data: BTreeMap<String, Vec<String>>,
}

/// Entity batches parsed out of a [`SeedData`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedBatches {
    /// Countries named by the city data.
    pub countries: Vec<Country>,
    /// States named by the city data.
    pub states: Vec<State>,
    /// Cities listed under each state.
    pub cities: Vec<City>,
    /// Postal codes listed per country.
    pub zips: Vec<Zip>,
}

impl SeedData {
    /// Whether the dataset contains anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.city_data.is_empty() && self.zip_data.is_empty()
    }

    /// Parse the composite-key maps into entity batches.
    ///
    /// Malformed keys and records with empty fields are dropped with a
    /// warning; this never fails.
    #[must_use]
    pub fn entity_batches(&self) -> SeedBatches {
        let mut batches = SeedBatches::default();

        for (country_key, states) in &self.city_data {
            let Some((country_code, country_name)) =
                split_once_exact(country_key, COUNTRY_DELIMITER)
            else {
                log::warn!("skipping malformed country key {country_key:?}");
                continue;
            };
            let country = match Country::new(country_code, country_name) {
                Ok(country) => country,
                Err(err) => {
                    log::warn!("skipping country key {country_key:?}: {err}");
                    continue;
                }
            };

            for (state_key, cities) in states {
                let Some((state_code, state_name)) = state_key
                    .split_once(STATE_DELIMITER)
                    .filter(|(_, tail)| !tail.contains(STATE_DELIMITER))
                else {
                    log::warn!("skipping malformed state key {state_key:?}");
                    continue;
                };
                let state = match State::new(state_code, state_name, &country.code) {
                    Ok(state) => state,
                    Err(err) => {
                        log::warn!("skipping state key {state_key:?}: {err}");
                        continue;
                    }
                };

                for name in cities {
                    match City::new(name, &state.code, &country.code) {
                        Ok(city) => batches.cities.push(city),
                        Err(err) => log::warn!("skipping city {name:?}: {err}"),
                    }
                }
                batches.states.push(state);
            }
            batches.countries.push(country);
        }

        for (country_code, codes) in &self.zip_data {
            for code in codes {
                match Zip::new(code, country_code) {
                    Ok(zip) => batches.zips.push(zip),
                    Err(err) => log::warn!("skipping postal code {code:?}: {err}"),
                }
            }
        }

        batches
    }
}

/// Split on a delimiter only when it occurs exactly once, mirroring the
/// "exactly two parts" contract of the composite keys.
fn split_once_exact(key: &str, delimiter: char) -> Option<(&str, &str)> {
    let (head, tail) = key.split_once(delimiter)?;
    if tail.contains(delimiter) {
        return None;
    }
    Some((head, tail))
}
