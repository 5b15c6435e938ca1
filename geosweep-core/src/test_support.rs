//! Test-only, in-memory entity store used by unit and behaviour tests.

use crate::entity::{City, Country, SearchQuery, State, TargetCountry, Zip};
use crate::page::PageState;
use crate::seed::SeedBatches;
use crate::session::{NewSession, Session, StepRefs};
use crate::store::{EntityStore, StoreError};

/// In-memory [`EntityStore`] implementation.
///
/// Mirrors the SQLite store's insert-if-absent and single-active-session
/// semantics with plain vectors; intended only for small test datasets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    countries: Vec<Country>,
    states: Vec<State>,
    cities: Vec<City>,
    zips: Vec<Zip>,
    queries: Vec<SearchQuery>,
    sessions: Vec<Session>,
    next_row_id: i64,
}

impl MemoryStore {
    fn next_id(&mut self) -> i64 {
        self.next_row_id += 1;
        self.next_row_id
    }
}

impl EntityStore for MemoryStore {
    fn countries(&self, target: &TargetCountry) -> Result<Vec<Country>, StoreError> {
        Ok(self
            .countries
            .iter()
            .filter(|c| match target {
                TargetCountry::All => true,
                TargetCountry::Only(code) => &c.code == code,
            })
            .cloned()
            .collect())
    }

    fn states_in(&self, country_codes: &[String]) -> Result<Vec<State>, StoreError> {
        Ok(self
            .states
            .iter()
            .filter(|s| country_codes.contains(&s.country_code))
            .cloned()
            .collect())
    }

    fn cities_in(&self, country_codes: &[String]) -> Result<Vec<City>, StoreError> {
        Ok(self
            .cities
            .iter()
            .filter(|c| country_codes.contains(&c.country_code))
            .cloned()
            .collect())
    }

    fn zips_in(&self, country_codes: &[String]) -> Result<Vec<Zip>, StoreError> {
        Ok(self
            .zips
            .iter()
            .filter(|z| country_codes.contains(&z.country_code))
            .cloned()
            .collect())
    }

    fn queries(&self) -> Result<Vec<SearchQuery>, StoreError> {
        Ok(self.queries.clone())
    }

    fn add_countries(&mut self, countries: &[Country], external: bool) -> Result<(), StoreError> {
        for country in countries {
            if self.countries.iter().any(|c| c.code == country.code) {
                continue;
            }
            self.countries.push(Country {
                external,
                ..country.clone()
            });
        }
        Ok(())
    }

    fn add_states(&mut self, states: &[State], external: bool) -> Result<(), StoreError> {
        for state in states {
            if self
                .states
                .iter()
                .any(|s| s.code == state.code && s.country_code == state.country_code)
            {
                continue;
            }
            self.states.push(State {
                external,
                ..state.clone()
            });
        }
        Ok(())
    }

    fn add_cities(&mut self, cities: &[City], external: bool) -> Result<(), StoreError> {
        for city in cities {
            if self.cities.iter().any(|c| {
                c.name == city.name
                    && c.state_code == city.state_code
                    && c.country_code == city.country_code
            }) {
                continue;
            }
            let id = Some(self.next_id());
            self.cities.push(City {
                id,
                external,
                ..city.clone()
            });
        }
        Ok(())
    }

    fn add_zips(&mut self, zips: &[Zip], external: bool) -> Result<(), StoreError> {
        for zip in zips {
            if self
                .zips
                .iter()
                .any(|z| z.code == zip.code && z.country_code == zip.country_code)
            {
                continue;
            }
            let id = Some(self.next_id());
            self.zips.push(Zip {
                id,
                external,
                ..zip.clone()
            });
        }
        Ok(())
    }

    fn add_queries(&mut self, queries: &[SearchQuery], external: bool) -> Result<(), StoreError> {
        for query in queries {
            if self.queries.iter().any(|q| q.text == query.text) {
                continue;
            }
            let id = Some(self.next_id());
            self.queries.push(SearchQuery {
                id,
                external,
                ..query.clone()
            });
        }
        Ok(())
    }

    fn clear_queries(&mut self) -> Result<(), StoreError> {
        self.queries.retain(|q| !q.external);
        Ok(())
    }

    fn country_count(&self) -> Result<u64, StoreError> {
        Ok(self.countries.len() as u64)
    }

    fn seed_entities(&mut self, batches: &SeedBatches) -> Result<(), StoreError> {
        self.add_countries(&batches.countries, false)?;
        self.add_states(&batches.states, false)?;
        self.add_cities(&batches.cities, false)?;
        self.add_zips(&batches.zips, false)
    }

    fn active_session(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.iter().find(|s| !s.completed).cloned())
    }

    fn all_sessions(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.sessions.clone())
    }

    fn save_session(&mut self, session: &NewSession) -> Result<i64, StoreError> {
        let id = self.next_id();
        self.sessions.push(Session {
            id,
            format: session.format,
            country_code: session.country_code.clone(),
            query_id: session.query_id,
            zip_id: session.zip_id,
            city_id: session.city_id,
            state_code: session.state_code.clone(),
            page: session.page.clone(),
            completed: false,
            external: session.external,
        });
        Ok(id)
    }

    fn update_session_page(&mut self, id: i64, page: &PageState) -> Result<(), StoreError> {
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) {
            session.page = page.clone();
        }
        Ok(())
    }

    fn complete_session(&mut self, id: i64) -> Result<(), StoreError> {
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) {
            session.completed = true;
            session.page = PageState::Completed;
        }
        Ok(())
    }

    fn mark_used(&mut self, refs: &StepRefs) -> Result<(), StoreError> {
        if let Some(code) = &refs.country_code {
            for country in self.countries.iter_mut().filter(|c| &c.code == code) {
                country.used = true;
            }
        }
        if let Some(id) = refs.query_id {
            for query in self.queries.iter_mut().filter(|q| q.id == Some(id)) {
                query.used = true;
            }
        }
        if let Some(id) = refs.zip_id {
            for zip in self.zips.iter_mut().filter(|z| z.id == Some(id)) {
                zip.used = true;
            }
        }
        if let Some(id) = refs.city_id {
            for city in self.cities.iter_mut().filter(|c| c.id == Some(id)) {
                city.used = true;
            }
        }
        if let (Some(state_code), Some(country_code)) = (&refs.state_code, &refs.country_code) {
            for state in self
                .states
                .iter_mut()
                .filter(|s| &s.code == state_code && &s.country_code == country_code)
            {
                state.used = true;
            }
        }
        Ok(())
    }

    fn reset_sessions(&mut self) -> Result<(), StoreError> {
        self.sessions.clear();
        Ok(())
    }

    fn reset_all(&mut self) -> Result<(), StoreError> {
        self.sessions.clear();
        for country in &mut self.countries {
            country.used = false;
        }
        for state in &mut self.states {
            state.used = false;
        }
        for city in &mut self.cities {
            city.used = false;
        }
        for zip in &mut self.zips {
            zip.used = false;
        }
        for query in &mut self.queries {
            query.used = false;
        }
        Ok(())
    }
}
