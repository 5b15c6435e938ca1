//! Orchestration of the expanded sequence and the resumable session cursor.
//!
//! The sequencer owns the in-memory sequence, the cursor and the public
//! resume/advance/pagination API. The persisted session is the source of
//! truth for "where we are"; the cursor is a cache reconstructed from it on
//! restore, always by value match and never by a stored index, because the
//! entity set may have changed since the session was written.

use serde::Serialize;
use thiserror::Error;

use crate::entity::{City, Country, SearchQuery, State, TargetCountry, Zip};
use crate::entity::EntityError;
use crate::expand::{EntitySet, expand};
use crate::format::NavFormat;
use crate::page::{PageProgress, PageState};
use crate::seed::SeedData;
use crate::session::{NewSession, Session, StepRefs};
use crate::step::NavStep;
use crate::store::{EntityStore, StoreError};

/// Errors raised by sequencer operations.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// The backing store failed; the cursor may be out of sync.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A record in a bulk-add batch failed validation; nothing was written.
    #[error(transparent)]
    Entity(#[from] EntityError),
}

/// Initialisation options for [`Sequencer::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOptions {
    /// Format to expand the sequence under.
    pub format: NavFormat,
    /// Country filter.
    pub target: TargetCountry,
}

/// The view of the cursor returned to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavResponse {
    /// Active format.
    pub format: NavFormat,
    /// The step under the cursor.
    pub step: NavStep,
    /// Country code of the step.
    pub country_code: String,
    /// Human-readable label for the step.
    pub placeholder: String,
    /// Pagination progress for the step.
    pub page: PageState,
    /// Whether a successor step exists.
    pub has_next: bool,
}

/// A user-supplied city record for [`Sequencer::add_cities`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCity {
    /// City name.
    pub name: String,
    /// Code of the state the city belongs to.
    pub state_code: String,
    /// Owning country code.
    pub country_code: String,
    /// County, when known.
    pub county: Option<String>,
}

/// A user-supplied state record for [`Sequencer::add_states`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewState {
    /// State code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Owning country code.
    pub country_code: String,
}

/// A user-supplied country record for [`Sequencer::add_countries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCountry {
    /// Two-letter country code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Counts describing the loaded entity snapshot and the cursor position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequencerSummary {
    /// Active format.
    pub format: NavFormat,
    /// Country filter in textual form.
    pub target: String,
    /// Length of the expanded sequence.
    pub sequence_len: usize,
    /// Current cursor index.
    pub cursor: usize,
    /// Loaded country count.
    pub countries: usize,
    /// Loaded state count.
    pub states: usize,
    /// Loaded city count.
    pub cities: usize,
    /// Loaded postal-code count.
    pub zips: usize,
    /// Loaded query count.
    pub queries: usize,
}

/// Drives the expanded sequence against a persistent entity store.
#[derive(Debug)]
pub struct Sequencer<S: EntityStore> {
    store: S,
    format: NavFormat,
    target: TargetCountry,
    entities: EntitySet,
    sequence: Vec<NavStep>,
    cursor: usize,
    current: Option<NavResponse>,
}

impl<S: EntityStore> Sequencer<S> {
    /// Initialise against a store, seeding it from `seed` when empty.
    ///
    /// Entities are loaded filtered by the target, the sequence is expanded,
    /// and the cursor is resolved through the restore protocol: an active
    /// session is re-located by value match, or a fresh session is persisted
    /// for the first step.
    pub fn init(
        store: S,
        options: InitOptions,
        seed: Option<&SeedData>,
    ) -> Result<Self, SequencerError> {
        let mut sequencer = Self {
            store,
            format: options.format,
            target: options.target,
            entities: EntitySet::default(),
            sequence: Vec::new(),
            cursor: 0,
            current: None,
        };
        sequencer.bootstrap(seed)?;
        sequencer.reload_entities()?;
        sequencer.sequence = expand(&sequencer.entities, sequencer.format);
        sequencer.restore()?;
        Ok(sequencer)
    }

    fn bootstrap(&mut self, seed: Option<&SeedData>) -> Result<(), StoreError> {
        let Some(seed) = seed else {
            return Ok(());
        };
        if self.store.country_count()? > 0 {
            return Ok(());
        }
        self.store.seed_entities(&seed.entity_batches())
    }

    fn reload_entities(&mut self) -> Result<(), StoreError> {
        let countries = self.store.countries(&self.target)?;
        let codes: Vec<String> = countries.iter().map(|c| c.code.clone()).collect();
        self.entities = EntitySet {
            states: self.store.states_in(&codes)?,
            cities: self.store.cities_in(&codes)?,
            zips: self.store.zips_in(&codes)?,
            queries: self.store.queries()?,
            countries,
        };
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), StoreError> {
        self.reload_entities()?;
        self.sequence = expand(&self.entities, self.format);
        Ok(())
    }

    fn restore(&mut self) -> Result<(), SequencerError> {
        match self.store.active_session()? {
            Some(session) => {
                self.cursor = self.locate(&session).unwrap_or_else(|| {
                    log::warn!(
                        "no step matches session {}; restarting from the beginning",
                        session.id
                    );
                    0
                });
                self.current = self
                    .sequence
                    .get(self.cursor)
                    .map(|step| build_response(step, self.format, session.page.clone(), self.cursor, self.sequence.len()));
            }
            None => {
                self.cursor = 0;
                self.open_session_at_cursor()?;
            }
        }
        Ok(())
    }

    /// Find the persisted session in the freshly expanded sequence by value
    /// equality on the fields it recorded.
    fn locate(&self, session: &Session) -> Option<usize> {
        let country = self.entities.country(&session.country_code);
        let query = session.query_id.and_then(|id| self.entities.query_by_id(id));
        let zip = session.zip_id.and_then(|id| self.entities.zip_by_id(id));
        let city = session.city_id.and_then(|id| self.entities.city_by_id(id));
        let state = session
            .state_code
            .as_deref()
            .and_then(|code| self.entities.state(code, &session.country_code));
        self.sequence
            .iter()
            .position(|step| step_matches(step, country, query, zip, city, state))
    }

    fn open_session_at_cursor(&mut self) -> Result<(), SequencerError> {
        let Some(step) = self.sequence.get(self.cursor) else {
            self.current = None;
            return Ok(());
        };
        let response =
            build_response(step, self.format, PageState::NotStarted, self.cursor, self.sequence.len());
        let session = self.session_for(step);
        self.store.save_session(&session)?;
        self.current = Some(response);
        Ok(())
    }

    fn session_for(&self, step: &NavStep) -> NewSession {
        let refs = self.step_refs(step);
        NewSession {
            format: self.format,
            country_code: step.country_code().to_owned(),
            query_id: refs.query_id,
            zip_id: refs.zip_id,
            city_id: refs.city_id,
            state_code: refs.state_code,
            page: PageState::NotStarted,
            external: true,
        }
    }

    fn step_refs(&self, step: &NavStep) -> StepRefs {
        StepRefs {
            country_code: Some(step.country_code().to_owned()),
            query_id: step
                .query()
                .and_then(|text| self.entities.queries.iter().find(|q| q.text == text))
                .and_then(|q| q.id),
            zip_id: step
                .zip()
                .and_then(|code| {
                    self.entities
                        .zips
                        .iter()
                        .find(|z| z.code == code && z.country_code == step.country_code())
                })
                .and_then(|z| z.id),
            city_id: step
                .city()
                .and_then(|name| {
                    self.entities.cities.iter().find(|c| {
                        c.name == name
                            && c.country_code == step.country_code()
                            && step.state_code().is_none_or(|code| c.state_code == code)
                    })
                })
                .and_then(|c| c.id),
            state_code: step.state_code().map(str::to_owned),
        }
    }

    /// The navigation response under the cursor, if the sequence is not
    /// empty or exhausted.
    #[must_use]
    pub fn current(&self) -> Option<&NavResponse> {
        self.current.as_ref()
    }

    /// The active format.
    #[must_use]
    pub fn format(&self) -> NavFormat {
        self.format
    }

    /// Read access to the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The country filter the sequencer was initialised with.
    #[must_use]
    pub fn target(&self) -> &TargetCountry {
        &self.target
    }

    /// Move to the next step.
    ///
    /// While the active session is not completed this is a no-op returning
    /// the unchanged current step; a step must be finished before the walk
    /// moves on. Otherwise the finished step's entities are marked used and
    /// a fresh session is persisted for the successor, atomically. Returns
    /// `None` once the sequence is exhausted.
    pub fn advance(&mut self) -> Result<Option<&NavResponse>, SequencerError> {
        if self.current.is_none() {
            return Ok(None);
        }
        if self.store.active_session()?.is_some() {
            return Ok(self.current.as_ref());
        }

        let refs = match self.current.as_ref() {
            Some(current) => self.step_refs(&current.step),
            None => StepRefs::default(),
        };
        self.cursor += 1;

        if self.cursor >= self.sequence.len() {
            self.store.advance_session(&refs, None)?;
            self.current = None;
            return Ok(None);
        }

        let (response, session) = match self.sequence.get(self.cursor) {
            Some(step) => (
                build_response(step, self.format, PageState::NotStarted, self.cursor, self.sequence.len()),
                self.session_for(step),
            ),
            None => {
                self.current = None;
                return Ok(None);
            }
        };
        self.store.advance_session(&refs, Some(&session))?;
        self.current = Some(response);
        Ok(self.current.as_ref())
    }

    /// Attach pagination to the current step.
    ///
    /// `pages` may pre-mark pages already known to be done. A no-op when no
    /// session is active.
    pub fn set_pagination(&mut self, total: u32, pages: &[u32]) -> Result<(), SequencerError> {
        let Some(session) = self.store.active_session()? else {
            return Ok(());
        };
        if self.current.is_none() {
            return Ok(());
        }
        let state = PageState::InProgress(PageProgress::new(total, pages.iter().copied()));
        self.store.update_session_page(session.id, &state)?;
        if let Some(current) = self.current.as_mut() {
            current.page = state;
        }
        Ok(())
    }

    /// Record one page of the current step as done.
    ///
    /// Marking a page twice has no effect. When the completed set reaches
    /// the declared total the step transitions to completed exactly once,
    /// which is the sole trigger that unblocks [`Self::advance`].
    pub fn mark_page_done(&mut self, page: u32) -> Result<(), SequencerError> {
        let Some(session) = self.store.active_session()? else {
            return Ok(());
        };
        let mut progress = match self.current.as_ref().map(|c| &c.page) {
            Some(PageState::InProgress(progress)) => progress.clone(),
            _ => return Ok(()),
        };
        if !progress.mark_done(page) {
            return Ok(());
        }
        let complete = progress.is_complete();
        let state = PageState::InProgress(progress);
        self.store.update_session_page(session.id, &state)?;
        if let Some(current) = self.current.as_mut() {
            current.page = state;
        }
        if complete {
            self.mark_complete()?;
        }
        Ok(())
    }

    /// Mark the current step as fully consumed, unblocking [`Self::advance`].
    pub fn mark_complete(&mut self) -> Result<(), SequencerError> {
        let Some(session) = self.store.active_session()? else {
            return Ok(());
        };
        self.store.complete_session(session.id)?;
        if let Some(current) = self.current.as_mut() {
            current.page = PageState::Completed;
        }
        Ok(())
    }

    /// Add search queries and re-expand the sequence.
    ///
    /// The whole batch is validated before anything is written. The cursor
    /// is not re-anchored; positions in the new sequence may differ for the
    /// same logical step until the next restore.
    pub fn add_queries(&mut self, texts: &[String]) -> Result<(), SequencerError> {
        if texts.is_empty() {
            return Ok(());
        }
        let queries = texts
            .iter()
            .map(|text| SearchQuery::new(text.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        self.store.add_queries(&queries, true)?;
        self.entities.queries = self.store.queries()?;
        self.sequence = expand(&self.entities, self.format);
        Ok(())
    }

    /// Add a single search query; an empty string is a no-op.
    pub fn add_query(&mut self, text: &str) -> Result<(), SequencerError> {
        if text.is_empty() {
            return Ok(());
        }
        self.add_queries(&[text.to_owned()])
    }

    /// Remove the user-added search queries and re-expand the sequence.
    pub fn clear_queries(&mut self) -> Result<(), SequencerError> {
        self.store.clear_queries()?;
        self.entities.queries = self.store.queries()?;
        self.sequence = expand(&self.entities, self.format);
        Ok(())
    }

    /// Add cities and re-expand the sequence.
    pub fn add_cities(&mut self, cities: &[NewCity]) -> Result<(), SequencerError> {
        if cities.is_empty() {
            return Ok(());
        }
        let records = cities
            .iter()
            .map(|city| {
                City::new(
                    city.name.as_str(),
                    city.state_code.as_str(),
                    city.country_code.as_str(),
                )
                .map(|record| match &city.county {
                    Some(county) => record.with_county(county.as_str()),
                    None => record,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.store.add_cities(&records, true)?;
        self.refresh()?;
        Ok(())
    }

    /// Add states and re-expand the sequence.
    pub fn add_states(&mut self, states: &[NewState]) -> Result<(), SequencerError> {
        if states.is_empty() {
            return Ok(());
        }
        let records = states
            .iter()
            .map(|state| {
                State::new(
                    state.code.as_str(),
                    state.name.as_str(),
                    state.country_code.as_str(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.store.add_states(&records, true)?;
        self.refresh()?;
        Ok(())
    }

    /// Add countries and re-expand the sequence.
    pub fn add_countries(&mut self, countries: &[NewCountry]) -> Result<(), SequencerError> {
        if countries.is_empty() {
            return Ok(());
        }
        let records = countries
            .iter()
            .map(|country| Country::new(country.code.as_str(), country.name.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        self.store.add_countries(&records, true)?;
        self.refresh()?;
        Ok(())
    }

    /// Delete all sessions and restart the walk from the first step.
    pub fn reset(&mut self) -> Result<(), SequencerError> {
        self.store.reset_sessions()?;
        self.cursor = 0;
        self.current = None;
        self.restore()
    }

    /// Delete all sessions, clear every usage flag, and restart the walk.
    pub fn reset_all(&mut self) -> Result<(), SequencerError> {
        self.store.reset_all()?;
        self.cursor = 0;
        self.current = None;
        self.refresh()?;
        self.restore()
    }

    /// Every persisted session, oldest first.
    pub fn sessions(&self) -> Result<Vec<Session>, SequencerError> {
        Ok(self.store.all_sessions()?)
    }

    /// Counts describing the loaded snapshot and the cursor.
    #[must_use]
    pub fn summary(&self) -> SequencerSummary {
        SequencerSummary {
            format: self.format,
            target: self.target.to_string(),
            sequence_len: self.sequence.len(),
            cursor: self.cursor,
            countries: self.entities.countries.len(),
            states: self.entities.states.len(),
            cities: self.entities.cities.len(),
            zips: self.entities.zips.len(),
            queries: self.entities.queries.len(),
        }
    }
}

fn build_response(
    step: &NavStep,
    format: NavFormat,
    page: PageState,
    cursor: usize,
    sequence_len: usize,
) -> NavResponse {
    NavResponse {
        format,
        country_code: step.country_code().to_owned(),
        placeholder: step.placeholder(),
        page,
        has_next: cursor + 1 < sequence_len,
        step: step.clone(),
    }
}

fn field_matches(step_field: Option<&str>, entity_value: Option<&str>) -> bool {
    match (step_field, entity_value) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn step_matches(
    step: &NavStep,
    country: Option<&Country>,
    query: Option<&SearchQuery>,
    zip: Option<&Zip>,
    city: Option<&City>,
    state: Option<&State>,
) -> bool {
    field_matches(step.query(), query.map(|q| q.text.as_str()))
        && field_matches(step.zip(), zip.map(|z| z.code.as_str()))
        && field_matches(step.city(), city.map(|c| c.name.as_str()))
        && field_matches(step.state(), state.map(|s| s.name.as_str()))
        && country.is_some_and(|c| c.code == step.country_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use rstest::{fixture, rstest};

    fn store_with(
        countries: &[(&str, &str)],
        states: &[(&str, &str, &str)],
        cities: &[(&str, &str, &str)],
        zips: &[(&str, &str)],
        queries: &[&str],
    ) -> MemoryStore {
        let mut store = MemoryStore::default();
        let countries: Vec<Country> = countries
            .iter()
            .map(|(code, name)| Country::new(*code, *name).unwrap())
            .collect();
        store.add_countries(&countries, false).unwrap();
        let states: Vec<State> = states
            .iter()
            .map(|(code, name, country)| State::new(*code, *name, *country).unwrap())
            .collect();
        store.add_states(&states, false).unwrap();
        let cities: Vec<City> = cities
            .iter()
            .map(|(name, state, country)| City::new(*name, *state, *country).unwrap())
            .collect();
        store.add_cities(&cities, false).unwrap();
        let zips: Vec<Zip> = zips
            .iter()
            .map(|(code, country)| Zip::new(*code, *country).unwrap())
            .collect();
        store.add_zips(&zips, false).unwrap();
        let queries: Vec<SearchQuery> = queries
            .iter()
            .map(|text| SearchQuery::new(*text).unwrap())
            .collect();
        store.add_queries(&queries, true).unwrap();
        store
    }

    #[fixture]
    fn us_store() -> MemoryStore {
        store_with(
            &[("US", "United States")],
            &[("CA", "California", "US")],
            &[("Los Angeles", "CA", "US")],
            &[("10001", "US"), ("90001", "US")],
            &[],
        )
    }

    fn init(store: MemoryStore, format: NavFormat, target: &str) -> Sequencer<MemoryStore> {
        Sequencer::init(
            store,
            InitOptions {
                format,
                target: TargetCountry::parse(target),
            },
            None,
        )
        .unwrap()
    }

    #[rstest]
    fn single_city_walk(us_store: MemoryStore) {
        let sequencer = init(us_store, NavFormat::CityStateCountry, "US");
        let current = sequencer.current().expect("one step");
        assert_eq!(current.placeholder, "Los Angeles");
        assert_eq!(current.step.city(), Some("Los Angeles"));
        assert_eq!(current.step.state(), Some("California"));
        assert_eq!(current.step.state_code(), Some("CA"));
        assert_eq!(current.step.country(), Some("United States"));
        assert_eq!(current.step.country_code(), "US");
        assert!(!current.has_next);
        assert_eq!(current.page, PageState::NotStarted);
    }

    #[rstest]
    fn init_persists_the_first_session(us_store: MemoryStore) {
        let sequencer = init(us_store, NavFormat::Zip, "US");
        let sessions = sequencer.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        let first = sessions.first().unwrap();
        assert!(!first.completed);
        assert_eq!(first.country_code, "US");
        assert!(first.zip_id.is_some());
    }

    #[rstest]
    fn advance_is_a_no_op_until_the_step_completes(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::Zip, "US");
        let before = sequencer.current().cloned();
        let after = sequencer.advance().unwrap().cloned();
        assert_eq!(before, after);
    }

    #[rstest]
    fn completing_all_pages_unblocks_advance(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::Zip, "US");
        assert_eq!(
            sequencer.current().map(|c| c.step.zip()),
            Some(Some("10001"))
        );

        sequencer.set_pagination(3, &[]).unwrap();
        for page in [2, 1, 2, 3] {
            sequencer.mark_page_done(page).unwrap();
        }
        assert_eq!(
            sequencer.current().map(|c| c.page.clone()),
            Some(PageState::Completed)
        );

        let next = sequencer.advance().unwrap().expect("second step");
        assert_eq!(next.step.zip(), Some("90001"));
        assert!(!next.has_next);
    }

    #[rstest]
    fn advancing_marks_the_finished_step_used(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::Zip, "US");
        sequencer.mark_complete().unwrap();
        sequencer.advance().unwrap();

        let zips = sequencer.store().zips_in(&["US".to_owned()]).unwrap();
        let used: Vec<bool> = zips.iter().map(|z| z.used).collect();
        assert_eq!(used, [true, false]);
        let countries = sequencer.store().countries(&TargetCountry::All).unwrap();
        assert!(countries.iter().all(|c| c.used));
    }

    #[rstest]
    fn exhausting_the_sequence_yields_none(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::CityStateCountry, "US");
        sequencer.mark_complete().unwrap();
        assert!(sequencer.advance().unwrap().is_none());
        assert!(sequencer.current().is_none());
        assert!(sequencer.advance().unwrap().is_none());

        let cities = sequencer.store().cities_in(&["US".to_owned()]).unwrap();
        assert!(cities.iter().all(|c| c.used));
    }

    #[rstest]
    fn empty_store_yields_no_steps() {
        let sequencer = init(MemoryStore::default(), NavFormat::Zip, "all");
        assert!(sequencer.current().is_none());
        assert!(sequencer.sessions().unwrap().is_empty());
    }

    #[rstest]
    fn adding_queries_grows_a_query_crossed_sequence(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::QueryZip, "US");
        // No queries stored yet, so the sequence is empty.
        assert_eq!(sequencer.summary().sequence_len, 0);

        sequencer.add_queries(&["Realtor".to_owned()]).unwrap();
        assert_eq!(sequencer.summary().sequence_len, 2);

        sequencer.add_queries(&["Restaurant".to_owned()]).unwrap();
        assert_eq!(sequencer.summary().sequence_len, 4);
    }

    #[rstest]
    fn batch_validation_is_all_or_nothing(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::City, "US");
        let result = sequencer.add_cities(&[
            NewCity {
                name: "San Diego".to_owned(),
                state_code: "CA".to_owned(),
                country_code: "US".to_owned(),
                county: None,
            },
            NewCity {
                name: String::new(),
                state_code: "CA".to_owned(),
                country_code: "US".to_owned(),
                county: None,
            },
        ]);
        assert!(matches!(result, Err(SequencerError::Entity(_))));
        // Nothing was written: the sequence still has only the seeded city.
        assert_eq!(sequencer.summary().cities, 1);
    }

    #[rstest]
    fn added_cities_extend_the_sequence(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::City, "US");
        sequencer
            .add_cities(&[NewCity {
                name: "San Diego".to_owned(),
                state_code: "CA".to_owned(),
                country_code: "US".to_owned(),
                county: Some("San Diego County".to_owned()),
            }])
            .unwrap();
        assert_eq!(sequencer.summary().sequence_len, 2);
    }

    #[rstest]
    fn reset_restarts_from_the_first_step(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::Zip, "US");
        sequencer.mark_complete().unwrap();
        sequencer.advance().unwrap();
        assert_eq!(
            sequencer.current().map(|c| c.step.zip()),
            Some(Some("90001"))
        );

        sequencer.reset().unwrap();
        assert_eq!(
            sequencer.current().map(|c| c.step.zip()),
            Some(Some("10001"))
        );
        assert_eq!(sequencer.sessions().unwrap().len(), 1);
        // Usage flags survive a plain reset.
        let zips = sequencer.store().zips_in(&["US".to_owned()]).unwrap();
        assert!(zips.iter().any(|z| z.used));
    }

    #[rstest]
    fn reset_all_clears_usage_flags(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::Zip, "US");
        sequencer.mark_complete().unwrap();
        sequencer.advance().unwrap();

        sequencer.reset_all().unwrap();
        let zips = sequencer.store().zips_in(&["US".to_owned()]).unwrap();
        assert!(zips.iter().all(|z| !z.used));
        assert_eq!(sequencer.sessions().unwrap().len(), 1);
    }

    #[rstest]
    fn duplicate_page_marks_have_no_effect(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::Zip, "US");
        sequencer.set_pagination(3, &[]).unwrap();
        sequencer.mark_page_done(2).unwrap();
        sequencer.mark_page_done(2).unwrap();
        match sequencer.current().map(|c| &c.page) {
            Some(PageState::InProgress(progress)) => {
                assert_eq!(progress.pages.iter().copied().collect::<Vec<_>>(), [2]);
            }
            other => panic!("unexpected page state: {other:?}"),
        }
    }

    #[rstest]
    fn query_format_requires_stored_queries(us_store: MemoryStore) {
        let mut sequencer = init(us_store, NavFormat::Query, "US");
        assert!(sequencer.current().is_none());
        sequencer.add_query("Realtor").unwrap();
        assert_eq!(sequencer.summary().sequence_len, 1);
    }

    #[rstest]
    fn summary_reports_the_loaded_snapshot(us_store: MemoryStore) {
        let sequencer = init(us_store, NavFormat::Zip, "US");
        let summary = sequencer.summary();
        assert_eq!(summary.countries, 1);
        assert_eq!(summary.states, 1);
        assert_eq!(summary.cities, 1);
        assert_eq!(summary.zips, 2);
        assert_eq!(summary.sequence_len, 2);
        assert_eq!(summary.cursor, 0);
    }
}
