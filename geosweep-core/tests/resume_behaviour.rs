//! End-to-end behaviour of the resume protocol against an on-disk store.

#![cfg(feature = "store-sqlite")]

use std::collections::BTreeMap;
use std::path::Path;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use geosweep_core::{
    City, Country, EntityStore, InitOptions, NavFormat, PageState, SeedData, Sequencer,
    SqliteEntityStore, State, TargetCountry, Zip,
};

fn options(format: NavFormat, target: &str) -> InitOptions {
    InitOptions {
        format,
        target: TargetCountry::parse(target),
    }
}

fn seeded_store(path: &Path) -> SqliteEntityStore {
    let mut store = SqliteEntityStore::open(path).expect("open store");
    store
        .add_countries(&[Country::new("US", "United States").expect("country")], false)
        .expect("add countries");
    store
        .add_states(&[State::new("CA", "California", "US").expect("state")], false)
        .expect("add states");
    store
        .add_cities(
            &[City::new("Los Angeles", "CA", "US").expect("city")],
            false,
        )
        .expect("add cities");
    store
        .add_zips(
            &[
                Zip::new("10001", "US").expect("zip"),
                Zip::new("90001", "US").expect("zip"),
            ],
            false,
        )
        .expect("add zips");
    store
}

#[fixture]
fn workdir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

#[rstest]
fn restart_relocates_the_session_by_value(workdir: TempDir) {
    let db_path = workdir.path().join("nav.db");
    let store = seeded_store(&db_path);
    let mut sequencer = Sequencer::init(
        store,
        options(NavFormat::CityStateCountry, "US"),
        None,
    )
    .expect("init");
    sequencer.set_pagination(4, &[1]).expect("set pagination");
    drop(sequencer);

    let store = SqliteEntityStore::open(&db_path).expect("reopen store");
    let sequencer = Sequencer::init(
        store,
        options(NavFormat::CityStateCountry, "US"),
        None,
    )
    .expect("re-init");

    let current = sequencer.current().expect("restored step");
    assert_eq!(current.placeholder, "Los Angeles");
    assert_eq!(current.step.state_code(), Some("CA"));
    match &current.page {
        PageState::InProgress(progress) => {
            assert_eq!(progress.total, 4);
            assert_eq!(progress.pages.iter().copied().collect::<Vec<_>>(), [1]);
        }
        other => panic!("pagination was not restored: {other:?}"),
    }
    // Restarting did not open a second session.
    assert_eq!(sequencer.sessions().expect("sessions").len(), 1);
}

#[rstest]
fn restart_survives_entity_growth(workdir: TempDir) {
    let db_path = workdir.path().join("nav.db");
    let store = seeded_store(&db_path);
    let mut sequencer =
        Sequencer::init(store, options(NavFormat::Zip, "US"), None).expect("init");
    // Finish the first zip and move onto the second.
    sequencer.mark_complete().expect("complete");
    sequencer.advance().expect("advance");
    let before_restart = sequencer.current().expect("second step").step.clone();
    drop(sequencer);

    // New zips sort both ahead of and after the session's step, shifting
    // its index from 1 to 2.
    let mut store = SqliteEntityStore::open(&db_path).expect("reopen store");
    store
        .add_zips(
            &[
                Zip::new("00501", "US").expect("zip"),
                Zip::new("99999", "US").expect("zip"),
            ],
            true,
        )
        .expect("grow zips");
    let sequencer =
        Sequencer::init(store, options(NavFormat::Zip, "US"), None).expect("re-init");

    let current = sequencer.current().expect("restored step");
    assert_eq!(current.step, before_restart);
    assert!(current.has_next, "the shifted step is no longer last");
}

#[rstest]
fn vanished_entities_fall_back_to_the_first_step(workdir: TempDir) {
    let db_path = workdir.path().join("nav.db");
    let store = seeded_store(&db_path);
    let mut sequencer =
        Sequencer::init(store, options(NavFormat::Zip, "US"), None).expect("init");
    sequencer.mark_complete().expect("complete");
    sequencer.advance().expect("advance");
    drop(sequencer);

    // Re-initialise under a format whose steps no longer match the session.
    let store = SqliteEntityStore::open(&db_path).expect("reopen store");
    let sequencer = Sequencer::init(store, options(NavFormat::CityStateCountry, "US"), None)
        .expect("re-init");
    let current = sequencer.current().expect("fallback step");
    assert_eq!(current.placeholder, "Los Angeles");
}

#[rstest]
fn full_walk_records_every_session(workdir: TempDir) {
    let db_path = workdir.path().join("nav.db");
    let store = seeded_store(&db_path);
    let mut sequencer =
        Sequencer::init(store, options(NavFormat::Zip, "US"), None).expect("init");

    let mut placeholders = Vec::new();
    while let Some(current) = sequencer.current().cloned() {
        placeholders.push(current.placeholder);
        sequencer.mark_complete().expect("complete");
        sequencer.advance().expect("advance");
    }

    assert_eq!(placeholders, ["10001", "90001"]);
    let sessions = sequencer.sessions().expect("sessions");
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.completed));
    assert!(sessions.iter().all(|s| s.page == PageState::Completed));

    let zips = sequencer
        .store()
        .zips_in(&["US".to_owned()])
        .expect("zips");
    assert!(zips.iter().all(|z| z.used));
}

#[rstest]
fn bootstrap_seeds_an_empty_store_once(workdir: TempDir) {
    let db_path = workdir.path().join("nav.db");
    let mut seed = SeedData::default();
    seed.city_data.insert(
        "US#United States".to_owned(),
        BTreeMap::from([(
            "CA##California".to_owned(),
            vec!["Los Angeles".to_owned(), "San Diego".to_owned()],
        )]),
    );
    seed.zip_data
        .insert("US".to_owned(), vec!["90001".to_owned()]);

    let store = SqliteEntityStore::open(&db_path).expect("open store");
    let sequencer = Sequencer::init(
        store,
        options(NavFormat::CityState, "US"),
        Some(&seed),
    )
    .expect("init with seed");
    assert_eq!(sequencer.summary().cities, 2);
    assert_eq!(sequencer.summary().zips, 1);
    drop(sequencer);

    // A second initialisation sees a populated store and does not re-seed.
    let store = SqliteEntityStore::open(&db_path).expect("reopen store");
    let sequencer = Sequencer::init(
        store,
        options(NavFormat::CityState, "US"),
        Some(&seed),
    )
    .expect("re-init with seed");
    assert_eq!(sequencer.summary().cities, 2);
    assert_eq!(sequencer.sessions().expect("sessions").len(), 1);
}
