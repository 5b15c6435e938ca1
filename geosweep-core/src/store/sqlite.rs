//! SQLite-backed implementation of the entity store.
//!
//! The schema is created idempotently inside a transaction, one migration
//! step at a time so a failure names the statement that broke. Bulk inserts
//! use prepared `INSERT OR IGNORE` statements inside a single transaction,
//! which is what makes the add operations idempotent per unique key.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension, Row, Transaction, params, params_from_iter};

use crate::entity::{City, Country, SearchQuery, State, TargetCountry, Zip};
use crate::format::NavFormat;
use crate::page::PageState;
use crate::seed::SeedBatches;
use crate::session::{NewSession, Session, StepRefs};

use super::{EntityStore, StoreError};

/// Entity store backed by a SQLite database file (or `:memory:`).
pub struct SqliteEntityStore {
    connection: Connection,
}

impl fmt::Debug for SqliteEntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteEntityStore").finish_non_exhaustive()
    }
}

impl SqliteEntityStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let connection = Connection::open(path.as_ref())
            .map_err(|source| StoreError::backend("open database", source))?;
        Self::initialise(connection)
    }

    /// Open a transient in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory()
            .map_err(|source| StoreError::backend("open in-memory database", source))?;
        Self::initialise(connection)
    }

    fn initialise(mut connection: Connection) -> Result<Self, StoreError> {
        connection
            .pragma_update(None, "foreign_keys", true)
            .map_err(|source| StoreError::backend("enable foreign keys", source))?;
        connection
            .pragma_update(None, "journal_mode", "WAL")
            .map_err(|source| StoreError::backend("enable write-ahead logging", source))?;

        let transaction = connection
            .transaction()
            .map_err(|source| StoreError::backend("begin schema transaction", source))?;
        create_schema(&transaction)?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit schema transaction", source))?;

        Ok(Self { connection })
    }

    fn transaction(&mut self) -> Result<Transaction<'_>, StoreError> {
        self.connection
            .transaction()
            .map_err(|source| StoreError::backend("begin transaction", source))
    }
}

fn create_schema(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create countries table",
        "CREATE TABLE IF NOT EXISTS countries (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            used INTEGER NOT NULL DEFAULT 0,
            external INTEGER NOT NULL DEFAULT 0
        )",
    )?;
    run_migration_step(
        transaction,
        "create states table",
        "CREATE TABLE IF NOT EXISTS states (
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            country_code TEXT NOT NULL,
            used INTEGER NOT NULL DEFAULT 0,
            external INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (code, country_code),
            FOREIGN KEY (country_code) REFERENCES countries(code) ON DELETE CASCADE
        )",
    )?;
    run_migration_step(
        transaction,
        "create cities table",
        "CREATE TABLE IF NOT EXISTS cities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            state_code TEXT NOT NULL,
            country_code TEXT NOT NULL,
            county TEXT,
            used INTEGER NOT NULL DEFAULT 0,
            external INTEGER NOT NULL DEFAULT 0,
            UNIQUE (name, state_code, country_code),
            FOREIGN KEY (state_code, country_code)
                REFERENCES states(code, country_code) ON DELETE CASCADE,
            FOREIGN KEY (country_code) REFERENCES countries(code) ON DELETE CASCADE
        )",
    )?;
    run_migration_step(
        transaction,
        "create zips table",
        "CREATE TABLE IF NOT EXISTS zips (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL,
            country_code TEXT NOT NULL,
            used INTEGER NOT NULL DEFAULT 0,
            external INTEGER NOT NULL DEFAULT 0,
            UNIQUE (code, country_code),
            FOREIGN KEY (country_code) REFERENCES countries(code) ON DELETE CASCADE
        )",
    )?;
    run_migration_step(
        transaction,
        "create queries table",
        "CREATE TABLE IF NOT EXISTS queries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL UNIQUE,
            used INTEGER NOT NULL DEFAULT 0,
            external INTEGER NOT NULL DEFAULT 0
        )",
    )?;
    run_migration_step(
        transaction,
        "create nav_sessions table",
        "CREATE TABLE IF NOT EXISTS nav_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            format TEXT NOT NULL,
            country_code TEXT NOT NULL,
            query_id INTEGER,
            zip_id INTEGER,
            city_id INTEGER,
            state_code TEXT,
            page TEXT,
            completed INTEGER NOT NULL DEFAULT 0,
            external INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (country_code) REFERENCES countries(code) ON DELETE CASCADE,
            FOREIGN KEY (query_id) REFERENCES queries(id) ON DELETE SET NULL,
            FOREIGN KEY (zip_id) REFERENCES zips(id) ON DELETE SET NULL,
            FOREIGN KEY (city_id) REFERENCES cities(id) ON DELETE SET NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "index states by country",
        "CREATE INDEX IF NOT EXISTS idx_states_country ON states(country_code)",
    )?;
    run_migration_step(
        transaction,
        "index cities by country",
        "CREATE INDEX IF NOT EXISTS idx_cities_country ON cities(country_code)",
    )?;
    run_migration_step(
        transaction,
        "index cities by state",
        "CREATE INDEX IF NOT EXISTS idx_cities_state ON cities(state_code, country_code)",
    )?;
    run_migration_step(
        transaction,
        "index zips by country",
        "CREATE INDEX IF NOT EXISTS idx_zips_country ON zips(country_code)",
    )?;
    run_migration_step(
        transaction,
        "index sessions by completion",
        "CREATE INDEX IF NOT EXISTS idx_sessions_completed ON nav_sessions(completed)",
    )
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreError::backend(step, source))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn country_from_row(row: &Row<'_>) -> rusqlite::Result<Country> {
    Ok(Country {
        code: row.get(0)?,
        name: row.get(1)?,
        used: row.get(2)?,
        external: row.get(3)?,
    })
}

fn state_from_row(row: &Row<'_>) -> rusqlite::Result<State> {
    Ok(State {
        code: row.get(0)?,
        name: row.get(1)?,
        country_code: row.get(2)?,
        used: row.get(3)?,
        external: row.get(4)?,
    })
}

fn city_from_row(row: &Row<'_>) -> rusqlite::Result<City> {
    Ok(City {
        id: row.get(0)?,
        name: row.get(1)?,
        state_code: row.get(2)?,
        country_code: row.get(3)?,
        county: row.get(4)?,
        used: row.get(5)?,
        external: row.get(6)?,
    })
}

fn zip_from_row(row: &Row<'_>) -> rusqlite::Result<Zip> {
    Ok(Zip {
        id: row.get(0)?,
        code: row.get(1)?,
        country_code: row.get(2)?,
        used: row.get(3)?,
        external: row.get(4)?,
    })
}

fn query_from_row(row: &Row<'_>) -> rusqlite::Result<SearchQuery> {
    Ok(SearchQuery {
        id: row.get(0)?,
        text: row.get(1)?,
        used: row.get(2)?,
        external: row.get(3)?,
    })
}

/// Session columns before the format string and page blob are decoded.
struct RawSession {
    id: i64,
    format: String,
    country_code: String,
    query_id: Option<i64>,
    zip_id: Option<i64>,
    city_id: Option<i64>,
    state_code: Option<String>,
    page: Option<String>,
    completed: bool,
    external: bool,
}

fn raw_session_from_row(row: &Row<'_>) -> rusqlite::Result<RawSession> {
    Ok(RawSession {
        id: row.get(0)?,
        format: row.get(1)?,
        country_code: row.get(2)?,
        query_id: row.get(3)?,
        zip_id: row.get(4)?,
        city_id: row.get(5)?,
        state_code: row.get(6)?,
        page: row.get(7)?,
        completed: row.get(8)?,
        external: row.get(9)?,
    })
}

fn decode_session(raw: RawSession) -> Result<Session, StoreError> {
    let format = NavFormat::from_str(&raw.format).map_err(|_| StoreError::CorruptSession {
        id: raw.id,
        value: raw.format.clone(),
    })?;
    Ok(Session {
        id: raw.id,
        format,
        country_code: raw.country_code,
        query_id: raw.query_id,
        zip_id: raw.zip_id,
        city_id: raw.city_id,
        state_code: raw.state_code,
        page: PageState::from_column(raw.page.as_deref()),
        completed: raw.completed,
        external: raw.external,
    })
}

const SESSION_COLUMNS: &str =
    "id, format, country_code, query_id, zip_id, city_id, state_code, page, completed, external";

fn insert_countries(
    connection: &Connection,
    countries: &[Country],
    external: bool,
) -> Result<(), StoreError> {
    if countries.is_empty() {
        return Ok(());
    }
    let mut statement = connection
        .prepare_cached(
            "INSERT OR IGNORE INTO countries (code, name, used, external)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(|source| StoreError::backend("prepare country insert", source))?;
    for country in countries {
        statement
            .execute(params![country.code, country.name, country.used, external])
            .map_err(|source| StoreError::backend("insert country", source))?;
    }
    Ok(())
}

fn insert_states(
    connection: &Connection,
    states: &[State],
    external: bool,
) -> Result<(), StoreError> {
    if states.is_empty() {
        return Ok(());
    }
    let mut statement = connection
        .prepare_cached(
            "INSERT OR IGNORE INTO states (code, name, country_code, used, external)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|source| StoreError::backend("prepare state insert", source))?;
    for state in states {
        statement
            .execute(params![
                state.code,
                state.name,
                state.country_code,
                state.used,
                external
            ])
            .map_err(|source| StoreError::backend("insert state", source))?;
    }
    Ok(())
}

fn insert_cities(
    connection: &Connection,
    cities: &[City],
    external: bool,
) -> Result<(), StoreError> {
    if cities.is_empty() {
        return Ok(());
    }
    let mut statement = connection
        .prepare_cached(
            "INSERT OR IGNORE INTO cities
                 (name, state_code, country_code, county, used, external)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(|source| StoreError::backend("prepare city insert", source))?;
    for city in cities {
        statement
            .execute(params![
                city.name,
                city.state_code,
                city.country_code,
                city.county,
                city.used,
                external
            ])
            .map_err(|source| StoreError::backend("insert city", source))?;
    }
    Ok(())
}

fn insert_zips(connection: &Connection, zips: &[Zip], external: bool) -> Result<(), StoreError> {
    if zips.is_empty() {
        return Ok(());
    }
    let mut statement = connection
        .prepare_cached(
            "INSERT OR IGNORE INTO zips (code, country_code, used, external)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(|source| StoreError::backend("prepare zip insert", source))?;
    for zip in zips {
        statement
            .execute(params![zip.code, zip.country_code, zip.used, external])
            .map_err(|source| StoreError::backend("insert zip", source))?;
    }
    Ok(())
}

fn insert_queries(
    connection: &Connection,
    queries: &[SearchQuery],
    external: bool,
) -> Result<(), StoreError> {
    if queries.is_empty() {
        return Ok(());
    }
    let mut statement = connection
        .prepare_cached(
            "INSERT OR IGNORE INTO queries (text, used, external) VALUES (?1, ?2, ?3)",
        )
        .map_err(|source| StoreError::backend("prepare query insert", source))?;
    for query in queries {
        statement
            .execute(params![query.text, query.used, external])
            .map_err(|source| StoreError::backend("insert query", source))?;
    }
    Ok(())
}

fn apply_mark_used(connection: &Connection, refs: &StepRefs) -> Result<(), StoreError> {
    if let Some(country_code) = &refs.country_code {
        connection
            .execute(
                "UPDATE countries SET used = 1 WHERE code = ?1",
                params![country_code],
            )
            .map_err(|source| StoreError::backend("mark country used", source))?;
    }
    if let Some(query_id) = refs.query_id {
        connection
            .execute("UPDATE queries SET used = 1 WHERE id = ?1", params![query_id])
            .map_err(|source| StoreError::backend("mark query used", source))?;
    }
    if let Some(zip_id) = refs.zip_id {
        connection
            .execute("UPDATE zips SET used = 1 WHERE id = ?1", params![zip_id])
            .map_err(|source| StoreError::backend("mark zip used", source))?;
    }
    if let Some(city_id) = refs.city_id {
        connection
            .execute("UPDATE cities SET used = 1 WHERE id = ?1", params![city_id])
            .map_err(|source| StoreError::backend("mark city used", source))?;
    }
    if let (Some(state_code), Some(country_code)) = (&refs.state_code, &refs.country_code) {
        connection
            .execute(
                "UPDATE states SET used = 1 WHERE code = ?1 AND country_code = ?2",
                params![state_code, country_code],
            )
            .map_err(|source| StoreError::backend("mark state used", source))?;
    }
    Ok(())
}

fn insert_session(connection: &Connection, session: &NewSession) -> Result<i64, StoreError> {
    let page = session
        .page
        .to_column()
        .map_err(|source| StoreError::EncodePage { source })?;
    connection
        .execute(
            "INSERT INTO nav_sessions
                 (format, country_code, query_id, zip_id, city_id, state_code,
                  page, completed, external)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
            params![
                session.format.as_str(),
                session.country_code,
                session.query_id,
                session.zip_id,
                session.city_id,
                session.state_code,
                page,
                session.external
            ],
        )
        .map_err(|source| StoreError::backend("insert session", source))?;
    Ok(connection.last_insert_rowid())
}

impl EntityStore for SqliteEntityStore {
    fn countries(&self, target: &TargetCountry) -> Result<Vec<Country>, StoreError> {
        let (sql, code) = match target {
            TargetCountry::All => (
                "SELECT code, name, used, external FROM countries ORDER BY code",
                None,
            ),
            TargetCountry::Only(code) => (
                "SELECT code, name, used, external FROM countries WHERE code = ?1",
                Some(code.clone()),
            ),
        };
        let mut statement = self
            .connection
            .prepare(sql)
            .map_err(|source| StoreError::backend("prepare country select", source))?;
        let rows = match code {
            Some(code) => statement.query_map(params![code], country_from_row),
            None => statement.query_map([], country_from_row),
        }
        .map_err(|source| StoreError::backend("select countries", source))?;
        collect_rows(rows, "read country row")
    }

    fn states_in(&self, country_codes: &[String]) -> Result<Vec<State>, StoreError> {
        if country_codes.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT code, name, country_code, used, external FROM states
             WHERE country_code IN ({}) ORDER BY country_code, code",
            placeholders(country_codes.len())
        );
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|source| StoreError::backend("prepare state select", source))?;
        let rows = statement
            .query_map(params_from_iter(country_codes.iter()), state_from_row)
            .map_err(|source| StoreError::backend("select states", source))?;
        collect_rows(rows, "read state row")
    }

    fn cities_in(&self, country_codes: &[String]) -> Result<Vec<City>, StoreError> {
        if country_codes.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, name, state_code, country_code, county, used, external FROM cities
             WHERE country_code IN ({}) ORDER BY id",
            placeholders(country_codes.len())
        );
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|source| StoreError::backend("prepare city select", source))?;
        let rows = statement
            .query_map(params_from_iter(country_codes.iter()), city_from_row)
            .map_err(|source| StoreError::backend("select cities", source))?;
        collect_rows(rows, "read city row")
    }

    fn zips_in(&self, country_codes: &[String]) -> Result<Vec<Zip>, StoreError> {
        if country_codes.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, code, country_code, used, external FROM zips
             WHERE country_code IN ({}) ORDER BY id",
            placeholders(country_codes.len())
        );
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|source| StoreError::backend("prepare zip select", source))?;
        let rows = statement
            .query_map(params_from_iter(country_codes.iter()), zip_from_row)
            .map_err(|source| StoreError::backend("select zips", source))?;
        collect_rows(rows, "read zip row")
    }

    fn queries(&self) -> Result<Vec<SearchQuery>, StoreError> {
        let mut statement = self
            .connection
            .prepare("SELECT id, text, used, external FROM queries ORDER BY id")
            .map_err(|source| StoreError::backend("prepare query select", source))?;
        let rows = statement
            .query_map([], query_from_row)
            .map_err(|source| StoreError::backend("select queries", source))?;
        collect_rows(rows, "read query row")
    }

    fn add_countries(&mut self, countries: &[Country], external: bool) -> Result<(), StoreError> {
        let transaction = self.transaction()?;
        insert_countries(&transaction, countries, external)?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit country insert", source))
    }

    fn add_states(&mut self, states: &[State], external: bool) -> Result<(), StoreError> {
        let transaction = self.transaction()?;
        insert_states(&transaction, states, external)?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit state insert", source))
    }

    fn add_cities(&mut self, cities: &[City], external: bool) -> Result<(), StoreError> {
        let transaction = self.transaction()?;
        insert_cities(&transaction, cities, external)?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit city insert", source))
    }

    fn add_zips(&mut self, zips: &[Zip], external: bool) -> Result<(), StoreError> {
        let transaction = self.transaction()?;
        insert_zips(&transaction, zips, external)?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit zip insert", source))
    }

    fn add_queries(&mut self, queries: &[SearchQuery], external: bool) -> Result<(), StoreError> {
        let transaction = self.transaction()?;
        insert_queries(&transaction, queries, external)?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit query insert", source))
    }

    fn clear_queries(&mut self) -> Result<(), StoreError> {
        self.connection
            .execute("DELETE FROM queries WHERE external = 1", [])
            .map(|_| ())
            .map_err(|source| StoreError::backend("clear queries", source))
    }

    fn country_count(&self) -> Result<u64, StoreError> {
        self.connection
            .query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))
            .map_err(|source| StoreError::backend("count countries", source))
    }

    fn seed_entities(&mut self, batches: &SeedBatches) -> Result<(), StoreError> {
        let transaction = self.transaction()?;
        insert_countries(&transaction, &batches.countries, false)?;
        insert_states(&transaction, &batches.states, false)?;
        insert_cities(&transaction, &batches.cities, false)?;
        insert_zips(&transaction, &batches.zips, false)?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit seed insert", source))?;
        log::info!(
            "seeded {} countries, {} states, {} cities, {} zips",
            batches.countries.len(),
            batches.states.len(),
            batches.cities.len(),
            batches.zips.len()
        );
        Ok(())
    }

    fn active_session(&self) -> Result<Option<Session>, StoreError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM nav_sessions WHERE completed = 0 LIMIT 1"
        );
        let raw = self
            .connection
            .query_row(&sql, [], raw_session_from_row)
            .optional()
            .map_err(|source| StoreError::backend("select active session", source))?;
        raw.map(decode_session).transpose()
    }

    fn all_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM nav_sessions ORDER BY id");
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|source| StoreError::backend("prepare session select", source))?;
        let rows = statement
            .query_map([], raw_session_from_row)
            .map_err(|source| StoreError::backend("select sessions", source))?;
        let raw = collect_rows(rows, "read session row")?;
        raw.into_iter().map(decode_session).collect()
    }

    fn save_session(&mut self, session: &NewSession) -> Result<i64, StoreError> {
        insert_session(&self.connection, session)
    }

    fn update_session_page(&mut self, id: i64, page: &PageState) -> Result<(), StoreError> {
        let column = page
            .to_column()
            .map_err(|source| StoreError::EncodePage { source })?;
        self.connection
            .execute(
                "UPDATE nav_sessions SET page = ?1 WHERE id = ?2",
                params![column, id],
            )
            .map(|_| ())
            .map_err(|source| StoreError::backend("update session page", source))
    }

    fn complete_session(&mut self, id: i64) -> Result<(), StoreError> {
        let column = PageState::Completed
            .to_column()
            .map_err(|source| StoreError::EncodePage { source })?;
        self.connection
            .execute(
                "UPDATE nav_sessions SET completed = 1, page = ?1 WHERE id = ?2",
                params![column, id],
            )
            .map(|_| ())
            .map_err(|source| StoreError::backend("complete session", source))
    }

    fn mark_used(&mut self, refs: &StepRefs) -> Result<(), StoreError> {
        let transaction = self.transaction()?;
        apply_mark_used(&transaction, refs)?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit usage flags", source))
    }

    fn advance_session(
        &mut self,
        used: &StepRefs,
        next: Option<&NewSession>,
    ) -> Result<Option<i64>, StoreError> {
        let transaction = self.transaction()?;
        apply_mark_used(&transaction, used)?;
        let id = next
            .map(|session| insert_session(&transaction, session))
            .transpose()?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit session advance", source))?;
        Ok(id)
    }

    fn reset_sessions(&mut self) -> Result<(), StoreError> {
        self.connection
            .execute("DELETE FROM nav_sessions", [])
            .map(|_| ())
            .map_err(|source| StoreError::backend("delete sessions", source))
    }

    fn reset_all(&mut self) -> Result<(), StoreError> {
        let transaction = self.transaction()?;
        for (operation, sql) in [
            ("clear country usage", "UPDATE countries SET used = 0"),
            ("clear state usage", "UPDATE states SET used = 0"),
            ("clear city usage", "UPDATE cities SET used = 0"),
            ("clear zip usage", "UPDATE zips SET used = 0"),
            ("clear query usage", "UPDATE queries SET used = 0"),
            ("delete sessions", "DELETE FROM nav_sessions"),
        ] {
            transaction
                .execute(sql, [])
                .map_err(|source| StoreError::backend(operation, source))?;
        }
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit reset", source))
    }
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
    operation: &'static str,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|source| StoreError::backend(operation, source))?);
    }
    Ok(out)
}
