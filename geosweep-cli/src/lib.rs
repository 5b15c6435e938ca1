//! Command-line interface for driving the Geosweep engine.
//!
//! The CLI is a thin front end: it parses arguments, wires a SQLite store
//! into the sequencer and prints JSON responses. No navigation logic lives
//! here.

#![forbid(unsafe_code)]

mod error;

pub use error::CliError;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use geosweep_core::{
    InitOptions, NavFormat, NewCity, NewCountry, NewState, PageState, SeedData, Sequencer,
    SqliteEntityStore, TargetCountry,
};
use geosweep_data::fetch::{DEFAULT_POSTAL_COUNTRIES, HttpDatasetSource, build_seed_data};
use geosweep_data::{load_seed_data, save_seed_data};

/// Run the Geosweep CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    env_logger::try_init().ok();
    dispatch(cli)
}

#[derive(Debug, Parser)]
#[command(
    name = "geosweep",
    about = "Resumable navigation over a geographic and search-term space",
    version
)]
struct Cli {
    /// Path to the SQLite store.
    #[arg(long, global = true, default_value = "geosweep.db", value_name = "path")]
    db: Utf8PathBuf,
    /// Navigation format to expand the sequence under.
    #[arg(long, global = true, default_value = "zip", value_name = "format")]
    format: String,
    /// Country filter: a two-letter code or "all".
    #[arg(long, global = true, default_value = "all", value_name = "country")]
    country: String,
    /// Seed dataset used to bootstrap an empty store.
    #[arg(long, global = true, value_name = "path")]
    seed_file: Option<Utf8PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download the bootstrap datasets and write them to a seed file.
    Fetch(FetchArgs),
    /// Show the current navigation step.
    Status,
    /// Move to the next step once the current one is completed.
    Next,
    /// Pagination operations for the current step.
    Pages(PagesArgs),
    /// Mark the current step as completed and move to its successor.
    Complete,
    /// Add entities or search queries.
    Add(AddArgs),
    /// Remove the user-added search queries.
    ClearQueries,
    /// List every persisted session.
    Sessions,
    /// Show entity and sequence counts.
    Summary,
    /// Delete sessions and restart the walk.
    Reset(ResetArgs),
}

/// Arguments for the `fetch` subcommand.
#[derive(Debug, Args)]
struct FetchArgs {
    /// Where to write the dataset.
    #[arg(long, value_name = "path")]
    output: Utf8PathBuf,
    /// Countries to fetch postal codes for; defaults to the built-in set.
    #[arg(long = "postal-country", value_name = "code")]
    postal_countries: Vec<String>,
}

#[derive(Debug, Args)]
struct PagesArgs {
    #[command(subcommand)]
    action: PagesAction,
}

#[derive(Debug, Subcommand)]
enum PagesAction {
    /// Declare the page total, optionally pre-marking pages already done.
    Set {
        /// Total number of pages for the step.
        #[arg(long)]
        total: u32,
        /// Pages already known to be done.
        #[arg(long = "done", value_name = "page")]
        done: Vec<u32>,
    },
    /// Mark one page as done.
    Done {
        /// The page to mark.
        #[arg(long)]
        page: u32,
    },
}

#[derive(Debug, Args)]
struct AddArgs {
    #[command(subcommand)]
    entity: AddEntity,
}

#[derive(Debug, Subcommand)]
enum AddEntity {
    /// Add search queries.
    Query {
        /// The search terms to store.
        #[arg(required = true, value_name = "text")]
        texts: Vec<String>,
    },
    /// Add a city.
    City {
        /// City name.
        #[arg(long)]
        name: String,
        /// Code of the state the city belongs to.
        #[arg(long)]
        state_code: String,
        /// Owning country code.
        #[arg(long)]
        country_code: String,
        /// County, when known.
        #[arg(long)]
        county: Option<String>,
    },
    /// Add a state.
    State {
        /// State code.
        #[arg(long)]
        code: String,
        /// Display name.
        #[arg(long)]
        name: String,
        /// Owning country code.
        #[arg(long)]
        country_code: String,
    },
    /// Add a country.
    Country {
        /// Two-letter country code.
        #[arg(long)]
        code: String,
        /// Display name.
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Args)]
struct ResetArgs {
    /// Also clear every usage flag.
    #[arg(long)]
    all: bool,
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let Cli {
        db,
        format,
        country,
        seed_file,
        command,
    } = cli;

    let command = match command {
        Command::Fetch(args) => return run_fetch(&args),
        other => other,
    };

    let format: NavFormat = format.parse()?;
    let seed = seed_file.map(|path| load_seed_data(&path)).transpose()?;
    let store = SqliteEntityStore::open(&db)?;
    let mut sequencer = Sequencer::init(
        store,
        InitOptions {
            format,
            target: TargetCountry::parse(&country),
        },
        seed.as_ref(),
    )?;

    match command {
        Command::Fetch(_) => Ok(()),
        Command::Status => print_current(&sequencer),
        Command::Next => {
            sequencer.advance()?;
            print_current(&sequencer)
        }
        Command::Pages(args) => {
            match args.action {
                PagesAction::Set { total, done } => sequencer.set_pagination(total, &done)?,
                PagesAction::Done { page } => {
                    sequencer.mark_page_done(page)?;
                    advance_if_completed(&mut sequencer)?;
                }
            }
            print_current(&sequencer)
        }
        Command::Complete => {
            sequencer.mark_complete()?;
            sequencer.advance()?;
            print_current(&sequencer)
        }
        Command::Add(args) => {
            match args.entity {
                AddEntity::Query { texts } => sequencer.add_queries(&texts)?,
                AddEntity::City {
                    name,
                    state_code,
                    country_code,
                    county,
                } => sequencer.add_cities(&[NewCity {
                    name,
                    state_code,
                    country_code,
                    county,
                }])?,
                AddEntity::State {
                    code,
                    name,
                    country_code,
                } => sequencer.add_states(&[NewState {
                    code,
                    name,
                    country_code,
                }])?,
                AddEntity::Country { code, name } => {
                    sequencer.add_countries(&[NewCountry { code, name }])?;
                }
            }
            print_json(&sequencer.summary())
        }
        Command::ClearQueries => {
            sequencer.clear_queries()?;
            print_json(&sequencer.summary())
        }
        Command::Sessions => print_json(&sequencer.sessions()?),
        Command::Summary => print_json(&sequencer.summary()),
        Command::Reset(args) => {
            if args.all {
                sequencer.reset_all()?;
            } else {
                sequencer.reset()?;
            }
            print_current(&sequencer)
        }
    }
}

fn run_fetch(args: &FetchArgs) -> Result<(), CliError> {
    let countries: Vec<String> = if args.postal_countries.is_empty() {
        DEFAULT_POSTAL_COUNTRIES
            .iter()
            .map(|code| (*code).to_owned())
            .collect()
    } else {
        args.postal_countries
            .iter()
            .map(|code| code.to_ascii_uppercase())
            .collect()
    };

    let source = HttpDatasetSource::new();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let seed = runtime.block_on(build_seed_data(&source, &countries))?;
    save_seed_data(&args.output, &seed)?;
    log::info!("seed data written to {}", args.output);
    Ok(())
}

/// One-shot invocations cannot advance in a later process: a restart with no
/// active session opens a fresh one at the current step, which blocks
/// `advance` again. Moving on the moment a step completes keeps the durable
/// cursor on the successor.
fn advance_if_completed(sequencer: &mut Sequencer<SqliteEntityStore>) -> Result<(), CliError> {
    if matches!(
        sequencer.current().map(|c| &c.page),
        Some(PageState::Completed)
    ) {
        sequencer.advance()?;
    }
    Ok(())
}

fn print_current(sequencer: &Sequencer<SqliteEntityStore>) -> Result<(), CliError> {
    match sequencer.current() {
        Some(response) => print_json(response),
        None => print_json(&serde_json::json!({ "exhausted": true })),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests;
