//! Unit tests for argument parsing and command dispatch.

use super::*;
use rstest::rstest;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args.iter().copied()).expect("arguments should parse")
}

#[rstest]
fn parses_the_fetch_command() {
    let cli = parse(&[
        "geosweep",
        "fetch",
        "--output",
        "seed.json",
        "--postal-country",
        "us",
        "--postal-country",
        "de",
    ]);
    match cli.command {
        Command::Fetch(args) => {
            assert_eq!(args.output, Utf8PathBuf::from("seed.json"));
            assert_eq!(args.postal_countries, ["us", "de"]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[rstest]
fn parses_pages_subcommands() {
    let cli = parse(&[
        "geosweep", "pages", "set", "--total", "3", "--done", "1", "--done", "2",
    ]);
    match cli.command {
        Command::Pages(PagesArgs {
            action: PagesAction::Set { total, done },
        }) => {
            assert_eq!(total, 3);
            assert_eq!(done, [1, 2]);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let cli = parse(&["geosweep", "pages", "done", "--page", "2"]);
    assert!(matches!(
        cli.command,
        Command::Pages(PagesArgs {
            action: PagesAction::Done { page: 2 }
        })
    ));
}

#[rstest]
fn global_options_apply_after_the_subcommand() {
    let cli = parse(&[
        "geosweep",
        "status",
        "--db",
        "custom.db",
        "--format",
        "city-state",
        "--country",
        "us",
    ]);
    assert_eq!(cli.db, Utf8PathBuf::from("custom.db"));
    assert_eq!(cli.format, "city-state");
    assert_eq!(cli.country, "us");
}

#[rstest]
fn rejects_add_query_without_terms() {
    assert!(Cli::try_parse_from(["geosweep", "add", "query"]).is_err());
}

#[rstest]
fn rejects_an_unknown_format() {
    let dir = TempDir::new().expect("create temp dir");
    let db = dir.path().join("nav.db");
    let db = db.to_str().expect("utf-8 path");
    let result = dispatch(parse(&[
        "geosweep", "--db", db, "--format", "city-country", "status",
    ]));
    assert!(matches!(result, Err(CliError::InvalidFormat(_))));
}

#[rstest]
fn walks_a_seeded_store_end_to_end() {
    let dir = TempDir::new().expect("create temp dir");
    let db = dir.path().join("nav.db");
    let db = db.to_str().expect("utf-8 path");
    let base = ["geosweep", "--db", db, "--format", "city-state"];

    let with = |extra: &[&str]| {
        let mut args = base.to_vec();
        args.extend_from_slice(extra);
        parse(&args)
    };

    dispatch(with(&[
        "add", "country", "--code", "US", "--name", "United States",
    ]))
    .expect("add country");
    dispatch(with(&[
        "add",
        "state",
        "--code",
        "CA",
        "--name",
        "California",
        "--country-code",
        "US",
    ]))
    .expect("add state");
    dispatch(with(&[
        "add",
        "city",
        "--name",
        "Los Angeles",
        "--state-code",
        "CA",
        "--country-code",
        "US",
    ]))
    .expect("add city");

    dispatch(with(&["status"])).expect("status");
    dispatch(with(&["pages", "set", "--total", "1"])).expect("set pages");
    dispatch(with(&["pages", "done", "--page", "1"])).expect("mark page");
    dispatch(with(&["next"])).expect("advance");
    dispatch(with(&["sessions"])).expect("list sessions");
    dispatch(with(&["reset"])).expect("reset");
}
