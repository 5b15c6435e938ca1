//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = geosweep_cli::run() {
        eprintln!("geosweep: {err}");
        std::process::exit(1);
    }
}
