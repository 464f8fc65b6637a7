//! hoare-fv: checks each function of an annotated module against its
//! contract.
//!
//! Usage:
//!   hoare-fv [OPTIONS] <MODULE.json>
//!
//! Logs go to stderr and are filtered by `RUST_LOG` (default `warn`,
//! `info` with `--verbose`).

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let default_level = if hoare_fv_driver::cli::wants_verbose(&args) {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = hoare_fv_driver::cli::run(&args);
    ExitCode::from(u8::try_from(code).unwrap_or(2))
}
