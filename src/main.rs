//! dota-agent binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dota_agent::Error;
use dota_agent::cli::{Cli, execute};

/// Exit status when the model or tool backend could not be reached.
const EXIT_UNAVAILABLE: u8 = 2;

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(output) => {
            print!("{output}");
            std::process::ExitCode::SUCCESS
        }
        Err(Error::Agent(e)) if e.is_unavailable() => {
            eprintln!("Error: {e}");
            std::process::ExitCode::from(EXIT_UNAVAILABLE)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
