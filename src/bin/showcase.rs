//! Desktop showcase for the hero scene.
//!
//! ```text
//! folio-showcase [config.json]
//! ```
//!
//! Without a config file the standard page layout is used. Set `RUST_LOG`
//! to change log verbosity (default `info`).

use std::process::ExitCode;

use folio_fx::config::ShowcaseConfig;
use folio_fx::error::ShowcaseError;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ShowcaseError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading config from {}", path);
            ShowcaseConfig::load(&path)?
        }
        None => ShowcaseConfig::default(),
    };
    folio_fx::window::run(config)
}
