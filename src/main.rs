mod config;
mod export;
mod finance;
mod models;
mod run;
mod store;
mod ui;
mod workbook;

use anyhow::Result;

use crate::config::{AppConfig, Overrides, Paths};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (overrides, rest) = Overrides::extract(&args)?;
    if run::as_builtin(&rest) {
        return Ok(());
    }

    let paths = Paths::discover()?;
    run::init_logging(&paths)?;
    let config = AppConfig::load(&paths, &overrides)?;

    match rest.len() {
        0 => run::as_tui(config),
        _ => run::as_cli(&rest, &config),
    }
}
