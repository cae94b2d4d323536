//! snipvault - Code Snippet Manager
//!
//! Command-line front end for a personal snippet collection stored locally
//! as a single JSON document. Snippets can be listed, searched by text and
//! language, added, edited, deleted, copied to the clipboard, and exported
//! or imported.

use color_eyre::Result;
use snipvault::{Config, logging};

mod cli;

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load()?;
    logging::init(&config.log_filter);

    let args: Vec<String> = std::env::args().skip(1).collect();
    cli::execute_cli(&args, config)
}
