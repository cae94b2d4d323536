//! CLI Module for snipvault
//! Thin presentation layer over the snippet repository: parses arguments,
//! drives the repository and edit session, and prints coloured output.

pub mod commands;

use color_eyre::Result;
use colored::{ColoredString, Colorize};
use snipvault::{Config, SnippetRepository, StorageManager};
use std::collections::{HashMap, HashSet};

/// Options that take no value
const SWITCHES: &[&str] = &["overwrite"];

pub fn bar() -> ColoredString {
    "┃".bright_magenta()
}

/// The opened snippet store plus the settings it was opened with
pub struct Vault {
    pub config: Config,
    pub repo: SnippetRepository<StorageManager>,
}

impl Vault {
    pub fn open(config: Config) -> Result<Self> {
        let storage = StorageManager::new(config.resolved_data_dir()?, &config.storage_key)?;
        let repo = SnippetRepository::load(storage);
        Ok(Self { config, repo })
    }
}

/// `--name value` options, bare switches and positional arguments
#[derive(Debug, Default)]
pub struct ParsedArgs {
    positional: Vec<String>,
    options: HashMap<String, String>,
    switches: HashSet<String>,
}

impl ParsedArgs {
    pub fn parse(args: &[String]) -> Self {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.strip_prefix("--") {
                Some(name) if SWITCHES.contains(&name) => {
                    parsed.switches.insert(name.to_string());
                }
                Some(name) => match name.split_once('=') {
                    Some((key, value)) => {
                        parsed.options.insert(key.to_string(), value.to_string());
                    }
                    None => {
                        let value = iter.next().cloned().unwrap_or_default();
                        parsed.options.insert(name.to_string(), value);
                    }
                },
                None => parsed.positional.push(arg.clone()),
            }
        }

        parsed
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub fn switch(&self, name: &str) -> bool {
        self.switches.contains(name)
    }
}

/// Executes CLI commands based on the provided arguments
pub fn execute_cli(args: &[String], config: Config) -> Result<()> {
    let Some(command) = args.first() else {
        print_help();
        return Ok(());
    };
    let rest = ParsedArgs::parse(&args[1..]);

    match command.as_str() {
        "list" | "ls" => commands::list_snippets(&Vault::open(config)?, &rest)?,
        "search" | "find" => commands::search_snippets(&Vault::open(config)?, &rest)?,
        "show" | "view" | "cat" => commands::show_snippet(&Vault::open(config)?, &rest)?,
        "add" | "new" => commands::add_snippet(&mut Vault::open(config)?, &rest)?,
        "edit" => commands::edit_snippet(&mut Vault::open(config)?, &rest)?,
        "delete" | "rm" => commands::delete_snippet(&mut Vault::open(config)?, &rest)?,
        "copy" | "cp" => commands::copy_to_clipboard(&Vault::open(config)?, &rest)?,
        "export" => commands::export_to_file(&Vault::open(config)?, &rest)?,
        "import" => commands::import_from_file(&mut Vault::open(config)?, &rest)?,
        "languages" | "langs" => commands::list_languages(),
        "help" | "--help" | "-h" => print_help(),
        other => {
            println!("{}  Unknown command: {}", bar(), other);
            print_help();
        }
    }

    Ok(())
}

/// Prints the help message with available commands
fn print_help() {
    println!("{}  {}", bar(), "SNIPVAULT - CODE SNIPPET MANAGER".bold());
    println!("{}  {}", bar(), "USAGE:".bright_yellow());
    println!("{}  snipvault [COMMAND] [ARGS]", bar());
    println!("{}  {}", bar(), "COMMANDS:".bright_yellow());

    let commands = [
        ("list, ls [--lang L]", "List snippets, newest first"),
        ("search <QUERY> [--lang L]", "Search title, tags, code and description"),
        ("show <ID>", "Display a snippet (unique ID prefix works)"),
        ("add --title T", "Add a snippet; code from --file or stdin"),
        ("edit <ID> [FIELDS]", "Change --title, --lang, --tags, --desc, --file"),
        ("delete, rm <ID>", "Delete a snippet"),
        ("copy, cp <ID>", "Copy a snippet's code to the clipboard"),
        ("export <PATH>", "Export all snippets (.json or .yaml)"),
        ("import <PATH> [--overwrite]", "Merge snippets from an export"),
        ("languages", "List supported languages"),
        ("help", "Display this help message"),
    ];
    for (usage, description) in commands {
        println!("{}  {:<30} {}", bar(), usage.bright_white(), description);
    }

    println!("{}  {}", bar(), "TIP:".bright_green());
    println!(
        "{}  Set SNIPVAULT_DATA_DIR or data_dir in config.toml to use another store",
        bar()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_mixed_arguments() {
        let parsed = ParsedArgs::parse(&args(&[
            "abc", "--lang", "python", "--tags=a,b", "--overwrite", "extra",
        ]));

        assert_eq!(parsed.positional(0), Some("abc"));
        assert_eq!(parsed.positional(1), Some("extra"));
        assert_eq!(parsed.option("lang"), Some("python"));
        assert_eq!(parsed.option("tags"), Some("a,b"));
        assert!(parsed.switch("overwrite"));
        assert!(!parsed.switch("lang"));
    }

    #[test]
    fn test_trailing_option_without_value() {
        let parsed = ParsedArgs::parse(&args(&["--title"]));
        assert_eq!(parsed.option("title"), Some(""));
    }
}
