use crate::cli::{ParsedArgs, Vault, bar};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use colored::Colorize;
use snipvault::models::{export_snippets, import_snippets};
use snipvault::{
    BlockReason, CopyIndicator, EditSession, LanguageFilter, MatchField, Snippet, SnippetError,
    SnippetId, SnippetLanguage, SnippetQuery, SubmitOutcome, SystemClipboard, copy_snippet,
    filter_snippets,
};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

/// Snippets whose id is `needle`, or else starts with it. Empty for a blank needle.
fn id_candidates<'a>(snippets: &'a [Snippet], needle: &str) -> Vec<&'a Snippet> {
    if needle.is_empty() {
        return Vec::new();
    }
    if let Some(exact) = snippets.iter().find(|s| s.id.as_str() == needle) {
        return vec![exact];
    }
    snippets
        .iter()
        .filter(|s| s.id.as_str().starts_with(needle))
        .collect()
}

/// Resolves an exact id or a unique id prefix
fn resolve_snippet<'a>(vault: &'a Vault, needle: &str) -> Option<&'a Snippet> {
    let needle = needle.trim();
    if needle.is_empty() {
        println!("{}  Error: Missing snippet ID", bar());
        return None;
    }

    match id_candidates(vault.repo.list(), needle).as_slice() {
        [only] => Some(*only),
        [] => {
            println!("{}  No snippet found with ID: {}", bar(), needle);
            None
        }
        many => {
            println!(
                "{}  ID prefix '{}' matches {} snippets:",
                bar(),
                needle,
                many.len()
            );
            for snippet in many {
                println!("{}     {} {}", bar(), short_id(&snippet.id).bright_black(), snippet.title);
            }
            None
        }
    }
}

fn short_id(id: &SnippetId) -> String {
    id.as_str().chars().take(8).collect()
}

fn language_filter(args: &ParsedArgs) -> Result<LanguageFilter> {
    match args.option("lang") {
        Some(value) => Ok(value.parse()?),
        None => Ok(LanguageFilter::All),
    }
}

fn report_write_failure(vault: &Vault) {
    if let Some(error) = vault.repo.last_write_error() {
        println!(
            "{}  {} changes are kept in memory only: {}",
            bar(),
            "WARNING".bright_red().bold(),
            error
        );
    }
}

fn print_summary_line(idx: usize, snippet: &Snippet) {
    println!(
        "{}  {}. {} {} {}",
        bar(),
        (idx + 1).to_string().bright_yellow(),
        snippet.title.bright_white().bold(),
        format!("[{}]", snippet.language.display_name()).bright_green(),
        short_id(&snippet.id).bright_black()
    );

    let tags = snippet.tag_list();
    if !tags.is_empty() {
        let rendered: Vec<String> = tags.iter().map(|t| format!("#{t}")).collect();
        println!("{}     {}", bar(), rendered.join(" ").cyan());
    }
}

/// Lists snippets, newest first
pub fn list_snippets(vault: &Vault, args: &ParsedArgs) -> Result<()> {
    let query = SnippetQuery::new("", language_filter(args)?);
    let visible = filter_snippets(vault.repo.list(), &query);

    if visible.is_empty() {
        println!("{}  No snippets found.", bar());
        return Ok(());
    }

    println!("{}  {} snippets:", bar(), visible.len());
    println!("{}", "─".repeat(60).bright_magenta());
    for (idx, snippet) in visible.iter().enumerate() {
        print_summary_line(idx, snippet);
    }
    Ok(())
}

/// Searches for snippets matching a query string
pub fn search_snippets(vault: &Vault, args: &ParsedArgs) -> Result<()> {
    let Some(text) = args.positional(0) else {
        println!("{}  Error: Missing search query", bar());
        println!("{}  Usage: snipvault search <QUERY> [--lang LANG]", bar());
        return Ok(());
    };

    let query = SnippetQuery::new(text, language_filter(args)?);
    let results = filter_snippets(vault.repo.list(), &query);

    println!(
        "{}  {} '{}'",
        bar(),
        "SEARCH RESULTS FOR".bold(),
        text.bright_white()
    );

    if results.is_empty() {
        println!("{}  No snippets found matching query: {}", bar(), text);
        return Ok(());
    }

    println!("{}", "─".repeat(60).bright_magenta());
    for (idx, snippet) in results.iter().enumerate() {
        print_summary_line(idx, snippet);

        let context = match query.locate(snippet) {
            Some(MatchField::Title) => "title".to_string(),
            Some(MatchField::Tags) => "tags".to_string(),
            Some(MatchField::Description) => "description".to_string(),
            Some(MatchField::Code { line, text }) => format!("line {line}: {text}"),
            None => continue,
        };
        println!("{}     {}: {}", bar(), "Match".bright_blue(), context);
    }

    Ok(())
}

/// Shows the content of a specific snippet by ID
pub fn show_snippet(vault: &Vault, args: &ParsedArgs) -> Result<()> {
    let Some(needle) = args.positional(0) else {
        println!("{}  Error: Missing snippet ID", bar());
        println!("{}  Usage: snipvault show <ID>", bar());
        return Ok(());
    };

    if let Some(snippet) = resolve_snippet(vault, needle) {
        display_snippet_content(snippet);
    }
    Ok(())
}

fn display_snippet_content(snippet: &Snippet) {
    println!(
        "{}  {} {}",
        bar(),
        "SNIPPET".bright_green().bold(),
        snippet.title.bold()
    );
    println!("{}", "─".repeat(60).bright_magenta());

    println!(
        "{}  {}: {}",
        bar(),
        "Language".bright_yellow(),
        snippet.language.display_name()
    );
    if !snippet.tags.trim().is_empty() {
        println!("{}  {}: {}", bar(), "Tags".bright_blue(), snippet.tag_list().join(", "));
    }
    if let Some(desc) = snippet.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{}  {}: {}", bar(), "Description".bright_cyan(), desc);
    }
    println!("{}  {}: {}", bar(), "Lines".bright_black(), snippet.line_count());
    println!(
        "{}  {}: {}",
        bar(),
        "Updated".bright_black(),
        snippet.updated_at.format("%Y-%m-%d %H:%M")
    );
    println!("{}  {}: {}", bar(), "ID".bright_black(), snippet.id);
    println!("{}", "─".repeat(60).bright_magenta());

    for line in snippet.code.lines() {
        println!("{}  {}", bar(), line);
    }
}

/// Copies flag values onto the session draft
fn apply_fields(session: &mut EditSession, args: &ParsedArgs, code: Option<String>) -> Result<()> {
    let language = args
        .option("lang")
        .map(|value| value.parse::<SnippetLanguage>())
        .transpose()?;

    let draft = session.draft_mut();
    if let Some(title) = args.option("title") {
        draft.title = title.to_string();
    }
    if let Some(language) = language {
        draft.language = language;
    }
    if let Some(tags) = args.option("tags") {
        draft.tags = tags.to_string();
    }
    if let Some(desc) = args.option("desc") {
        draft.description = Some(desc.to_string());
    }
    if let Some(code) = code {
        draft.code = code;
    }
    Ok(())
}

fn read_code(args: &ParsedArgs, allow_stdin: bool) -> Result<Option<String>> {
    if let Some(path) = args.option("file") {
        return Ok(Some(fs::read_to_string(path)?));
    }
    if !allow_stdin {
        return Ok(None);
    }

    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        println!("{}  Enter code, finish with Ctrl-D:", bar());
    }
    let mut code = String::new();
    stdin.read_to_string(&mut code)?;
    Ok(Some(code))
}

fn finish_submit(vault: &mut Vault, session: &mut EditSession) -> Result<()> {
    match session.submit(&mut vault.repo)? {
        SubmitOutcome::Created(snippet) => {
            println!(
                "{}  {} {} ({})",
                bar(),
                "Created".bright_green().bold(),
                snippet.title.bold(),
                snippet.id
            );
        }
        SubmitOutcome::Updated(snippet) => {
            println!(
                "{}  {} {} ({})",
                bar(),
                "Updated".bright_green().bold(),
                snippet.title.bold(),
                snippet.id
            );
        }
        SubmitOutcome::Blocked(BlockReason::MissingField(field)) => {
            println!(
                "{}  Please fill in title and code fields ({} is empty)",
                bar(),
                field
            );
            return Ok(());
        }
        SubmitOutcome::Blocked(BlockReason::NotComposing) => {
            return Err(eyre!("no snippet form is open"));
        }
    }

    report_write_failure(vault);
    Ok(())
}

pub fn add_snippet(vault: &mut Vault, args: &ParsedArgs) -> Result<()> {
    let mut session = EditSession::new();
    session.start_new();

    let code = read_code(args, true)?;
    apply_fields(&mut session, args, code)?;
    finish_submit(vault, &mut session)
}

pub fn edit_snippet(vault: &mut Vault, args: &ParsedArgs) -> Result<()> {
    let Some(needle) = args.positional(0) else {
        println!(
            "{}  Usage: snipvault edit <ID> [--title T] [--lang L] [--tags T] [--desc D] [--file PATH]",
            bar()
        );
        return Ok(());
    };
    let Some(snippet) = resolve_snippet(vault, needle).cloned() else {
        return Ok(());
    };

    let mut session = EditSession::new();
    session.start_edit(&snippet);

    let code = read_code(args, false)?;
    apply_fields(&mut session, args, code)?;
    finish_submit(vault, &mut session)
}

pub fn delete_snippet(vault: &mut Vault, args: &ParsedArgs) -> Result<()> {
    let Some(needle) = args.positional(0) else {
        println!("{}  Usage: snipvault delete <ID>", bar());
        return Ok(());
    };
    let Some(snippet) = resolve_snippet(vault, needle).cloned() else {
        return Ok(());
    };

    vault.repo.delete(&snippet.id)?;
    println!("{}  {} {}", bar(), "Deleted".bright_red().bold(), snippet.title);
    report_write_failure(vault);
    Ok(())
}

pub fn copy_to_clipboard(vault: &Vault, args: &ParsedArgs) -> Result<()> {
    let Some(needle) = args.positional(0) else {
        println!("{}  Usage: snipvault copy <ID>", bar());
        return Ok(());
    };
    let Some(snippet) = resolve_snippet(vault, needle) else {
        return Ok(());
    };

    let indicator = CopyIndicator::new(vault.config.copy_feedback());
    let runtime = tokio::runtime::Runtime::new()?;
    let copied = runtime.block_on(async {
        // Failures are logged by copy_snippet; only success is shown
        copy_snippet(&SystemClipboard, &indicator, snippet).await.is_ok()
    });

    if copied && indicator.is_active(&snippet.id) {
        println!("{}  {} {}", bar(), "Copied!".bright_green().bold(), snippet.title);
    }
    Ok(())
}

pub fn export_to_file(vault: &Vault, args: &ParsedArgs) -> Result<()> {
    let Some(path) = args.positional(0) else {
        println!("{}  Usage: snipvault export <PATH.json|PATH.yaml>", bar());
        return Ok(());
    };

    export_snippets(vault.repo.list(), Path::new(path)).map_err(SnippetError::from)?;
    println!(
        "{}  Exported {} snippets to {}",
        bar(),
        vault.repo.len(),
        path.bright_white()
    );
    Ok(())
}

pub fn import_from_file(vault: &mut Vault, args: &ParsedArgs) -> Result<()> {
    let Some(path) = args.positional(0) else {
        println!("{}  Usage: snipvault import <PATH> [--overwrite]", bar());
        return Ok(());
    };

    let incoming = import_snippets(Path::new(path)).map_err(SnippetError::from)?;
    let summary = vault.repo.merge(incoming, args.switch("overwrite"));

    println!(
        "{}  Imported {} new, replaced {}, skipped {}",
        bar(),
        summary.added.to_string().bright_green(),
        summary.replaced.to_string().bright_yellow(),
        summary.skipped.to_string().bright_black()
    );
    report_write_failure(vault);
    Ok(())
}

pub fn list_languages() {
    println!("{}  {}", bar(), "LANGUAGES".bold());
    for language in SnippetLanguage::ALL {
        println!(
            "{}  {:<12} {}",
            bar(),
            language.as_str().bright_white(),
            language.display_name()
        );
    }
}
