//! Interactive pager over collections and their items.
//!
//! Launch with `dlp-access repl [collection-key]`.
//! Type `/help` for available commands, Tab for completion.

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};
use tokio::runtime::Handle;

use dlp_access::{
    Collection, CollectionItems, ListingController, ListingSource, RouteParam, SortDirection,
    SortField, SortOption, TopLevelCollections, PAGE_SIZE_OPTIONS,
};

use crate::portal::Portal;
use crate::render;

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/open", "Open a collection by key"),
    ("/browse", "List top-level collections"),
    ("/next", "Next page"),
    ("/prev", "Previous page"),
    ("/limit", "Set page size (10, 20, 50)"),
    ("/sort", "Sort by field [asc|desc]"),
    ("/show", "Show the current page again"),
    ("/info", "Show collection metadata"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// REPL helper for tab completion.
struct PagerHelper {
    /// Sort fields of the listing on screen.
    sort_fields: &'static [SortField],
}

impl Completer for PagerHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let candidates: Vec<String> = match cmd {
            "/sort" if !args.contains(' ') => self
                .sort_fields
                .iter()
                .map(|f| f.as_str().to_string())
                .collect(),
            "/sort" => ["asc", "desc"].iter().map(|d| d.to_string()).collect(),
            "/limit" => PAGE_SIZE_OPTIONS.iter().map(|n| n.to_string()).collect(),
            _ => return Ok((pos, Vec::new())),
        };

        let word = args.rsplit(' ').next().unwrap_or("");
        let start = pos - word.len();
        let matches = candidates
            .into_iter()
            .filter(|c| c.starts_with(word))
            .map(|c| Pair {
                display: c.clone(),
                replacement: format!("{c} "),
            })
            .collect();
        Ok((start, matches))
    }
}

impl Hinter for PagerHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for PagerHelper {}
impl Validator for PagerHelper {}
impl Helper for PagerHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// What the pager is showing.
enum View {
    Empty,
    Browse(ListingController<TopLevelCollections>),
    Collection(Box<Collection>, ListingController<CollectionItems>),
}

/// A state change requested by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Prev,
    Limit(u32),
    Sort(SortOption),
}

/// Parse `/sort` arguments: a field and an optional direction.
pub fn parse_sort(args: &str) -> anyhow::Result<SortOption> {
    let mut words = args.split_whitespace();
    let Some(field) = words.next() else {
        anyhow::bail!("Usage: /sort <field> [asc|desc]");
    };
    let field: SortField = field.parse()?;
    let direction: SortDirection = match words.next() {
        Some(direction) => direction.parse()?,
        None => SortDirection::Asc,
    };
    Ok(SortOption::new(field, direction))
}

/// Apply a step and load the resulting page. `Ok(false)` when the step
/// did not move (first or last page).
pub fn navigate<S: ListingSource>(
    handle: &Handle,
    pager: &mut ListingController<S>,
    step: Step,
) -> anyhow::Result<bool> {
    let ticket = match step {
        Step::Next => pager.next_page(),
        Step::Prev => pager.prev_page(),
        Step::Limit(limit) => Some(pager.set_page_size(limit)?),
        Step::Sort(sort) => Some(pager.set_sort(sort)?),
    };
    Ok(handle.block_on(pager.load_if(ticket)))
}

fn show<S, F>(pager: &ListingController<S>, line: F)
where
    S: ListingSource,
    F: Fn(&S::Item) -> String,
{
    eprintln!();
    match pager.items() {
        Some([]) | None => eprintln!("  \x1b[90m(no items)\x1b[0m"),
        Some(items) => {
            for item in items {
                eprintln!("    {}", line(item));
            }
        }
    }
    eprintln!();
    eprintln!("  \x1b[90m{}\x1b[0m", render::page_footer(pager.state()));
    eprintln!();
}

/// Session state.
struct ReplState {
    portal: Portal,
    handle: Handle,
    view: View,
}

impl ReplState {
    fn open(&mut self, key: &str) {
        if key.is_empty() {
            eprintln!("  Usage: /open <collection-key>");
            return;
        }
        let gateway = self.portal.gateway();
        let found = self
            .handle
            .block_on(gateway.get_collection_by_key(&RouteParam::from(key)));
        let Some(collection) = found else {
            eprintln!("  Collection '{key}' not found.");
            return;
        };

        let mut pager = self.portal.collection_items(&collection.id);
        self.handle.block_on(pager.refresh());
        eprintln!();
        eprintln!("  \x1b[1m{}\x1b[0m", collection.display_title());
        show(&pager, render::archive_line);
        self.view = View::Collection(Box::new(collection), pager);
    }

    fn browse(&mut self) {
        let mut pager = self.portal.top_level();
        self.handle.block_on(pager.refresh());
        show(&pager, render::collection_line);
        self.view = View::Browse(pager);
    }

    fn step(&mut self, step: Step) {
        let moved = match &mut self.view {
            View::Empty => {
                eprintln!("  Nothing open. Use /open <key> or /browse.");
                return;
            }
            View::Browse(pager) => navigate(&self.handle, pager, step),
            View::Collection(_, pager) => navigate(&self.handle, pager, step),
        };
        match moved {
            Ok(true) => self.show(),
            Ok(false) => eprintln!("  No more pages in that direction."),
            Err(e) => eprintln!("  {e}"),
        }
    }

    /// Sort fields offered for the current view.
    fn sort_fields(&self) -> &'static [SortField] {
        match &self.view {
            View::Empty => &SortField::ALL,
            View::Browse(_) => TopLevelCollections::SORT_FIELDS,
            View::Collection(..) => CollectionItems::SORT_FIELDS,
        }
    }

    fn show(&self) {
        match &self.view {
            View::Empty => eprintln!("  Nothing open. Use /open <key> or /browse."),
            View::Browse(pager) => show(pager, render::collection_line),
            View::Collection(_, pager) => show(pager, render::archive_line),
        }
    }

    fn info(&self) {
        let View::Collection(collection, _) = &self.view else {
            eprintln!("  No collection open.");
            return;
        };
        let top_level = self
            .handle
            .block_on(self.portal.gateway().get_top_level_ancestor((**collection).clone()));
        eprintln!();
        for line in render::collection_detail(collection, Some(&top_level)).lines() {
            eprintln!("  {line}");
        }
        eprintln!();
    }
}

/// Run the interactive REPL. Must be called off the async runtime's worker
/// threads (e.g. from `spawn_blocking`), since it blocks on `handle`.
pub fn run(portal: Portal, handle: Handle, initial_key: Option<String>) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mdlp-access v{}\x1b[0m \x1b[90m{}\x1b[0m",
        env!("CARGO_PKG_VERSION"),
        portal.site().name
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<PagerHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(PagerHelper {
        sort_fields: &SortField::ALL,
    }));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".dlp_access_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let mut state = ReplState {
        portal,
        handle,
        view: View::Empty,
    };
    if let Some(key) = initial_key {
        state.open(&key);
    }

    let prompt = " \x1b[36mdlp>\x1b[0m ";

    loop {
        if let Some(helper) = rl.helper_mut() {
            helper.sort_fields = state.sort_fields();
        }
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
                let args = args.trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "open" => state.open(args),
                    "browse" => state.browse(),
                    "next" | "n" => state.step(Step::Next),
                    "prev" | "p" => state.step(Step::Prev),
                    "limit" => match args.parse::<u32>() {
                        Ok(limit) => state.step(Step::Limit(limit)),
                        Err(_) => eprintln!("  Usage: /limit <10|20|50>"),
                    },
                    "sort" => match parse_sort(args) {
                        Ok(sort) => state.step(Step::Sort(sort)),
                        Err(e) => eprintln!("  {e}"),
                    },
                    "show" => state.show(),
                    "info" => state.info(),
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!(
        "  Sort fields: {}",
        SortField::ALL.map(SortField::as_str).join(", ")
    );
    eprintln!();
}
