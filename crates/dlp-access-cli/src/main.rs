//! DLP Access CLI — entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use dlp_access::listing::DEFAULT_PAGE_SIZE;
use dlp_access::{ContentSlot, SortDirection, SortField, SortOption};
use dlp_access_cli::commands::{self, PageTarget};
use dlp_access_cli::{load_config, repl, resolve_config_path, Portal};

#[derive(Parser)]
#[command(
    name = "dlp-access",
    about = "Browse digital-library collections, items and site pages",
    version
)]
struct Cli {
    /// Path to a TOML config file.
    /// Also reads DLP_ACCESS_CONFIG, ./dlp-access.toml and ~/.config/dlp-access/config.toml.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct PageArgs {
    /// Sort field (title, start_date, identifier, createdAt).
    /// Collections cannot be sorted by start_date.
    #[arg(long, default_value = "title")]
    sort: SortField,

    /// Sort direction (asc, desc).
    #[arg(long, default_value = "asc")]
    direction: SortDirection,

    /// Items per page (10, 20, 50).
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    limit: u32,

    /// Page number, starting at 1.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

impl PageArgs {
    fn sort(&self) -> SortOption {
        SortOption::new(self.sort, self.direction)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show site settings.
    Site,

    /// List top-level collections.
    Browse {
        #[command(flatten)]
        paging: PageArgs,
    },

    /// Show a collection and a page of its items.
    Collection {
        /// Collection custom key, e.g. ark:/53696/xyz.
        key: String,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Show an archive item. The ARK prefix is added when missing.
    Archive {
        /// Item custom key.
        key: String,
    },

    /// Print the sanitized HTML of a site section.
    Page {
        /// Section name (about, team, organizations, maps, formats,
        /// harmful-content-statement, digital-collection-strategy).
        #[arg(required_unless_present = "id")]
        section: Option<ContentSlot>,

        /// Raw content id instead of a section.
        #[arg(long, conflicts_with = "section")]
        id: Option<String>,
    },

    /// List site sections with their content ids and routes.
    Sections,

    /// Build facet search links from an HTML list.
    Facets {
        /// Facet name, e.g. format.
        facet: String,

        /// HTML file to read (stdin when omitted).
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the rewritten HTML instead of the links.
        #[arg(long)]
        rewrite: bool,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   dlp-access completions bash > ~/.local/share/bash-completion/completions/dlp-access
    ///   dlp-access completions zsh > ~/.zfunc/_dlp-access
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch the interactive pager.
    Repl {
        /// Collection key to open on start.
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "dlp-access", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(config_path.as_deref()).context("Cannot load configuration")?;

    match cli.command {
        Commands::Sections => commands::sections(&config.content_registry()?),

        Commands::Facets {
            facet,
            file,
            rewrite,
        } => {
            let html = commands::read_html(file.as_deref())?;
            commands::facets(&config.rewriter()?, &html, &facet, rewrite, cli.json)?;
        }

        Commands::Completions { .. } => {}

        command => {
            let portal = Portal::connect(&config)?;
            match command {
                Commands::Site => commands::site(&portal, cli.json).await?,
                Commands::Browse { paging } => {
                    commands::browse(&portal, paging.sort(), paging.limit, paging.page, cli.json)
                        .await?
                }
                Commands::Collection { key, paging } => {
                    commands::collection(
                        &portal,
                        &key,
                        paging.sort(),
                        paging.limit,
                        paging.page,
                        cli.json,
                    )
                    .await?
                }
                Commands::Archive { key } => commands::archive(&portal, &key, cli.json).await?,
                Commands::Page { section, id } => {
                    let target = match (section, id) {
                        (_, Some(id)) => PageTarget::Id(id),
                        (Some(slot), None) => PageTarget::Section(slot),
                        (None, None) => anyhow::bail!("Give a section name or --id"),
                    };
                    commands::page(&portal, target).await?
                }
                Commands::Repl { key } => {
                    let handle = tokio::runtime::Handle::current();
                    tokio::task::spawn_blocking(move || repl::run(portal, handle, key)).await??
                }
                Commands::Sections | Commands::Facets { .. } | Commands::Completions { .. } => {}
            }
        }
    }

    Ok(())
}
