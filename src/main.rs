mod config;
mod dump;
mod index;
mod output;
mod prefetch;
mod registry;
mod render;
#[cfg(test)]
mod testutil;
mod wiki;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use config::{DEFAULT_MAX_HITS, DEFAULT_PREFIX, DEFAULT_WINDOW, Settings};
use render::ContentFormat;
use wiki::Wiki;

#[derive(Parser)]
#[command(
    name = "offwiki",
    version,
    about = "Serve and search encyclopedia articles from local dumps"
)]
struct Cli {
    /// Dump file to register; repeat or comma-separate for several
    #[arg(long = "dump", env = "OFFWIKI_DUMPS", value_delimiter = ',', global = true)]
    dumps: Vec<PathBuf>,

    /// Directory whose matching files are registered as dumps
    #[arg(long, env = "OFFWIKI_DUMP_DIR", global = true)]
    dump_dir: Option<PathBuf>,

    /// File name glob used with --dump-dir
    #[arg(long, default_value = "*.owd", global = true)]
    dump_pattern: String,

    /// Article URL prefix served from the dumps
    #[arg(long, env = "OFFWIKI_PREFIX", default_value = DEFAULT_PREFIX, global = true)]
    prefix: String,

    /// Fuzzy title hits scanned for an exact match
    #[arg(long, env = "OFFWIKI_WINDOW", default_value_t = DEFAULT_WINDOW, global = true)]
    window: usize,

    /// Hits a search considers before pagination
    #[arg(long, env = "OFFWIKI_MAX_HITS", default_value_t = DEFAULT_MAX_HITS, global = true)]
    max_hits: usize,

    /// Output format for article content
    #[arg(long, value_enum, default_value_t = ContentFormat::Html, global = true)]
    format: ContentFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report whether a URL is worth looking up locally (exit status 1 if not)
    Check { url: String },

    /// Print an article, following one redirect
    Get {
        url: String,
        /// Print the redirect target instead of following it
        #[arg(long)]
        no_follow: bool,
    },

    /// Full-text search
    Search {
        text: String,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 10)]
        amount: usize,
        /// Print the result page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve many URLs concurrently and summarize (reads stdin when no URLs are given)
    Prefetch {
        urls: Vec<String>,
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("offwiki=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::new(&cli.prefix, cli.window, cli.max_hits, cli.format)?;

    let mut wiki = Wiki::new(settings);
    for dump in &cli.dumps {
        wiki.register(dump);
    }
    if let Some(dir) = &cli.dump_dir {
        let registered = wiki.register_dir(dir, &cli.dump_pattern);
        info!(dir = %dir.display(), registered, "dump directory registered");
    }
    if wiki.has_any() {
        info!(dumps = wiki.dump_count(), prefix = %wiki.settings().prefix, "wiki ready");
    } else {
        warn!("no dumps registered; every lookup will miss");
    }
    // Registration is over; from here on the wiki is shared read-only.
    let wiki = Arc::new(wiki);

    match cli.command {
        Command::Check { url } => {
            if wiki.may_be_cached(&url) {
                println!("cached");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("not cached");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Get { url, no_follow } => match get(&wiki, &url, no_follow) {
            Ok(content) => {
                print!("{content}");
                Ok(ExitCode::SUCCESS)
            }
            Err(reason) => {
                eprintln!("{reason}");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Search {
            text,
            offset,
            amount,
            json,
        } => {
            let page = wiki.query(&text, offset, amount);
            info!(
                total = page.total_hits,
                shown = page.entries.len(),
                "search complete"
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print!("{}", output::format_results(&page, &text, offset));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Prefetch {
            urls,
            concurrency,
            timeout_secs,
        } => {
            let urls = if urls.is_empty() {
                read_urls_from_stdin().await?
            } else {
                urls
            };
            info!(urls = urls.len(), concurrency, "prefetch starting");
            let report = prefetch::prefetch(
                Arc::clone(&wiki),
                urls,
                concurrency,
                Duration::from_secs(timeout_secs),
            )
            .await;
            print!("{}", output::format_prefetch(&report));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Resolves `url` as a proxy would: a redirect is re-issued once, never more.
/// `Ok` carries what to print, `Err` why nothing can be shown.
fn get(wiki: &Wiki, url: &str, no_follow: bool) -> Result<String, String> {
    match wiki.resolve(url) {
        (Some(content), _) => Ok(content),
        (None, Some(target)) if no_follow => Ok(format!("redirect: {target}\n")),
        (None, Some(target)) => {
            info!(%url, %target, "following redirect");
            match wiki.resolve(&target) {
                (Some(content), _) => Ok(content),
                (None, Some(next)) => Err(format!(
                    "{target} redirects again to {next}; not following"
                )),
                (None, None) => Err(format!("redirect target not found: {target}")),
            }
        }
        (None, None) => Err(format!("not found: {url}")),
    }
}

async fn read_urls_from_stdin() -> std::io::Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut urls = Vec::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            urls.push(line.to_string());
        }
    }
    Ok(urls)
}
