use crate::client::{
    extension_from_url, force_download, synthesize_filename, DownloadButton, DownloadOutcome,
    FileStore, HistorySearch, HistoryStore, ProxyClient, SubmitForm,
};
use crate::config::Config;
use crate::resolver::DownrUpstream;
use crate::server::{self, AppState};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the resolver proxy HTTP server
    Serve {
        /// Address to listen on, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
        /// Front-end directory to serve next to the API
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Resolve a post URL through the proxy and list its media.
    /// Reads the URL from stdin when omitted.
    Resolve {
        url: Option<String>,
        /// Reuse the most recent history URL containing this text
        #[arg(long, conflicts_with = "url")]
        recent: Option<String>,
        /// Save every returned media item
        #[arg(short, long)]
        download: bool,
        /// Directory for downloaded files
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Browse or edit the history of submitted URLs
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Save a single media URL to disk
    Download {
        url: String,
        #[arg(short, long)]
        filename: Option<String>,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// Show recent URLs, optionally filtered by a case-insensitive substring
    List { query: Option<String> },
    /// Forget a URL
    Remove { url: String },
}

pub async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Serve { bind, static_dir } => {
            let mut server_config = config.server.clone();
            if let Some(bind) = bind {
                server_config.bind = bind;
            }
            if static_dir.is_some() {
                server_config.static_dir = static_dir;
            }

            let upstream = DownrUpstream::new(config.upstream.clone())
                .context("Failed to initialize upstream resolver")?;
            server::serve(AppState::new(Arc::new(upstream)), &server_config).await
        }
        Command::Resolve {
            url,
            recent,
            download,
            dir,
        } => {
            let input = match (url, recent) {
                (Some(url), _) => url,
                (None, Some(query)) => recent_url(&config, &query)?,
                (None, None) => read_stdin_line()?,
            };
            let dir = dir.unwrap_or_else(|| config.client.download_dir());
            resolve(&config, &input, download.then_some(dir.as_path())).await
        }
        Command::History { action } => {
            let mut history = open_history(&config)?;
            let mut search = HistorySearch::new();
            match action {
                HistoryAction::List { query } => {
                    match query {
                        Some(query) => search.set_query(&query),
                        None => search.open(),
                    }
                    print!("{}", search.view(&history));
                }
                HistoryAction::Remove { url } => {
                    let view = search.remove(&mut history, &url)?;
                    println!("Removed {}", url);
                    print!("{}", view);
                }
            }
            Ok(())
        }
        Command::Download { url, filename, dir } => {
            let filename = filename.unwrap_or_else(|| {
                synthesize_filename(
                    &config.client.filename_prefix,
                    crate::utils::now_millis(),
                    0,
                    extension_from_url(&url).as_deref(),
                )
            });
            let dir = dir.unwrap_or_else(|| config.client.download_dir());
            let api = ProxyClient::new(config.client.endpoint.clone());
            download_one(&api, &url, &filename, &dir).await;
            Ok(())
        }
    }
}

fn open_history(config: &Config) -> Result<HistoryStore<FileStore>> {
    let store = FileStore::new(config.client.storage_path()?);
    info!("Using history storage at {}", store.path().display());
    Ok(HistoryStore::new(store))
}

/// Picks the most recent history URL matching `query`, as selecting it from
/// the search dropdown would.
fn recent_url(config: &Config, query: &str) -> Result<String> {
    let history = open_history(config)?;
    let mut search = HistorySearch::new();
    search.set_query(query);

    let view = search.view(&history);
    match view.rows.first() {
        Some(row) => Ok(search.select(&row.url)),
        None => anyhow::bail!("No history entry matches {:?}", query),
    }
}

fn read_stdin_line() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read URL from stdin")?;
    Ok(line)
}

async fn resolve(config: &Config, input: &str, download_dir: Option<&Path>) -> Result<()> {
    let api = ProxyClient::new(config.client.endpoint.clone());
    let mut history = open_history(config)?;
    let mut form = SubmitForm::new(config.client.filename_prefix.clone());

    let submitted = form.submit(&api, &mut history, input).await.map(|_| ());
    if let Err(e) = submitted {
        match form.error() {
            Some(message) => anyhow::bail!("{}", message),
            None => anyhow::bail!("{}", e),
        }
    }

    for card in form.results() {
        println!("{}", card);
    }

    if let Some(dir) = download_dir {
        for card in form.results() {
            download_one(&api, &card.url, &card.filename, dir).await;
        }
    }

    Ok(())
}

async fn download_one(api: &ProxyClient, url: &str, filename: &str, dir: &Path) {
    let mut button = DownloadButton::default();
    if !button.begin(Instant::now()) {
        warn!("Download of {} is already in progress", filename);
        return;
    }
    println!("{} {}", button.label(Instant::now()), filename);

    let outcome = force_download(api.http(), url, filename, dir).await;
    button.finish(&outcome, Instant::now());

    match outcome {
        DownloadOutcome::Saved { path, bytes } => {
            println!(
                "{} {} ({} bytes)",
                button.label(Instant::now()),
                path.display(),
                bytes
            );
        }
        DownloadOutcome::Fallback { url } => {
            println!("Could not save {}. Open it directly: {}", filename, url);
        }
    }
}
