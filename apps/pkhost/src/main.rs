//! pkhost - command line host for pluggable package backends
//!
//! Loads the built-in test backend, dispatches one transaction, renders the
//! live event stream and keeps the offline package cache up to date.

mod cli;
mod display;
mod error;
mod events;

use crate::cli::{CacheCommands, Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use pk_backend::backends::test_thread;
use pk_backend::{BackendHost, PackageCache, TransactionCollector, TransactionOutcome};
use pk_config::Config;
use pk_errors::BackendError;
use pk_events::EventReceiver;
use pk_types::{ExitStatus, OutputFormat};
use std::future;
use std::process;
use std::time::Duration;
use tokio::select;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting pkhost v{}", env!("CARGO_PKG_VERSION"));

    // File (or defaults), then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    if cli.global.json {
        config.general.default_output = OutputFormat::Json;
    }

    let json_output = config.general.default_output == OutputFormat::Json;
    let renderer = OutputRenderer::new(json_output);

    match cli.command {
        Commands::Roles => {
            renderer.render_roles(&test_thread::capabilities())?;
        }
        Commands::SearchName {
            term,
            filter,
            cancel_after,
        } => {
            let (host, receiver) = load_backend(&config)?;
            host.search_name(filter, term)?;
            let mut handler = EventHandler::new(json_output, cli.global.debug);
            let cancel_after = cancel_after.map(Duration::from_millis);
            let outcome = drive_transaction(&host, receiver, cancel_after, &mut handler).await?;
            finish_search(&config, &renderer, &outcome).await?;
        }
        Commands::SearchGroup { group, filter } => {
            let (host, receiver) = load_backend(&config)?;
            host.search_group(filter, group)?;
            let mut handler = EventHandler::new(json_output, cli.global.debug);
            let outcome = drive_transaction(&host, receiver, None, &mut handler).await?;
            finish_search(&config, &renderer, &outcome).await?;
        }
        Commands::Cache(CacheCommands::Show) => {
            let cache = PackageCache::from_config(&config)?;
            let packages = cache.load().await?;
            renderer.render_cache(cache.path(), &packages)?;
        }
        Commands::Cache(CacheCommands::Clear) => {
            let cache = PackageCache::from_config(&config)?;
            cache.clear().await?;
            renderer.render_success_message(&format!(
                "Cleared package cache at {}",
                cache.path().display()
            ))?;
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Load and initialize the built-in backend with a fresh event channel
fn load_backend(config: &Config) -> Result<(BackendHost, EventReceiver), CliError> {
    let (sender, receiver) = pk_events::channel();
    let host = BackendHost::new(test_thread::capabilities(), &config.worker, Some(sender));
    host.initialize()?;
    Ok((host, receiver))
}

/// Render events until the transaction finishes, cancelling it once
/// `cancel_after` elapses
async fn drive_transaction(
    host: &BackendHost,
    mut receiver: EventReceiver,
    cancel_after: Option<Duration>,
    handler: &mut EventHandler,
) -> Result<TransactionOutcome, CliError> {
    let mut collector = TransactionCollector::new();
    let cancel_timer = async {
        match cancel_after {
            Some(delay) => tokio::time::sleep(delay).await,
            None => future::pending().await,
        }
    };
    tokio::pin!(cancel_timer);
    let mut cancel_sent = false;

    loop {
        select! {
            () = &mut cancel_timer, if !cancel_sent => {
                cancel_sent = true;
                if host.cancel()? {
                    info!("Cancellation requested");
                }
            }

            message = receiver.recv() => {
                let Some(message) = message else {
                    return Err(BackendError::failed(
                        "event channel closed before the transaction finished",
                    )
                    .into());
                };
                handler.handle_event(&message);
                if collector.observe(&message) {
                    return Ok(collector.into_outcome());
                }
            }
        }
    }
}

/// Render search results and merge them into the offline cache
async fn finish_search(
    config: &Config,
    renderer: &OutputRenderer,
    outcome: &TransactionOutcome,
) -> Result<(), CliError> {
    renderer.render_outcome(outcome)?;

    if outcome.exit == Some(ExitStatus::Failed) {
        let err = outcome
            .error()
            .unwrap_or_else(|| BackendError::failed("transaction failed"));
        return Err(err.into());
    }

    if config.cache.enabled && !outcome.packages.is_empty() {
        let cache = PackageCache::from_config(config)?;
        match cache.update(&outcome.packages).await {
            Ok(merged) => info!(
                path = %cache.path().display(),
                total = merged.len(),
                "package cache updated"
            ),
            Err(e) => warn!(error = %e, "failed to update package cache"),
        }
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        // JSON logs go to stderr so stdout stays a single JSON document
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
