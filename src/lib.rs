#![warn(missing_docs)]
//! Hacker Mode main components and helper functions used by `main`
//!
//! The [`SystemService`] keeps the canonical [`SystemState`], the
//! [`hardware`] monitor feeds it battery and network events, the
//! [`poller`] republishes it to the status bar and the [`session`] console
//! turns user requests into service calls.
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

pub mod command;
pub mod config;
pub mod display;
pub mod hardware;
pub mod launcher;
pub mod poller;
pub mod secret;
pub mod service;
pub mod session;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod wifi;
pub use config::{AppConfig, Args, Cmd};
pub use service::SystemService;
pub use state::SystemState;

use display::StatusDisplay;
use hardware::{HardwareMonitor, Sources};
use poller::StatusPoller;
use session::{Console, Reply, Request};
use store::ConfigStore;

/// Prompt printed before each console request.
pub const PROMPT: &str = "hacker-mode> ";

/// Setup logging to stderr
/// (Tracing is a bit more involving to set up but will provide much more feature if needed)
pub fn setup_tracing(args: &Args) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let filter_layer =
        EnvFilter::try_new(args.verbose.get_level_filter()).context("Initializing log filter")?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(())
}

/// Create the [`SystemService`] described by `config`, refreshed from `sources`.
pub fn build_service(config: &AppConfig, sources: Sources) -> Arc<SystemService> {
    Arc::new(
        SystemService::builder(config.service.clone())
            .sources(sources)
            .build(),
    )
}

fn console(config: &AppConfig, service: Arc<SystemService>) -> Console {
    Console::new(
        service,
        ConfigStore::new(&config.config_dir),
        config.launchers.clone(),
    )
}

/// Current system state as pretty printed JSON.
pub async fn state_json(config: &AppConfig, sources: Sources) -> Result<String> {
    let state = build_service(config, sources).get_state().await;
    serde_json::to_string_pretty(&state).context("Serializing system state")
}

/// Carry out the single console request made of `words`.
pub async fn run_request(config: &AppConfig, sources: Sources, words: &[String]) -> Result<String> {
    let request = Request::from_words(words)?;
    let mut console = console(config, build_service(config, sources));
    match console.handle(request).await? {
        Reply::Text(text) => Ok(text),
        Reply::Quit => Ok(String::new()),
    }
}

/// JSON stored under `key` in the settings store.
pub fn config_get(config: &AppConfig, key: &str) -> Result<String> {
    let value = ConfigStore::new(&config.config_dir).get(key)?;
    serde_json::to_string_pretty(&value).context("Serializing setting")
}

/// Store the JSON text `value` under `key`.
pub fn config_set(config: &AppConfig, key: &str, value: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(value).with_context(|| format!("{:?} is not valid JSON", value))?;
    ConfigStore::new(&config.config_dir).set(key, &value)
}

/// Interactive kiosk session.
///
/// Starts the hardware monitor and the status poller, then handles the
/// requests read from `input` (one per line) until `quit`, end of input or
/// Ctrl-C. Replies are written to `output`. Every timer is stopped before
/// returning.
pub async fn run_shell<R, W>(
    config: &AppConfig,
    sources: Sources,
    display: Arc<dyn StatusDisplay>,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let service = build_service(config, sources.clone());
    let monitor = HardwareMonitor::spawn(
        service.clone(),
        sources,
        config.hardware.sample_period(),
    );
    let poller = StatusPoller::start(service.clone(), display, &config.poller);
    let mut console = console(config, service);
    info!("Hacker Mode session started, type `help` for the list of requests");

    let mut lines = input.lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let res = loop {
        if let Err(e) = output.write_all(PROMPT.as_bytes()).await {
            break Err(e).context("Writing prompt");
        }
        if let Err(e) = output.flush().await {
            break Err(e).context("Writing prompt");
        }
        let line = tokio::select! {
            line = lines.next_line() => line,
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!("Unable to listen for Ctrl-C: {}", e);
                }
                break Ok(());
            }
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("End of input");
                break Ok(());
            }
            Err(e) => break Err(e).context("Reading request"),
        };
        if line.trim().is_empty() {
            continue;
        }
        let text = match console.handle_line(&line).await {
            Ok(Reply::Quit) => break Ok(()),
            Ok(Reply::Text(text)) => text,
            Err(e) => format!("Error: {}", e),
        };
        if let Err(e) = output.write_all(format!("{}\n", text).as_bytes()).await {
            break Err(e).context("Writing reply");
        }
    };

    poller.stop().await;
    monitor.stop();
    info!("Hacker Mode session ended");
    res
}
