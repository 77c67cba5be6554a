#![doc = include_str!("../README.md")]
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::debug;

use ::lib::config::{Args, Cmd, ConfigCmd};
use ::lib::display::TerminalStatusBar;
use ::lib::hardware;
use ::lib::{config_get, config_set, run_request, run_shell, setup_tracing, state_json};

#[paw::main]
fn main(args: Args) -> Result<()> {
    setup_tracing(&args)?;
    let config = args.load_config()?;
    let cmd = args.cmd.clone().unwrap_or(Cmd::Shell);
    debug!("Running {:?}", cmd);

    let runtime = tokio::runtime::Runtime::new().context("Starting async runtime")?;
    let res = match cmd {
        Cmd::Shell => {
            let sources = hardware::detect(&config.hardware);
            runtime.block_on(run_shell(
                &config,
                sources,
                Arc::new(TerminalStatusBar::new()),
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            ))
        }
        Cmd::State => {
            let sources = hardware::detect(&config.hardware);
            runtime
                .block_on(state_json(&config, sources))
                .map(|json| println!("{}", json))
        }
        Cmd::Run { request } => {
            let sources = hardware::detect(&config.hardware);
            runtime
                .block_on(run_request(&config, sources, &request))
                .map(|reply| {
                    if !reply.is_empty() {
                        println!("{}", reply);
                    }
                })
        }
        Cmd::Config(ConfigCmd::Get { key }) => {
            config_get(&config, &key).map(|json| println!("{}", json))
        }
        Cmd::Config(ConfigCmd::Set { key, value }) => config_set(&config, &key, &value),
        Cmd::DumpConfig => toml::to_string_pretty(&config)
            .context("Serializing configuration")
            .map(|toml| print!("{}", toml)),
    };
    // A pending read on stdin must not hold the process.
    runtime.shutdown_background();
    res
}
