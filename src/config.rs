//! This module olds struct and helpers for parameters and configuration
//!
//! Configuration is merged in three layers: built-in defaults, then an
//! optional TOML file, then command line overrides.
use ::structopt::clap::AppSettings;
use anyhow::{Context, Result};
use directories_next::ProjectDirs;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;
use tracing::debug;

use crate::launcher::{default_launchers, LauncherEntry};

// Courtesy of structopt_flags crate
/// `-v`/`-q` flags selecting the log level
#[derive(StructOpt, Debug, Clone, Default)]
pub struct QuietVerbose {
    /// Increase the output's verbosity level
    ///
    /// Pass many times to increase verbosity level, up to 2.
    #[structopt(
        name = "quietverbose",
        long = "verbose",
        short = "v",
        parse(from_occurrences),
        conflicts_with = "quietquiet",
        global = true
    )]
    verbosity_level: u8,

    /// Decrease the output's verbosity level.
    ///
    /// Used once, only warnings are shown; twice, only errors; three times,
    /// the log is silenced.
    #[structopt(
        name = "quietquiet",
        long = "quiet",
        short = "q",
        parse(from_occurrences),
        conflicts_with = "quietverbose",
        global = true
    )]
    quiet_level: u8,
}

impl QuietVerbose {
    /// Filter directive for the log level selected on the command line
    /// (`info` when neither flag is given).
    pub fn get_level_filter(&self) -> &'static str {
        let level = 2 + i16::from(self.verbosity_level.min(2)) - i16::from(self.quiet_level.min(3));
        match level {
            i16::MIN..=-1 => "off",
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
    }
}

#[derive(StructOpt, Debug)]
/// Kiosk launcher shell for a Linux gaming distribution
///
/// Keeps track of volume, brightness, wifi, power profile, battery and network
/// state, dispatches the matching system commands and shows a status bar.
#[structopt(global_settings(&[AppSettings::ColoredHelp, AppSettings::ColorAuto]))]
pub struct Args {
    /// configuration file
    ///
    /// Defaults to `config.toml` inside the configuration directory.
    #[structopt(short, long, env = "HACKERMODE_CONFIG", parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// directory holding persisted settings (`<key>.json`)
    #[structopt(long, env = "HACKERMODE_CONFIG_DIR", parse(from_os_str))]
    pub config_dir: Option<PathBuf>,

    /// only log commands, never start them
    #[structopt(long)]
    pub dry_run: bool,

    #[structopt(flatten)]
    pub verbose: QuietVerbose,

    #[structopt(subcommand)]
    pub cmd: Option<Cmd>,
}

/// Sub commands of the binary
#[derive(StructOpt, Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Interactive kiosk console with a live status bar (default)
    Shell,
    /// Print the current system state as JSON
    State,
    /// Run a single console request (e.g. `run volume 40`)
    Run {
        /// request words
        #[structopt(required = true)]
        request: Vec<String>,
    },
    /// Read or write persisted settings
    Config(ConfigCmd),
    /// Print the effective configuration as TOML
    DumpConfig,
}

/// `config` sub commands
#[derive(StructOpt, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCmd {
    /// Print the JSON stored under `key`
    Get {
        /// setting name (e.g. `language`, `accounts`)
        key: String,
    },
    /// Store a JSON value under `key`
    Set {
        /// setting name
        key: String,
        /// JSON value
        value: String,
    },
}

/// How actuations commit to the canonical state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Update state first, dispatch without waiting, never roll back.
    #[default]
    Optimistic,
    /// Dispatch, wait for the outcome and update state only on success.
    Confirmed,
}

/// What to do with a power action that is not one of the known symbols.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownActionPolicy {
    /// Dispatch the action text itself as a command line.
    #[default]
    Passthrough,
    /// Refuse it.
    Reject,
}

/// Settings of the [`SystemService`](crate::service::SystemService)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    #[allow(missing_docs)]
    pub commit_mode: CommitMode,
    #[allow(missing_docs)]
    pub unknown_action: UnknownActionPolicy,
    /// Minimum duration of a wifi scan
    pub scan_latency_ms: u64,
    /// Delay before a connection attempt is reported as issued
    pub connect_settle_ms: u64,
    /// Log commands instead of running them
    pub dry_run: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            commit_mode: CommitMode::Optimistic,
            unknown_action: UnknownActionPolicy::Passthrough,
            scan_latency_ms: 1500,
            connect_settle_ms: 2000,
            dry_run: false,
        }
    }
}

impl ServiceConfig {
    /// Configuration without artificial latency, handy for tests.
    pub fn immediate() -> Self {
        Self {
            scan_latency_ms: 0,
            connect_settle_ms: 0,
            ..Default::default()
        }
    }

    #[allow(missing_docs)]
    pub fn scan_latency(&self) -> Duration {
        Duration::from_millis(self.scan_latency_ms)
    }

    #[allow(missing_docs)]
    pub fn connect_settle(&self) -> Duration {
        Duration::from_millis(self.connect_settle_ms)
    }
}

/// Cadence of the status bar timers
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PollerConfig {
    /// Period of the system state refresh
    pub state_ms: u64,
    /// Period of the clock refresh
    pub clock_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            state_ms: 2000,
            clock_ms: 1000,
        }
    }
}

impl PollerConfig {
    #[allow(missing_docs)]
    pub fn state_period(&self) -> Duration {
        Duration::from_millis(self.state_ms.max(1))
    }

    #[allow(missing_docs)]
    pub fn clock_period(&self) -> Duration {
        Duration::from_millis(self.clock_ms.max(1))
    }
}

/// Where and how often hardware is sampled
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HardwareConfig {
    /// Period between two hardware samples
    pub sample_ms: u64,
    #[allow(missing_docs)]
    pub power_supply_root: PathBuf,
    #[allow(missing_docs)]
    pub net_root: PathBuf,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            sample_ms: 1000,
            power_supply_root: PathBuf::from("/sys/class/power_supply"),
            net_root: PathBuf::from("/sys/class/net"),
        }
    }
}

impl HardwareConfig {
    #[allow(missing_docs)]
    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_ms.max(1))
    }
}

/// Effective application configuration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory of the persisted settings store
    pub config_dir: PathBuf,
    #[allow(missing_docs)]
    pub service: ServiceConfig,
    #[allow(missing_docs)]
    pub poller: PollerConfig,
    #[allow(missing_docs)]
    pub hardware: HardwareConfig,
    /// Platforms shown on the launcher screen
    pub launchers: Vec<LauncherEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            service: ServiceConfig::default(),
            poller: PollerConfig::default(),
            hardware: HardwareConfig::default(),
            launchers: default_launchers(),
        }
    }
}

/// `~/.config/hacker-mode` on Linux, `./.hacker-mode` when no home is known.
pub fn default_config_dir() -> PathBuf {
    ProjectDirs::from("org", "hackeros", "hacker-mode")
        .map(|dirs| dirs.config_dir().to_owned())
        .unwrap_or_else(|| PathBuf::from(".hacker-mode"))
}

#[derive(Serialize, Debug, Default)]
struct ServiceOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    dry_run: Option<bool>,
}

#[derive(Serialize, Debug, Default)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_dir: Option<PathBuf>,
    service: ServiceOverrides,
}

impl Args {
    /// Path of the TOML configuration file to read.
    pub fn config_file(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| default_config_dir().join("config.toml"))
    }

    /// Merge config Default → Config File → command line args
    pub fn load_config(&self) -> Result<AppConfig> {
        let file = self.config_file();
        let overrides = Overrides {
            config_dir: self.config_dir.clone(),
            service: ServiceOverrides {
                dry_run: self.dry_run.then_some(true),
            },
        };
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(&file))
            .merge(Serialized::defaults(overrides))
            .extract()
            .with_context(|| format!("Loading configuration from {:?}", &file))?;
        debug!("Merge config and parameters : {:#?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod load_config_should {
    use super::*;
    use mktemp::Temp;
    use std::fs;
    use test_log::test;

    fn args(config: PathBuf) -> Args {
        Args {
            config: Some(config),
            config_dir: None,
            dry_run: false,
            verbose: QuietVerbose::default(),
            cmd: None,
        }
    }

    #[test]
    fn use_defaults_without_file() -> Result<()> {
        let temp = Temp::new_dir()?;
        let config = args(temp.to_path_buf().join("missing.toml")).load_config()?;
        assert_eq!(config.service, ServiceConfig::default());
        assert_eq!(config.poller.state_ms, 2000);
        assert_eq!(config.poller.clock_ms, 1000);
        assert_eq!(config.launchers.len(), 5);
        Ok(())
    }

    #[test]
    fn merge_file_then_command_line() -> Result<()> {
        let temp = Temp::new_dir()?;
        let file = temp.to_path_buf().join("config.toml");
        fs::write(
            &file,
            r#"
config_dir = "/tmp/from-file"

[service]
commit_mode = "confirmed"
unknown_action = "reject"
scan_latency_ms = 10

[[launchers]]
id = "steam"
name = "Steam"
command = "steam -gamepadui"
"#,
        )?;
        let mut args = args(file);
        args.dry_run = true;
        args.config_dir = Some(PathBuf::from("/tmp/from-cli"));
        let config = args.load_config()?;
        assert_eq!(config.service.commit_mode, CommitMode::Confirmed);
        assert_eq!(config.service.unknown_action, UnknownActionPolicy::Reject);
        assert_eq!(config.service.scan_latency_ms, 10);
        assert_eq!(config.service.connect_settle_ms, 2000);
        assert!(config.service.dry_run);
        assert_eq!(config.config_dir, PathBuf::from("/tmp/from-cli"));
        assert_eq!(config.launchers.len(), 1);
        assert_eq!(config.launchers[0].command, "steam -gamepadui");
        Ok(())
    }

    #[test]
    fn report_malformed_file() -> Result<()> {
        let temp = Temp::new_dir()?;
        let file = temp.to_path_buf().join("config.toml");
        fs::write(&file, "[service]\ncommit_mode = \"maybe\"\n")?;
        assert!(args(file).load_config().is_err());
        Ok(())
    }
}

#[cfg(test)]
mod quiet_verbose_should {
    use super::*;

    #[test]
    fn default_to_info() {
        assert_eq!(QuietVerbose::default().get_level_filter(), "info");
    }

    #[test]
    fn follow_flags() {
        let v = |verbosity_level, quiet_level| QuietVerbose {
            verbosity_level,
            quiet_level,
        };
        assert_eq!(v(1, 0).get_level_filter(), "debug");
        assert_eq!(v(5, 0).get_level_filter(), "trace");
        assert_eq!(v(0, 1).get_level_filter(), "warn");
        assert_eq!(v(0, 2).get_level_filter(), "error");
        assert_eq!(v(0, 3).get_level_filter(), "off");
    }
}
