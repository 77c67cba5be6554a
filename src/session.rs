//! The kiosk console: requests typed by the user and the UI-side session
//! state around them.
//!
//! A [`Console`] owns the [`WifiSession`] (scan results, selection and typed
//! password) and turns each [`Request`] into calls on the shared
//! [`SystemService`], the launcher catalog and the settings store.
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::launcher::{self, LaunchError, LauncherEntry};
use crate::secret::Secret;
use crate::service::{ServiceError, SystemService};
use crate::state::{GamingTool, ParseError, PowerProfile, Theme, WifiNetwork};
use crate::store::{Accounts, ConfigStore, Language, LanguageSetting, ACCOUNTS_KEY, LANGUAGE_KEY};

/// Step applied by `volume up|down` and `brightness up|down`.
pub const STEP: i64 = 5;

/// Text printed by `help`.
pub const HELP: &str = "\
state                      show the system state
volume <n>|up|down         set the volume
brightness <n>|up|down     set the screen brightness
mute                       toggle mute
wifi                       toggle the wifi radio
scan                       list visible networks
select <ssid>              pick a network from the last scan
password <pw>              type the password of the selected network
connect [<ssid> [<pw>]]    join the selected (or given) network
profile <name>             power-saving, balanced or performance
theme [dark|light]         set or switch the theme
bluetooth on|off           toggle bluetooth
tool <name> on|off         gamescope, mangohud or vkbasalt
action <name>              shutdown, restart, sleep or switch_plasma
launch <app>|<command>     start a platform from `apps` or a command
apps                       list platforms
lang [en|pl]               show or set the interface language
account [<store> <name>]   show or set steam, epic or gog account names
help                       this text
quit                       leave";

/// Errors reported back to the user of the console.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot read request: {0}")]
    Syntax(#[from] shell_words::ParseError),
    #[error("Unknown request '{0}', type `help` for the list")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Please select a network")]
    NoSelection,
    #[error("Network '{0}' is not in the last scan")]
    UnknownNetwork(String),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Absolute or relative percentage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Set to this value (clamped by the service)
    Set(i64),
    /// Raise by [`STEP`]
    Up,
    /// Lower by [`STEP`]
    Down,
}

impl Level {
    /// Resolve against the `current` value.
    pub fn apply(self, current: u8) -> i64 {
        match self {
            Level::Set(v) => v,
            Level::Up => i64::from(current) + STEP,
            Level::Down => i64::from(current) - STEP,
        }
    }
}

impl FromStr for Level {
    type Err = SessionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "+" => Ok(Level::Up),
            "down" | "-" => Ok(Level::Down),
            _ => s
                .parse()
                .map(Level::Set)
                .map_err(|_| SessionError::NotANumber(s.to_owned())),
        }
    }
}

/// Account fields editable from the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    #[allow(missing_docs)]
    Steam,
    #[allow(missing_docs)]
    Epic,
    #[allow(missing_docs)]
    Gog,
}

/// One console request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    #[allow(missing_docs)]
    State,
    #[allow(missing_docs)]
    Volume(Level),
    #[allow(missing_docs)]
    Brightness(Level),
    #[allow(missing_docs)]
    Mute,
    #[allow(missing_docs)]
    Wifi,
    #[allow(missing_docs)]
    Scan,
    #[allow(missing_docs)]
    Select(String),
    #[allow(missing_docs)]
    Password(Secret),
    /// Connect to the given network, or to the selected one
    Connect {
        /// Network to join, the selected one otherwise
        ssid: Option<String>,
        /// Password, the typed one otherwise
        password: Option<Secret>,
    },
    #[allow(missing_docs)]
    Profile(PowerProfile),
    /// Set the theme, or switch it (`None`)
    Theme(Option<Theme>),
    #[allow(missing_docs)]
    Bluetooth(bool),
    #[allow(missing_docs)]
    Tool(GamingTool, bool),
    #[allow(missing_docs)]
    Action(String),
    #[allow(missing_docs)]
    Launch(String),
    #[allow(missing_docs)]
    Apps,
    /// Show (`None`) or set the language
    Lang(Option<Language>),
    /// Show (`None`) or set one account name
    Account(Option<(Store, String)>),
    #[allow(missing_docs)]
    Help,
    #[allow(missing_docs)]
    Quit,
}

fn on_off(word: Option<&str>, usage: &'static str) -> Result<bool, SessionError> {
    match word {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err(SessionError::Usage(usage)),
    }
}

impl Request {
    /// Build a request from already split words.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Result<Self, SessionError> {
        let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
        let request = match words.as_slice() {
            ["state"] => Request::State,
            ["volume", level] => Request::Volume(level.parse()?),
            ["volume", ..] => return Err(SessionError::Usage("volume <n>|up|down")),
            ["brightness", level] => Request::Brightness(level.parse()?),
            ["brightness", ..] => return Err(SessionError::Usage("brightness <n>|up|down")),
            ["mute"] => Request::Mute,
            ["wifi"] => Request::Wifi,
            ["scan"] => Request::Scan,
            ["select", ssid] => Request::Select(ssid.to_string()),
            ["select", ..] => return Err(SessionError::Usage("select <ssid>")),
            ["password", pw] => Request::Password(Secret::new(*pw)),
            ["password", ..] => return Err(SessionError::Usage("password <pw>")),
            ["connect"] => Request::Connect {
                ssid: None,
                password: None,
            },
            ["connect", ssid] => Request::Connect {
                ssid: Some(ssid.to_string()),
                password: None,
            },
            ["connect", ssid, pw] => Request::Connect {
                ssid: Some(ssid.to_string()),
                password: Some(Secret::new(*pw)),
            },
            ["connect", ..] => return Err(SessionError::Usage("connect [<ssid> [<pw>]]")),
            ["profile", name] => Request::Profile(name.parse()?),
            ["profile", ..] => return Err(SessionError::Usage("profile <name>")),
            ["theme"] => Request::Theme(None),
            ["theme", name] => Request::Theme(Some(name.parse()?)),
            ["bluetooth", rest @ ..] => {
                Request::Bluetooth(on_off(rest.first().copied(), "bluetooth on|off")?)
            }
            ["tool", name, state] => {
                Request::Tool(name.parse()?, on_off(Some(*state), "tool <name> on|off")?)
            }
            ["tool", ..] => return Err(SessionError::Usage("tool <name> on|off")),
            ["action", name] => Request::Action(name.to_string()),
            ["action", ..] => return Err(SessionError::Usage("action <name>")),
            ["launch", target @ ..] if !target.is_empty() => {
                Request::Launch(shell_words::join(target))
            }
            ["launch"] => return Err(SessionError::Usage("launch <app>|<command>")),
            ["apps"] => Request::Apps,
            ["lang"] => Request::Lang(None),
            ["lang", lang] => Request::Lang(Some(lang.parse()?)),
            ["account"] => Request::Account(None),
            ["account", store, name] => {
                let store = match *store {
                    "steam" => Store::Steam,
                    "epic" => Store::Epic,
                    "gog" => Store::Gog,
                    _ => return Err(SessionError::Usage("account [steam|epic|gog <name>]")),
                };
                Request::Account(Some((store, name.to_string())))
            }
            ["account", ..] => return Err(SessionError::Usage("account [steam|epic|gog <name>]")),
            ["help"] | ["?"] => Request::Help,
            ["quit"] | ["exit"] => Request::Quit,
            [] => return Err(SessionError::Usage("type `help` for the list of requests")),
            [other, ..] => return Err(SessionError::Unknown(other.to_string())),
        };
        Ok(request)
    }
}

impl FromStr for Request {
    type Err = SessionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Request::from_words(&shell_words::split(s)?)
    }
}

/// What the console should do after a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this text and keep going
    Text(String),
    /// Leave the session
    Quit,
}

/// UI-side state of the wifi panel.
#[derive(Debug, Default)]
pub struct WifiSession {
    /// `true` while a scan is running
    pub scanning: bool,
    /// Network picked from the last result set
    pub selected_network: Option<String>,
    /// Password typed for the selected network
    pub password: Secret,
    /// Last scan result set
    pub networks: Vec<WifiNetwork>,
}

impl WifiSession {
    fn select(&mut self, ssid: &str) -> Result<(), SessionError> {
        if !self.networks.iter().any(|n| n.ssid == ssid) {
            return Err(SessionError::UnknownNetwork(ssid.to_owned()));
        }
        if self.selected_network.as_deref() != Some(ssid) {
            self.password = Secret::default();
        }
        self.selected_network = Some(ssid.to_owned());
        Ok(())
    }
}

fn format_networks(networks: &[WifiNetwork]) -> String {
    let mut res = String::new();
    for n in networks {
        let _ = writeln!(
            res,
            "{:<24} {:>3}%  {}",
            n.ssid,
            n.signal,
            if n.security { "secured" } else { "open" }
        );
    }
    res.trim_end().to_owned()
}

/// Interactive session over a shared [`SystemService`].
#[derive(Debug)]
pub struct Console {
    service: Arc<SystemService>,
    store: ConfigStore,
    launchers: Vec<LauncherEntry>,
    wifi: WifiSession,
}

impl Console {
    #[allow(missing_docs)]
    pub fn new(
        service: Arc<SystemService>,
        store: ConfigStore,
        launchers: Vec<LauncherEntry>,
    ) -> Self {
        Self {
            service,
            store,
            launchers,
            wifi: WifiSession::default(),
        }
    }

    /// Wifi panel state.
    pub fn wifi(&self) -> &WifiSession {
        &self.wifi
    }

    /// Parse `line` and handle it.
    pub async fn handle_line(&mut self, line: &str) -> Result<Reply, SessionError> {
        let request: Request = line.parse()?;
        self.handle(request).await
    }

    /// Carry out one request.
    pub async fn handle(&mut self, request: Request) -> Result<Reply, SessionError> {
        debug!("Handling {:?}", request);
        let text = match request {
            Request::State => {
                let state = self.service.get_state().await;
                serde_json::to_string_pretty(&state).map_err(anyhow::Error::from)?
            }
            Request::Volume(level) => {
                let current = self.service.get_state().await.volume;
                self.service.set_volume(level.apply(current)).await;
                format!("Volume {}%", self.service.get_state().await.volume)
            }
            Request::Brightness(level) => {
                let current = self.service.get_state().await.brightness;
                self.service.set_brightness(level.apply(current)).await;
                format!("Brightness {}%", self.service.get_state().await.brightness)
            }
            Request::Mute => {
                if self.service.toggle_mute().await {
                    "Muted".to_string()
                } else {
                    "Unmuted".to_string()
                }
            }
            Request::Wifi => {
                let enabled = self.service.toggle_wifi().await;
                if !enabled {
                    self.wifi = WifiSession::default();
                }
                format!("Wifi {}", if enabled { "on" } else { "off" })
            }
            Request::Scan => {
                self.wifi.scanning = true;
                let networks = self.service.scan_wifi().await;
                self.wifi.scanning = false;
                if let Some(selected) = &self.wifi.selected_network {
                    if !networks.iter().any(|n| &n.ssid == selected) {
                        self.wifi.selected_network = None;
                        self.wifi.password = Secret::default();
                    }
                }
                self.wifi.networks = networks;
                if self.wifi.networks.is_empty() {
                    "No network found".to_string()
                } else {
                    format_networks(&self.wifi.networks)
                }
            }
            Request::Select(ssid) => {
                self.wifi.select(&ssid)?;
                format!("Selected {}", ssid)
            }
            Request::Password(password) => {
                if self.wifi.selected_network.is_none() {
                    return Err(SessionError::NoSelection);
                }
                self.wifi.password = password;
                "Password set".to_string()
            }
            Request::Connect { ssid, password } => {
                let ssid = match ssid.or_else(|| self.wifi.selected_network.clone()) {
                    Some(ssid) => ssid,
                    None => return Err(SessionError::NoSelection),
                };
                let password = password.or_else(|| {
                    Some(std::mem::take(&mut self.wifi.password)).filter(|p| !p.is_empty())
                });
                info!("Connecting to {}", ssid);
                self.service.connect_wifi(&ssid, password).await;
                self.wifi.selected_network = None;
                format!("Connection to {} requested", ssid)
            }
            Request::Profile(profile) => {
                self.service.set_power_profile(profile).await;
                format!("Power profile {}", profile)
            }
            Request::Theme(None) => format!("Theme {}", self.service.toggle_theme()),
            Request::Theme(Some(theme)) => {
                self.service.set_theme(theme);
                format!("Theme {}", theme)
            }
            Request::Bluetooth(enabled) => {
                self.service.set_bluetooth(enabled);
                format!("Bluetooth {}", if enabled { "on" } else { "off" })
            }
            Request::Tool(tool, enabled) => {
                self.service.set_gaming_tool(tool, enabled);
                format!("{:?} {}", tool, if enabled { "on" } else { "off" })
            }
            Request::Action(action) => {
                self.service.system_action(&action).await?;
                format!("Running {}", action)
            }
            Request::Launch(target) => {
                let command = launcher::resolve(&self.launchers, &target)?;
                self.service.launch_app(command).await;
                format!("Launching {}", target)
            }
            Request::Apps => self
                .launchers
                .iter()
                .map(|e| format!("{:<16} {}", e.id, e.name))
                .collect::<Vec<_>>()
                .join("\n"),
            Request::Lang(None) => {
                let setting: LanguageSetting = self.store.load(LANGUAGE_KEY)?;
                format!("Language {}", setting.lang)
            }
            Request::Lang(Some(lang)) => {
                self.store
                    .save(LANGUAGE_KEY, &LanguageSetting { lang })?;
                format!("Language {}", lang)
            }
            Request::Account(None) => {
                let accounts: Accounts = self.store.load(ACCOUNTS_KEY)?;
                format!(
                    "steam: {}\nepic: {}\ngog: {}",
                    accounts.steam, accounts.epic, accounts.gog
                )
            }
            Request::Account(Some((store, name))) => {
                let mut accounts: Accounts = self.store.load(ACCOUNTS_KEY)?;
                match store {
                    Store::Steam => accounts.steam = name,
                    Store::Epic => accounts.epic = name,
                    Store::Gog => accounts.gog = name,
                }
                self.store.save(ACCOUNTS_KEY, &accounts)?;
                "Account saved".to_string()
            }
            Request::Help => HELP.to_string(),
            Request::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Text(text))
    }
}
