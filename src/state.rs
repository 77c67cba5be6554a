//! The canonical system state record and the value types it is made of.
//!
//! [`SystemState`] is what the status bar and settings screens display. It is
//! owned by the [`SystemService`](crate::service::SystemService); everything
//! else only ever sees clones of it.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when parsing a symbolic value typed by the user.
#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown power profile '{0}' (expected power-saving, balanced or performance)")]
    PowerProfile(String),
    #[error("Unknown theme '{0}' (expected dark or light)")]
    Theme(String),
    #[error("Unknown gaming tool '{0}' (expected gamescope, mangohud or vkbasalt)")]
    GamingTool(String),
    #[error("Unknown system action '{0}'")]
    SystemAction(String),
    #[error("Unknown language '{0}' (expected en or pl)")]
    Language(String),
}

/// Clamp any integer into a `[0, 100]` percentage.
pub fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

/// UI colour theme
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[allow(missing_docs)]
    #[default]
    Dark,
    #[allow(missing_docs)]
    Light,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        })
    }
}

impl FromStr for Theme {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(ParseError::Theme(s.to_owned())),
        }
    }
}

/// Power profile as understood by `powerprofilesctl`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PowerProfile {
    #[allow(missing_docs)]
    PowerSaving,
    #[allow(missing_docs)]
    #[default]
    Balanced,
    #[allow(missing_docs)]
    Performance,
}

impl PowerProfile {
    /// Name passed to `powerprofilesctl set`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerProfile::PowerSaving => "power-saving",
            PowerProfile::Balanced => "balanced",
            PowerProfile::Performance => "performance",
        }
    }
}

impl fmt::Display for PowerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerProfile {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "power-saving" => Ok(PowerProfile::PowerSaving),
            "balanced" => Ok(PowerProfile::Balanced),
            "performance" => Ok(PowerProfile::Performance),
            _ => Err(ParseError::PowerProfile(s.to_owned())),
        }
    }
}

/// Gaming overlays and compositors whose toggle is tracked but not actuated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GamingTool {
    #[allow(missing_docs)]
    Gamescope,
    #[allow(missing_docs)]
    Mangohud,
    #[allow(missing_docs)]
    Vkbasalt,
}

impl FromStr for GamingTool {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gamescope" => Ok(GamingTool::Gamescope),
            "mangohud" => Ok(GamingTool::Mangohud),
            "vkbasalt" => Ok(GamingTool::Vkbasalt),
            _ => Err(ParseError::GamingTool(s.to_owned())),
        }
    }
}

/// Power menu actions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SystemAction {
    #[allow(missing_docs)]
    Shutdown,
    #[allow(missing_docs)]
    Restart,
    #[allow(missing_docs)]
    Sleep,
    /// Leave the kiosk session for the Plasma desktop
    SwitchPlasma,
}

impl SystemAction {
    /// Command line realizing the action.
    pub fn command(&self) -> &'static str {
        match self {
            SystemAction::Shutdown => "systemctl poweroff",
            SystemAction::Restart => "systemctl reboot",
            SystemAction::Sleep => "systemctl suspend",
            SystemAction::SwitchPlasma => "qdbus org.kde.ksmserver /KSMServer logout 0 0 0",
        }
    }
}

impl FromStr for SystemAction {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shutdown" => Ok(SystemAction::Shutdown),
            "restart" => Ok(SystemAction::Restart),
            "sleep" => Ok(SystemAction::Sleep),
            "switch_plasma" => Ok(SystemAction::SwitchPlasma),
            _ => Err(ParseError::SystemAction(s.to_owned())),
        }
    }
}

/// Snapshot of every setting the launcher displays.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    /// Sink volume in percent
    pub volume: u8,
    #[allow(missing_docs)]
    pub is_muted: bool,
    /// Backlight brightness in percent
    pub brightness: u8,
    #[allow(missing_docs)]
    pub wifi_enabled: bool,
    #[allow(missing_docs)]
    pub bluetooth_enabled: bool,
    #[allow(missing_docs)]
    pub theme: Theme,
    #[allow(missing_docs)]
    pub power_profile: PowerProfile,
    #[allow(missing_docs)]
    pub gamescope_enabled: bool,
    #[allow(missing_docs)]
    pub mangohud_enabled: bool,
    #[allow(missing_docs)]
    pub vkbasalt_enabled: bool,
    /// Battery charge in percent, written by hardware events only
    pub battery_level: u8,
    /// Written by hardware events only
    pub battery_charging: bool,
    /// `wifi`, `ethernet`, `none`, `unknown`... written by hardware events only
    pub network_type: String,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            volume: 50,
            is_muted: false,
            brightness: 70,
            wifi_enabled: true,
            bluetooth_enabled: false,
            theme: Theme::Dark,
            power_profile: PowerProfile::Balanced,
            gamescope_enabled: true,
            mangohud_enabled: false,
            vkbasalt_enabled: false,
            battery_level: 100,
            battery_charging: false,
            network_type: "unknown".to_string(),
        }
    }
}

impl SystemState {
    /// Mutable access to the flag tracking `tool`.
    pub fn gaming_tool_mut(&mut self, tool: GamingTool) -> &mut bool {
        match tool {
            GamingTool::Gamescope => &mut self.gamescope_enabled,
            GamingTool::Mangohud => &mut self.mangohud_enabled,
            GamingTool::Vkbasalt => &mut self.vkbasalt_enabled,
        }
    }
}

/// One access point of a scan result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WifiNetwork {
    #[allow(missing_docs)]
    pub ssid: String,
    /// Signal strength in percent
    pub signal: u8,
    /// Whether a password is required
    pub security: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub connected: Option<bool>,
}

impl WifiNetwork {
    /// Network with `signal` clamped to a percentage.
    pub fn new(ssid: impl Into<String>, signal: i64, security: bool) -> Self {
        Self {
            ssid: ssid.into(),
            signal: clamp_percent(signal),
            security,
            connected: None,
        }
    }
}
