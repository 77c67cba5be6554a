//! Game platforms shown on the launcher screen.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One tile of the launcher screen
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LauncherEntry {
    /// Identifier typed in `launch <id>`
    pub id: String,
    /// Display name
    pub name: String,
    /// Command line started (detached) when the tile is activated
    pub command: String,
}

impl LauncherEntry {
    #[allow(missing_docs)]
    pub fn new(id: &str, name: &str, command: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            command: command.to_owned(),
        }
    }
}

/// Platforms installed by the distribution.
pub fn default_launchers() -> Vec<LauncherEntry> {
    vec![
        LauncherEntry::new("steam", "Steam", "flatpak run com.valvesoftware.Steam"),
        LauncherEntry::new("heroic", "Heroic Games Launcher", "heroic"),
        LauncherEntry::new("hyperplay", "HyperPlay", "hyperplay"),
        LauncherEntry::new("lutris", "Lutris", "flatpak run net.lutris.Lutris"),
        LauncherEntry::new(
            "hacker_launcher",
            "Hacker Launcher",
            "/usr/share/HackerOS/Scripts/HackerOS-Apps/Hacker_Launcher",
        ),
    ]
}

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Nothing to launch")]
    Empty,
    #[error("Malformed command line {0:?}")]
    Malformed(String),
}

/// Resolve what `launch <target>` should start: the command of the entry
/// whose id is `target`, or `target` itself taken as a command line.
///
/// The command line must split into words (balanced quotes) before it is
/// handed to the shell.
pub fn resolve<'a>(entries: &'a [LauncherEntry], target: &'a str) -> Result<&'a str, LaunchError> {
    let command = entries
        .iter()
        .find(|e| e.id == target)
        .map(|e| e.command.as_str())
        .unwrap_or(target);
    match shell_words::split(command) {
        Ok(words) if words.is_empty() => Err(LaunchError::Empty),
        Ok(_) => Ok(command),
        Err(_) => Err(LaunchError::Malformed(command.to_owned())),
    }
}
