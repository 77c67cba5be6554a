//! Per-key JSON blob store for settings surviving a restart.
//!
//! Each key maps to `<dir>/<key>.json`, read and written wholesale. The
//! launcher keeps the user's [`Language`] and store [`Accounts`] there.
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::state::ParseError;

/// Key holding the [`Language`] setting.
pub const LANGUAGE_KEY: &str = "language";
/// Key holding the [`Accounts`] setting.
pub const ACCOUNTS_KEY: &str = "accounts";

/// Directory-backed key/value store.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the blobs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("Invalid config key {:?}", key);
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Read the blob stored under `key`, or an empty object when absent.
    pub fn get(&self, key: &str) -> Result<Value> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!("No value stored for {:?}", key);
            return Ok(Value::Object(Default::default()));
        }
        let json = fs::read_to_string(&path).with_context(|| format!("Reading {:?}", &path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Unable to deserialize {:?} (try to remove it)", &path))
    }

    /// Replace the blob stored under `key`.
    pub fn set(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Creating config dir {:?}", &self.dir))?;
        fs::write(&path, serde_json::to_string(value)?)
            .with_context(|| format!("Writing to config file {:?}", &path))?;
        info!("Saved {:?}", key);
        Ok(())
    }

    /// Read `key` as `T`, falling back to `T::default()` for missing fields.
    pub fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let value = self.get(key)?;
        match value {
            Value::Object(ref map) if map.is_empty() => Ok(T::default()),
            v => serde_json::from_value(v).with_context(|| format!("Decoding {:?}", key)),
        }
    }

    /// Store `value` under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, &serde_json::to_value(value)?)
    }
}

/// UI language
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[allow(missing_docs)]
    En,
    #[allow(missing_docs)]
    #[default]
    Pl,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::En => "en",
            Language::Pl => "pl",
        })
    }
}

impl FromStr for Language {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "pl" => Ok(Language::Pl),
            _ => Err(ParseError::Language(s.to_owned())),
        }
    }
}

/// Stored form of the language setting: `{"lang": "pl"}`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LanguageSetting {
    #[allow(missing_docs)]
    #[serde(default)]
    pub lang: Language,
}

/// Store account names typed in the settings screen.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Accounts {
    #[allow(missing_docs)]
    #[serde(default)]
    pub steam: String,
    #[allow(missing_docs)]
    #[serde(default)]
    pub epic: String,
    #[allow(missing_docs)]
    #[serde(default)]
    pub gog: String,
}
