//! Linux sysfs readers for `/sys/class/power_supply` and `/sys/class/net`.
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::{BatteryReading, BatterySource, HardwareError, NetworkReading, NetworkSource};

fn read_attribute(path: &Path) -> Result<String, HardwareError> {
    Ok(fs::read_to_string(path)?.trim().to_owned())
}

/// Battery exposed as a `power_supply` device of type `Battery`.
#[derive(Debug, Clone)]
pub struct SysfsBattery {
    path: PathBuf,
}

impl SysfsBattery {
    /// Battery backed by the device directory `path` (e.g. `.../BAT0`).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the first battery found under `root`.
    pub fn discover(root: &Path) -> Result<Self, HardwareError> {
        let entries = fs::read_dir(root).map_err(|_| HardwareError::Unavailable("Battery"))?;
        let mut devices: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        devices.sort();
        devices
            .into_iter()
            .find(|dev| {
                let kind = read_attribute(&dev.join("type")).unwrap_or_default();
                trace!("{:?} is of type {:?}", dev, kind);
                kind == "Battery"
            })
            .map(Self::new)
            .ok_or(HardwareError::Unavailable("Battery"))
    }

    /// Device directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BatterySource for SysfsBattery {
    fn read(&self) -> Result<BatteryReading, HardwareError> {
        let capacity = read_attribute(&self.path.join("capacity"))?;
        let percent: f64 = capacity.parse().map_err(|_| HardwareError::BadValue {
            attribute: "capacity".to_string(),
            value: capacity.clone(),
        })?;
        let status = read_attribute(&self.path.join("status")).unwrap_or_default();
        Ok(BatteryReading {
            level: percent / 100.0,
            charging: matches!(status.as_str(), "Charging" | "Full"),
        })
    }
}

/// Network links listed under `/sys/class/net`.
#[derive(Debug, Clone)]
pub struct SysfsNetwork {
    root: PathBuf,
}

impl SysfsNetwork {
    /// Reader for interfaces under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl NetworkSource for SysfsNetwork {
    /// Only physical interfaces (those with a `device` entry) count; an up
    /// wireless link wins over an up wired one.
    fn read(&self) -> Result<NetworkReading, HardwareError> {
        let entries =
            fs::read_dir(&self.root).map_err(|_| HardwareError::Unavailable("Network state"))?;
        let mut wired_up = false;
        let mut wireless_up = false;
        for entry in entries {
            let iface = entry?.path();
            if !iface.join("device").exists() {
                continue;
            }
            let operstate = read_attribute(&iface.join("operstate")).unwrap_or_default();
            let wireless = iface.join("wireless").is_dir();
            debug!("{:?} operstate={} wireless={}", iface, operstate, wireless);
            if operstate == "up" {
                if wireless {
                    wireless_up = true;
                } else {
                    wired_up = true;
                }
            }
        }
        Ok(match (wireless_up, wired_up) {
            (true, _) => NetworkReading {
                online: true,
                connection_type: Some("wifi".to_string()),
            },
            (false, true) => NetworkReading {
                online: true,
                connection_type: Some("ethernet".to_string()),
            },
            (false, false) => NetworkReading {
                online: false,
                connection_type: None,
            },
        })
    }
}
