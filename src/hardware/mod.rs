//! Battery and network sources feeding the hardware event subscriptions.
//!
//! A source only knows how to take a reading. Turning successive readings into
//! `levelchange`/`chargingchange`/`online`/`offline` events is the job of the
//! [`HardwareMonitor`], which forwards them to the
//! [`SystemService`](crate::service::SystemService).

mod monitor;
mod sysfs;

pub use monitor::HardwareMonitor;
pub use sysfs::{SysfsBattery, SysfsNetwork};

use std::sync::Arc;
use std::{fmt, io};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::HardwareConfig;

#[derive(Debug, Error)]
/// Error specific to hardware sources.
pub enum HardwareError {
    /// The platform does not expose this capability.
    #[error("{0} is not available on this host")]
    Unavailable(&'static str),
    /// A sysfs attribute holds something unexpected.
    #[error("Unexpected value {value:?} in {attribute}")]
    BadValue {
        #[allow(missing_docs)]
        attribute: String,
        #[allow(missing_docs)]
        value: String,
    },
    #[allow(missing_docs)]
    #[error("Hardware IO Error")]
    IoError(#[from] io::Error),
}

/// One battery sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// Charge ratio in `[0, 1]`
    pub level: f64,
    #[allow(missing_docs)]
    pub charging: bool,
}

impl BatteryReading {
    /// Charge as a rounded, clamped percentage.
    pub fn percent(&self) -> u8 {
        (self.level * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// One network sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkReading {
    /// Whether any physical link is up
    pub online: bool,
    /// Kind of the active link (`wifi`, `ethernet`) when known
    pub connection_type: Option<String>,
}

impl NetworkReading {
    /// Value stored in `SystemState::network_type`.
    pub fn network_type(&self) -> String {
        match (&self.connection_type, self.online) {
            (Some(kind), _) => kind.clone(),
            (None, true) => "wifi".to_string(),
            (None, false) => "none".to_string(),
        }
    }
}

/// Something able to report the battery charge.
#[cfg_attr(test, mockall::automock)]
pub trait BatterySource: Send + Sync {
    /// Take a reading.
    fn read(&self) -> Result<BatteryReading, HardwareError>;
}

/// Something able to report network connectivity.
#[cfg_attr(test, mockall::automock)]
pub trait NetworkSource: Send + Sync {
    /// Take a reading.
    fn read(&self) -> Result<NetworkReading, HardwareError>;
}

/// Sources detected on this host.
#[derive(Default, Clone)]
pub struct Sources {
    /// `None` when the host has no battery
    pub battery: Option<Arc<dyn BatterySource>>,
    /// `None` when network state cannot be read
    pub network: Option<Arc<dyn NetworkSource>>,
}

impl fmt::Debug for Sources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sources")
            .field("battery", &self.battery.is_some())
            .field("network", &self.network.is_some())
            .finish()
    }
}

/// Look for sysfs battery and network sources under the configured roots.
///
/// Missing capabilities are logged and left out: callers keep the seeded
/// defaults for the matching fields.
pub fn detect(config: &HardwareConfig) -> Sources {
    let battery = match SysfsBattery::discover(&config.power_supply_root) {
        Ok(battery) => {
            info!("Battery found at {:?}", battery.path());
            Some(Arc::new(battery) as Arc<dyn BatterySource>)
        }
        Err(e) => {
            warn!("No battery reading: {}", e);
            None
        }
    };
    let network = SysfsNetwork::new(&config.net_root);
    let network = match network.read() {
        Ok(_) => Some(Arc::new(network) as Arc<dyn NetworkSource>),
        Err(e) => {
            warn!("No network reading: {}", e);
            None
        }
    };
    Sources { battery, network }
}
