//! Background task turning hardware readings into state events.
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BatteryReading, HardwareError, NetworkReading, Sources};
use crate::service::SystemService;

/// Handle on the hardware subscription task.
///
/// The task lives as long as the handle: dropping it stops the task.
#[derive(Debug)]
pub struct HardwareMonitor {
    task: JoinHandle<()>,
}

/// Last readings seen, used to emit events on change only.
#[derive(Debug, Default)]
struct Seen {
    battery: Option<BatteryReading>,
    network: Option<NetworkReading>,
    battery_failing: bool,
    network_failing: bool,
}

/// Log the first failure of a source as a warning, later ones quietly.
fn report_failure(failing: &mut bool, what: &str, e: &HardwareError) {
    if *failing {
        debug!("{} still unreadable: {}", what, e);
    } else {
        warn!("{} unreadable, keeping last known values: {}", what, e);
        *failing = true;
    }
}

impl Seen {
    fn sample(&mut self, service: &SystemService, sources: &Sources) {
        if let Some(battery) = &sources.battery {
            match battery.read() {
                Ok(reading) => {
                    self.battery_failing = false;
                    let previous = self.battery.replace(reading);
                    let level_changed = previous.map(|p| p.percent()) != Some(reading.percent());
                    let charging_changed = previous.map(|p| p.charging) != Some(reading.charging);
                    if level_changed {
                        debug!("levelchange: {}%", reading.percent());
                    }
                    if charging_changed {
                        debug!("chargingchange: {}", reading.charging);
                    }
                    if level_changed || charging_changed {
                        service.apply_battery_event(reading);
                    }
                }
                Err(e) => report_failure(&mut self.battery_failing, "Battery", &e),
            }
        }
        if let Some(network) = &sources.network {
            match network.read() {
                Ok(reading) => {
                    self.network_failing = false;
                    if self.network.as_ref() != Some(&reading) {
                        info!(
                            "Network {} ({})",
                            if reading.online { "online" } else { "offline" },
                            reading.network_type()
                        );
                        service.apply_network_event(reading.clone());
                        self.network = Some(reading);
                    }
                }
                Err(e) => report_failure(&mut self.network_failing, "Network", &e),
            }
        }
    }
}

impl HardwareMonitor {
    /// Subscribe `service` to `sources`, sampling them every `period`.
    ///
    /// The first sample is taken right away so the state reflects hardware
    /// before the first display refresh.
    pub fn spawn(service: Arc<SystemService>, sources: Sources, period: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut seen = Seen::default();
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                seen.sample(&service, &sources);
            }
        });
        Self { task }
    }

    /// Stop the subscription.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for HardwareMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
