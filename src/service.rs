//! The system state service: single owner of the canonical [`SystemState`].
//!
//! Reads go through [`SystemService::get_state`], which refreshes hardware
//! fields before returning a copy. Writes go through the `set_*`/`toggle_*`
//! operations, which update the record and dispatch one command through the
//! injected [`CommandExecutor`]. Command outcomes are logged and never fed
//! back into the state.
//!
//! Field ownership:
//! - `battery_level`, `battery_charging`, `network_type` are written by
//!   [`SystemService::apply_battery_event`] and
//!   [`SystemService::apply_network_event`] only (hardware monitor or the
//!   refresh inside `get_state`);
//! - every other field is written by explicit calls, except `wifi_enabled`
//!   which a network `offline` event also forces to `false`.
use derivative::Derivative;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::command::{CommandExecutor, DryRunExecutor, ShellExecutor};
use crate::config::{CommitMode, ServiceConfig, UnknownActionPolicy};
use crate::hardware::{BatteryReading, BatterySource, NetworkReading, NetworkSource, Sources};
use crate::secret::Secret;
use crate::state::{
    clamp_percent, GamingTool, PowerProfile, SystemAction, SystemState, Theme, WifiNetwork,
};
use crate::wifi::{normalize_scan, ConnectCommand, FixedNetworks, WifiScanner, SCAN_COMMAND};

/// Errors surfaced by [`SystemService`] operations.
#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Unknown system action '{0}'")]
    UnknownAction(String),
}

/// Owner of the canonical [`SystemState`].
///
/// Built once per session with [`SystemService::builder`] and shared as an
/// `Arc` with the status poller, the hardware monitor and the console.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct SystemService {
    config: ServiceConfig,
    state: Mutex<SystemState>,
    #[derivative(Debug = "ignore")]
    executor: Arc<dyn CommandExecutor>,
    #[derivative(Debug = "ignore")]
    battery: Option<Arc<dyn BatterySource>>,
    #[derivative(Debug = "ignore")]
    network: Option<Arc<dyn NetworkSource>>,
    #[derivative(Debug = "ignore")]
    scanner: Arc<dyn WifiScanner>,
}

/// Builder for [`SystemService`]
#[derive(Derivative)]
#[derivative(Debug)]
pub struct SystemServiceBuilder {
    config: ServiceConfig,
    #[derivative(Debug = "ignore")]
    executor: Option<Arc<dyn CommandExecutor>>,
    sources: Sources,
    #[derivative(Debug = "ignore")]
    scanner: Option<Arc<dyn WifiScanner>>,
}

impl SystemServiceBuilder {
    /// Executor used for every dispatch. Defaults to [`ShellExecutor`], or
    /// [`DryRunExecutor`] when `dry_run` is configured.
    pub fn executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Hardware sources refreshed by `get_state`.
    pub fn sources(mut self, sources: Sources) -> Self {
        self.sources = sources;
        self
    }

    /// Provider of wifi scan results. Defaults to [`FixedNetworks`].
    pub fn scanner(mut self, scanner: Arc<dyn WifiScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    #[allow(missing_docs)]
    pub fn build(self) -> SystemService {
        let executor = self.executor.unwrap_or_else(|| {
            if self.config.dry_run {
                info!("Dry run: system commands will only be logged");
                Arc::new(DryRunExecutor)
            } else {
                Arc::new(ShellExecutor::default())
            }
        });
        SystemService {
            config: self.config,
            state: Mutex::new(SystemState::default()),
            executor,
            battery: self.sources.battery,
            network: self.sources.network,
            scanner: self
                .scanner
                .unwrap_or_else(|| Arc::new(FixedNetworks::default())),
        }
    }
}

impl SystemService {
    /// Start building a service configured with `config`.
    pub fn builder(config: ServiceConfig) -> SystemServiceBuilder {
        SystemServiceBuilder {
            config,
            executor: None,
            sources: Sources::default(),
            scanner: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SystemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> SystemState {
        self.lock().clone()
    }

    fn wifi_enabled(&self) -> bool {
        self.lock().wifi_enabled
    }

    /// Refresh hardware fields, then return a copy of the whole record.
    ///
    /// Unreadable sources leave the last known values in place.
    pub async fn get_state(&self) -> SystemState {
        if let Some(battery) = &self.battery {
            match battery.read() {
                Ok(reading) => self.apply_battery_event(reading),
                Err(e) => debug!("Battery refresh failed: {}", e),
            }
        }
        if let Some(network) = &self.network {
            match network.read() {
                Ok(reading) => self.apply_network_event(reading),
                Err(e) => debug!("Network refresh failed: {}", e),
            }
        }
        self.snapshot()
    }

    /// Handle a battery `levelchange`/`chargingchange`.
    pub fn apply_battery_event(&self, reading: BatteryReading) {
        let mut state = self.lock();
        state.battery_level = reading.percent();
        state.battery_charging = reading.charging;
        trace!(
            "Battery at {}% (charging: {})",
            state.battery_level,
            state.battery_charging
        );
    }

    /// Handle a network `online`/`offline` transition.
    ///
    /// Going offline also marks wifi as disabled.
    pub fn apply_network_event(&self, reading: NetworkReading) {
        let mut state = self.lock();
        state.network_type = reading.network_type();
        if !reading.online && state.wifi_enabled {
            info!("Network offline: marking wifi as disabled");
            state.wifi_enabled = false;
        }
    }

    /// Start `command` and log its outcome once it completes.
    ///
    /// `shown` is the only form of the command that reaches the log.
    fn dispatch(&self, command: &str, shown: &str) {
        info!("[EXEC] {}", shown);
        let outcome = self.executor.execute(command);
        let shown = shown.to_owned();
        tokio::spawn(async move {
            match outcome.await {
                Ok(out) if out.is_success() => debug!("`{}` done: {}", shown, out.stdout.trim()),
                Ok(out) => warn!(
                    "`{}` exited with {:?}: {}",
                    shown,
                    out.code,
                    out.stderr.trim()
                ),
                Err(e) => warn!("`{}` failed: {:#}", shown, e),
            }
        });
    }

    /// Dispatch the command planned by `plan` and commit its target value
    /// with `apply`, according to the configured [`CommitMode`].
    ///
    /// `plan` sees the current record and returns the target value together
    /// with the command realizing it. Only that target is ever committed, so
    /// the record cannot disagree with the command that was sent. Returns the
    /// committed target, `None` when a confirmed command failed.
    async fn actuate<T, P>(&self, plan: P, apply: fn(&mut SystemState, T)) -> Option<T>
    where
        T: Copy + Send,
        P: FnOnce(&SystemState) -> (T, String) + Send,
    {
        match self.config.commit_mode {
            CommitMode::Optimistic => {
                let (target, command) = {
                    let mut state = self.lock();
                    let (target, command) = plan(&*state);
                    apply(&mut *state, target);
                    (target, command)
                };
                self.dispatch(&command, &command);
                Some(target)
            }
            CommitMode::Confirmed => {
                let (target, command) = plan(&self.snapshot());
                info!("[EXEC] {}", command);
                match self.executor.execute(&command).await {
                    Ok(out) if out.is_success() => {
                        apply(&mut *self.lock(), target);
                        Some(target)
                    }
                    Ok(out) => {
                        warn!(
                            "`{}` exited with {:?}, state left unchanged",
                            command, out.code
                        );
                        None
                    }
                    Err(e) => {
                        warn!("`{}` failed, state left unchanged: {:#}", command, e);
                        None
                    }
                }
            }
        }
    }

    /// Set the sink volume, clamped to `[0, 100]`.
    pub async fn set_volume(&self, value: i64) {
        let volume = clamp_percent(value);
        self.actuate(
            move |_| {
                let command = format!("pactl set-sink-volume @DEFAULT_SINK@ {}%", volume);
                (volume, command)
            },
            |s, volume| s.volume = volume,
        )
        .await;
    }

    /// Set the backlight brightness, clamped to `[0, 100]`.
    pub async fn set_brightness(&self, value: i64) {
        let brightness = clamp_percent(value);
        self.actuate(
            move |_| (brightness, format!("brightnessctl set {}%", brightness)),
            |s, brightness| s.brightness = brightness,
        )
        .await;
    }

    /// Flip the mute flag and return the committed value (the current one
    /// when a confirmed command fails).
    pub async fn toggle_mute(&self) -> bool {
        let committed = self
            .actuate(
                |s| {
                    let command = "pactl set-sink-mute @DEFAULT_SINK@ toggle".to_string();
                    (!s.is_muted, command)
                },
                |s, muted| s.is_muted = muted,
            )
            .await;
        committed.unwrap_or_else(|| self.lock().is_muted)
    }

    /// Switch the wifi radio and return the committed state (the current
    /// one when a confirmed command fails).
    pub async fn toggle_wifi(&self) -> bool {
        let committed = self
            .actuate(
                |s| {
                    let enabled = !s.wifi_enabled;
                    let command = format!(
                        "nmcli radio wifi {}",
                        if enabled { "on" } else { "off" }
                    );
                    (enabled, command)
                },
                |s, enabled| s.wifi_enabled = enabled,
            )
            .await;
        committed.unwrap_or_else(|| self.wifi_enabled())
    }

    /// Switch the power profile.
    pub async fn set_power_profile(&self, profile: PowerProfile) {
        self.actuate(
            move |_| (profile, format!("powerprofilesctl set {}", profile)),
            |s, profile| s.power_profile = profile,
        )
        .await;
    }

    /// Record the UI theme.
    pub fn set_theme(&self, theme: Theme) {
        info!("Theme set to {}", theme);
        self.lock().theme = theme;
    }

    /// Switch between dark and light theme and return the new one.
    pub fn toggle_theme(&self) -> Theme {
        let mut state = self.lock();
        state.theme = state.theme.toggled();
        info!("Theme set to {}", state.theme);
        state.theme
    }

    /// Record the bluetooth toggle.
    pub fn set_bluetooth(&self, enabled: bool) {
        info!("Bluetooth {}", if enabled { "enabled" } else { "disabled" });
        self.lock().bluetooth_enabled = enabled;
    }

    /// Record a gaming tool toggle.
    pub fn set_gaming_tool(&self, tool: GamingTool, enabled: bool) {
        info!("{:?} enabled: {}", tool, enabled);
        *self.lock().gaming_tool_mut(tool) = enabled;
    }

    /// List visible networks.
    ///
    /// Resolves to an empty list without dispatching anything when wifi is
    /// disabled, and to an empty list as well when wifi gets disabled while
    /// the scan is running. Overlapping scans are independent.
    pub async fn scan_wifi(&self) -> Vec<WifiNetwork> {
        if !self.wifi_enabled() {
            debug!("Wifi is disabled, nothing to scan");
            return Vec::new();
        }
        self.dispatch(SCAN_COMMAND, SCAN_COMMAND);
        tokio::time::sleep(self.config.scan_latency()).await;
        if !self.wifi_enabled() {
            debug!("Wifi disabled during scan");
            return Vec::new();
        }
        let networks = normalize_scan(self.scanner.networks());
        info!("{} wifi networks visible", networks.len());
        networks
    }

    /// Issue a connection attempt to `ssid`.
    ///
    /// Returns `true` once the attempt is dispatched; association is not
    /// awaited. The password never appears in the log.
    pub async fn connect_wifi(&self, ssid: &str, password: Option<Secret>) -> bool {
        let connect = ConnectCommand::new(ssid, password);
        self.dispatch(&connect.command_line(), &connect.redacted());
        tokio::time::sleep(self.config.connect_settle()).await;
        true
    }

    /// Run a power menu action (`shutdown`, `restart`, `sleep`, `switch_plasma`).
    ///
    /// Other values are handled according to [`UnknownActionPolicy`].
    pub async fn system_action(&self, action: &str) -> Result<(), ServiceError> {
        let command = match action.parse::<SystemAction>() {
            Ok(known) => known.command().to_owned(),
            Err(_) => match self.config.unknown_action {
                UnknownActionPolicy::Passthrough => {
                    warn!("Unknown system action {:?}, running it as is", action);
                    action.to_owned()
                }
                UnknownActionPolicy::Reject => {
                    warn!("Refusing unknown system action {:?}", action);
                    return Err(ServiceError::UnknownAction(action.to_owned()));
                }
            },
        };
        self.dispatch(&command, &command);
        Ok(())
    }

    /// Start `command` detached from the launcher process.
    pub async fn launch_app(&self, command: &str) {
        let detached = format!("nohup {} >/dev/null 2>&1 &", command);
        self.dispatch(&detached, &detached);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, MockCommandExecutor};
    use crate::hardware::{HardwareError, MockBatterySource, MockNetworkSource};
    use anyhow::anyhow;
    use futures::future::{ready, FutureExt};
    use std::collections::HashSet;
    use test_log::test;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Executor recording every command and answering with `code`.
    fn recording_executor(code: i32) -> (Arc<MockCommandExecutor>, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().returning(move |cmd| {
            sink.lock().unwrap().push(cmd.to_string());
            ready(Ok(CommandOutput {
                code: Some(code),
                ..Default::default()
            }))
            .boxed()
        });
        (Arc::new(mock), log)
    }

    fn service_with(config: ServiceConfig, executor: Arc<MockCommandExecutor>) -> SystemService {
        SystemService::builder(config).executor(executor).build()
    }

    fn commands(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test(tokio::test)]
    async fn clamp_volume_and_dispatch_pactl() {
        let (executor, log) = recording_executor(0);
        let service = service_with(ServiceConfig::immediate(), executor);
        for (input, expected) in [(120, 100), (-5, 0), (37, 37), (100, 100), (0, 0)] {
            service.set_volume(input).await;
            assert_eq!(service.get_state().await.volume, expected);
        }
        assert_eq!(
            commands(&log)[0],
            "pactl set-sink-volume @DEFAULT_SINK@ 100%"
        );
        assert_eq!(commands(&log)[1], "pactl set-sink-volume @DEFAULT_SINK@ 0%");
    }

    #[test(tokio::test)]
    async fn clamp_brightness_and_dispatch_brightnessctl() {
        let (executor, log) = recording_executor(0);
        let service = service_with(ServiceConfig::immediate(), executor);
        service.set_brightness(-10).await;
        assert_eq!(service.get_state().await.brightness, 0);
        service.set_brightness(55).await;
        assert_eq!(service.get_state().await.brightness, 55);
        assert_eq!(
            commands(&log),
            vec!["brightnessctl set 0%", "brightnessctl set 55%"]
        );
    }

    #[test(tokio::test)]
    async fn restore_mute_after_two_toggles() {
        let (executor, log) = recording_executor(0);
        let service = service_with(ServiceConfig::immediate(), executor);
        let before = service.get_state().await;
        assert!(service.toggle_mute().await);
        assert!(!service.toggle_mute().await);
        assert_eq!(service.get_state().await, before);
        assert_eq!(
            commands(&log),
            vec!["pactl set-sink-mute @DEFAULT_SINK@ toggle"; 2]
        );
    }

    #[test(tokio::test)]
    async fn keep_optimistic_value_when_command_fails() {
        let (executor, log) = recording_executor(1);
        let service = service_with(ServiceConfig::immediate(), executor);
        assert!(!service.toggle_wifi().await);
        service.set_power_profile(PowerProfile::Performance).await;
        let state = service.get_state().await;
        assert!(!state.wifi_enabled);
        assert_eq!(state.power_profile, PowerProfile::Performance);
        assert_eq!(
            commands(&log),
            vec!["nmcli radio wifi off", "powerprofilesctl set performance"]
        );
    }

    #[test(tokio::test)]
    async fn keep_optimistic_value_when_spawn_fails() {
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| ready(Err(anyhow!("no such shell"))).boxed());
        let service = service_with(ServiceConfig::immediate(), Arc::new(mock));
        service.set_volume(80).await;
        assert_eq!(service.get_state().await.volume, 80);
    }

    #[test(tokio::test)]
    async fn commit_only_confirmed_actuations() {
        let config = ServiceConfig {
            commit_mode: CommitMode::Confirmed,
            ..ServiceConfig::immediate()
        };
        let (failing, _) = recording_executor(1);
        let service = service_with(config.clone(), failing);
        service.set_volume(10).await;
        assert!(!service.toggle_mute().await);
        let state = service.get_state().await;
        assert_eq!(state.volume, 50);
        assert!(!state.is_muted);

        let (working, log) = recording_executor(0);
        let service = service_with(config, working);
        service.set_volume(10).await;
        assert!(!service.toggle_wifi().await);
        let state = service.get_state().await;
        assert_eq!(state.volume, 10);
        assert!(!state.wifi_enabled);
        assert_eq!(
            commands(&log),
            vec![
                "pactl set-sink-volume @DEFAULT_SINK@ 10%",
                "nmcli radio wifi off"
            ]
        );
    }

    #[test(tokio::test(start_paused = true))]
    async fn commit_what_overlapping_confirmed_toggles_sent() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().returning(move |cmd| {
            sink.lock().unwrap().push(cmd.to_string());
            async {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(CommandOutput::ok())
            }
            .boxed()
        });
        let config = ServiceConfig {
            commit_mode: CommitMode::Confirmed,
            ..ServiceConfig::immediate()
        };
        let service = service_with(config, Arc::new(mock));
        let (first, second) = tokio::join!(service.toggle_wifi(), service.toggle_wifi());
        assert_eq!(commands(&log), vec!["nmcli radio wifi off"; 2]);
        assert_eq!((first, second), (false, false));
        assert!(!service.get_state().await.wifi_enabled);
    }

    #[test(tokio::test(start_paused = true))]
    async fn keep_offline_wifi_off_after_confirmed_toggle() {
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().returning(|_| {
            async {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(CommandOutput::ok())
            }
            .boxed()
        });
        let config = ServiceConfig {
            commit_mode: CommitMode::Confirmed,
            ..ServiceConfig::immediate()
        };
        let service = service_with(config, Arc::new(mock));
        let toggle = service.toggle_wifi();
        let offline = async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            service.apply_network_event(NetworkReading {
                online: false,
                connection_type: None,
            });
        };
        let (enabled, ()) = tokio::join!(toggle, offline);
        assert!(!enabled);
        assert!(!service.get_state().await.wifi_enabled);
    }

    #[test(tokio::test)]
    async fn not_scan_when_wifi_is_disabled() {
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute()
            .withf(|cmd| cmd == "nmcli radio wifi off")
            .times(1)
            .returning(|_| ready(Ok(CommandOutput::ok())).boxed());
        let service = service_with(ServiceConfig::immediate(), Arc::new(mock));
        assert!(!service.toggle_wifi().await);
        assert!(service.scan_wifi().await.is_empty());
    }

    #[test(tokio::test)]
    async fn return_unique_networks_when_wifi_is_enabled() {
        let (executor, log) = recording_executor(0);
        let service = service_with(ServiceConfig::immediate(), executor);
        let networks = service.scan_wifi().await;
        assert!(!networks.is_empty());
        let ssids: HashSet<&str> = networks.iter().map(|n| n.ssid.as_str()).collect();
        assert_eq!(ssids.len(), networks.len());
        assert_eq!(commands(&log), vec![SCAN_COMMAND]);
    }

    #[test(tokio::test)]
    async fn deduplicate_scanner_output() {
        let (executor, _) = recording_executor(0);
        let scanner = FixedNetworks::new(vec![
            WifiNetwork::new("Dup", 10, true),
            WifiNetwork::new("Dup", 80, true),
        ]);
        let service = SystemService::builder(ServiceConfig::immediate())
            .executor(executor)
            .scanner(Arc::new(scanner))
            .build();
        let networks = service.scan_wifi().await;
        assert_eq!(networks, vec![WifiNetwork::new("Dup", 80, true)]);
    }

    #[test(tokio::test(start_paused = true))]
    async fn honour_scan_latency_floor() {
        let (executor, _) = recording_executor(0);
        let service = service_with(ServiceConfig::default(), executor);
        let start = tokio::time::Instant::now();
        service.scan_wifi().await;
        assert!(start.elapsed() >= std::time::Duration::from_millis(1500));
    }

    #[test(tokio::test)]
    async fn connect_with_real_password_and_report_dispatch() {
        let (executor, log) = recording_executor(1);
        let service = service_with(ServiceConfig::immediate(), executor);
        assert!(
            service
                .connect_wifi("Home_Network_5G", Some(Secret::new("hunter2")))
                .await
        );
        assert_eq!(
            commands(&log),
            vec![r#"nmcli dev wifi connect "Home_Network_5G" password "hunter2""#]
        );
    }

    #[test(tokio::test)]
    async fn map_system_actions() -> anyhow::Result<()> {
        let (executor, log) = recording_executor(0);
        let service = service_with(ServiceConfig::immediate(), executor);
        service.system_action("shutdown").await?;
        service.system_action("restart").await?;
        service.system_action("sleep").await?;
        service.system_action("switch_plasma").await?;
        service.system_action("loginctl lock-session").await?;
        assert_eq!(
            commands(&log),
            vec![
                "systemctl poweroff",
                "systemctl reboot",
                "systemctl suspend",
                "qdbus org.kde.ksmserver /KSMServer logout 0 0 0",
                "loginctl lock-session",
            ]
        );
        Ok(())
    }

    #[test(tokio::test)]
    async fn reject_unknown_actions_when_configured() {
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().times(0);
        let config = ServiceConfig {
            unknown_action: UnknownActionPolicy::Reject,
            ..ServiceConfig::immediate()
        };
        let service = service_with(config, Arc::new(mock));
        assert_eq!(
            service.system_action("rm -rf /").await,
            Err(ServiceError::UnknownAction("rm -rf /".to_string()))
        );
    }

    #[test(tokio::test)]
    async fn detach_launched_apps() {
        let (executor, log) = recording_executor(0);
        let service = service_with(ServiceConfig::immediate(), executor);
        service.launch_app("flatpak run net.lutris.Lutris").await;
        assert_eq!(
            commands(&log),
            vec!["nohup flatpak run net.lutris.Lutris >/dev/null 2>&1 &"]
        );
    }

    #[test(tokio::test)]
    async fn track_settings_without_dispatch() {
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().times(0);
        let service = service_with(ServiceConfig::immediate(), Arc::new(mock));
        assert_eq!(service.toggle_theme(), Theme::Light);
        service.set_bluetooth(true);
        service.set_gaming_tool(GamingTool::Mangohud, true);
        service.set_gaming_tool(GamingTool::Gamescope, false);
        let state = service.get_state().await;
        assert_eq!(state.theme, Theme::Light);
        assert!(state.bluetooth_enabled);
        assert!(state.mangohud_enabled);
        assert!(!state.gamescope_enabled);
        service.set_theme(Theme::Dark);
        assert_eq!(service.get_state().await.theme, Theme::Dark);
    }

    #[test(tokio::test)]
    async fn return_equal_records_on_repeated_reads() {
        let mut battery = MockBatterySource::new();
        battery.expect_read().returning(|| {
            Ok(BatteryReading {
                level: 0.42,
                charging: true,
            })
        });
        let mut network = MockNetworkSource::new();
        network.expect_read().returning(|| {
            Ok(NetworkReading {
                online: true,
                connection_type: Some("ethernet".to_string()),
            })
        });
        let (executor, _) = recording_executor(0);
        let service = SystemService::builder(ServiceConfig::immediate())
            .executor(executor)
            .sources(Sources {
                battery: Some(Arc::new(battery)),
                network: Some(Arc::new(network)),
            })
            .build();
        let first = service.get_state().await;
        let second = service.get_state().await;
        assert_eq!(first, second);
        assert_eq!(first.battery_level, 42);
        assert!(first.battery_charging);
        assert_eq!(first.network_type, "ethernet");
    }

    #[test(tokio::test)]
    async fn keep_last_known_values_when_sources_fail() {
        let mut battery = MockBatterySource::new();
        battery
            .expect_read()
            .returning(|| Err(HardwareError::Unavailable("Battery")));
        let mut network = MockNetworkSource::new();
        network
            .expect_read()
            .returning(|| Err(HardwareError::Unavailable("Network state")));
        let service = SystemService::builder(ServiceConfig::immediate())
            .sources(Sources {
                battery: Some(Arc::new(battery)),
                network: Some(Arc::new(network)),
            })
            .build();
        let state = service.get_state().await;
        assert_eq!(state, SystemState::default());
    }

    #[test(tokio::test)]
    async fn update_only_battery_fields_on_battery_event() {
        let (executor, _) = recording_executor(0);
        let service = service_with(ServiceConfig::immediate(), executor);
        let before = service.get_state().await;
        service.apply_battery_event(BatteryReading {
            level: 0.157,
            charging: true,
        });
        let after = service.get_state().await;
        assert_eq!(after.battery_level, 16);
        assert!(after.battery_charging);
        assert_eq!(
            SystemState {
                battery_level: before.battery_level,
                battery_charging: before.battery_charging,
                ..after
            },
            before
        );
    }

    #[test(tokio::test)]
    async fn disable_wifi_when_going_offline() {
        let (executor, log) = recording_executor(0);
        let service = service_with(ServiceConfig::immediate(), executor);
        assert!(service.get_state().await.wifi_enabled);
        service.apply_network_event(NetworkReading {
            online: false,
            connection_type: None,
        });
        let state = service.get_state().await;
        assert!(!state.wifi_enabled);
        assert_eq!(state.network_type, "none");
        assert!(commands(&log).is_empty());

        service.apply_network_event(NetworkReading {
            online: true,
            connection_type: Some("wifi".to_string()),
        });
        let state = service.get_state().await;
        assert_eq!(state.network_type, "wifi");
        assert!(!state.wifi_enabled);
    }
}
