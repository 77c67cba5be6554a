//! Wifi scan results and connection command lines.
//!
//! Scanning itself is driven by [`SystemService::scan_wifi`](crate::service::SystemService::scan_wifi);
//! this module provides the result set ([`WifiScanner`]) and the command
//! builders for listing and connecting.
use std::collections::HashMap;

use crate::secret::{Secret, REDACTED};
use crate::state::WifiNetwork;

/// Command listing visible access points.
pub const SCAN_COMMAND: &str = "nmcli -t -f SSID,SIGNAL dev wifi list";

/// Provider of the access points visible after a scan.
#[cfg_attr(test, mockall::automock)]
pub trait WifiScanner: Send + Sync {
    /// Fresh result set for one scan.
    fn networks(&self) -> Vec<WifiNetwork>;
}

/// Scanner returning a fixed result set.
#[derive(Debug, Clone)]
pub struct FixedNetworks(Vec<WifiNetwork>);

impl FixedNetworks {
    #[allow(missing_docs)]
    pub fn new(networks: Vec<WifiNetwork>) -> Self {
        Self(networks)
    }
}

impl Default for FixedNetworks {
    fn default() -> Self {
        Self(vec![
            WifiNetwork::new("Home_Network_5G", 95, true),
            WifiNetwork::new("Free_Public_WiFi", 60, false),
            WifiNetwork::new("Neighbor_Wifi", 30, true),
            WifiNetwork::new("HackerOS_Hotspot", 100, true),
        ])
    }
}

impl WifiScanner for FixedNetworks {
    fn networks(&self) -> Vec<WifiNetwork> {
        self.0.clone()
    }
}

/// Keep one entry per SSID (the strongest), drop hidden networks and sort
/// by decreasing signal.
pub fn normalize_scan(networks: Vec<WifiNetwork>) -> Vec<WifiNetwork> {
    let mut best: HashMap<String, WifiNetwork> = HashMap::new();
    for net in networks.into_iter().filter(|n| !n.ssid.is_empty()) {
        match best.get(&net.ssid) {
            Some(kept) if kept.signal >= net.signal => {}
            _ => {
                best.insert(net.ssid.clone(), net);
            }
        }
    }
    let mut res: Vec<WifiNetwork> = best.into_values().collect();
    res.sort_by(|a, b| b.signal.cmp(&a.signal).then_with(|| a.ssid.cmp(&b.ssid)));
    res
}

/// Escape `s` for use between double quotes in a POSIX shell.
fn escape_double_quoted(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            res.push('\\');
        }
        res.push(c);
    }
    res
}

/// `nmcli` invocation joining a network, with its log-safe twin.
#[derive(Debug, Clone)]
pub struct ConnectCommand {
    ssid: String,
    password: Option<Secret>,
}

impl ConnectCommand {
    #[allow(missing_docs)]
    pub fn new(ssid: &str, password: Option<Secret>) -> Self {
        Self {
            ssid: ssid.to_owned(),
            password,
        }
    }

    fn render(&self, password: &str) -> String {
        format!(
            "nmcli dev wifi connect \"{}\" password \"{}\"",
            escape_double_quoted(&self.ssid),
            escape_double_quoted(password)
        )
    }

    /// Command line handed to the executor.
    pub fn command_line(&self) -> String {
        self.render(self.password.as_ref().map(Secret::expose).unwrap_or(""))
    }

    /// Command line with the password masked, the only form that may be logged.
    pub fn redacted(&self) -> String {
        self.render(match &self.password {
            Some(p) if !p.is_empty() => REDACTED,
            _ => "",
        })
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn provide_unique_default_networks() {
        let nets = normalize_scan(FixedNetworks::default().networks());
        assert_eq!(nets.len(), 4);
        assert_eq!(nets[0].ssid, "HackerOS_Hotspot");
        assert_eq!(nets[3].ssid, "Neighbor_Wifi");
    }

    #[test]
    fn keep_strongest_duplicate() {
        let nets = normalize_scan(vec![
            WifiNetwork::new("Cafe", 20, false),
            WifiNetwork::new("", 99, false),
            WifiNetwork::new("Cafe", 70, false),
            WifiNetwork::new("Home", 50, true),
        ]);
        assert_eq!(
            nets,
            vec![
                WifiNetwork::new("Cafe", 70, false),
                WifiNetwork::new("Home", 50, true)
            ]
        );
    }

    #[test]
    fn build_connect_command() {
        let cmd = ConnectCommand::new("Home_Network_5G", Some(Secret::new("s3cret")));
        assert_eq!(
            cmd.command_line(),
            r#"nmcli dev wifi connect "Home_Network_5G" password "s3cret""#
        );
        assert_eq!(
            cmd.redacted(),
            r#"nmcli dev wifi connect "Home_Network_5G" password "***""#
        );
        assert!(!format!("{:?}", cmd).contains("s3cret"));
    }

    #[test]
    fn build_connect_command_without_password() {
        let cmd = ConnectCommand::new("Free_Public_WiFi", None);
        assert_eq!(
            cmd.command_line(),
            r#"nmcli dev wifi connect "Free_Public_WiFi" password """#
        );
        assert_eq!(cmd.redacted(), cmd.command_line());
    }

    #[test]
    fn escape_shell_sensitive_characters() {
        let cmd = ConnectCommand::new(r#"My "Net" $HOME"#, Some(Secret::new("a`b\\c")));
        assert_eq!(
            cmd.command_line(),
            r#"nmcli dev wifi connect "My \"Net\" \$HOME" password "a\`b\\c""#
        );
    }
}
