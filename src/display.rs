//! Status bar rendering.
use chrono::{DateTime, Local};
use std::sync::Mutex;

use crate::state::SystemState;

/// Battery percentage under which the status bar flags the battery.
pub const LOW_BATTERY_PERCENT: u8 = 20;

/// Sink for what the status poller publishes.
pub trait StatusDisplay: Send + Sync {
    /// New system state from the 2 s refresh.
    fn show_state(&self, state: &SystemState);
    /// New time from the 1 s clock.
    fn show_clock(&self, now: DateTime<Local>);
}

/// Render the one line status bar.
///
/// ```
/// use lib::display::status_line;
/// use lib::state::SystemState;
/// use chrono::{Local, TimeZone};
/// let now = Local.with_ymd_and_hms(2024, 5, 1, 14, 5, 0).unwrap();
/// let state = SystemState { battery_level: 12, ..Default::default() };
/// assert_eq!(status_line(&state, now), "HACKER MODE | wifi on | vol 50% | battery 12% LOW | 14:05");
/// ```
pub fn status_line(state: &SystemState, now: DateTime<Local>) -> String {
    let wifi = if state.wifi_enabled { "on" } else { "off" };
    let volume = if state.is_muted {
        "muted".to_string()
    } else {
        format!("{}%", state.volume)
    };
    let battery = if state.battery_charging {
        format!("{}% (charging)", state.battery_level)
    } else if state.battery_level < LOW_BATTERY_PERCENT {
        format!("{}% LOW", state.battery_level)
    } else {
        format!("{}%", state.battery_level)
    };
    format!(
        "HACKER MODE | wifi {} | vol {} | battery {} | {}",
        wifi,
        volume,
        battery,
        now.format("%H:%M")
    )
}

#[derive(Debug, Default)]
struct Shown {
    state: Option<SystemState>,
    now: Option<DateTime<Local>>,
    line: String,
}

/// Status bar printed on standard error whenever its text changes.
#[derive(Debug, Default)]
pub struct TerminalStatusBar {
    shown: Mutex<Shown>,
}

impl TerminalStatusBar {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    fn redraw(&self, update: impl FnOnce(&mut Shown)) {
        let mut shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut shown);
        let (Some(state), Some(now)) = (&shown.state, shown.now) else {
            return;
        };
        let line = status_line(state, now);
        if line != shown.line {
            eprintln!("{}", line);
            shown.line = line;
        }
    }
}

impl StatusDisplay for TerminalStatusBar {
    fn show_state(&self, state: &SystemState) {
        self.redraw(|shown| shown.state = Some(state.clone()));
    }

    fn show_clock(&self, now: DateTime<Local>) {
        self.redraw(|shown| shown.now = Some(now));
    }
}
