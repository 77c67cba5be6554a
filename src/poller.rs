//! Periodic republishing of the system state and the clock.
use chrono::Local;
use futures::future::{ready, BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::config::PollerConfig;
use crate::display::StatusDisplay;
use crate::service::SystemService;
use crate::shutdown::ShutdownSignal;

/// Starts the status bar timers.
pub struct StatusPoller;

/// Running status bar timers.
///
/// [`PollerHandle::stop`] ends them gracefully; dropping the handle aborts
/// whatever is still running.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: ShutdownSignal,
    tasks: Vec<JoinHandle<()>>,
}

/// Run `tick` every `period` until `shutdown` is requested. The first call
/// happens right away.
fn every<F>(
    name: &'static str,
    period: Duration,
    shutdown: ShutdownSignal,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    trace!("{} tick", name);
                    tick().await;
                }
            }
        }
        debug!("{} timer stopped", name);
    })
}

impl StatusPoller {
    /// Publish `service` state every `state_ms` and the time every
    /// `clock_ms` to `display`.
    pub fn start(
        service: Arc<SystemService>,
        display: Arc<dyn StatusDisplay>,
        config: &PollerConfig,
    ) -> PollerHandle {
        let shutdown = ShutdownSignal::new();
        let state_display = display.clone();
        let state = every("state", config.state_period(), shutdown.clone(), move || {
            let service = service.clone();
            let display = state_display.clone();
            async move {
                let state = service.get_state().await;
                display.show_state(&state);
            }
            .boxed()
        });
        let clock = every("clock", config.clock_period(), shutdown.clone(), move || {
            display.show_clock(Local::now());
            ready(()).boxed()
        });
        PollerHandle {
            shutdown,
            tasks: vec![state, clock],
        }
    }
}

impl PollerHandle {
    /// Cancel both timers and wait for them to finish.
    pub async fn stop(mut self) {
        self.shutdown.request_shutdown();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                debug!("Timer ended abnormally: {}", e);
            }
        }
    }

    /// `true` while at least one timer still runs.
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::state::SystemState;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_log::test;

    #[derive(Default)]
    struct Counting {
        states: AtomicUsize,
        clocks: AtomicUsize,
    }

    impl StatusDisplay for Counting {
        fn show_state(&self, _state: &SystemState) {
            self.states.fetch_add(1, Ordering::SeqCst);
        }
        fn show_clock(&self, _now: DateTime<Local>) {
            self.clocks.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Counting {
        fn counts(&self) -> (usize, usize) {
            (
                self.states.load(Ordering::SeqCst),
                self.clocks.load(Ordering::SeqCst),
            )
        }
    }

    fn service() -> Arc<SystemService> {
        Arc::new(SystemService::builder(ServiceConfig::immediate()).build())
    }

    #[test(tokio::test(start_paused = true))]
    async fn publish_at_configured_cadence() {
        let display = Arc::new(Counting::default());
        let handle = StatusPoller::start(service(), display.clone(), &PollerConfig::default());
        tokio::time::sleep(Duration::from_millis(4500)).await;
        // state at 0, 2 and 4 s; clock every second from 0 to 4 s
        assert_eq!(display.counts(), (3, 5));
        handle.stop().await;
    }

    #[test(tokio::test(start_paused = true))]
    async fn stop_both_timers() {
        let display = Arc::new(Counting::default());
        let handle = StatusPoller::start(service(), display.clone(), &PollerConfig::default());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_running());
        handle.stop().await;
        let stopped = display.counts();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(display.counts(), stopped);
    }

    #[test(tokio::test(start_paused = true))]
    async fn abort_timers_when_dropped() {
        let display = Arc::new(Counting::default());
        let handle = StatusPoller::start(service(), display.clone(), &PollerConfig::default());
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let dropped = display.counts();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(display.counts(), dropped);
    }
}
