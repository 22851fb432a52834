use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use battmon_notify::{EventKind, NotificationEvent, Notifier, NotifyError};

use super::shutdown::ShutdownGuard;
use crate::engine::{self, Band, Decision, EpisodeState, Trend};
use crate::environment::{PowerSource, SystemControl};
use crate::types::{Reading, Thresholds};

/// Fixed poll cadence.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2500);
/// Upper bound on one notification attempt, so a hung sink can't stall the loop.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// What one tick did. Returned for tests and logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// `None` when the power source could not be read and the tick was skipped.
    pub reading: Option<Reading>,
    pub delivered: Vec<EventKind>,
    pub failed: Vec<EventKind>,
    pub shutdown_requested: bool,
}

/// The poll loop. Owns the episode state; ticks never overlap because each one
/// is awaited to completion before the interval is polled again.
pub struct Runtime {
    thresholds: Thresholds,
    source: Arc<dyn PowerSource>,
    notifier: Arc<dyn Notifier>,
    control: Arc<dyn SystemControl>,
    state: EpisodeState,
    shutdown: ShutdownGuard,
    tick_count: u64,
    notify_timeout: Duration,
}

impl Runtime {
    pub fn new(
        thresholds: Thresholds,
        source: Arc<dyn PowerSource>,
        notifier: Arc<dyn Notifier>,
        control: Arc<dyn SystemControl>,
    ) -> Self {
        Self {
            thresholds,
            source,
            notifier,
            control,
            state: EpisodeState::new(),
            shutdown: ShutdownGuard::new(),
            tick_count: 0,
            notify_timeout: NOTIFY_TIMEOUT,
        }
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    /// Returns the cancellation token that stops [`Runtime::run`].
    pub fn token(&self) -> CancellationToken {
        self.shutdown.token()
    }

    pub fn state(&self) -> &EpisodeState {
        &self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Start the signal listener and poll until cancelled. Missed intervals are
    /// skipped rather than bunched up.
    pub async fn run(&mut self) {
        let listener = self.shutdown.spawn_signal_listener();
        let token = self.shutdown.token();

        tracing::info!(
            minimal = self.thresholds.minimal(),
            critical = self.thresholds.critical(),
            interval_ms = POLL_INTERVAL.as_millis() as u64,
            notifier = self.notifier.name(),
            "battery monitor started"
        );

        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(
                        tick_count = self.tick_count,
                        "shutdown signal received, exiting poll loop"
                    );
                    break;
                },
                _ = interval.tick() => {
                    self.tick().await;
                },
            }
        }

        if let Err(e) = listener.await {
            tracing::warn!(error = %e, "signal listener task failed");
        }
        tracing::info!("battery monitor stopped");
    }

    /// Single tick: read → evaluate → notify → commit → shutdown.
    pub async fn tick(&mut self) -> TickReport {
        self.tick_count += 1;
        let span = tracing::info_span!("tick", n = self.tick_count);
        self.tick_inner().instrument(span).await
    }

    async fn tick_inner(&mut self) -> TickReport {
        let mut report = TickReport::default();

        let reading = match self.source.read().await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(error = %e, "power source unavailable, skipping tick");
                return report;
            }
        };
        report.reading = Some(reading);

        let decision = engine::evaluate(reading, &self.thresholds, &mut self.state, Utc::now());
        self.log_decision(reading, &decision);

        for event in decision.events {
            let kind = event.kind();
            match self.deliver(event).await {
                Ok(()) => {
                    self.state.mark_notified(kind);
                    tracing::info!(%kind, percent = event.percent(), "notification sent");
                    report.delivered.push(kind);
                }
                Err(e) => {
                    tracing::warn!(%kind, error = %e, "notification failed, will retry next tick");
                    report.failed.push(kind);
                }
            }
        }

        if decision.shutdown_requested {
            report.shutdown_requested = true;
            tracing::warn!(
                percent = reading.percent,
                critical = self.thresholds.critical(),
                "battery at critical level, shutting down"
            );
            // Last action of the tick; nothing is scheduled after it.
            if let Err(e) = self.control.shutdown().await {
                tracing::error!(error = %e, "shutdown request failed");
            }
        }

        report
    }

    async fn deliver(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        tracing::debug!(
            kind = %event.kind(),
            notifier = self.notifier.name(),
            "sending notification"
        );
        tokio::time::timeout(self.notify_timeout, self.notifier.send(event))
            .await
            .map_err(|_| NotifyError::TimedOut(self.notify_timeout))?
    }

    fn log_decision(&self, reading: Reading, decision: &Decision) {
        if decision.episode_started {
            tracing::info!(
                charging = reading.charging,
                percent = reading.percent,
                "power episode started"
            );
        }

        match decision.trend {
            Some(Trend::Entered { percent }) => {
                tracing::debug!(percent, "battery percentage entered low range");
            }
            Some(Trend::Increased { from, to }) => {
                tracing::debug!(from, to, "battery percentage increased");
            }
            Some(Trend::Decreased { from, to }) => {
                tracing::debug!(from, to, "battery percentage decreased");
            }
            None => {}
        }

        match decision.band {
            Band::Charging => {
                tracing::debug!(
                    percent = reading.percent,
                    "system is charging, skipping battery check"
                );
            }
            Band::Healthy => {
                tracing::debug!(percent = reading.percent, "battery above minimum, skipping");
            }
            Band::BelowMinimum => {
                if decision.kinds().contains(&EventKind::BatteryBelowMinimum) {
                    tracing::info!(
                        percent = reading.percent,
                        minimal = self.thresholds.minimal(),
                        "battery percentage is below minimum"
                    );
                }
            }
            Band::Critical => {}
        }
    }
}
