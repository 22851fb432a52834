use chrono::{DateTime, Utc};

use battmon_notify::{EventKind, NotificationEvent};

use super::episode::EpisodeState;
use crate::types::{Reading, Thresholds};

/// Where a reading falls relative to the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Charging,
    /// Discharging, above the minimal threshold.
    Healthy,
    /// Discharging, `critical < percent <= minimal`.
    BelowMinimum,
    /// Discharging, `percent <= critical`.
    Critical,
}

/// Local-only trend observation, produced while below the minimal threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// First low reading of the episode.
    Entered { percent: u8 },
    Increased { from: u8, to: u8 },
    Decreased { from: u8, to: u8 },
}

/// Outcome of one evaluation. Events are intents: the caller delivers them and
/// commits the matching flag with [`EpisodeState::mark_notified`] on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub events: Vec<NotificationEvent>,
    pub shutdown_requested: bool,
    pub band: Band,
    pub trend: Option<Trend>,
    /// The reading opened a new episode.
    pub episode_started: bool,
}

impl Decision {
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.iter().map(NotificationEvent::kind).collect()
    }
}

/// Classify `reading` and decide what to report.
///
/// Polarity is checked first; a flip resets `state` before anything else is
/// evaluated. Discharge checks run in a fixed order (unplugged, healthy
/// cut-off, trend, below-minimum, critical) and several events can come out of
/// one call. At or below critical, shutdown is requested on every call.
pub fn evaluate(
    reading: Reading,
    thresholds: &Thresholds,
    state: &mut EpisodeState,
    now: DateTime<Utc>,
) -> Decision {
    let episode_started = state.observe_polarity(reading.charging);
    let percent = reading.percent;
    let mut events = Vec::new();

    if reading.charging {
        if !state.charging_notified {
            events.push(NotificationEvent::SystemCharging { percent });
        }
        return Decision {
            events,
            shutdown_requested: false,
            band: Band::Charging,
            trend: None,
            episode_started,
        };
    }

    if !state.adapter_unplugged_notified {
        events.push(NotificationEvent::AdapterUnplugged { percent });
    }
    state.unplugged_since.get_or_insert(now);

    let minimal = thresholds.minimal();
    let critical = thresholds.critical();

    if percent > minimal {
        return Decision {
            events,
            shutdown_requested: false,
            band: Band::Healthy,
            trend: None,
            episode_started,
        };
    }

    let trend = match state.last_percent {
        Some(prev) if prev == percent => None,
        Some(prev) if percent > prev => Some(Trend::Increased { from: prev, to: percent }),
        Some(prev) => Some(Trend::Decreased { from: prev, to: percent }),
        None => Some(Trend::Entered { percent }),
    };
    state.last_percent = Some(percent);

    if percent > critical {
        if !state.below_minimum_notified {
            events.push(NotificationEvent::BatteryBelowMinimum {
                percent,
                minimal,
                critical,
            });
        }
        return Decision {
            events,
            shutdown_requested: false,
            band: Band::BelowMinimum,
            trend,
            episode_started,
        };
    }

    if !state.at_critical_notified {
        events.push(NotificationEvent::BatteryAtCritical { percent, critical });
    }
    Decision {
        events,
        shutdown_requested: true,
        band: Band::Critical,
        trend,
        episode_started,
    }
}
