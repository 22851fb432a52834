use chrono::{DateTime, Utc};

use battmon_notify::EventKind;

/// Per-episode memory. An episode is a maximal run of polls with the same
/// charging polarity; the state is reset in place whenever polarity flips.
///
/// The four notified flags are committed by the poll loop only after a
/// delivery succeeds, so a failed send is re-attempted on the next qualifying
/// tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeState {
    pub charging_notified: bool,
    pub adapter_unplugged_notified: bool,
    pub below_minimum_notified: bool,
    pub at_critical_notified: bool,
    /// Polarity observed at episode start. `None` until the first reading.
    pub episode_charging: Option<bool>,
    /// Most recent percent seen below the minimal threshold. Trend logging only.
    pub last_percent: Option<u8>,
    /// When the current discharge episode was first observed.
    pub unplugged_since: Option<DateTime<Utc>>,
}

impl EpisodeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new episode if `charging` differs from the current polarity.
    /// The very first observation always starts one. Returns true on reset.
    pub fn observe_polarity(&mut self, charging: bool) -> bool {
        if self.episode_charging == Some(charging) {
            return false;
        }
        *self = Self {
            episode_charging: Some(charging),
            ..Self::default()
        };
        true
    }

    pub fn is_notified(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::SystemCharging => self.charging_notified,
            EventKind::AdapterUnplugged => self.adapter_unplugged_notified,
            EventKind::BatteryBelowMinimum => self.below_minimum_notified,
            EventKind::BatteryAtCritical => self.at_critical_notified,
        }
    }

    /// Commit a successful delivery.
    pub fn mark_notified(&mut self, kind: EventKind) {
        let flag = match kind {
            EventKind::SystemCharging => &mut self.charging_notified,
            EventKind::AdapterUnplugged => &mut self.adapter_unplugged_notified,
            EventKind::BatteryBelowMinimum => &mut self.below_minimum_notified,
            EventKind::BatteryAtCritical => &mut self.at_critical_notified,
        };
        *flag = true;
    }

    /// True when no event has been committed in this episode yet.
    pub fn is_fresh(&self) -> bool {
        EventKind::ALL.iter().all(|k| !self.is_notified(*k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_starts_episode() {
        let mut s = EpisodeState::new();
        assert!(s.observe_polarity(false));
        assert_eq!(s.episode_charging, Some(false));
        assert!(s.is_fresh());
    }

    #[test]
    fn same_polarity_keeps_flags() {
        let mut s = EpisodeState::new();
        s.observe_polarity(false);
        s.mark_notified(EventKind::AdapterUnplugged);
        assert!(!s.observe_polarity(false));
        assert!(s.is_notified(EventKind::AdapterUnplugged));
    }

    #[test]
    fn flip_clears_every_flag_and_episode_fields() {
        let mut s = EpisodeState::new();
        s.observe_polarity(false);
        for kind in EventKind::ALL {
            s.mark_notified(kind);
        }
        s.last_percent = Some(12);
        s.unplugged_since = Some(Utc::now());

        assert!(s.observe_polarity(true));
        assert!(s.is_fresh());
        assert_eq!(s.episode_charging, Some(true));
        assert_eq!(s.last_percent, None);
        assert_eq!(s.unplugged_since, None);
    }
}
