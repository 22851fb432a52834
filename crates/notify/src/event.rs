use serde::{Deserialize, Serialize};
use std::fmt;

/// The four event kinds a monitor can report. Each is delivered at most once
/// per charging/discharging episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    SystemCharging,
    AdapterUnplugged,
    BatteryBelowMinimum,
    BatteryAtCritical,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::SystemCharging,
        EventKind::AdapterUnplugged,
        EventKind::BatteryBelowMinimum,
        EventKind::BatteryAtCritical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SystemCharging => "system_charging",
            Self::AdapterUnplugged => "adapter_unplugged",
            Self::BatteryBelowMinimum => "battery_below_minimum",
            Self::BatteryAtCritical => "battery_at_critical",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed notification payload. Formatting into text happens only at the
/// notifier boundary (see [`crate::embed`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    SystemCharging {
        percent: u8,
    },
    AdapterUnplugged {
        percent: u8,
    },
    BatteryBelowMinimum {
        percent: u8,
        minimal: u8,
        critical: u8,
    },
    BatteryAtCritical {
        percent: u8,
        critical: u8,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SystemCharging { .. } => EventKind::SystemCharging,
            Self::AdapterUnplugged { .. } => EventKind::AdapterUnplugged,
            Self::BatteryBelowMinimum { .. } => EventKind::BatteryBelowMinimum,
            Self::BatteryAtCritical { .. } => EventKind::BatteryAtCritical,
        }
    }

    pub fn percent(&self) -> u8 {
        match *self {
            Self::SystemCharging { percent }
            | Self::AdapterUnplugged { percent }
            | Self::BatteryBelowMinimum { percent, .. }
            | Self::BatteryAtCritical { percent, .. } => percent,
        }
    }

    /// Placeholder values available to templates for this event.
    pub fn variables(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![("batteryPercentage", self.percent().to_string())];
        match *self {
            Self::BatteryBelowMinimum {
                minimal, critical, ..
            } => {
                vars.push(("batteryPercentageMinimal", minimal.to_string()));
                vars.push(("batteryPercentageCritical", critical.to_string()));
            }
            Self::BatteryAtCritical { critical, .. } => {
                vars.push(("batteryPercentageCritical", critical.to_string()));
            }
            Self::SystemCharging { .. } | Self::AdapterUnplugged { .. } => {}
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            NotificationEvent::SystemCharging { percent: 80 }.kind(),
            EventKind::SystemCharging
        );
        assert_eq!(
            NotificationEvent::BatteryAtCritical { percent: 5, critical: 10 }.kind(),
            EventKind::BatteryAtCritical
        );
    }

    #[test]
    fn below_minimum_exposes_both_thresholds() {
        let ev = NotificationEvent::BatteryBelowMinimum {
            percent: 25,
            minimal: 30,
            critical: 10,
        };
        let vars = ev.variables();
        assert!(vars.contains(&("batteryPercentage", "25".to_string())));
        assert!(vars.contains(&("batteryPercentageMinimal", "30".to_string())));
        assert!(vars.contains(&("batteryPercentageCritical", "10".to_string())));
    }

    #[test]
    fn charging_exposes_only_percentage() {
        let vars = NotificationEvent::SystemCharging { percent: 42 }.variables();
        assert_eq!(vars, vec![("batteryPercentage", "42".to_string())]);
    }
}
