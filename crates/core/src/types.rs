use serde::{Deserialize, Serialize};

/// One power-supply sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Battery charge, 0–100.
    pub percent: u8,
    /// True while an adapter is supplying power.
    pub charging: bool,
}

impl Reading {
    pub fn charging(percent: u8) -> Self {
        Self { percent, charging: true }
    }

    pub fn discharging(percent: u8) -> Self {
        Self { percent, charging: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidThresholds {
    #[error("{name} must be within 0..=100, got {value}")]
    OutOfRange { name: &'static str, value: i64 },
    #[error("critical percentage ({critical}) must be below minimal percentage ({minimal})")]
    CriticalNotBelowMinimal { minimal: u8, critical: u8 },
}

/// Alert thresholds. Constructed once at startup; `critical < minimal` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    minimal: u8,
    critical: u8,
}

impl Thresholds {
    pub fn new(minimal: i64, critical: i64) -> Result<Self, InvalidThresholds> {
        let minimal = percent_in_range("batteryPercentageMinimal", minimal)?;
        let critical = percent_in_range("batteryPercentageCritical", critical)?;
        if critical >= minimal {
            return Err(InvalidThresholds::CriticalNotBelowMinimal { minimal, critical });
        }
        Ok(Self { minimal, critical })
    }

    pub fn minimal(&self) -> u8 {
        self.minimal
    }

    pub fn critical(&self) -> u8 {
        self.critical
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { minimal: 30, critical: 10 }
    }
}

fn percent_in_range(name: &'static str, value: i64) -> Result<u8, InvalidThresholds> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or(InvalidThresholds::OutOfRange { name, value })
}
