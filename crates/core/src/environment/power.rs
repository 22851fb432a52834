use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::types::Reading;

pub const DEFAULT_POWER_SUPPLY_PATH: &str = "/sys/class/power_supply";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no system battery under {0}")]
    NoBattery(PathBuf),
    #[error("unexpected value {value:?} in {path}")]
    Malformed { path: PathBuf, value: String },
}

/// Anything that can report the current battery reading.
#[async_trait::async_trait]
pub trait PowerSource: Send + Sync {
    async fn read(&self) -> Result<Reading, SourceError>;
}

/// Reads `/sys/class/power_supply/*`.
///
/// The first system battery (by directory name) supplies `capacity`. Charging
/// is true when any mains/USB adapter reports `online = 1`; without an adapter
/// entry the battery `status` decides.
#[derive(Debug, Clone)]
pub struct SysfsPowerSource {
    root: PathBuf,
}

impl SysfsPowerSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[derive(Debug)]
struct Supply {
    name: String,
    kind: Option<String>,
    scope: Option<String>,
    capacity: Option<String>,
    online: Option<String>,
    status: Option<String>,
    /// First attribute that existed but could not be read.
    fault: Option<SourceError>,
}

impl Supply {
    fn is_peripheral(&self) -> bool {
        self.scope.as_deref() == Some("Device")
    }

    /// Peripheral batteries (mice, headsets) report `scope = Device`.
    fn is_system_battery(&self) -> bool {
        (self.capacity.is_some() || self.fault.is_some())
            && self.kind.as_deref().is_none_or(|k| k == "Battery")
            && !self.is_peripheral()
    }

    /// Mains, USB and wireless chargers. Batteries of any scope never count,
    /// even when they expose `online`.
    fn is_adapter(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k != "Battery") && !self.is_peripheral()
    }
}

/// `Ok(None)` when the attribute does not exist.
async fn read_attr(path: &Path) -> Result<Option<String>, SourceError> {
    match tokio::fs::read_to_string(path).await {
        Ok(s) => Ok(Some(s.trim().to_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SourceError::Unreadable {
            path: path.to_owned(),
            source,
        }),
    }
}

impl SysfsPowerSource {
    async fn scan(&self) -> Result<Vec<Supply>, SourceError> {
        let unreadable = |source| SourceError::Unreadable {
            path: self.root.clone(),
            source,
        };
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(unreadable)?;

        let mut supplies = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(unreadable)? {
            supplies.push(read_supply(entry.path()).await);
        }
        supplies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(supplies)
    }

    fn malformed(&self, supply: &Supply, attr: &str, value: &str) -> SourceError {
        SourceError::Malformed {
            path: self.root.join(&supply.name).join(attr),
            value: value.to_owned(),
        }
    }
}

/// Read one supply directory. Attribute errors are kept on the supply instead
/// of failing the scan; they only matter if it turns out to be the battery.
async fn read_supply(dir: PathBuf) -> Supply {
    let mut supply = Supply {
        name: dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        kind: None,
        scope: None,
        capacity: None,
        online: None,
        status: None,
        fault: None,
    };
    for attr in ["type", "scope", "capacity", "online", "status"] {
        let value = match read_attr(&dir.join(attr)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(
                    supply = %supply.name,
                    error = %e,
                    "power supply attribute unreadable"
                );
                supply.fault.get_or_insert(e);
                None
            }
        };
        match attr {
            "type" => supply.kind = value,
            "scope" => supply.scope = value,
            "capacity" => supply.capacity = value,
            "online" => supply.online = value,
            _ => supply.status = value,
        }
    }
    supply
}

#[async_trait::async_trait]
impl PowerSource for SysfsPowerSource {
    async fn read(&self) -> Result<Reading, SourceError> {
        let mut supplies = self.scan().await?;

        // A readable battery wins over one with a fault; the fault is only
        // reported when no candidate can be read.
        let Some(index) = supplies
            .iter()
            .position(|s| s.is_system_battery() && s.fault.is_none())
        else {
            return Err(supplies
                .iter_mut()
                .filter(|s| s.is_system_battery())
                .find_map(|s| s.fault.take())
                .unwrap_or_else(|| SourceError::NoBattery(self.root.clone())));
        };
        let battery = &supplies[index];
        let raw = battery.capacity.as_deref().unwrap_or_default();
        let capacity: u16 = raw
            .parse()
            .map_err(|_| self.malformed(battery, "capacity", raw))?;
        let percent = capacity.min(100) as u8;

        let mut adapters = supplies
            .iter()
            .filter(|s| s.is_adapter())
            .filter_map(|s| s.online.as_deref().map(|v| (s, v)))
            .peekable();

        let charging = if adapters.peek().is_some() {
            let mut any_online = false;
            for (supply, value) in adapters {
                match value {
                    "1" => any_online = true,
                    "0" => {}
                    other => return Err(self.malformed(supply, "online", other)),
                }
            }
            any_online
        } else {
            matches!(battery.status.as_deref(), Some("Charging" | "Full"))
        };

        Ok(Reading { percent, charging })
    }
}

/// Test double that replays a fixed script of readings. `None` entries read
/// as an unavailable source; once exhausted the last entry repeats.
#[derive(Debug)]
pub struct ScriptedPowerSource {
    script: Mutex<VecDeque<Option<Reading>>>,
}

impl ScriptedPowerSource {
    pub fn new(script: impl IntoIterator<Item = Option<Reading>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    pub fn readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        Self::new(readings.into_iter().map(Some))
    }
}

#[async_trait::async_trait]
impl PowerSource for ScriptedPowerSource {
    async fn read(&self) -> Result<Reading, SourceError> {
        let unavailable = || SourceError::NoBattery(PathBuf::from("scripted"));
        let mut script = self.script.lock().map_err(|_| unavailable())?;
        let next = if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().copied().flatten()
        };
        next.ok_or_else(unavailable)
    }
}
