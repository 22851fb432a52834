use std::io;
use std::path::{Path, PathBuf};

use battmon_notify::embed::{NotificationTemplates, TemplateError};
use battmon_notify::webhook::WebhookTarget;
use serde::{Deserialize, Serialize};

use crate::environment::control::DEFAULT_SHUTDOWN_COMMAND;
use crate::environment::power::DEFAULT_POWER_SUPPLY_PATH;
use crate::types::{InvalidThresholds, Thresholds};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/default/batterymonitor";
/// Credential value written into a freshly seeded config.
pub const PLACEHOLDER_CREDENTIAL: &str = "REPLACE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write default config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("created default config at {0}; fill in the webhook credentials and restart")]
    Seeded(PathBuf),
    #[error("webhook credentials are still the \"REPLACE\" placeholder")]
    PlaceholderCredentials,
    #[error(transparent)]
    Thresholds(#[from] InvalidThresholds),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Monitor settings, read once at startup from a JSON file.
/// A missing file is seeded with these defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorCfg {
    #[serde(rename = "discordWebhookID", alias = "webhookEndpointId")]
    pub webhook_id: String,
    #[serde(rename = "discordWebhookToken", alias = "webhookToken")]
    pub webhook_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_base_url: Option<String>,

    pub battery_percentage_minimal: i64,
    pub battery_percentage_critical: i64,

    #[serde(default = "default_power_supply_path")]
    pub power_supply_path: PathBuf,
    #[serde(default = "default_shutdown_command")]
    pub shutdown_command: String,

    #[serde(default)]
    pub notifications: NotificationTemplates,
}

fn default_power_supply_path() -> PathBuf {
    PathBuf::from(DEFAULT_POWER_SUPPLY_PATH)
}

fn default_shutdown_command() -> String {
    DEFAULT_SHUTDOWN_COMMAND.to_owned()
}

impl Default for MonitorCfg {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            webhook_id: PLACEHOLDER_CREDENTIAL.to_owned(),
            webhook_token: PLACEHOLDER_CREDENTIAL.to_owned(),
            webhook_base_url: None,
            battery_percentage_minimal: thresholds.minimal().into(),
            battery_percentage_critical: thresholds.critical().into(),
            power_supply_path: default_power_supply_path(),
            shutdown_command: default_shutdown_command(),
            notifications: NotificationTemplates::default(),
        }
    }
}

impl MonitorCfg {
    /// Load from `path`. If the file does not exist, write the defaults there
    /// and return [`ConfigError::Seeded`] so the operator can add credentials.
    pub fn load_or_seed(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::default().seed(path)?;
            return Err(ConfigError::Seeded(path.to_owned()));
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Write this config as pretty JSON. The file holds the webhook token, so
    /// it is created owner-readable only.
    pub fn seed(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(io::Error::other(e)))?;
        std::fs::write(path, body).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        Ok(())
    }

    /// Startup validation. Thresholds must be ordered and in range, credentials
    /// filled in, template colors parseable.
    pub fn validate(&self) -> Result<Thresholds, ConfigError> {
        let thresholds = self.thresholds()?;
        if self.has_placeholder_credentials() {
            return Err(ConfigError::PlaceholderCredentials);
        }
        self.notifications.validate()?;
        Ok(thresholds)
    }

    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        Ok(Thresholds::new(
            self.battery_percentage_minimal,
            self.battery_percentage_critical,
        )?)
    }

    fn has_placeholder_credentials(&self) -> bool {
        [&self.webhook_id, &self.webhook_token]
            .iter()
            .any(|v| v.trim().is_empty() || v.as_str() == PLACEHOLDER_CREDENTIAL)
    }

    pub fn webhook_target(&self) -> WebhookTarget {
        WebhookTarget {
            id: self.webhook_id.clone(),
            token: self.webhook_token.clone(),
            base_url: self.webhook_base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL_FORMAT: &str = r##"{
        "discordWebhookID": "1234",
        "discordWebhookToken": "secret",
        "batteryPercentageMinimal": 25,
        "batteryPercentageCritical": 5,
        "notifications": {
            "systemCharging": { "timestamp": true, "color": "#1ed760", "title": "Charging" },
            "adapterUnpluggedDetails": { "title": "Details", "description": "{unpluggedTime}" }
        }
    }"##;

    fn write(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("batterymonitor");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_is_seeded_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("etc/default/batterymonitor");

        let err = MonitorCfg::load_or_seed(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Seeded(ref p) if p == &path));

        let seeded = MonitorCfg::load(&path).unwrap();
        assert_eq!(seeded, MonitorCfg::default());
        assert_eq!(seeded.battery_percentage_minimal, 30);
        assert_eq!(seeded.battery_percentage_critical, 10);
        assert!(matches!(seeded.validate(), Err(ConfigError::PlaceholderCredentials)));
    }

    #[cfg(unix)]
    #[test]
    fn seeded_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("batterymonitor");
        MonitorCfg::default().seed(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn seeded_json_uses_original_keys() {
        let json = serde_json::to_value(MonitorCfg::default()).unwrap();
        assert_eq!(json["discordWebhookID"], PLACEHOLDER_CREDENTIAL);
        assert_eq!(json["discordWebhookToken"], PLACEHOLDER_CREDENTIAL);
        assert_eq!(json["batteryPercentageMinimal"], 30);
        assert!(json["notifications"]["batteryAtCriticalLevel"].is_object());
        assert!(json.get("webhookBaseUrl").is_none());
    }

    #[test]
    fn loads_original_format_and_ignores_details_template() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = MonitorCfg::load_or_seed(&write(tmp.path(), ORIGINAL_FORMAT)).unwrap();

        let thresholds = cfg.validate().unwrap();
        assert_eq!((thresholds.minimal(), thresholds.critical()), (25, 5));
        assert_eq!(cfg.webhook_target().id, "1234");
        assert_eq!(cfg.notifications.system_charging.title.as_deref(), Some("Charging"));
        assert_eq!(
            cfg.notifications.adapter_unplugged,
            NotificationTemplates::default().adapter_unplugged
        );
        assert_eq!(cfg.power_supply_path, PathBuf::from(DEFAULT_POWER_SUPPLY_PATH));
        assert_eq!(cfg.shutdown_command, DEFAULT_SHUTDOWN_COMMAND);
    }

    #[test]
    fn accepts_generic_credential_aliases() {
        let tmp = tempfile::tempdir().unwrap();
        let body = r#"{
            "webhookEndpointId": "9",
            "webhookToken": "t",
            "webhookBaseUrl": "http://localhost:8080/hooks",
            "batteryPercentageMinimal": 40,
            "batteryPercentageCritical": 15
        }"#;
        let cfg = MonitorCfg::load(&write(tmp.path(), body)).unwrap();
        let target = cfg.webhook_target();
        assert_eq!((target.id.as_str(), target.token.as_str()), ("9", "t"));
        assert_eq!(target.base_url.as_deref(), Some("http://localhost:8080/hooks"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_thresholds_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let body = r#"{ "discordWebhookID": "1", "discordWebhookToken": "2" }"#;
        let err = MonitorCfg::load(&write(tmp.path(), body)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = MonitorCfg::load(&write(tmp.path(), "{ not json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let cfg = MonitorCfg {
            webhook_id: "1".into(),
            webhook_token: "2".into(),
            battery_percentage_minimal: 10,
            battery_percentage_critical: 30,
            ..MonitorCfg::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Thresholds(InvalidThresholds::CriticalNotBelowMinimal { .. }))
        ));
    }

    #[test]
    fn bad_template_color_rejected() {
        let mut cfg = MonitorCfg {
            webhook_id: "1".into(),
            webhook_token: "2".into(),
            ..MonitorCfg::default()
        };
        cfg.notifications.system_charging.color = Some("green".into());
        assert!(matches!(cfg.validate(), Err(ConfigError::Template(_))));
    }
}
