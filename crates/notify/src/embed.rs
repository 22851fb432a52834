//! Discord embed templates.
//!
//! Templates come from the config file and may reference `{placeholder}`
//! names supplied by [`NotificationEvent::variables`](crate::event::NotificationEvent::variables).
//! Unknown placeholders are left untouched.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{EventKind, NotificationEvent};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid color {value:?} in {kind} template (expected #rrggbb)")]
    InvalidColor { kind: EventKind, value: String },
}

// ── Config-side templates ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedTemplate {
    /// Stamp the embed with the send time.
    #[serde(default)]
    pub timestamp: bool,
    /// Hex color such as `#1ed760`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTemplate {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// One template per event kind. Kinds missing from the config file fall
/// back to the built-in template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationTemplates {
    pub system_charging: EmbedTemplate,
    pub adapter_unplugged: EmbedTemplate,
    pub battery_below_minimum: EmbedTemplate,
    #[serde(rename = "batteryAtCriticalLevel")]
    pub battery_at_critical: EmbedTemplate,
}

const GREEN: &str = "#1ed760";
const RED: &str = "#ec7979";

impl Default for NotificationTemplates {
    fn default() -> Self {
        Self {
            system_charging: EmbedTemplate {
                timestamp: true,
                color: Some(GREEN.into()),
                title: Some("System is charging!".into()),
                ..Default::default()
            },
            adapter_unplugged: EmbedTemplate {
                timestamp: true,
                color: Some(RED.into()),
                title: Some("The adapter charger has been unplugged!".into()),
                description: Some("**Current battery percentage:** {batteryPercentage}%".into()),
                ..Default::default()
            },
            battery_below_minimum: EmbedTemplate {
                timestamp: true,
                color: Some(RED.into()),
                title: Some("Battery percentage is below minimum!".into()),
                description: Some(
                    "**Current battery percentage:** {batteryPercentage}%\n\
                     **Minimal battery percentage:** {batteryPercentageMinimal}%\n\
                     **Critical battery percentage:** {batteryPercentageCritical}%"
                        .into(),
                ),
                ..Default::default()
            },
            battery_at_critical: EmbedTemplate {
                timestamp: true,
                color: Some(RED.into()),
                title: Some(
                    "Battery percentage is at critical percentage, system shutting down!".into(),
                ),
                description: Some(
                    "**Current battery percentage:** {batteryPercentage}%\n\
                     **Critical battery percentage:** {batteryPercentageCritical}%"
                        .into(),
                ),
                ..Default::default()
            },
        }
    }
}

impl NotificationTemplates {
    pub fn get(&self, kind: EventKind) -> &EmbedTemplate {
        match kind {
            EventKind::SystemCharging => &self.system_charging,
            EventKind::AdapterUnplugged => &self.adapter_unplugged,
            EventKind::BatteryBelowMinimum => &self.battery_below_minimum,
            EventKind::BatteryAtCritical => &self.battery_at_critical,
        }
    }

    /// Check every template's color so a typo is caught at startup rather than
    /// silently dropped at send time.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for kind in EventKind::ALL {
            if let Some(color) = &self.get(kind).color {
                parse_color(color).ok_or_else(|| TemplateError::InvalidColor {
                    kind,
                    value: color.clone(),
                })?;
            }
        }
        Ok(())
    }

    pub fn render(&self, event: &NotificationEvent, now: DateTime<Utc>) -> Embed {
        self.get(event.kind()).render(&event.variables(), now)
    }
}

// ── Wire-side embed ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedTemplate {
    pub fn render(&self, vars: &[(&str, String)], now: DateTime<Utc>) -> Embed {
        let sub = |s: &Option<String>| s.as_deref().map(|t| inject(t, vars));
        Embed {
            title: sub(&self.title),
            description: sub(&self.description),
            url: sub(&self.url),
            color: self.color.as_deref().and_then(parse_color),
            timestamp: self
                .timestamp
                .then(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            footer: sub(&self.footer).map(|text| EmbedFooter { text }),
            image: sub(&self.image).map(|url| EmbedMedia { url }),
            thumbnail: sub(&self.thumbnail).map(|url| EmbedMedia { url }),
            author: sub(&self.author).map(|name| EmbedAuthor { name }),
            fields: self
                .fields
                .iter()
                .map(|f| EmbedField {
                    name: inject(&f.name, vars),
                    value: inject(&f.value, vars),
                    inline: f.inline,
                })
                .collect(),
        }
    }
}

/// `#rrggbb` (leading `#` optional) → 24-bit integer.
pub fn parse_color(value: &str) -> Option<u32> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Replace `{name}` with the matching variable. Unknown names stay verbatim.
pub fn inject(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' && close > 0 => {
                let name = &after[..close];
                match vars.iter().find(|(k, _)| *k == name) {
                    Some((_, v)) => out.push_str(v),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn vars() -> Vec<(&'static str, String)> {
        vec![
            ("batteryPercentage", "25".to_string()),
            ("batteryPercentageMinimal", "30".to_string()),
        ]
    }

    #[test]
    fn inject_replaces_known_placeholders() {
        assert_eq!(
            inject("now {batteryPercentage}% of {batteryPercentageMinimal}%", &vars()),
            "now 25% of 30%"
        );
    }

    #[test]
    fn inject_keeps_unknown_and_unbalanced() {
        assert_eq!(inject("{unknown} left", &vars()), "{unknown} left");
        assert_eq!(inject("open { brace", &vars()), "open { brace");
        assert_eq!(inject("{}", &vars()), "{}");
        assert_eq!(inject("{{batteryPercentage}}", &vars()), "{25}");
    }

    #[test]
    fn parse_color_accepts_hex() {
        assert_eq!(parse_color("#1ed760"), Some(0x1ed760));
        assert_eq!(parse_color("ec7979"), Some(0xec7979));
        assert_eq!(parse_color("#fff"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn render_fills_description_color_and_timestamp() {
        let templates = NotificationTemplates::default();
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
        let event = NotificationEvent::BatteryBelowMinimum {
            percent: 25,
            minimal: 30,
            critical: 10,
        };
        let embed = templates.render(&event, now);

        assert_eq!(embed.title.as_deref(), Some("Battery percentage is below minimum!"));
        let desc = embed.description.unwrap();
        assert!(desc.contains("**Current battery percentage:** 25%"));
        assert!(desc.contains("**Minimal battery percentage:** 30%"));
        assert!(desc.contains("**Critical battery percentage:** 10%"));
        assert_eq!(embed.color, Some(0xec7979));
        assert_eq!(embed.timestamp.as_deref(), Some("2026-10-14T12:00:00.000Z"));
    }

    #[test]
    fn render_wraps_nested_discord_objects() {
        let tpl = EmbedTemplate {
            footer: Some("at {batteryPercentage}%".into()),
            thumbnail: Some("https://img/{batteryPercentage}.png".into()),
            author: Some("host".into()),
            fields: vec![FieldTemplate {
                name: "Level".into(),
                value: "{batteryPercentage}%".into(),
                inline: true,
            }],
            ..Default::default()
        };
        let embed = tpl.render(&vars(), Utc::now());
        assert_eq!(embed.footer, Some(EmbedFooter { text: "at 25%".into() }));
        assert_eq!(
            embed.thumbnail,
            Some(EmbedMedia { url: "https://img/25.png".into() })
        );
        assert_eq!(embed.author, Some(EmbedAuthor { name: "host".into() }));
        assert_eq!(embed.fields[0].value, "25%");
        assert!(embed.timestamp.is_none());

        let json = serde_json::to_value(&embed).unwrap();
        assert!(json.get("image").is_none());
        assert_eq!(json["footer"]["text"], "at 25%");
    }

    #[test]
    fn validate_rejects_bad_color() {
        let mut templates = NotificationTemplates::default();
        assert!(templates.validate().is_ok());
        templates.battery_at_critical.color = Some("red".into());
        assert_eq!(
            templates.validate(),
            Err(TemplateError::InvalidColor {
                kind: EventKind::BatteryAtCritical,
                value: "red".into(),
            })
        );
    }

    #[test]
    fn partial_templates_fall_back_to_defaults() {
        let json = r##"{ "systemCharging": { "title": "Plugged in", "color": "#000000" } }"##;
        let templates: NotificationTemplates = serde_json::from_str(json).unwrap();
        assert_eq!(templates.system_charging.title.as_deref(), Some("Plugged in"));
        assert_eq!(
            templates.battery_at_critical,
            NotificationTemplates::default().battery_at_critical
        );
    }

    #[test]
    fn ignores_unplugged_details_template() {
        let json = r#"{ "adapterUnpluggedDetails": { "title": "Details" } }"#;
        let templates: NotificationTemplates = serde_json::from_str(json).unwrap();
        assert_eq!(templates, NotificationTemplates::default());
    }
}
