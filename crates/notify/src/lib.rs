//! Notification delivery for battmon.
//!
//! [`Notifier`] is the seam the poll loop talks to; [`webhook::DiscordWebhook`]
//! is the production sink and [`RecordingNotifier`] the test double.

pub mod embed;
pub mod event;
pub mod notifier;
pub mod webhook;

pub use event::{EventKind, NotificationEvent};
pub use notifier::{Notifier, NotifyError, RecordingNotifier};
