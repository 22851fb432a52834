use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use crate::event::{EventKind, NotificationEvent};

/// Error type for notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("endpoint rejected notification: {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("delivery timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

/// Trait for notification sinks (Discord webhook, test doubles).
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    fn send(
        &self,
        event: NotificationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>>;
}

/// Test double that records every attempt and fails on demand.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    inner: Mutex<Recorded>,
}

#[derive(Debug, Default)]
struct Recorded {
    attempts: Vec<NotificationEvent>,
    delivered: Vec<NotificationEvent>,
    /// Remaining forced failures per kind.
    failures: HashMap<EventKind, u32>,
    /// Remaining forced failures for any kind.
    fail_any: u32,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` deliveries of `kind`.
    pub fn fail_kind(&self, kind: EventKind, times: u32) {
        if let Ok(mut rec) = self.inner.lock() {
            *rec.failures.entry(kind).or_default() += times;
        }
    }

    /// Fail the next `times` deliveries regardless of kind.
    pub fn fail_next(&self, times: u32) {
        if let Ok(mut rec) = self.inner.lock() {
            rec.fail_any += times;
        }
    }

    /// Every send attempt, successful or not, in order.
    pub fn attempts(&self) -> Vec<NotificationEvent> {
        self.inner.lock().map(|r| r.attempts.clone()).unwrap_or_default()
    }

    /// Successfully delivered events, in order.
    pub fn delivered(&self) -> Vec<NotificationEvent> {
        self.inner.lock().map(|r| r.delivered.clone()).unwrap_or_default()
    }

    pub fn delivered_kinds(&self) -> Vec<EventKind> {
        self.delivered().iter().map(NotificationEvent::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.delivered().iter().filter(|e| e.kind() == kind).count()
    }

    fn record(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        let mut rec = self
            .inner
            .lock()
            .map_err(|_| NotifyError::RequestFailed("recorder poisoned".into()))?;
        rec.attempts.push(event);

        if rec.fail_any > 0 {
            rec.fail_any -= 1;
            return Err(NotifyError::RequestFailed("forced failure".into()));
        }
        if let Some(left) = rec.failures.get_mut(&event.kind()) {
            if *left > 0 {
                *left -= 1;
                return Err(NotifyError::Rejected {
                    status: 500,
                    body: format!("forced failure for {}", event.kind()),
                });
            }
        }

        rec.delivered.push(event);
        Ok(())
    }
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn send(
        &self,
        event: NotificationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        let result = self.record(event);
        Box::pin(async move { result })
    }
}
