use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Stops the poll loop on SIGTERM or SIGINT via a CancellationToken.
#[derive(Debug)]
pub struct ShutdownGuard {
    token: CancellationToken,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// The cancellation token the poll loop monitors.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn a background task that cancels the token on the first
    /// termination signal. The task also ends once the token is cancelled
    /// elsewhere.
    pub fn spawn_signal_listener(&self) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use signal::unix::{SignalKind, signal as unix_signal};
                let handlers = (
                    unix_signal(SignalKind::terminate()),
                    unix_signal(SignalKind::interrupt()),
                );
                let (mut sigterm, mut sigint) = match handlers {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::warn!(error = %e, "failed to register signal handlers");
                        return;
                    }
                };
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, stopping monitor"),
                    _ = sigint.recv() => tracing::info!("received SIGINT, stopping monitor"),
                    _ = token.cancelled() => return,
                }
            }
            #[cfg(not(unix))]
            {
                tokio::select! {
                    _ = signal::ctrl_c() => tracing::info!("received Ctrl+C, stopping monitor"),
                    _ = token.cancelled() => return,
                }
            }
            token.cancel();
        })
    }
}

impl Default for ShutdownGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn listener_exits_when_token_cancelled_elsewhere() {
        let guard = ShutdownGuard::new();
        let listener = guard.spawn_signal_listener();
        tokio::task::yield_now().await;
        assert!(!listener.is_finished());

        guard.token().cancel();
        tokio::time::timeout(Duration::from_secs(1), listener)
            .await
            .expect("listener still running after cancel")
            .unwrap();
    }
}
