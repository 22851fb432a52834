use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_SHUTDOWN_COMMAND: &str = "/usr/sbin/poweroff";

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("shutdown command is empty")]
    EmptyCommand,
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Host power control. `shutdown` only has to start the shutdown; it must not
/// be assumed to block until the machine is off.
#[async_trait::async_trait]
pub trait SystemControl: Send + Sync {
    async fn shutdown(&self) -> Result<(), ControlError>;
}

/// Runs the configured poweroff command and returns once it has been spawned.
#[derive(Debug, Clone)]
pub struct PoweroffControl {
    program: PathBuf,
    args: Vec<String>,
}

impl PoweroffControl {
    /// Parse a whitespace-separated command line, e.g. `systemctl poweroff`.
    pub fn from_command(command: &str) -> Result<Self, ControlError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(ControlError::EmptyCommand)?;
        Ok(Self {
            program: PathBuf::from(program),
            args: parts.map(String::from).collect(),
        })
    }
}

#[async_trait::async_trait]
impl SystemControl for PoweroffControl {
    async fn shutdown(&self) -> Result<(), ControlError> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| ControlError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let program = self.program.display().to_string();
        tracing::info!(%program, "shutdown command issued");
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::debug!(%program, "shutdown command exited");
                }
                Ok(status) => tracing::warn!(%program, %status, "shutdown command failed"),
                Err(e) => tracing::warn!(%program, error = %e, "shutdown command wait failed"),
            }
        });
        Ok(())
    }
}

/// Test double counting shutdown requests.
#[derive(Debug, Default)]
pub struct RecordingControl {
    calls: AtomicUsize,
}

impl RecordingControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SystemControl for RecordingControl {
    async fn shutdown(&self) -> Result<(), ControlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_args() {
        let ctl = PoweroffControl::from_command("systemctl  poweroff --no-wall").unwrap();
        assert_eq!(ctl.program, PathBuf::from("systemctl"));
        assert_eq!(ctl.args, vec!["poweroff".to_string(), "--no-wall".to_string()]);
    }

    #[test]
    fn empty_command_rejected() {
        assert!(matches!(
            PoweroffControl::from_command("   "),
            Err(ControlError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn spawns_without_waiting() {
        let ctl = PoweroffControl::from_command("true").unwrap();
        ctl.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let ctl = PoweroffControl::from_command("/nonexistent/battmon-poweroff").unwrap();
        assert!(matches!(ctl.shutdown().await, Err(ControlError::Spawn { .. })));
    }
}
