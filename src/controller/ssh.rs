//! SSH command runner
//!
//! Runs one command on a router by shelling out to the system ssh client
//! (`ssh user@host 'command'`), relying on key-based authentication.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum SshError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("command '{command}' on {target} timed out after {timeout:?}")]
    Timeout {
        target: String,
        command: String,
        timeout: Duration,
    },
    #[error("command '{command}' on {target} failed with exit code {code}: {stderr}")]
    Failed {
        target: String,
        command: String,
        code: i32,
        stderr: String,
    },
}

/// Something that can run a command on a remote device
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` on `host` as `username` and return its stdout
    async fn run(
        &self,
        host: &str,
        username: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>, SshError>;
}

/// [`CommandRunner`] backed by the ssh client binary
#[derive(Debug, Clone)]
pub struct SshRunner {
    program: String,
}

impl SshRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SshRunner {
    fn default() -> Self {
        Self::new("ssh")
    }
}

#[async_trait]
impl CommandRunner for SshRunner {
    async fn run(
        &self,
        host: &str,
        username: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>, SshError> {
        let target = format!("{username}@{host}");
        tracing::debug!(program = %self.program, %target, command, "running remote command");

        let child = Command::new(&self.program)
            .arg(&target)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        // Dropping the future on timeout kills the child
        let output = match tokio::time::timeout(timeout, child).await {
            Ok(result) => result.map_err(|source| SshError::Spawn {
                program: self.program.clone(),
                source,
            })?,
            Err(_) => {
                return Err(SshError::Timeout {
                    target,
                    command: command.to_string(),
                    timeout,
                })
            }
        };

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(SshError::Failed {
                target,
                command: command.to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
