// ABOUTME: Remote command execution over a fresh channel per call.
// ABOUTME: Captures combined or stdout-only output and logs per client options.

use super::client::Client;
use super::error::{Error, Result};
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use std::fmt;
use std::time::Instant;

/// How a remote command terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Code(u32),
    Signal(String),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Code(0))
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Code(code) => write!(f, "exited with status {code}"),
            ExitStatus::Signal(signal) => write!(f, "exited with signal {signal}"),
        }
    }
}

/// Output from a remote command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Stdout, or stdout and stderr interleaved when not in stdout-only mode.
    pub output: String,
    /// Stderr, captured only in stdout-only mode.
    pub stderr: String,
    pub status: ExitStatus,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

impl Client {
    /// Run `command` and return its output.
    ///
    /// A non-zero exit is not an error: it is logged as a warning and the
    /// output is still returned. Channel, I/O and protocol failures are
    /// errors. No timeout is applied.
    pub async fn execute(&self, command: &str) -> Result<String> {
        let started = Instant::now();
        if self.options.log_input {
            self.logger.in_scope(|| tracing::debug!(command, "ssh exec"));
        }

        let output = self.run(command).await?;

        if !output.success() && self.options.logs_anything() {
            let stderr = output.stderr.trim();
            self.logger.in_scope(|| {
                tracing::warn!(command, status = %output.status, stderr, "ssh command failed")
            });
        }

        if self.options.log_output {
            let elapsed = started.elapsed();
            let trimmed = output.output.trim();
            self.logger.in_scope(|| {
                if trimmed.is_empty() {
                    tracing::debug!(?elapsed, "ssh output");
                } else {
                    tracing::debug!(output = trimmed, ?elapsed, "ssh output");
                }
            });
        }

        Ok(output.output)
    }

    /// Run `command` on a new channel and collect everything it produced.
    ///
    /// Unlike [`Client::execute`] this applies no logging policy and reports
    /// the exit status to the caller.
    pub async fn run(&self, command: &str) -> Result<CommandOutput> {
        let stdout_only = self.options.stdout_only;
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(Error::SessionOpen)?;

        let mut captured = Captured::default();
        let result = captured.read_from(&mut channel, command, stdout_only).await;
        self.close_channel(&channel, command).await;

        let stderr = String::from_utf8_lossy(&captured.stderr).into_owned();
        match result {
            Ok(status) => Ok(CommandOutput {
                output: String::from_utf8_lossy(&captured.output).into_owned(),
                stderr,
                status,
            }),
            Err(reason) => Err(Error::CommandExecution {
                reason,
                stderr: stdout_only.then_some(stderr),
            }),
        }
    }

    async fn close_channel(&self, channel: &Channel<Msg>, command: &str) {
        match channel.close().await {
            Ok(()) => {}
            Err(e) if is_end_of_stream(&e) => {}
            Err(e) => {
                if self.options.logs_anything() {
                    self.logger.in_scope(|| {
                        tracing::error!(command, error = %e, "failed to close ssh session")
                    });
                }
            }
        }
    }
}

#[derive(Default)]
struct Captured {
    output: Vec<u8>,
    stderr: Vec<u8>,
}

impl Captured {
    /// Exec `command` and drain the channel until exit status and EOF.
    async fn read_from(
        &mut self,
        channel: &mut Channel<Msg>,
        command: &str,
        stdout_only: bool,
    ) -> std::result::Result<ExitStatus, String> {
        channel
            .exec(true, command)
            .await
            .map_err(|e| format!("failed to exec command: {e}"))?;

        let mut status = None;
        let mut got_eof = false;
        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => self.output.extend_from_slice(&data),
                Some(ChannelMsg::ExtendedData { data, ext: 1 }) => {
                    if stdout_only {
                        self.stderr.extend_from_slice(&data);
                    } else {
                        self.output.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    status = Some(ExitStatus::Code(exit_status));
                    if got_eof {
                        break;
                    }
                }
                Some(ChannelMsg::ExitSignal { signal_name, .. }) => {
                    status = Some(ExitStatus::Signal(format!("{signal_name:?}")));
                    if got_eof {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) => {
                    got_eof = true;
                    if status.is_some() {
                        break;
                    }
                }
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            }
        }

        status.ok_or_else(|| "channel closed without exit status".to_string())
    }
}

/// Closing a channel the peer already tore down reports end-of-stream.
fn is_end_of_stream(e: &russh::Error) -> bool {
    match e {
        russh::Error::Disconnect => true,
        russh::Error::IO(io) => io.kind() == std::io::ErrorKind::UnexpectedEof,
        _ => false,
    }
}
