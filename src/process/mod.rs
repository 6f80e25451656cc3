//! External tool execution.
//!
//! Every tool runs as a blocking step of the pipeline: the caller awaits
//! until the child exits. Stdout and stderr are read concurrently and merged
//! in arrival order.

mod filter;
mod workdir;

pub use filter::{OutputMode, is_error_line};
pub use workdir::WorkingDir;

use crate::cli::OutputManager;
use crate::config::ToolCommand;
use crate::pipeline::{Error, Result};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Outcome of a finished tool.
#[derive(Debug)]
pub struct ToolOutput {
    /// Exit status
    pub status: ExitStatus,
    /// All output lines (only in [`OutputMode::Capture`])
    pub lines: Vec<String>,
    /// Lines shown to the operator as errors
    pub highlighted: Vec<String>,
}

impl ToolOutput {
    /// Whether the tool exited with status 0.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, `None` when terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Runs tools and routes their output to the operator.
#[derive(Debug, Clone, Copy)]
pub struct ToolRunner<'a> {
    output: &'a OutputManager,
    strict: bool,
}

impl<'a> ToolRunner<'a> {
    /// Create a runner. In strict mode a non-zero exit from [`ToolRunner::run_checked`] is fatal.
    pub fn new(output: &'a OutputManager, strict: bool) -> Self {
        Self { output, strict }
    }

    /// Run a tool in the current working directory.
    pub async fn run(&self, command: &ToolCommand, mode: OutputMode) -> Result<ToolOutput> {
        let display = command.to_string();
        let program = which::which(&command.program).map_err(|e| Error::CommandFailed {
            command: display.clone(),
            error: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found in PATH: {}", command.program, e),
            ),
        })?;
        log::debug!("Running `{}` ({})", display, program.display());

        let mut child = Command::new(&program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| Error::CommandFailed {
                command: display.clone(),
                error,
            })?;

        let waited = match command.timeout_secs {
            Some(secs) => {
                let outcome =
                    tokio::time::timeout(Duration::from_secs(secs), self.collect(&mut child, mode))
                        .await;
                match outcome {
                    Ok(result) => result,
                    Err(_elapsed) => {
                        self.output
                            .warn(&format!("`{}` timed out after {}s, terminating...", display, secs));
                        if let Err(e) = child.kill().await {
                            log::warn!("Failed to kill `{}`: {}", display, e);
                        }
                        return Err(Error::Timeout {
                            command: display,
                            secs,
                        });
                    }
                }
            }
            None => self.collect(&mut child, mode).await,
        };

        let (status, lines, highlighted) = waited.map_err(|error| Error::CommandFailed {
            command: display.clone(),
            error,
        })?;
        log::debug!(
            "`{}` finished with {:?} ({} highlighted line(s))",
            display,
            status.code(),
            highlighted.len()
        );

        Ok(ToolOutput {
            status,
            lines,
            highlighted,
        })
    }

    /// Run a tool and apply the exit-status policy.
    ///
    /// A non-zero exit is fatal in strict mode; otherwise it is reported and
    /// the caller's artifact check decides.
    pub async fn run_checked(&self, command: &ToolCommand, mode: OutputMode) -> Result<ToolOutput> {
        let result = self.run(command, mode).await?;
        if !result.success() {
            if self.strict {
                return Err(Error::ToolFailed {
                    command: command.to_string(),
                    code: result.code(),
                });
            }
            self.output.warn(&format!(
                "`{}` exited with {}",
                command,
                crate::pipeline::error::exit_code_display(result.code())
            ));
        }
        Ok(result)
    }

    async fn collect(
        &self,
        child: &mut Child,
        mode: OutputMode,
    ) -> std::io::Result<(ExitStatus, Vec<String>, Vec<String>)> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let readers = [
            child.stdout.take().map(|s| tokio::spawn(forward_lines(s, tx.clone()))),
            child.stderr.take().map(|s| tokio::spawn(forward_lines(s, tx.clone()))),
        ];
        drop(tx);

        let mut lines = Vec::new();
        let mut highlighted = Vec::new();
        let mut suppressed = 0usize;
        while let Some(line) = rx.recv().await {
            if mode.highlights(&line) {
                self.output.highlight(&line);
                highlighted.push(line);
            } else if mode.keeps_lines() {
                lines.push(line);
            } else {
                log::trace!("suppressed: {}", line);
                suppressed += 1;
            }
        }
        for reader in readers.into_iter().flatten() {
            // Reader tasks only end after their stream closed; a join error means a panic.
            if let Err(e) = reader.await {
                log::warn!("Output reader task failed: {}", e);
            }
        }
        if suppressed > 0 {
            log::debug!("Suppressed {} line(s) of tool output", suppressed);
        }

        let status = child.wait().await?;
        Ok((status, lines, highlighted))
    }
}

/// Forward every line of `stream` until EOF. Bytes that are not UTF-8 are
/// replaced rather than ending the read, so the child never writes into a
/// closed pipe.
async fn forward_lines<R>(stream: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(trim_line_ending(&buf)).into_owned();
                // Keep draining after the receiver is gone.
                let _ = tx.send(line);
            }
            Err(e) => {
                log::warn!("Failed to read tool output: {}", e);
                break;
            }
        }
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
